//! The D-Tagatose study's concrete process units and route presets.
//!
//! Yields, power draws, operating hours and equipment costs come from the
//! latest revision of the feasibility study (1000 L reactor, 110 g/L
//! galactose, 24 h batch). Two routes are modeled:
//!
//! - **Route A**: purified D-Galactose feed, steps 3-7
//! - **Route B**: red algae biomass feed, steps 1-7 (adds acid hydrolysis,
//!   neutralization and an anion-exchange polish)
//!
//! # Example
//!
//! ```
//! use tagatea::stages::library;
//! use tagatea::{PerBatch, Stream};
//!
//! let feed = Stream::<PerBatch>::new().with_component(library::GALACTOSE, 110.0)?;
//! let report = library::route_a().evaluate(&feed)?;
//!
//! // Downstream recovery: 98% x 96% x 94% x 95% = 83.8%
//! let product = report.product().component(library::TAGATOSE).kg();
//! assert!((product / 110.0 - 0.838).abs() < 0.001);
//! # Ok::<(), tagatea::EvalError>(())
//! ```

use super::{Stage, StageChain};
use crate::EvalResult;

/// Red algae dry biomass (Route B feed).
pub const ALGAE_BIOMASS: &str = "red-algae-biomass";
/// D-Galactose, the biocatalysis substrate.
pub const GALACTOSE: &str = "d-galactose";
/// D-Tagatose, the product.
pub const TAGATOSE: &str = "d-tagatose";

// Unit constants are compile-time literals; a violation is a programming
// error, not a runtime condition.
fn unit(stage: EvalResult<Stage>, power_kw: f64, hours: f64, equipment_cost: f64) -> Stage {
    stage
        .and_then(|s| s.with_utility(power_kw, hours))
        .and_then(|s| s.with_equipment_cost(equipment_cost))
        .expect("unit constants in range")
}

/// Step 1 (Route B): acid hydrolysis of algae polysaccharides to D-Galactose.
/// 85% yield at 130 degC with H2SO4.
pub fn acid_hydrolysis() -> Stage {
    unit(Stage::conversion("acid hydrolysis", ALGAE_BIOMASS, GALACTOSE, 0.85), 0.5, 0.5, 80_000.0)
}

/// Step 2 (Route B): neutralization with NaOH and filtration. 92% recovery.
pub fn neutralization() -> Stage {
    unit(Stage::recovery("neutralization", GALACTOSE, 0.92), 0.3, 1.0, 50_000.0)
}

/// Step 2.5 (Route B): anion-exchange removal of sulfate and organic acid
/// byproducts. The product passes through; resin replacement sits under the
/// maintenance fraction of CAPEX.
pub fn anion_exchange() -> Stage {
    unit(Stage::recovery("anion exchange", GALACTOSE, 1.0), 0.2, 2.0, 50_000.0)
}

/// Step 3: whole-cell biocatalysis, D-Galactose -> D-Tagatose at 98%
/// conversion. 1000 L bioreactor, 16 h anaerobic + 8 h aerobic.
pub fn biocatalysis() -> Stage {
    unit(Stage::conversion("whole-cell biocatalysis", GALACTOSE, TAGATOSE, 0.98), 5.0, 24.0, 225_000.0)
}

/// Oxygen supply for the 8 h aerobic phase. No mass effect on the product.
pub fn oxygen_compressor() -> Stage {
    unit(Stage::recovery("oxygen compressor", TAGATOSE, 1.0), 2.5, 8.0, 30_000.0)
}

/// Step 4: centrifugal cell removal. The product stream passes through; the
/// 98% figure in the study refers to cell removal, not product loss.
pub fn cell_separator() -> Stage {
    unit(Stage::recovery("cell separator", TAGATOSE, 1.0), 3.0, 2.0, 25_000.0)
}

/// Step 5: activated-carbon decolorization. 96% product recovery.
pub fn decolorization() -> Stage {
    unit(Stage::recovery("decolorization", TAGATOSE, 0.96), 1.0, 4.0, 20_000.0)
}

/// Step 6: cation-exchange desalting. 94% product recovery.
pub fn desalting() -> Stage {
    unit(Stage::recovery("desalting", TAGATOSE, 0.94), 1.0, 3.0, 30_000.0)
}

/// Cooling crystallization for the crystal product option.
pub fn crystallization() -> Stage {
    unit(Stage::recovery("crystallization", TAGATOSE, 1.0), 4.0, 6.0, 50_000.0)
}

/// Step 7: drying to powder (>98% purity, <5% moisture). 95% solid recovery.
pub fn dryer() -> Stage {
    unit(Stage::recovery("dryer", TAGATOSE, 0.95), 6.0, 3.0, 40_000.0)
}

/// Route A: purified D-Galactose feed, steps 3-7.
pub fn route_a() -> StageChain {
    StageChain::new(vec![
        biocatalysis(),
        oxygen_compressor(),
        cell_separator(),
        decolorization(),
        desalting(),
        crystallization(),
        dryer(),
    ])
}

/// Route B: red algae biomass feed, steps 1-7.
pub fn route_b() -> StageChain {
    StageChain::new(vec![
        acid_hydrolysis(),
        neutralization(),
        anion_exchange(),
        biocatalysis(),
        oxygen_compressor(),
        cell_separator(),
        decolorization(),
        desalting(),
        crystallization(),
        dryer(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PerBatch, Stream};

    #[test]
    fn route_a_downstream_recovery_matches_study() {
        let feed = Stream::<PerBatch>::new().with_component(GALACTOSE, 110.0).unwrap();
        let report = route_a().evaluate(&feed).unwrap();

        // 0.98 x 0.96 x 0.94 x 0.95 = 0.8386...
        let product = report.product().component(TAGATOSE).kg();
        assert!((product - 110.0 * 0.98 * 0.96 * 0.94 * 0.95).abs() < 1e-9);
    }

    #[test]
    fn route_b_galactose_step_yield_matches_study() {
        // 141 kg algae x 0.85 x 0.92 = 110.3 kg galactose into biocatalysis
        let feed = Stream::<PerBatch>::new().with_component(ALGAE_BIOMASS, 141.0).unwrap();
        let upstream = StageChain::new(vec![acid_hydrolysis(), neutralization(), anion_exchange()]);
        let report = upstream.evaluate(&feed).unwrap();

        let galactose = report.product().component(GALACTOSE).kg();
        assert!((galactose - 141.0 * 0.782).abs() < 0.05);
    }

    #[test]
    fn route_a_equipment_cost_matches_study_subtotal() {
        // 225k + 30k + 25k + 20k + 30k + 50k + 40k
        assert_eq!(route_a().equipment_cost(), 420_000.0);
    }

    #[test]
    fn route_b_adds_upstream_equipment() {
        assert_eq!(route_b().equipment_cost(), route_a().equipment_cost() + 180_000.0);
    }

    #[test]
    fn bioreactor_dominates_the_energy_roll_up() {
        let feed = Stream::<PerBatch>::new().with_component(GALACTOSE, 110.0).unwrap();
        let report = route_a().evaluate(&feed).unwrap();
        let bioreactor_kwh = 5.0 * 24.0;
        assert!(bioreactor_kwh / report.energy_per_batch_kwh() > 0.5);
    }
}
