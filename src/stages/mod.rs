//! Process stages and the stage chain evaluator.
//!
//! A [`Stage`] applies one scalar yield/recovery fraction to one tracked
//! component, with the complement routed to a per-stage waste entry for
//! auditability. A [`StageChain`] evaluates an ordered list of stages against
//! a per-batch feed stream, producing a [`ChainReport`] with the final
//! product stream, the stage-by-stage mass audit and the utility-energy
//! roll-up.
//!
//! All stage arithmetic happens on a per-batch basis; annualization is a
//! separate, explicit step on the report.
//!
//! # Example
//!
//! ```
//! use tagatea::stages::{Stage, StageChain};
//! use tagatea::{PerBatch, Stream};
//!
//! let chain = StageChain::new(vec![
//!     Stage::conversion("biocatalysis", "d-galactose", "d-tagatose", 0.98)?,
//!     Stage::recovery("decolorization", "d-tagatose", 0.96)?,
//! ]);
//!
//! let feed = Stream::<PerBatch>::new().with_component("d-galactose", 110.0)?;
//! let report = chain.evaluate(&feed)?;
//!
//! let product = report.product().component("d-tagatose");
//! assert!((product.kg() - 110.0 * 0.98 * 0.96).abs() < 1e-9);
//! # Ok::<(), tagatea::EvalError>(())
//! ```

pub mod library;

use crate::{EvalError, EvalResult, Mass, PerBatch, PerYear, Stream};

/// An ordered process step with one yield fraction, a fixed utility power
/// draw and a fixed equipment cost.
///
/// # Invariants
///
/// - `yield_fraction` lies in [0, 1] (no mass creation)
/// - power, operating hours and equipment cost are non-negative
#[derive(Debug, Clone)]
pub struct Stage {
    /// Stage name (appears in the audit and in error messages)
    name: String,
    /// Component the yield applies to; all others pass through unchanged
    feed_component: String,
    /// Output component name; differs from the feed component for conversion
    /// stages (e.g. d-galactose -> d-tagatose)
    product_component: String,
    /// Fraction of the tracked component retained in the output [0, 1]
    yield_fraction: f64,
    /// Utility power draw while the stage runs [kW]
    power_kw: f64,
    /// Operating hours per batch [hr]
    hours_per_batch: f64,
    /// Equipment purchase cost [$]
    equipment_cost: f64,
}

impl Stage {
    /// Creates a recovery stage: the tracked component keeps its name and a
    /// fraction of its mass.
    ///
    /// # Errors
    ///
    /// Returns a domain error if `yield_fraction` is outside [0, 1].
    pub fn recovery(name: &str, component: &str, yield_fraction: f64) -> EvalResult<Self> {
        Self::build(name, component, component, yield_fraction)
    }

    /// Creates a conversion stage: the surviving fraction of the feed
    /// component leaves under the product component's name.
    pub fn conversion(
        name: &str,
        feed_component: &str,
        product_component: &str,
        yield_fraction: f64,
    ) -> EvalResult<Self> {
        Self::build(name, feed_component, product_component, yield_fraction)
    }

    fn build(
        name: &str,
        feed_component: &str,
        product_component: &str,
        yield_fraction: f64,
    ) -> EvalResult<Self> {
        if !yield_fraction.is_finite() || !(0.0..=1.0).contains(&yield_fraction) {
            return Err(EvalError::domain(
                name,
                format!("yield fraction must lie in [0, 1], got {yield_fraction}"),
            ));
        }
        Ok(Stage {
            name: name.to_string(),
            feed_component: feed_component.to_string(),
            product_component: product_component.to_string(),
            yield_fraction,
            power_kw: 0.0,
            hours_per_batch: 0.0,
            equipment_cost: 0.0,
        })
    }

    /// Sets the utility power draw and the operating hours per batch.
    ///
    /// # Errors
    ///
    /// Rejects negative or non-finite power or hours.
    pub fn with_utility(mut self, power_kw: f64, hours_per_batch: f64) -> EvalResult<Self> {
        if !power_kw.is_finite() || power_kw < 0.0 {
            return Err(EvalError::domain(
                "power_kw",
                format!("power draw must be finite and non-negative, got {power_kw}"),
            ));
        }
        if !hours_per_batch.is_finite() || hours_per_batch < 0.0 {
            return Err(EvalError::domain(
                "hours_per_batch",
                format!("operating hours must be finite and non-negative, got {hours_per_batch}"),
            ));
        }
        self.power_kw = power_kw;
        self.hours_per_batch = hours_per_batch;
        Ok(self)
    }

    /// Sets the equipment purchase cost.
    ///
    /// # Errors
    ///
    /// Rejects negative or non-finite costs.
    pub fn with_equipment_cost(mut self, cost: f64) -> EvalResult<Self> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(EvalError::domain(
                "equipment_cost",
                format!("equipment cost must be finite and non-negative, got {cost}"),
            ));
        }
        self.equipment_cost = cost;
        Ok(self)
    }

    /// Stage name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Component the yield fraction applies to.
    pub fn feed_component(&self) -> &str {
        &self.feed_component
    }

    /// Component the surviving mass leaves under.
    pub fn product_component(&self) -> &str {
        &self.product_component
    }

    /// Yield/recovery fraction in [0, 1].
    pub fn yield_fraction(&self) -> f64 {
        self.yield_fraction
    }

    /// Utility power draw [kW].
    pub fn power_kw(&self) -> f64 {
        self.power_kw
    }

    /// Operating hours per batch.
    pub fn hours_per_batch(&self) -> f64 {
        self.hours_per_batch
    }

    /// Equipment purchase cost [$].
    pub fn equipment_cost(&self) -> f64 {
        self.equipment_cost
    }

    /// Utility energy drawn per batch [kWh].
    pub fn energy_per_batch_kwh(&self) -> f64 {
        self.power_kw * self.hours_per_batch
    }
}

/// Mass audit record for one evaluated stage.
#[derive(Debug, Clone)]
pub struct StageRecord {
    /// Stage name
    pub stage: String,
    /// Tracked-component mass entering the stage
    pub input: Mass<PerBatch>,
    /// Tracked-component mass leaving the stage (= input x yield)
    pub output: Mass<PerBatch>,
    /// Mass routed to waste (= input - output, always >= 0)
    pub waste: Mass<PerBatch>,
    /// Utility energy drawn by the stage [kWh per batch]
    pub energy_kwh: f64,
}

/// Result of evaluating a stage chain against a feed stream.
#[derive(Debug, Clone)]
pub struct ChainReport {
    feed: Stream<PerBatch>,
    product: Stream<PerBatch>,
    records: Vec<StageRecord>,
    equipment_cost: f64,
}

impl ChainReport {
    /// The feed stream the chain was evaluated against.
    pub fn feed(&self) -> &Stream<PerBatch> {
        &self.feed
    }

    /// The final stream after all stages.
    pub fn product(&self) -> &Stream<PerBatch> {
        &self.product
    }

    /// Stage-by-stage mass audit, in evaluation order.
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Total mass routed to waste across all stages.
    pub fn total_waste(&self) -> Mass<PerBatch> {
        self.records.iter().fold(Mass::zero(), |acc, r| acc + r.waste)
    }

    /// Total utility energy drawn per batch [kWh].
    pub fn energy_per_batch_kwh(&self) -> f64 {
        self.records.iter().map(|r| r.energy_kwh).sum()
    }

    /// Annual utility energy [kWh/yr], via an explicit annualization factor.
    pub fn annual_energy_kwh(&self, batches_per_year: f64) -> EvalResult<f64> {
        if !batches_per_year.is_finite() || batches_per_year <= 0.0 {
            return Err(EvalError::domain(
                "batches_per_year",
                format!("must be finite and positive, got {batches_per_year}"),
            ));
        }
        Ok(self.energy_per_batch_kwh() * batches_per_year)
    }

    /// Sum of the stages' equipment purchase costs [$].
    pub fn equipment_cost(&self) -> f64 {
        self.equipment_cost
    }

    /// Annual production of one component, via an explicit annualization factor.
    pub fn annual_production(&self, component: &str, batches_per_year: f64) -> EvalResult<Mass<PerYear>> {
        self.product.component(component).annualized(batches_per_year)
    }
}

/// An ordered list of process stages evaluated in sequence.
///
/// Each stage applies its yield fraction to its tracked component and passes
/// every other component through unchanged. Applying stages S1..Sn to mass M
/// therefore yields M x product(yield_i) for a component tracked by all of
/// them.
#[derive(Debug, Clone)]
pub struct StageChain {
    stages: Vec<Stage>,
}

impl StageChain {
    /// Creates a chain from stages in evaluation order.
    pub fn new(stages: Vec<Stage>) -> Self {
        StageChain { stages }
    }

    /// The stages in evaluation order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Sum of the stages' equipment purchase costs [$].
    pub fn equipment_cost(&self) -> f64 {
        self.stages.iter().map(|s| s.equipment_cost).sum()
    }

    /// Evaluates the chain against a per-batch feed stream.
    ///
    /// # Errors
    ///
    /// Returns a domain error if the feed stream fails validation, or if a
    /// stage's feed component never appears in the stream. The latter means
    /// the feed does not match the route (e.g. a purified-substrate feed run
    /// through a biomass route); applying the stage's yield anyway would
    /// silently shrink an unrelated stream.
    pub fn evaluate(&self, feed: &Stream<PerBatch>) -> EvalResult<ChainReport> {
        feed.validate()?;

        let mut stream = feed.clone();
        let mut records = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            if !stream.has_component(&stage.feed_component) {
                return Err(EvalError::domain(
                    &stage.name,
                    format!(
                        "feed component `{}` is absent from the stream; the feed does not match this route",
                        stage.feed_component
                    ),
                ));
            }
            let input = stream.remove_component(&stage.feed_component);
            let output = input.scaled(stage.yield_fraction)?;
            let waste = input.checked_sub(output)?;

            // Conversion stages rename the surviving mass; recovery stages
            // put it back under the same component.
            let carried = stream.component(&stage.product_component) + output;
            stream.set_component(&stage.product_component, carried.kg())?;

            records.push(StageRecord {
                stage: stage.name.clone(),
                input,
                output,
                waste,
                energy_kwh: stage.energy_per_batch_kwh(),
            });
        }

        Ok(ChainReport {
            feed: feed.clone(),
            product: stream,
            records,
            equipment_cost: self.equipment_cost(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(kg: f64) -> Stream<PerBatch> {
        Stream::new().with_component("d-galactose", kg).unwrap()
    }

    #[test]
    fn yield_fraction_outside_unit_interval_is_rejected() {
        assert!(Stage::recovery("bad", "d-tagatose", 1.2).is_err());
        assert!(Stage::recovery("bad", "d-tagatose", -0.1).is_err());
        assert!(Stage::recovery("edge", "d-tagatose", 1.0).is_ok());
        assert!(Stage::recovery("edge", "d-tagatose", 0.0).is_ok());
    }

    #[test]
    fn single_conversion_matches_hand_calculation() {
        // 110 kg/batch at 98% conversion -> 107.8 kg/batch product
        let chain = StageChain::new(vec![Stage::conversion(
            "biocatalysis",
            "d-galactose",
            "d-tagatose",
            0.98,
        )
        .unwrap()]);
        let report = chain.evaluate(&feed(110.0)).unwrap();

        let product = report.product().component("d-tagatose");
        assert!((product.kg() - 107.8).abs() < 1e-9);
        assert!((report.total_waste().kg() - 2.2).abs() < 1e-9);

        // At 312.5 batches/year -> 33,687.5 kg/year, not a per-hour figure
        let annual = report.annual_production("d-tagatose", 312.5).unwrap();
        assert!((annual.kg() - 33_687.5).abs() < 1e-6);
    }

    #[test]
    fn no_mass_creation_and_waste_is_non_negative() {
        let chain = StageChain::new(vec![
            Stage::conversion("biocatalysis", "d-galactose", "d-tagatose", 0.98).unwrap(),
            Stage::recovery("decolorization", "d-tagatose", 0.96).unwrap(),
            Stage::recovery("desalting", "d-tagatose", 0.94).unwrap(),
            Stage::recovery("dryer", "d-tagatose", 0.95).unwrap(),
        ]);
        let report = chain.evaluate(&feed(110.0)).unwrap();

        for record in report.records() {
            assert!(record.output.kg() <= record.input.kg());
            assert!(record.waste.kg() >= 0.0);
            assert!((record.waste.kg() - (record.input.kg() - record.output.kg())).abs() < 1e-12);
        }
        // feed mass = product + total waste
        let recovered = report.product().total() + report.total_waste();
        assert!((recovered.kg() - 110.0).abs() < 1e-9);
    }

    #[test]
    fn chaining_is_the_product_of_yields() {
        let yields = [0.98, 0.96, 0.94, 0.95];
        let stages = vec![
            Stage::conversion("biocatalysis", "d-galactose", "d-tagatose", yields[0]).unwrap(),
            Stage::recovery("decolorization", "d-tagatose", yields[1]).unwrap(),
            Stage::recovery("desalting", "d-tagatose", yields[2]).unwrap(),
            Stage::recovery("dryer", "d-tagatose", yields[3]).unwrap(),
        ];
        let report = StageChain::new(stages).evaluate(&feed(110.0)).unwrap();

        let expected = 110.0 * yields.iter().product::<f64>();
        assert!((report.product().component("d-tagatose").kg() - expected).abs() < 1e-9);
    }

    #[test]
    fn independent_recovery_stages_commute() {
        let a = Stage::recovery("decolorization", "d-tagatose", 0.96).unwrap();
        let b = Stage::recovery("desalting", "d-tagatose", 0.94).unwrap();
        let feed = Stream::new().with_component("d-tagatose", 107.8).unwrap();

        let forward = StageChain::new(vec![a.clone(), b.clone()]).evaluate(&feed).unwrap();
        let reversed = StageChain::new(vec![b, a]).evaluate(&feed).unwrap();

        let f = forward.product().component("d-tagatose").kg();
        let r = reversed.product().component("d-tagatose").kg();
        assert!((f - r).abs() < 1e-9);
    }

    #[test]
    fn untracked_components_pass_through_unchanged() {
        let chain = StageChain::new(vec![Stage::conversion(
            "biocatalysis",
            "d-galactose",
            "d-tagatose",
            0.98,
        )
        .unwrap()]);
        let feed = Stream::new()
            .with_component("d-galactose", 110.0)
            .unwrap()
            .with_component("water", 400.0)
            .unwrap();
        let report = chain.evaluate(&feed).unwrap();

        assert_eq!(report.product().component("water").kg(), 400.0);
    }

    #[test]
    fn energy_rolls_up_per_batch_then_annualizes_explicitly() {
        let chain = StageChain::new(vec![
            Stage::conversion("biocatalysis", "d-galactose", "d-tagatose", 0.98)
                .unwrap()
                .with_utility(5.0, 24.0)
                .unwrap(),
            Stage::recovery("cell separator", "d-tagatose", 1.0)
                .unwrap()
                .with_utility(3.0, 2.0)
                .unwrap(),
        ]);
        let report = chain.evaluate(&feed(110.0)).unwrap();

        assert_eq!(report.energy_per_batch_kwh(), 5.0 * 24.0 + 3.0 * 2.0);
        assert_eq!(report.annual_energy_kwh(312.5).unwrap(), 126.0 * 312.5);
        assert!(report.annual_energy_kwh(0.0).is_err());
    }

    #[test]
    fn equipment_cost_sums_over_stages() {
        let chain = StageChain::new(vec![
            Stage::conversion("biocatalysis", "d-galactose", "d-tagatose", 0.98)
                .unwrap()
                .with_equipment_cost(225_000.0)
                .unwrap(),
            Stage::recovery("cell separator", "d-tagatose", 1.0)
                .unwrap()
                .with_equipment_cost(25_000.0)
                .unwrap(),
        ]);
        assert_eq!(chain.equipment_cost(), 250_000.0);
    }

    #[test]
    fn negative_utility_and_equipment_constants_are_domain_errors() {
        let stage = Stage::recovery("dryer", "d-tagatose", 0.95).unwrap();
        assert!(matches!(
            stage.clone().with_utility(-6.0, 3.0),
            Err(EvalError::Domain { .. })
        ));
        assert!(matches!(
            stage.clone().with_utility(6.0, -3.0),
            Err(EvalError::Domain { .. })
        ));
        assert!(matches!(
            stage.with_equipment_cost(-40_000.0),
            Err(EvalError::Domain { .. })
        ));
    }

    #[test]
    fn feed_that_does_not_match_the_route_is_rejected() {
        // A biomass-route chain fed purified galactose: the hydrolysis feed
        // component is absent, which must fail instead of silently applying
        // downstream recoveries to the wrong stream.
        let chain = StageChain::new(vec![
            Stage::conversion("acid hydrolysis", "red-algae-biomass", "d-galactose", 0.85)
                .unwrap(),
            Stage::recovery("neutralization", "d-galactose", 0.92).unwrap(),
        ]);
        let err = chain.evaluate(&feed(110.0)).unwrap_err();
        match err {
            EvalError::Domain { field, reason } => {
                assert_eq!(field, "acid hydrolysis");
                assert!(reason.contains("red-algae-biomass"));
            }
            other => panic!("expected Domain error, got {other:?}"),
        }
    }
}
