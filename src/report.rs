//! Plain-text tabular reports for a feasibility run.
//!
//! Two tables: a scenario comparison (one row per market scenario) and an
//! OPEX Pareto breakdown (cost drivers ranked by annual spend). Both render
//! through `Display`; the underlying rows stay available as serializable
//! structs for callers that want machine-readable output instead.
//!
//! # Example
//!
//! ```
//! use tagatea::config::PlantConfig;
//! use tagatea::report::FeasibilityReport;
//! use tagatea::stages::library;
//!
//! let config = PlantConfig::default();
//! let report = FeasibilityReport::from_config(&config, &library::route_a())?;
//! let text = report.to_string();
//! assert!(text.contains("Crystal-Only"));
//! assert!(text.contains("Breakeven"));
//! # Ok::<(), tagatea::EvalError>(())
//! ```

use crate::config::{PlantConfig, PROVENANCE_NOTES};
use crate::economics::{Economics, EconomicScenario, ParetoEntry, ScenarioMetrics};
use crate::stages::{library, StageChain};
use crate::EvalResult;
use serde::Serialize;
use std::fmt;

/// Scenario comparison table: one row per market scenario.
#[derive(Debug, Clone)]
pub struct ScenarioTable {
    rows: Vec<ScenarioMetrics>,
}

impl ScenarioTable {
    /// Evaluates the study's three product scenarios at a base market price.
    pub fn standard(econ: &Economics, base_price: f64) -> EvalResult<Self> {
        let scenarios = [
            EconomicScenario::crystal_only(base_price),
            EconomicScenario::syrup_only(base_price),
            EconomicScenario::mixed_50_50(base_price),
        ];
        Self::evaluate(econ, &scenarios)
    }

    /// Evaluates an arbitrary scenario list against one plant's economics.
    pub fn evaluate(econ: &Economics, scenarios: &[EconomicScenario]) -> EvalResult<Self> {
        let rows = scenarios
            .iter()
            .map(|s| s.evaluate(econ))
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(ScenarioTable { rows })
    }

    pub fn rows(&self) -> &[ScenarioMetrics] {
        &self.rows
    }
}

impl fmt::Display for ScenarioTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<14} {:>9} {:>13} {:>13} {:>11} {:>13} {:>8} {:>11}",
            "Scenario",
            "$/kg",
            "Revenue $/yr",
            "OPEX $/yr",
            "Amort $/yr",
            "Profit $/yr",
            "ROI %",
            "Breakeven"
        )?;
        writeln!(f, "{}", "-".repeat(98))?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<14} {:>9.2} {:>13.0} {:>13.0} {:>11.0} {:>13.0} {:>8.1} {:>11.2}",
                row.name,
                row.price_per_kg,
                row.annual_revenue,
                row.annual_opex,
                row.capex_amortization,
                row.annual_profit,
                row.roi_pct,
                row.breakeven_price,
            )?;
        }
        Ok(())
    }
}

/// OPEX Pareto table: cost drivers ranked by annual spend.
#[derive(Debug, Clone)]
pub struct ParetoTable {
    entries: Vec<ParetoEntry>,
}

impl ParetoTable {
    pub fn new(econ: &Economics) -> Self {
        ParetoTable { entries: econ.pareto() }
    }

    pub fn entries(&self) -> &[ParetoEntry] {
        &self.entries
    }
}

impl fmt::Display for ParetoTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<5} {:<32} {:>13} {:>8} {:>8}",
            "Rank", "Cost Item", "$/yr", "%", "Cum %"
        )?;
        writeln!(f, "{}", "-".repeat(70))?;
        for entry in &self.entries {
            writeln!(
                f,
                "{:<5} {:<32} {:>13.0} {:>8.1} {:>8.1}",
                entry.rank, entry.name, entry.annual_cost, entry.share_pct, entry.cumulative_pct,
            )?;
        }
        Ok(())
    }
}

/// One row of the route comparison table.
#[derive(Debug, Clone, Serialize)]
pub struct RouteRow {
    pub route: String,
    pub annual_production_kg: f64,
    pub equipment_cost: f64,
    pub annual_opex: f64,
    pub breakeven_price: f64,
    /// Profit at the configuration's base market price [$/yr]
    pub annual_profit: f64,
}

/// Route A vs Route B side by side, both evaluated from one configuration at
/// its base market price.
#[derive(Debug, Clone)]
pub struct RouteComparison {
    rows: Vec<RouteRow>,
}

impl RouteComparison {
    pub fn from_config(config: &PlantConfig) -> EvalResult<Self> {
        let mut rows = Vec::new();
        for (route, chain) in [
            ("Route A: Purified D-Galactose", library::route_a()),
            ("Route B: Red Algae Biomass", library::route_b()),
        ] {
            let econ = config.economics(&chain)?;
            rows.push(RouteRow {
                route: route.to_string(),
                annual_production_kg: econ.production().kg(),
                equipment_cost: chain.equipment_cost(),
                annual_opex: econ.annual_opex(),
                breakeven_price: econ.breakeven_price()?,
                annual_profit: econ.profit(config.tagatose_price_per_kg)?,
            });
        }
        Ok(RouteComparison { rows })
    }

    pub fn rows(&self) -> &[RouteRow] {
        &self.rows
    }
}

impl fmt::Display for RouteComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<30} {:>12} {:>12} {:>13} {:>11} {:>13}",
            "Route", "kg/yr", "Equip $", "OPEX $/yr", "Breakeven", "Profit $/yr"
        )?;
        writeln!(f, "{}", "-".repeat(96))?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<30} {:>12.1} {:>12.0} {:>13.0} {:>11.2} {:>13.0}",
                row.route,
                row.annual_production_kg,
                row.equipment_cost,
                row.annual_opex,
                row.breakeven_price,
                row.annual_profit,
            )?;
        }
        Ok(())
    }
}

/// Footnotes for constants whose published values changed between study
/// revisions. Empty string when nothing is contested.
pub fn provenance_footnotes() -> String {
    let mut out = String::new();
    for (i, note) in PROVENANCE_NOTES.iter().enumerate() {
        out.push_str(&format!(
            "[{}] {}: adopted {:.0}, supersedes {:.0} ({})\n",
            i + 1,
            note.field,
            note.adopted,
            note.superseded,
            note.source,
        ));
    }
    out
}

/// The full feasibility report: scenario comparison, OPEX Pareto and
/// provenance footnotes, assembled from one configuration and one route.
#[derive(Debug, Clone)]
pub struct FeasibilityReport {
    scenarios: ScenarioTable,
    pareto: ParetoTable,
    breakeven_price: f64,
    annual_production_kg: f64,
}

impl FeasibilityReport {
    pub fn from_config(config: &PlantConfig, chain: &StageChain) -> EvalResult<Self> {
        let econ = config.economics(chain)?;
        Ok(FeasibilityReport {
            scenarios: ScenarioTable::standard(&econ, config.tagatose_price_per_kg)?,
            pareto: ParetoTable::new(&econ),
            breakeven_price: econ.breakeven_price()?,
            annual_production_kg: econ.production().kg(),
        })
    }

    pub fn scenarios(&self) -> &ScenarioTable {
        &self.scenarios
    }

    pub fn pareto(&self) -> &ParetoTable {
        &self.pareto
    }

    pub fn breakeven_price(&self) -> f64 {
        self.breakeven_price
    }
}

impl fmt::Display for FeasibilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "D-Tagatose Feasibility Summary")?;
        writeln!(f, "Annual production: {:.1} kg/yr", self.annual_production_kg)?;
        writeln!(f, "Breakeven price:   {:.2} $/kg", self.breakeven_price)?;
        writeln!(f)?;
        writeln!(f, "Market Scenarios")?;
        write!(f, "{}", self.scenarios)?;
        writeln!(f)?;
        writeln!(f, "OPEX Breakdown (Pareto)")?;
        write!(f, "{}", self.pareto)?;
        let footnotes = provenance_footnotes();
        if !footnotes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Data Provenance")?;
            write!(f, "{footnotes}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlantConfig;
    use crate::stages::library;

    fn study_report() -> FeasibilityReport {
        FeasibilityReport::from_config(&PlantConfig::default(), &library::route_a()).unwrap()
    }

    #[test]
    fn scenario_rows_cover_the_three_product_mixes() {
        let report = study_report();
        let names: Vec<&str> =
            report.scenarios().rows().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Crystal-Only", "Syrup-Only", "Mixed 50/50"]);
    }

    #[test]
    fn crystal_premium_orders_the_scenarios_by_profit() {
        let report = study_report();
        let rows = report.scenarios().rows();
        assert!(rows[0].annual_profit > rows[2].annual_profit);
        assert!(rows[2].annual_profit > rows[1].annual_profit);
    }

    #[test]
    fn pareto_is_ranked_and_sums_to_one_hundred() {
        let report = study_report();
        let entries = report.pareto().entries();
        assert!(!entries.is_empty());
        for pair in entries.windows(2) {
            assert!(pair[0].annual_cost >= pair[1].annual_cost);
            assert!(pair[1].cumulative_pct >= pair[0].cumulative_pct);
        }
        let last = entries.last().unwrap();
        assert!((last.cumulative_pct - 100.0).abs() < 1e-6);
    }

    #[test]
    fn biocatalyst_and_labor_lead_the_pareto() {
        // At the revised prices the cells ($312,500/yr) and labor
        // ($208,000/yr) outrank every other item; NADP+ ($156,250/yr) is the
        // largest cofactor cost at rank three.
        let report = study_report();
        let entries = report.pareto().entries();
        assert_eq!(entries[0].name, "E. coli Whole Cell (DCW)");
        assert_eq!(entries[1].name, "Labor");
        assert_eq!(entries[2].name, "NADP+ Cofactor");
    }

    #[test]
    fn purified_feed_route_wins_at_study_prices() {
        let comparison = RouteComparison::from_config(&PlantConfig::default()).unwrap();
        let rows = comparison.rows();
        assert_eq!(rows.len(), 2);
        // More product through the same downstream train, less capital,
        // lower breakeven
        assert!(rows[0].annual_production_kg > rows[1].annual_production_kg);
        assert!(rows[0].equipment_cost < rows[1].equipment_cost);
        assert!(rows[0].breakeven_price < rows[1].breakeven_price);
    }

    #[test]
    fn route_comparison_renders_both_routes() {
        let text = RouteComparison::from_config(&PlantConfig::default()).unwrap().to_string();
        assert!(text.contains("Route A"));
        assert!(text.contains("Route B"));
    }

    #[test]
    fn display_renders_every_section() {
        let text = study_report().to_string();
        assert!(text.contains("Market Scenarios"));
        assert!(text.contains("OPEX Breakdown"));
        assert!(text.contains("Data Provenance"));
        assert!(text.contains("nad_price_per_mol"));
    }

    #[test]
    fn footnotes_carry_the_superseded_prices() {
        let notes = provenance_footnotes();
        assert!(notes.contains("supersedes 150"));
        assert!(notes.contains("supersedes 200"));
        assert!(notes.contains("supersedes 25"));
    }
}
