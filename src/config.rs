//! Flat plant configuration: named numeric constants for one feasibility run.
//!
//! The configuration is a flat object of enumerated numeric fields, loadable
//! from a TOML file. Every field is required; a missing constant is a
//! configuration error naming the field, and a feed declared on the wrong
//! time basis is a unit-basis error caught here, before any evaluation.
//!
//! Defaults correspond to the latest revision of the D-Tagatose study
//! (1000 L reactor, 110 g/L galactose, 24 h batch, 7500 production hours a
//! year). Earlier revisions published different cofactor and biocatalyst
//! prices; the superseded figures are kept in [`PROVENANCE_NOTES`] and
//! surfaced as report footnotes rather than silently dropped.
//!
//! # Example
//!
//! ```
//! use tagatea::config::PlantConfig;
//! use tagatea::stages::library;
//!
//! let config = PlantConfig::default();
//! assert_eq!(config.batches_per_year()?, 312.5);
//!
//! let econ = config.economics(&library::route_a())?;
//! assert!(econ.breakeven_price()? > 0.0);
//! # Ok::<(), tagatea::EvalError>(())
//! ```

use crate::economics::{CapexSchedule, Economics, OpexLineItem};
use crate::stages::{library, StageChain};
use crate::{BasisTag, EvalError, EvalResult, PerBatch, Stream};
use serde::Deserialize;
use std::path::Path;

/// Flat configuration of named numeric constants for one plant.
#[derive(Debug, Clone, Deserialize)]
pub struct PlantConfig {
    /// Reactor working volume [L]
    pub reactor_volume_l: f64,
    /// Substrate titer [g/L]
    pub titer_g_per_l: f64,
    /// Batch duration, fill to drain [hr]
    pub batch_hours: f64,
    /// Annual production hours (85% uptime in the study) [hr/yr]
    pub production_hours_per_year: f64,
    /// Declared basis of the feed quantities; the pipeline requires per_batch
    pub feed_basis: BasisTag,

    /// D-Galactose price [$/kg]
    pub galactose_price_per_kg: f64,
    /// Dried red algae biomass charged per batch, Route B feed [kg]
    pub algae_kg_per_batch: f64,
    /// Dried red algae biomass price [$/kg]
    pub algae_price_per_kg: f64,
    /// H2SO4 and heating for acid hydrolysis, per kg algae [$/kg]
    pub hydrolysis_chemicals_per_kg_algae: f64,
    /// NaOH and filter media for neutralization, per kg algae [$/kg]
    pub neutralization_chemicals_per_kg_algae: f64,
    /// Sodium formate charged per batch [kg]
    pub formate_kg_per_batch: f64,
    /// Sodium formate price [$/kg]
    pub formate_price_per_kg: f64,
    /// E. coli biocatalyst charged per batch [kg DCW]
    pub cells_kg_per_batch: f64,
    /// E. coli biocatalyst price [$/kg DCW]
    pub cells_price_per_kg_dcw: f64,
    /// NAD+ makeup per batch, after 80% in-process recovery [mol]
    pub nad_makeup_mol_per_batch: f64,
    /// NAD+ price [$/mol]
    pub nad_price_per_mol: f64,
    /// NADP+ charged per batch [mol]
    pub nadp_mol_per_batch: f64,
    /// NADP+ price [$/mol]
    pub nadp_price_per_mol: f64,
    /// Process water per batch [L]
    pub water_l_per_batch: f64,
    /// Water price [$/L]
    pub water_price_per_l: f64,

    /// Operating staff [full-time equivalents]
    pub labor_ftes: f64,
    /// Working hours per FTE per year
    pub labor_hours_per_fte: f64,
    /// Labor rate [$/hr]
    pub labor_rate_per_hour: f64,
    /// Maintenance as a fraction of total CAPEX per year
    pub maintenance_factor: f64,
    /// Insurance, licensing, G&A as a fraction of total CAPEX per year
    pub miscellaneous_factor: f64,
    /// Electricity price [$/kWh]
    pub electricity_price_per_kwh: f64,

    /// CAPEX amortization horizon [yr]
    pub amortization_years: f64,
    /// Project life for NPV [yr]
    pub project_life_years: u32,
    /// Discount rate for NPV (fraction, e.g. 0.10)
    pub discount_rate: f64,
    /// Base D-Tagatose market price [$/kg]
    pub tagatose_price_per_kg: f64,
}

impl Default for PlantConfig {
    /// The latest study revision: 110 g/L, 24 h batch, Tufvesson cofactor prices.
    fn default() -> Self {
        PlantConfig {
            reactor_volume_l: 1000.0,
            titer_g_per_l: 110.0,
            batch_hours: 24.0,
            production_hours_per_year: 7500.0,
            feed_basis: BasisTag::PerBatch,

            galactose_price_per_kg: 2.00,
            algae_kg_per_batch: 141.0,
            algae_price_per_kg: 0.75,
            hydrolysis_chemicals_per_kg_algae: 0.40,
            neutralization_chemicals_per_kg_algae: 0.25,
            formate_kg_per_batch: 44.0,
            formate_price_per_kg: 0.25,
            cells_kg_per_batch: 20.0,
            cells_price_per_kg_dcw: 50.0,
            nad_makeup_mol_per_batch: 0.2,
            nad_price_per_mol: 710.0,
            nadp_mol_per_batch: 0.1,
            nadp_price_per_mol: 5000.0,
            water_l_per_batch: 400.0,
            water_price_per_l: 0.002,

            labor_ftes: 2.0,
            labor_hours_per_fte: 2080.0,
            labor_rate_per_hour: 50.0,
            maintenance_factor: 0.04,
            miscellaneous_factor: 0.02,
            electricity_price_per_kwh: 0.12,

            amortization_years: 20.0,
            project_life_years: 20,
            discount_rate: 0.10,
            tagatose_price_per_kg: 10.0,
        }
    }
}

impl PlantConfig {
    /// Parses a configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// A missing or malformed field is a configuration error; validation
    /// errors follow the same taxonomy as [`PlantConfig::validate`].
    pub fn from_toml_str(text: &str) -> EvalResult<Self> {
        let config: PlantConfig = toml::from_str(text).map_err(|err| {
            let message = err.message().to_string();
            // serde names the constant in backticks ("missing field `x`");
            // lift it into the error's field slot.
            let field = message.split('`').nth(1).unwrap_or("plant_config");
            EvalError::config(field, message.clone())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> EvalResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| EvalError::config("plant_config", err.to_string()))?;
        Self::from_toml_str(&text)
    }

    /// Checks every constant: finite, non-negative, positive where a zero
    /// would poison a division, and the feed basis the pipeline expects.
    pub fn validate(&self) -> EvalResult<()> {
        let non_negative = [
            ("galactose_price_per_kg", self.galactose_price_per_kg),
            ("algae_kg_per_batch", self.algae_kg_per_batch),
            ("algae_price_per_kg", self.algae_price_per_kg),
            (
                "hydrolysis_chemicals_per_kg_algae",
                self.hydrolysis_chemicals_per_kg_algae,
            ),
            (
                "neutralization_chemicals_per_kg_algae",
                self.neutralization_chemicals_per_kg_algae,
            ),
            ("formate_kg_per_batch", self.formate_kg_per_batch),
            ("formate_price_per_kg", self.formate_price_per_kg),
            ("cells_kg_per_batch", self.cells_kg_per_batch),
            ("cells_price_per_kg_dcw", self.cells_price_per_kg_dcw),
            ("nad_makeup_mol_per_batch", self.nad_makeup_mol_per_batch),
            ("nad_price_per_mol", self.nad_price_per_mol),
            ("nadp_mol_per_batch", self.nadp_mol_per_batch),
            ("nadp_price_per_mol", self.nadp_price_per_mol),
            ("water_l_per_batch", self.water_l_per_batch),
            ("water_price_per_l", self.water_price_per_l),
            ("labor_ftes", self.labor_ftes),
            ("labor_hours_per_fte", self.labor_hours_per_fte),
            ("labor_rate_per_hour", self.labor_rate_per_hour),
            ("maintenance_factor", self.maintenance_factor),
            ("miscellaneous_factor", self.miscellaneous_factor),
            ("electricity_price_per_kwh", self.electricity_price_per_kwh),
            ("discount_rate", self.discount_rate),
            ("tagatose_price_per_kg", self.tagatose_price_per_kg),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(EvalError::config(
                    field,
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }

        let positive = [
            ("reactor_volume_l", self.reactor_volume_l),
            ("titer_g_per_l", self.titer_g_per_l),
            ("batch_hours", self.batch_hours),
            ("production_hours_per_year", self.production_hours_per_year),
            ("amortization_years", self.amortization_years),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(EvalError::config(
                    field,
                    format!("must be finite and positive, got {value}"),
                ));
            }
        }

        self.feed_basis.expect(BasisTag::PerBatch, "feed_basis")?;
        Ok(())
    }

    /// Batches per year: annual production hours over batch hours.
    ///
    /// This quotient is the single source of every annualization factor in a
    /// run; nothing else may convert batch data to annual data.
    pub fn batches_per_year(&self) -> EvalResult<f64> {
        self.validate()?;
        Ok(self.production_hours_per_year / self.batch_hours)
    }

    /// Galactose charged per batch [kg]: volume x titer.
    pub fn galactose_kg_per_batch(&self) -> f64 {
        self.reactor_volume_l * self.titer_g_per_l / 1000.0
    }

    /// Builds the per-batch purified-galactose feed stream (Route A).
    pub fn feed_stream(&self) -> EvalResult<Stream<PerBatch>> {
        self.validate()?;
        Stream::<PerBatch>::new()
            .with_component(library::GALACTOSE, self.galactose_kg_per_batch())
            .map(|s| s.with_unit_price(self.galactose_price_per_kg))
    }

    /// Builds the per-batch algae biomass feed stream (Route B).
    pub fn algae_feed_stream(&self) -> EvalResult<Stream<PerBatch>> {
        self.validate()?;
        Stream::<PerBatch>::new()
            .with_component(library::ALGAE_BIOMASS, self.algae_kg_per_batch)
            .map(|s| s.with_unit_price(self.algae_price_per_kg))
    }

    /// Picks the feed stream matching a chain's first stage.
    ///
    /// # Errors
    ///
    /// An empty chain, or a first stage feeding on a component no configured
    /// feed provides, is a configuration error. This is what keeps a biomass
    /// route from being silently evaluated against a purified-substrate feed.
    pub fn feed_stream_for(&self, chain: &StageChain) -> EvalResult<Stream<PerBatch>> {
        let first = chain
            .stages()
            .first()
            .ok_or_else(|| EvalError::config("stages", "the chain has no stages"))?;
        match first.feed_component() {
            library::GALACTOSE => self.feed_stream(),
            library::ALGAE_BIOMASS => self.algae_feed_stream(),
            other => Err(EvalError::config(
                "feed",
                format!("no configured feed provides component `{other}`"),
            )),
        }
    }

    /// Evaluates a stage chain against this configuration and rolls the
    /// result up into an [`Economics`] aggregator.
    ///
    /// OPEX line items follow the study's breakdown: raw materials (chosen by
    /// the chain's feed), labor, maintenance and miscellaneous (both on total
    /// CAPEX), electricity from the chain's energy roll-up, and water.
    pub fn economics(&self, chain: &StageChain) -> EvalResult<Economics> {
        let batches = self.batches_per_year()?;
        let feed = self.feed_stream_for(chain)?;
        let report = chain.evaluate(&feed)?;
        let production = report.annual_production(library::TAGATOSE, batches)?;

        let capex = CapexSchedule::new(chain.equipment_cost(), self.amortization_years)?;

        // The feed's raw-material lines: purchased galactose on Route A,
        // algae biomass plus its upstream chemicals on Route B.
        let mut opex = Vec::new();
        if feed.has_component(library::ALGAE_BIOMASS) {
            let algae = self.algae_kg_per_batch * self.algae_price_per_kg * batches;
            let hydrolysis =
                self.algae_kg_per_batch * self.hydrolysis_chemicals_per_kg_algae * batches;
            let neutralization =
                self.algae_kg_per_batch * self.neutralization_chemicals_per_kg_algae * batches;
            opex.push(OpexLineItem::new("Red Algae Biomass", algae)?);
            opex.push(OpexLineItem::new("Hydrolysis Chemicals", hydrolysis)?);
            opex.push(OpexLineItem::new("Neutralization Chemicals", neutralization)?);
        } else {
            let galactose =
                self.galactose_kg_per_batch() * self.galactose_price_per_kg * batches;
            opex.push(OpexLineItem::new("D-Galactose", galactose)?);
        }

        let formate = self.formate_kg_per_batch * self.formate_price_per_kg * batches;
        let cells = self.cells_kg_per_batch * self.cells_price_per_kg_dcw * batches;
        let nad = self.nad_makeup_mol_per_batch * self.nad_price_per_mol * batches;
        let nadp = self.nadp_mol_per_batch * self.nadp_price_per_mol * batches;
        let water = self.water_l_per_batch * self.water_price_per_l * batches;
        let labor = self.labor_ftes * self.labor_hours_per_fte * self.labor_rate_per_hour;
        let maintenance = capex.total() * self.maintenance_factor;
        let miscellaneous = capex.total() * self.miscellaneous_factor;
        let electricity = report.annual_energy_kwh(batches)? * self.electricity_price_per_kwh;

        opex.extend([
            OpexLineItem::new("Sodium Formate", formate)?,
            OpexLineItem::new("E. coli Whole Cell (DCW)", cells)?,
            OpexLineItem::new("NAD+ Cofactor (with recovery)", nad)?,
            OpexLineItem::new("NADP+ Cofactor", nadp)?,
            OpexLineItem::new("Labor", labor)?,
            OpexLineItem::new("Maintenance", maintenance)?,
            OpexLineItem::new("Miscellaneous", miscellaneous)?,
            OpexLineItem::new("Electricity", electricity)?,
            OpexLineItem::new("Water", water)?,
        ]);

        Economics::new(production, opex, capex)
    }
}

/// A constant whose published value changed between study revisions.
#[derive(Debug, Clone, Copy)]
pub struct ProvenanceNote {
    /// Configuration field the note concerns
    pub field: &'static str,
    /// Adopted (latest revision) value
    pub adopted: f64,
    /// Superseded value from an earlier revision
    pub superseded: f64,
    /// Source of the adopted value
    pub source: &'static str,
}

/// Constants the study revisions disagree on. The latest-dated revision is
/// authoritative; these notes keep the discrepancy visible in reports.
pub const PROVENANCE_NOTES: &[ProvenanceNote] = &[
    ProvenanceNote {
        field: "nad_price_per_mol",
        adopted: 710.0,
        superseded: 150.0,
        source: "revised analysis, Tufvesson 2011",
    },
    ProvenanceNote {
        field: "nadp_price_per_mol",
        adopted: 5000.0,
        superseded: 200.0,
        source: "revised analysis, Tufvesson 2011",
    },
    ProvenanceNote {
        field: "cells_price_per_kg_dcw",
        adopted: 50.0,
        superseded: 25.0,
        source: "revised analysis estimate",
    },
];
