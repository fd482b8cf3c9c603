//! Economics aggregator: OPEX roll-up, CAPEX amortization, breakeven price,
//! profit, ROI and the study's profitability supplements (payback, NPV,
//! Pareto cost-driver ranking).
//!
//! All divisions are guarded: zero or negative annual production is a domain
//! error, never a silent infinity or NaN.
//!
//! # Example
//!
//! ```
//! use tagatea::economics::{CapexSchedule, Economics, OpexLineItem};
//! use tagatea::{Mass, PerYear};
//!
//! let econ = Economics::new(
//!     Mass::<PerYear>::new(34_375.0)?,
//!     vec![OpexLineItem::new("labor", 208_000.0)?],
//!     CapexSchedule::new(390_000.0, 20.0)?,
//! )?;
//!
//! // profit(breakeven) is exactly zero by construction
//! let breakeven = econ.breakeven_price()?;
//! assert_eq!(econ.profit(breakeven)?, 0.0);
//! # Ok::<(), tagatea::EvalError>(())
//! ```

use crate::{EvalError, EvalResult, Mass, PerYear};
use serde::Serialize;

/// One annual operating-expense line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpexLineItem {
    /// Line item name (e.g. "D-Galactose", "Labor", "Maintenance")
    pub name: String,
    /// Annual cost [$/yr]
    pub annual_cost: f64,
}

impl OpexLineItem {
    /// Creates a line item, rejecting negative or non-finite costs.
    pub fn new(name: &str, annual_cost: f64) -> EvalResult<Self> {
        if !annual_cost.is_finite() || annual_cost < 0.0 {
            return Err(EvalError::domain(
                name,
                format!("annual cost must be finite and non-negative, got {annual_cost}"),
            ));
        }
        Ok(OpexLineItem { name: name.to_string(), annual_cost })
    }
}

/// Capital expenditure with the study's indirect-cost structure and an
/// amortization horizon.
///
/// Total CAPEX = equipment x (1 + indirect factor + working-capital factor).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapexSchedule {
    /// Equipment purchase subtotal [$]
    pub equipment_cost: f64,
    /// Installation, engineering and contingency as a fraction of equipment
    pub indirect_factor: f64,
    /// Working capital as a fraction of equipment
    pub working_capital_factor: f64,
    /// Amortization horizon [yr]
    pub amortization_years: f64,
}

impl CapexSchedule {
    /// Study defaults: 40% indirect, 15% working capital.
    const INDIRECT_FACTOR: f64 = 0.40;
    const WORKING_CAPITAL_FACTOR: f64 = 0.15;

    /// Creates a schedule with the study's default indirect factors.
    ///
    /// # Errors
    ///
    /// Rejects negative equipment cost and non-positive horizons.
    pub fn new(equipment_cost: f64, amortization_years: f64) -> EvalResult<Self> {
        Self::with_factors(
            equipment_cost,
            Self::INDIRECT_FACTOR,
            Self::WORKING_CAPITAL_FACTOR,
            amortization_years,
        )
    }

    /// Creates a schedule with explicit indirect factors.
    pub fn with_factors(
        equipment_cost: f64,
        indirect_factor: f64,
        working_capital_factor: f64,
        amortization_years: f64,
    ) -> EvalResult<Self> {
        if !equipment_cost.is_finite() || equipment_cost < 0.0 {
            return Err(EvalError::domain(
                "equipment_cost",
                format!("must be finite and non-negative, got {equipment_cost}"),
            ));
        }
        for (field, value) in
            [("indirect_factor", indirect_factor), ("working_capital_factor", working_capital_factor)]
        {
            if !value.is_finite() || value < 0.0 {
                return Err(EvalError::domain(
                    field,
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }
        if !amortization_years.is_finite() || amortization_years <= 0.0 {
            return Err(EvalError::domain(
                "amortization_years",
                format!("must be finite and positive, got {amortization_years}"),
            ));
        }
        Ok(CapexSchedule { equipment_cost, indirect_factor, working_capital_factor, amortization_years })
    }

    /// Total capital expenditure [$].
    pub fn total(&self) -> f64 {
        self.equipment_cost * (1.0 + self.indirect_factor + self.working_capital_factor)
    }

    /// Annual amortization charge [$/yr].
    pub fn annual_amortization(&self) -> f64 {
        self.total() / self.amortization_years
    }
}

/// One entry of the OPEX Pareto ranking.
#[derive(Debug, Clone, Serialize)]
pub struct ParetoEntry {
    pub rank: usize,
    pub name: String,
    pub annual_cost: f64,
    /// Share of total OPEX [%]
    pub share_pct: f64,
    /// Running share including this entry [%]
    pub cumulative_pct: f64,
}

/// The economics of one plant configuration: annual production, OPEX line
/// items and a CAPEX schedule.
#[derive(Debug, Clone)]
pub struct Economics {
    production: Mass<PerYear>,
    opex: Vec<OpexLineItem>,
    capex: CapexSchedule,
}

impl Economics {
    /// Creates the aggregator.
    ///
    /// # Errors
    ///
    /// Zero or negative annual production is rejected here, so every later
    /// division is safe.
    pub fn new(
        production: Mass<PerYear>,
        opex: Vec<OpexLineItem>,
        capex: CapexSchedule,
    ) -> EvalResult<Self> {
        if production.kg() <= 0.0 {
            return Err(EvalError::domain(
                "annual_production",
                format!("must be positive to evaluate economics, got {} kg/yr", production.kg()),
            ));
        }
        Ok(Economics { production, opex, capex })
    }

    /// Annual production [kg/yr], typed.
    pub fn production(&self) -> Mass<PerYear> {
        self.production
    }

    /// OPEX line items.
    pub fn opex_items(&self) -> &[OpexLineItem] {
        &self.opex
    }

    /// CAPEX schedule.
    pub fn capex(&self) -> &CapexSchedule {
        &self.capex
    }

    /// Sum of all OPEX line items [$/yr].
    pub fn annual_opex(&self) -> f64 {
        self.opex.iter().map(|item| item.annual_cost).sum()
    }

    /// Total annualized cost = OPEX + CAPEX amortization [$/yr].
    pub fn total_annual_cost(&self) -> f64 {
        self.annual_opex() + self.capex.annual_amortization()
    }

    /// Breakeven price: total annualized cost per kilogram produced [$/kg].
    pub fn breakeven_price(&self) -> EvalResult<f64> {
        // Production positivity is established at construction; keep the
        // guard so a Default-constructed schedule cannot sneak a NaN through.
        let kg = self.production.kg();
        if kg <= 0.0 {
            return Err(EvalError::domain("annual_production", "zero production mass"));
        }
        Ok(self.total_annual_cost() / kg)
    }

    /// Annual profit at a market price [$/yr].
    ///
    /// Computed as production x (price - breakeven), which is algebraically
    /// production x price - total cost and makes `profit(breakeven_price())`
    /// exactly zero.
    pub fn profit(&self, price_per_kg: f64) -> EvalResult<f64> {
        let breakeven = self.breakeven_price()?;
        Ok(self.production.kg() * (price_per_kg - breakeven))
    }

    /// Operating profit: revenue minus OPEX, before CAPEX amortization [$/yr].
    /// This is the cash flow used for payback and NPV.
    pub fn operating_profit(&self, price_per_kg: f64) -> f64 {
        self.production.kg() * price_per_kg - self.annual_opex()
    }

    /// Return on investment: profit over (total CAPEX + annual OPEX).
    pub fn roi(&self, price_per_kg: f64) -> EvalResult<f64> {
        let denominator = self.capex.total() + self.annual_opex();
        if denominator <= 0.0 {
            return Err(EvalError::domain("roi", "CAPEX + annual OPEX must be positive"));
        }
        Ok(self.profit(price_per_kg)? / denominator)
    }

    /// The study's ROI variant: profit over total CAPEX alone.
    pub fn roi_on_capex(&self, price_per_kg: f64) -> EvalResult<f64> {
        let capex = self.capex.total();
        if capex <= 0.0 {
            return Err(EvalError::domain("roi_on_capex", "total CAPEX must be positive"));
        }
        Ok(self.profit(price_per_kg)? / capex)
    }

    /// Payback period in years, `None` when the operation never pays back.
    pub fn payback_years(&self, price_per_kg: f64) -> Option<f64> {
        let cash_flow = self.operating_profit(price_per_kg);
        if cash_flow > 0.0 {
            Some(self.capex.total() / cash_flow)
        } else {
            None
        }
    }

    /// Net present value over the project life at the given discount rate.
    pub fn npv(&self, price_per_kg: f64, project_life_years: u32, discount_rate: f64) -> f64 {
        let cash_flow = self.operating_profit(price_per_kg);
        let mut npv = -self.capex.total();
        for year in 1..=project_life_years {
            npv += cash_flow / (1.0 + discount_rate).powi(year as i32);
        }
        npv
    }

    /// OPEX line items ranked by annual cost, descending, with cumulative
    /// percentages (the study's Pareto cost-driver table).
    pub fn pareto(&self) -> Vec<ParetoEntry> {
        let total = self.annual_opex();
        let mut ranked: Vec<&OpexLineItem> = self.opex.iter().collect();
        ranked.sort_by(|a, b| {
            b.annual_cost.partial_cmp(&a.annual_cost).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut cumulative = 0.0;
        ranked
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let share = if total > 0.0 { item.annual_cost / total * 100.0 } else { 0.0 };
                cumulative += share;
                ParetoEntry {
                    rank: i + 1,
                    name: item.name.clone(),
                    annual_cost: item.annual_cost,
                    share_pct: share,
                    cumulative_pct: cumulative,
                }
            })
            .collect()
    }
}

/// A named price point evaluated against one [`Economics`].
///
/// The study's product options carry fixed price adjustments: crystals sell
/// at a 20% premium, syrup at a 5% discount.
#[derive(Debug, Clone, Serialize)]
pub struct EconomicScenario {
    /// Scenario name (e.g. "Crystal-Only", "Syrup-Only", "Mixed 50/50")
    pub name: String,
    /// Effective selling price [$/kg]
    pub price_per_kg: f64,
}

impl EconomicScenario {
    pub fn new(name: &str, price_per_kg: f64) -> Self {
        EconomicScenario { name: name.to_string(), price_per_kg }
    }

    /// Crystal product: 20% premium over the base market price.
    pub fn crystal_only(base_price: f64) -> Self {
        Self::new("Crystal-Only", base_price * 1.2)
    }

    /// Syrup product: 5% discount to the base market price.
    pub fn syrup_only(base_price: f64) -> Self {
        Self::new("Syrup-Only", base_price * 0.95)
    }

    /// 50/50 crystal and syrup portfolio at the volume-weighted price.
    pub fn mixed_50_50(base_price: f64) -> Self {
        Self::new("Mixed 50/50", base_price * (1.2 + 0.95) / 2.0)
    }

    /// Evaluates this scenario's metric row.
    pub fn evaluate(&self, econ: &Economics) -> EvalResult<ScenarioMetrics> {
        Ok(ScenarioMetrics {
            name: self.name.clone(),
            price_per_kg: self.price_per_kg,
            annual_production_kg: econ.production().kg(),
            annual_revenue: econ.production().kg() * self.price_per_kg,
            annual_opex: econ.annual_opex(),
            capex_total: econ.capex().total(),
            capex_amortization: econ.capex().annual_amortization(),
            annual_profit: econ.profit(self.price_per_kg)?,
            roi_pct: econ.roi(self.price_per_kg)? * 100.0,
            breakeven_price: econ.breakeven_price()?,
        })
    }
}

/// One row of the scenario comparison table.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioMetrics {
    pub name: String,
    pub price_per_kg: f64,
    pub annual_production_kg: f64,
    pub annual_revenue: f64,
    pub annual_opex: f64,
    pub capex_total: f64,
    pub capex_amortization: f64,
    pub annual_profit: f64,
    pub roi_pct: f64,
    pub breakeven_price: f64,
}
