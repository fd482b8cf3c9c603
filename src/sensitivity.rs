//! One-at-a-time sensitivity sweep over an economics baseline.
//!
//! Each perturbation scales exactly one parameter by a signed percentage and
//! re-evaluates breakeven price and profit independently against the
//! unperturbed baseline; perturbations are never combined.
//!
//! # Example
//!
//! ```
//! use tagatea::economics::{CapexSchedule, Economics, OpexLineItem};
//! use tagatea::sensitivity::{one_at_a_time, Perturbation, SweepParameter};
//! use tagatea::{Mass, PerYear};
//!
//! let baseline = Economics::new(
//!     Mass::<PerYear>::new(34_375.0)?,
//!     vec![OpexLineItem::new("labor", 208_000.0)?],
//!     CapexSchedule::new(390_000.0, 20.0)?,
//! )?;
//!
//! let records = one_at_a_time(
//!     &baseline,
//!     10.0,
//!     &[Perturbation::new(SweepParameter::OpexItem("labor".into()), 10.0)],
//! )?;
//! assert_eq!(records.len(), 1);
//! assert!(records[0].breakeven_delta > 0.0); // costlier labor raises breakeven
//! # Ok::<(), tagatea::EvalError>(())
//! ```

use crate::economics::{CapexSchedule, Economics, OpexLineItem};
use crate::{EvalError, EvalResult, Mass, PerYear};
use serde::Serialize;

/// The parameter a single perturbation applies to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SweepParameter {
    /// A named OPEX line item
    OpexItem(String),
    /// Total equipment cost (indirect factors reapply on top)
    Capex,
    /// Annual production mass
    Production,
    /// The market price itself
    MarketPrice,
}

impl std::fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepParameter::OpexItem(name) => write!(f, "opex:{name}"),
            SweepParameter::Capex => f.write_str("capex"),
            SweepParameter::Production => f.write_str("production"),
            SweepParameter::MarketPrice => f.write_str("market_price"),
        }
    }
}

/// A single one-at-a-time perturbation: one parameter, one signed percentage.
#[derive(Debug, Clone, Serialize)]
pub struct Perturbation {
    pub parameter: SweepParameter,
    /// Signed percentage, e.g. +10.0 or -10.0
    pub delta_pct: f64,
}

impl Perturbation {
    pub fn new(parameter: SweepParameter, delta_pct: f64) -> Self {
        Perturbation { parameter, delta_pct }
    }

    fn factor(&self) -> f64 {
        1.0 + self.delta_pct / 100.0
    }
}

/// Result of one perturbation, with deltas against the baseline.
#[derive(Debug, Clone, Serialize)]
pub struct SensitivityRecord {
    pub parameter: SweepParameter,
    pub delta_pct: f64,
    pub breakeven_price: f64,
    pub annual_profit: f64,
    /// Perturbed breakeven minus baseline breakeven [$/kg]
    pub breakeven_delta: f64,
    /// Perturbed profit minus baseline profit [$/yr]
    pub profit_delta: f64,
}

/// One row of a market-price grid sweep.
#[derive(Debug, Clone, Serialize)]
pub struct PricePoint {
    pub price_per_kg: f64,
    pub annual_profit: f64,
    pub roi_pct: f64,
    /// `None` when the operation never pays back at this price
    pub payback_years: Option<f64>,
}

/// Runs each perturbation independently against the baseline.
///
/// # Errors
///
/// A perturbation naming a missing OPEX item is a configuration error; a
/// perturbation that drives production to zero or below is a domain error.
pub fn one_at_a_time(
    baseline: &Economics,
    market_price: f64,
    perturbations: &[Perturbation],
) -> EvalResult<Vec<SensitivityRecord>> {
    let base_breakeven = baseline.breakeven_price()?;
    let base_profit = baseline.profit(market_price)?;

    perturbations
        .iter()
        .map(|pert| {
            let (econ, price) = apply(baseline, market_price, pert)?;
            let breakeven = econ.breakeven_price()?;
            let profit = econ.profit(price)?;
            Ok(SensitivityRecord {
                parameter: pert.parameter.clone(),
                delta_pct: pert.delta_pct,
                breakeven_price: breakeven,
                annual_profit: profit,
                breakeven_delta: breakeven - base_breakeven,
                profit_delta: profit - base_profit,
            })
        })
        .collect()
}

/// Evaluates the baseline across a grid of market prices (the study's
/// $8-$15/kg sensitivity table).
pub fn price_sweep(baseline: &Economics, prices: &[f64]) -> EvalResult<Vec<PricePoint>> {
    prices
        .iter()
        .map(|&price| {
            Ok(PricePoint {
                price_per_kg: price,
                annual_profit: baseline.profit(price)?,
                roi_pct: baseline.roi(price)? * 100.0,
                payback_years: baseline.payback_years(price),
            })
        })
        .collect()
}

fn apply(
    baseline: &Economics,
    market_price: f64,
    pert: &Perturbation,
) -> EvalResult<(Economics, f64)> {
    let factor = pert.factor();
    match &pert.parameter {
        SweepParameter::OpexItem(name) => {
            let mut found = false;
            let opex: Vec<OpexLineItem> = baseline
                .opex_items()
                .iter()
                .map(|item| {
                    if item.name == *name {
                        found = true;
                        OpexLineItem { name: item.name.clone(), annual_cost: item.annual_cost * factor }
                    } else {
                        item.clone()
                    }
                })
                .collect();
            if !found {
                return Err(EvalError::config(
                    name,
                    "perturbation names an OPEX item absent from the baseline",
                ));
            }
            let econ = Economics::new(baseline.production(), opex, baseline.capex().clone())?;
            Ok((econ, market_price))
        }
        SweepParameter::Capex => {
            let base = baseline.capex();
            let capex = CapexSchedule::with_factors(
                base.equipment_cost * factor,
                base.indirect_factor,
                base.working_capital_factor,
                base.amortization_years,
            )?;
            let econ =
                Economics::new(baseline.production(), baseline.opex_items().to_vec(), capex)?;
            Ok((econ, market_price))
        }
        SweepParameter::Production => {
            let production = Mass::<PerYear>::new(baseline.production().kg() * factor)?;
            let econ = Economics::new(
                production,
                baseline.opex_items().to_vec(),
                baseline.capex().clone(),
            )?;
            Ok((econ, market_price))
        }
        SweepParameter::MarketPrice => Ok((baseline.clone(), market_price * factor)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economics::{CapexSchedule, Economics, OpexLineItem};

    fn baseline() -> Economics {
        Economics::new(
            Mass::<PerYear>::new(34_375.0).unwrap(),
            vec![
                OpexLineItem::new("labor", 208_000.0).unwrap(),
                OpexLineItem::new("d-galactose", 68_750.0).unwrap(),
            ],
            CapexSchedule::new(390_000.0, 20.0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn perturbations_are_independent_not_combinatorial() {
        let records = one_at_a_time(
            &baseline(),
            10.0,
            &[
                Perturbation::new(SweepParameter::OpexItem("labor".into()), 10.0),
                Perturbation::new(SweepParameter::Capex, 10.0),
            ],
        )
        .unwrap();

        // Each record reflects only its own perturbation: the labor record's
        // breakeven shift equals 10% of labor spread over production,
        // untouched by the CAPEX perturbation.
        let labor_shift = 0.10 * 208_000.0 / 34_375.0;
        assert!((records[0].breakeven_delta - labor_shift).abs() < 1e-9);

        let capex_shift = 0.10 * 390_000.0 * 1.55 / 20.0 / 34_375.0;
        assert!((records[1].breakeven_delta - capex_shift).abs() < 1e-9);
    }

    #[test]
    fn market_price_perturbation_moves_profit_not_breakeven() {
        let records = one_at_a_time(
            &baseline(),
            10.0,
            &[Perturbation::new(SweepParameter::MarketPrice, 10.0)],
        )
        .unwrap();

        assert_eq!(records[0].breakeven_delta, 0.0);
        assert!((records[0].profit_delta - 34_375.0).abs() < 1e-6); // +$1/kg x production
    }

    #[test]
    fn production_perturbation_rescales_breakeven() {
        let records = one_at_a_time(
            &baseline(),
            10.0,
            &[Perturbation::new(SweepParameter::Production, -10.0)],
        )
        .unwrap();
        // Less production spreads the same cost over fewer kilograms
        assert!(records[0].breakeven_delta > 0.0);
    }

    #[test]
    fn production_driven_to_zero_is_a_domain_error() {
        let result = one_at_a_time(
            &baseline(),
            10.0,
            &[Perturbation::new(SweepParameter::Production, -100.0)],
        );
        assert!(matches!(result, Err(EvalError::Domain { .. })));
    }

    #[test]
    fn missing_opex_item_is_a_configuration_error() {
        let result = one_at_a_time(
            &baseline(),
            10.0,
            &[Perturbation::new(SweepParameter::OpexItem("helium".into()), 10.0)],
        );
        assert!(matches!(result, Err(EvalError::Configuration { .. })));
    }

    #[test]
    fn price_sweep_covers_the_grid_in_order() {
        let prices = [8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let points = price_sweep(&baseline(), &prices).unwrap();
        assert_eq!(points.len(), prices.len());
        // profit is monotone in price
        for pair in points.windows(2) {
            assert!(pair[1].annual_profit > pair[0].annual_profit);
        }
    }
}
