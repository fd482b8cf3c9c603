//! # Tagatea: Typed Roll-Up Calculations for Batch Bioprocess Feasibility
//!
//! A typed, correct-by-construction calculator for techno-economic feasibility
//! studies of batch bioprocesses, instantiated for D-Tagatose production from
//! D-Galactose.
//!
//! The crate evaluates a straight-line pipeline: a feed stream passes through
//! an ordered chain of process stages (each applying one yield/recovery
//! fraction and drawing fixed utility power), and the resulting annual
//! production feeds an economics aggregator (OPEX roll-up, CAPEX amortization,
//! breakeven price, profit, ROI) plus a one-at-a-time sensitivity sweep.
//!
//! ## Example
//!
//! ```
//! use tagatea::{Mass, PerBatch};
//!
//! // Quantities carry their time basis in the type system
//! let per_batch: Mass<PerBatch> = Mass::new(110.0)?;
//!
//! // Annualization is an explicit, separate step
//! let annual = per_batch.annualized(312.5)?;
//! assert_eq!(annual.kg(), 34_375.0);
//! # Ok::<(), tagatea::EvalError>(())
//! ```
//!
//! The following would NOT compile, since a per-batch total cannot be added
//! to a per-hour rate:
//!
//! ```compile_fail
//! use tagatea::{Mass, PerBatch, PerHour};
//!
//! let batch: Mass<PerBatch> = Mass::new(110.0).unwrap();
//! let hourly: Mass<PerHour> = Mass::new(4.58).unwrap();
//! let _ = batch + hourly; // Compile error!
//! ```
//!
//! ## Why typed bases
//!
//! The feasibility study this crate reimplements shipped a mass balance that
//! silently read per-batch totals as per-hour rates, inflating annual
//! production 15x-215x depending on the stream. Here every mass carries its
//! basis as a zero-sized type parameter, and crossing bases requires an
//! explicit conversion carrying the batches-per-year factor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::ops::Add;

pub mod config;
pub mod economics;
pub mod report;
pub mod sensitivity;
pub mod stages;

pub use config::PlantConfig;
pub use economics::{CapexSchedule, EconomicScenario, Economics, OpexLineItem};
pub use stages::{Stage, StageChain};

/// Result type for all roll-up evaluations.
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors detected at the boundary of a calculation.
///
/// All variants name the offending field; none are recoverable automatically,
/// since the computation is deterministic and a bad input means the scenario
/// cannot be evaluated.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
    /// A quantity's declared time basis does not match what the pipeline expects
    #[error("field `{field}` declares basis `{declared}` but the pipeline expects `{expected}`")]
    UnitBasis { field: String, declared: BasisTag, expected: BasisTag },
    /// Division by zero production, yield outside [0, 1], negative mass or cost
    #[error("domain error in `{field}`: {reason}")]
    Domain { field: String, reason: String },
    /// Missing or invalid numeric constant in the configuration
    #[error("configuration error in `{field}`: {reason}")]
    Configuration { field: String, reason: String },
}

impl EvalError {
    pub(crate) fn domain(field: &str, reason: impl Into<String>) -> Self {
        EvalError::Domain { field: field.to_string(), reason: reason.into() }
    }

    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        EvalError::Configuration { field: field.to_string(), reason: reason.into() }
    }
}

/// Marker trait for the time basis of a quantity.
///
/// Quantities on different bases cannot be combined; conversion requires an
/// explicit call carrying the conversion factor.
pub trait TimeBasis: Copy {
    /// Runtime tag for this basis (for boundary checks and messages).
    const TAG: BasisTag;
}

/// Quantity accumulated over one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerBatch;
impl TimeBasis for PerBatch {
    const TAG: BasisTag = BasisTag::PerBatch;
}

/// Quantity expressed per hour of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerHour;
impl TimeBasis for PerHour {
    const TAG: BasisTag = BasisTag::PerHour;
}

/// Quantity accumulated over one production year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerYear;
impl TimeBasis for PerYear {
    const TAG: BasisTag = BasisTag::PerYear;
}

/// Runtime identifier for a time basis.
///
/// Used where a basis arrives from outside the type system, i.e. the flat
/// configuration. [`BasisTag::expect`] performs the one runtime check at that
/// boundary; everywhere else the basis is a type parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasisTag {
    PerBatch,
    PerHour,
    PerYear,
}

impl BasisTag {
    /// Checks a declared basis against the basis the pipeline expects.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnitBasis`] naming `field` on mismatch.
    pub fn expect(self, expected: BasisTag, field: &str) -> EvalResult<()> {
        if self == expected {
            Ok(())
        } else {
            Err(EvalError::UnitBasis { field: field.to_string(), declared: self, expected })
        }
    }
}

impl std::fmt::Display for BasisTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BasisTag::PerBatch => "per_batch",
            BasisTag::PerHour => "per_hour",
            BasisTag::PerYear => "per_year",
        };
        f.write_str(s)
    }
}

/// A mass in kilograms tagged with its time basis.
///
/// Arithmetic is only defined within one basis, and only through operations
/// that cannot produce a negative mass: addition is closed, while scaling and
/// subtraction are checked methods returning a domain error on violation.
/// Conversions between bases are explicit methods that take the conversion
/// factor as an argument, so the factor is always visible at the call site.
///
/// # Examples
///
/// ```
/// use tagatea::{Mass, PerBatch};
///
/// let feed: Mass<PerBatch> = Mass::new(110.0)?;
/// let product = feed.scaled(0.98)?;
/// assert!((product.kg() - 107.8).abs() < 1e-9);
/// # Ok::<(), tagatea::EvalError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Mass<B: TimeBasis> {
    kg: f64,
    _basis: PhantomData<B>,
}

impl<B: TimeBasis> Mass<B> {
    /// Creates a mass, rejecting negative or non-finite values.
    pub fn new(kg: f64) -> EvalResult<Self> {
        if !kg.is_finite() {
            return Err(EvalError::domain("mass", format!("mass must be finite, got {kg}")));
        }
        if kg < 0.0 {
            return Err(EvalError::domain("mass", format!("mass cannot be negative, got {kg}")));
        }
        Ok(Mass { kg, _basis: PhantomData })
    }

    /// Zero mass on this basis.
    pub fn zero() -> Self {
        Mass { kg: 0.0, _basis: PhantomData }
    }

    /// Internal constructor for values already known to be valid.
    pub(crate) fn raw(kg: f64) -> Self {
        Mass { kg, _basis: PhantomData }
    }

    /// The value in kilograms.
    pub fn kg(&self) -> f64 {
        self.kg
    }

    /// Runtime tag of this mass's basis.
    pub fn basis(&self) -> BasisTag {
        B::TAG
    }

    /// Scales by a non-negative factor.
    ///
    /// # Errors
    ///
    /// A negative or non-finite factor is a domain error; a mass can never
    /// become negative through scaling.
    pub fn scaled(self, factor: f64) -> EvalResult<Self> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(EvalError::domain(
                "factor",
                format!("scale factor must be finite and non-negative, got {factor}"),
            ));
        }
        Ok(Mass::raw(self.kg * factor))
    }

    /// Subtracts a smaller mass from a larger one.
    ///
    /// # Errors
    ///
    /// Returns a domain error when `rhs` exceeds `self`; the difference of
    /// two masses is itself a mass and cannot be negative.
    pub fn checked_sub(self, rhs: Self) -> EvalResult<Self> {
        if rhs.kg > self.kg {
            return Err(EvalError::domain(
                "mass",
                format!("cannot subtract {} kg from {} kg", rhs.kg, self.kg),
            ));
        }
        Ok(Mass::raw(self.kg - rhs.kg))
    }
}

impl Mass<PerBatch> {
    /// Converts a per-batch total to an annual total.
    ///
    /// This is the only way to obtain an annual mass from batch data; the
    /// batches-per-year factor must be explicit.
    ///
    /// # Errors
    ///
    /// `batches_per_year` must be finite and positive.
    pub fn annualized(self, batches_per_year: f64) -> EvalResult<Mass<PerYear>> {
        check_positive_factor(batches_per_year, "batches_per_year")?;
        Ok(Mass::raw(self.kg * batches_per_year))
    }
}

impl Mass<PerYear> {
    /// Converts an annual total back to a per-batch total.
    ///
    /// Round-trips exactly with [`Mass::annualized`] for the same factor.
    pub fn per_batch(self, batches_per_year: f64) -> EvalResult<Mass<PerBatch>> {
        check_positive_factor(batches_per_year, "batches_per_year")?;
        Ok(Mass::raw(self.kg / batches_per_year))
    }
}

impl Mass<PerHour> {
    /// Integrates an hourly rate over a number of operating hours.
    pub fn over_hours(self, hours: f64) -> EvalResult<Mass<PerBatch>> {
        check_positive_factor(hours, "hours")?;
        Ok(Mass::raw(self.kg * hours))
    }
}

fn check_positive_factor(value: f64, field: &str) -> EvalResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EvalError::domain(field, format!("must be finite and positive, got {value}")));
    }
    Ok(())
}

impl<B: TimeBasis> Add for Mass<B> {
    type Output = Mass<B>;
    fn add(self, rhs: Mass<B>) -> Mass<B> {
        Mass::raw(self.kg + rhs.kg)
    }
}

/// A process stream: a mapping from component name to mass, on one basis.
///
/// # Invariants
///
/// - No component mass is negative (enforced by validated setters)
/// - The total equals the sum of component masses by construction
///
/// # Examples
///
/// ```
/// use tagatea::{PerBatch, Stream};
///
/// let feed = Stream::<PerBatch>::new()
///     .with_component("d-galactose", 110.0)?
///     .with_unit_price(2.00);
///
/// assert_eq!(feed.total().kg(), 110.0);
/// assert_eq!(feed.component("d-galactose").kg(), 110.0);
/// assert_eq!(feed.component("water").kg(), 0.0);
/// # Ok::<(), tagatea::EvalError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Stream<B: TimeBasis> {
    /// Component name -> mass [kg on basis B]. BTreeMap keeps report output deterministic.
    components: BTreeMap<String, f64>,
    /// Unit price of the stream's material [$ per kg], if priced
    unit_price_per_kg: Option<f64>,
    _basis: PhantomData<B>,
}

impl<B: TimeBasis> Stream<B> {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Stream { components: BTreeMap::new(), unit_price_per_kg: None, _basis: PhantomData }
    }

    /// Adds a component, consuming and returning the stream (builder form).
    ///
    /// # Errors
    ///
    /// Rejects negative or non-finite masses.
    pub fn with_component(mut self, name: &str, kg: f64) -> EvalResult<Self> {
        self.set_component(name, kg)?;
        Ok(self)
    }

    /// Sets the stream's unit price in $/kg.
    pub fn with_unit_price(mut self, price_per_kg: f64) -> Self {
        self.unit_price_per_kg = Some(price_per_kg);
        self
    }

    /// Sets a component mass.
    pub fn set_component(&mut self, name: &str, kg: f64) -> EvalResult<()> {
        if !kg.is_finite() || kg < 0.0 {
            return Err(EvalError::domain(
                name,
                format!("component mass must be finite and non-negative, got {kg}"),
            ));
        }
        self.components.insert(name.to_string(), kg);
        Ok(())
    }

    /// Removes a component, returning its mass (zero if absent).
    pub fn remove_component(&mut self, name: &str) -> Mass<B> {
        Mass::raw(self.components.remove(name).unwrap_or(0.0))
    }

    /// Mass of one component (zero if absent).
    pub fn component(&self, name: &str) -> Mass<B> {
        Mass::raw(self.components.get(name).copied().unwrap_or(0.0))
    }

    /// Whether the stream carries an entry for this component at all.
    ///
    /// A present-but-zero component is distinct from an absent one: the
    /// former is a depleted stream, the latter usually a feed/route mismatch.
    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Total mass: the sum of all component masses.
    pub fn total(&self) -> Mass<B> {
        Mass::raw(self.components.values().sum())
    }

    /// The stream's unit price in $/kg, if set.
    pub fn unit_price_per_kg(&self) -> Option<f64> {
        self.unit_price_per_kg
    }

    /// Iterates components in deterministic (name) order.
    pub fn components(&self) -> impl Iterator<Item = (&str, Mass<B>)> {
        self.components.iter().map(|(name, &kg)| (name.as_str(), Mass::raw(kg)))
    }

    /// Number of components.
    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    /// Checks that the stream is physically consistent.
    pub fn validate(&self) -> EvalResult<()> {
        for (name, &kg) in &self.components {
            if !kg.is_finite() || kg < 0.0 {
                return Err(EvalError::domain(
                    name,
                    format!("component mass must be finite and non-negative, got {kg}"),
                ));
            }
        }
        Ok(())
    }
}

impl Stream<PerBatch> {
    /// Converts every component of a per-batch stream to an annual basis.
    pub fn annualized(&self, batches_per_year: f64) -> EvalResult<Stream<PerYear>> {
        check_positive_factor(batches_per_year, "batches_per_year")?;
        Ok(Stream {
            components: self
                .components
                .iter()
                .map(|(name, &kg)| (name.clone(), kg * batches_per_year))
                .collect(),
            unit_price_per_kg: self.unit_price_per_kg,
            _basis: PhantomData,
        })
    }
}

impl<B: TimeBasis> Default for Stream<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_rejects_negative_and_nan() {
        assert!(Mass::<PerBatch>::new(-1.0).is_err());
        assert!(Mass::<PerBatch>::new(f64::NAN).is_err());
        assert!(Mass::<PerBatch>::new(0.0).is_ok());
    }

    #[test]
    fn annualization_is_explicit_and_round_trips_exactly() {
        let per_batch = Mass::<PerBatch>::new(110.0).unwrap();
        let annual = per_batch.annualized(312.5).unwrap();
        assert_eq!(annual.kg(), 34_375.0);

        // De-annualization recovers the per-batch mass exactly
        let back = annual.per_batch(312.5).unwrap();
        assert_eq!(back.kg(), 110.0);
    }

    #[test]
    fn annualization_rejects_zero_factor() {
        let per_batch = Mass::<PerBatch>::new(110.0).unwrap();
        assert!(matches!(per_batch.annualized(0.0), Err(EvalError::Domain { .. })));
    }

    #[test]
    fn subtraction_cannot_create_negative_mass() {
        let small = Mass::<PerBatch>::new(1.0).unwrap();
        let large = Mass::<PerBatch>::new(2.0).unwrap();
        assert!(matches!(small.checked_sub(large), Err(EvalError::Domain { .. })));

        let diff = large.checked_sub(small).unwrap();
        assert_eq!(diff.kg(), 1.0);
    }

    #[test]
    fn scaling_rejects_negative_factors() {
        let mass = Mass::<PerBatch>::new(110.0).unwrap();
        assert!(matches!(mass.scaled(-2.0), Err(EvalError::Domain { .. })));
        assert!(matches!(mass.scaled(f64::NAN), Err(EvalError::Domain { .. })));
        assert!((mass.scaled(0.98).unwrap().kg() - 107.8).abs() < 1e-9);
    }

    #[test]
    fn hourly_rate_integrates_over_hours() {
        let rate = Mass::<PerHour>::new(4.0).unwrap();
        let batch = rate.over_hours(24.0).unwrap();
        assert_eq!(batch.kg(), 96.0);
    }

    #[test]
    fn basis_tag_mismatch_names_the_field() {
        let err = BasisTag::PerHour.expect(BasisTag::PerBatch, "feed_basis").unwrap_err();
        match err {
            EvalError::UnitBasis { field, declared, expected } => {
                assert_eq!(field, "feed_basis");
                assert_eq!(declared, BasisTag::PerHour);
                assert_eq!(expected, BasisTag::PerBatch);
            }
            other => panic!("expected UnitBasis error, got {other:?}"),
        }
    }

    #[test]
    fn stream_total_is_sum_of_components() {
        let stream = Stream::<PerBatch>::new()
            .with_component("d-galactose", 110.0)
            .unwrap()
            .with_component("water", 400.0)
            .unwrap();
        assert_eq!(stream.total().kg(), 510.0);
        assert!(stream.validate().is_ok());
    }

    #[test]
    fn stream_rejects_negative_component() {
        let result = Stream::<PerBatch>::new().with_component("d-galactose", -5.0);
        assert!(matches!(result, Err(EvalError::Domain { .. })));
    }

    #[test]
    fn stream_annualization_scales_every_component() {
        let stream = Stream::<PerBatch>::new()
            .with_component("d-tagatose", 107.8)
            .unwrap()
            .with_component("water", 400.0)
            .unwrap();
        let annual = stream.annualized(312.5).unwrap();
        assert!((annual.component("d-tagatose").kg() - 33_687.5).abs() < 1e-6);
        assert_eq!(annual.component("water").kg(), 125_000.0);
    }
}
