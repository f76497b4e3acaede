//! Progressive bracket tax calculator.
//!
//! Income is apportioned to brackets in schedule order. Each bracket takes
//! at most its width, which is `max_income - min_income`, plus one unit for
//! brackets with a non-zero rate. Bracket bounds are inclusive whole numbers
//! (`0-150,000`, `150,001-500,000`, ...) and the extra unit lets a rated
//! bracket absorb its full inclusive range.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::TaxBracket;
//! use tax_core::calculations::BracketSchedule;
//!
//! let brackets = vec![
//!     TaxBracket::from_bounds(dec!(0), dec!(150000), dec!(0)),
//!     TaxBracket::from_bounds(dec!(150001), dec!(500000), dec!(10)),
//! ];
//!
//! let computation = BracketSchedule::new(&brackets).compute(dec!(440000)).unwrap();
//!
//! assert_eq!(computation.total_tax, dec!(29000));
//! assert_eq!(computation.levels[0].tax, dec!(0));
//! assert_eq!(computation.levels[1].label, "150,001-500,000");
//! assert_eq!(computation.levels[1].tax, dec!(29000));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::percent_of;
use crate::models::{TaxBracket, TaxLevel};

/// Structural problems in a bracket table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("no tax brackets provided")]
    NoTaxBrackets,

    #[error("first bracket must start at 0, found {0}")]
    FirstBracketNotAtZero(Decimal),

    #[error("bracket {index} has a negative minimum income")]
    NegativeMinimum { index: usize },

    #[error("bracket {index} has rate {rate} outside 0-100")]
    RateOutOfRange { index: usize, rate: Decimal },

    #[error("bracket {index} has a maximum below its minimum")]
    InvertedBounds { index: usize },

    #[error("bracket {index} overlaps the previous bracket")]
    Overlap { index: usize },

    #[error("bracket {index} leaves a gap after the previous bracket")]
    Gap { index: usize },

    #[error("bracket {index} follows the unbounded top bracket")]
    UnboundedNotLast { index: usize },
}

/// Checks that `brackets` form a usable schedule: sorted ascending, starting
/// at zero, contiguous on whole-number boundaries, and with the unbounded
/// bracket (if any) in last position.
///
/// The calculator does not call this; table backends do when loading.
pub fn validate_schedule(brackets: &[TaxBracket]) -> Result<(), ScheduleError> {
    let first = brackets.first().ok_or(ScheduleError::NoTaxBrackets)?;
    if !first.min_income.is_zero() {
        return Err(ScheduleError::FirstBracketNotAtZero(first.min_income));
    }

    let mut previous: Option<&TaxBracket> = None;
    for (index, bracket) in brackets.iter().enumerate() {
        if bracket.min_income < Decimal::ZERO {
            return Err(ScheduleError::NegativeMinimum { index });
        }
        if bracket.tax_rate < Decimal::ZERO || bracket.tax_rate > Decimal::ONE_HUNDRED {
            return Err(ScheduleError::RateOutOfRange {
                index,
                rate: bracket.tax_rate,
            });
        }
        if bracket
            .max_income
            .is_some_and(|max| max < bracket.min_income)
        {
            return Err(ScheduleError::InvertedBounds { index });
        }

        if let Some(prev) = previous {
            let Some(prev_max) = prev.max_income else {
                return Err(ScheduleError::UnboundedNotLast { index });
            };
            if bracket.min_income <= prev.min_income || bracket.min_income < prev_max {
                return Err(ScheduleError::Overlap { index });
            }
            if bracket.min_income > prev_max + Decimal::ONE {
                return Err(ScheduleError::Gap { index });
            }
        }
        previous = Some(bracket);
    }

    Ok(())
}

/// Bracket tax that does not fit in a `Decimal`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("totalIncome is too large to compute tax for bracket {bracket}")]
pub struct OverflowError {
    pub bracket: String,
}

/// Output of [`BracketSchedule::compute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketComputation {
    /// Sum of every bracket's contribution.
    pub total_tax: Decimal,

    /// One entry per bracket, in schedule order, including zero entries.
    pub levels: Vec<TaxLevel>,
}

/// Calculator over an ordered bracket table.
#[derive(Debug, Clone)]
pub struct BracketSchedule<'a> {
    brackets: &'a [TaxBracket],
}

impl<'a> BracketSchedule<'a> {
    /// Brackets must already be sorted ascending by `min_income`; they are
    /// used in the order given.
    pub fn new(brackets: &'a [TaxBracket]) -> Self {
        Self { brackets }
    }

    /// Computes total tax and the per-bracket breakdown for `taxable_income`.
    ///
    /// Zero or negative income yields zero tax in every bracket.
    ///
    /// # Errors
    ///
    /// [`OverflowError`] if a bracket's tax or the running total exceeds the
    /// `Decimal` range.
    pub fn compute(
        &self,
        taxable_income: Decimal,
    ) -> Result<BracketComputation, OverflowError> {
        let mut remaining = taxable_income;
        let mut total_tax = Decimal::ZERO;
        let mut levels = Vec::with_capacity(self.brackets.len());

        for bracket in self.brackets {
            let tax = if remaining <= Decimal::ZERO {
                Decimal::ZERO
            } else {
                let applied = self.applied_income(bracket, remaining);
                remaining -= applied;
                percent_of(applied, bracket.tax_rate).ok_or_else(|| overflow(bracket))?
            };

            debug!(bracket = %bracket.label(), %tax, %remaining, "bracket computed");
            total_tax = total_tax.checked_add(tax).ok_or_else(|| overflow(bracket))?;
            levels.push(TaxLevel {
                label: bracket.label(),
                tax,
            });
        }

        Ok(BracketComputation { total_tax, levels })
    }

    /// Width of a bounded bracket; `None` for the unbounded top bracket.
    fn width(
        &self,
        bracket: &TaxBracket,
    ) -> Option<Decimal> {
        let max_income = bracket.max_income?;
        let width = max_income - bracket.min_income;
        if bracket.tax_rate.is_zero() {
            Some(width)
        } else {
            Some(width.saturating_add(Decimal::ONE))
        }
    }

    /// Portion of `remaining` that falls into `bracket`.
    fn applied_income(
        &self,
        bracket: &TaxBracket,
        remaining: Decimal,
    ) -> Decimal {
        match self.width(bracket) {
            Some(width) if width <= remaining => width,
            _ => remaining,
        }
    }
}

fn overflow(bracket: &TaxBracket) -> OverflowError {
    OverflowError {
        bracket: bracket.label(),
    }
}
