//! Tax calculation logic.
//!
//! The pipeline runs in three steps: [`deductions`] validates a request and
//! reduces gross income to taxable income, [`brackets`] walks the progressive
//! schedule, and [`crate::models::Settlement::reconcile`] nets the result
//! against withholding tax.

pub mod brackets;
pub mod common;
pub mod deductions;

pub use brackets::{
    BracketComputation, BracketSchedule, OverflowError, ScheduleError, validate_schedule,
};
pub use deductions::{DeductionResolver, ValidatedClaim, ValidationError, validate_request};
