use thiserror::Error;

use crate::calculations::{OverflowError, ValidationError};
use crate::provider::LookupError;

/// Failure of a tax calculation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaxError {
    /// The caller's input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The income is too large for the bracket arithmetic.
    #[error(transparent)]
    Overflow(#[from] OverflowError),

    /// A rate table or deduction lookup failed.
    #[error("failed to get {context}: {source}")]
    Lookup {
        context: &'static str,
        source: LookupError,
    },
}

impl TaxError {
    pub fn lookup(
        context: &'static str,
        source: LookupError,
    ) -> Self {
        Self::Lookup { context, source }
    }

    /// True when the failure is attributable to the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Overflow(_))
    }
}
