use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{DeductionPolicy, TaxBracket};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Source of the progressive rate table.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Brackets sorted ascending by minimum income.
    async fn get_brackets(&self) -> Result<Vec<TaxBracket>, LookupError>;
}

/// Source of deduction policies, keyed by table name
/// (`"Personal"`, `"Donation"`, `"K-Receipt"`).
#[async_trait]
pub trait DeductionProvider: Send + Sync {
    async fn get_deduction(
        &self,
        deduction_type: &str,
    ) -> Result<DeductionPolicy, LookupError>;
}

/// A deduction provider whose configured amounts can be changed.
#[async_trait]
pub trait DeductionStore: DeductionProvider {
    /// Replaces the configured amount of `deduction_type`. Bounds are the
    /// caller's responsibility (see [`crate::admin::update_deduction`]).
    async fn set_deduction_amount(
        &self,
        deduction_type: &str,
        amount: Decimal,
    ) -> Result<(), LookupError>;
}

/// Everything a backend has to offer, as one object-safe trait.
pub trait TaxStore: RateProvider + DeductionStore {}

impl<T: RateProvider + DeductionStore + ?Sized> TaxStore for T {}
