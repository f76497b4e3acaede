//! Bounded updates to the configured deduction amounts.

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use crate::calculations::common::format_thousands;
use crate::models::{DeductionKind, DeductionPolicy};
use crate::provider::{DeductionStore, LookupError};

/// Deductions an administrator may change. Donation is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjustableDeduction {
    Personal,
    KReceipt,
}

impl AdjustableDeduction {
    pub fn kind(&self) -> DeductionKind {
        match self {
            Self::Personal => DeductionKind::Personal,
            Self::KReceipt => DeductionKind::KReceipt,
        }
    }

    /// Name used in failure messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Personal => "personal deduction",
            Self::KReceipt => "k-receipt deduction",
        }
    }

    /// Accepts `personal` and `k-receipt`, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "personal" => Some(Self::Personal),
            "k-receipt" => Some(Self::KReceipt),
            _ => None,
        }
    }
}

impl fmt::Display for AdjustableDeduction {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.kind().as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdminError {
    #[error("Amount should be less than {}", format_thousands(*.maximum))]
    AboveMaximum { maximum: Decimal },

    #[error("Amount should be more than {}", format_thousands(*.minimum))]
    BelowMinimum { minimum: Decimal },

    #[error("failed to get {target}: {source}")]
    Lookup {
        target: &'static str,
        source: LookupError,
    },

    #[error("failed to set {target}: {source}")]
    Store {
        target: &'static str,
        source: LookupError,
    },
}

impl AdminError {
    /// True when the requested amount itself was rejected.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::AboveMaximum { .. } | Self::BelowMinimum { .. })
    }
}

/// Sets the configured amount of `target` after checking it against the
/// policy's bounds. Returns the policy as it now stands.
///
/// The maximum is checked before the minimum; both bounds are inclusive.
pub async fn update_deduction<S>(
    store: &S,
    target: AdjustableDeduction,
    amount: Decimal,
) -> Result<DeductionPolicy, AdminError>
where
    S: DeductionStore + ?Sized,
{
    let name = target.kind().as_str();
    let mut policy = store
        .get_deduction(name)
        .await
        .map_err(|source| AdminError::Lookup {
            target: target.description(),
            source,
        })?;

    if amount > policy.maximum_amount {
        return Err(AdminError::AboveMaximum {
            maximum: policy.maximum_amount,
        });
    }
    if amount < policy.minimum_amount {
        return Err(AdminError::BelowMinimum {
            minimum: policy.minimum_amount,
        });
    }

    store
        .set_deduction_amount(name, amount)
        .await
        .map_err(|source| AdminError::Store {
            target: target.description(),
            source,
        })?;

    info!(deduction = name, previous = %policy.amount, %amount, "deduction updated");
    policy.amount = amount;
    Ok(policy)
}
