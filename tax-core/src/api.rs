//! JSON shapes exchanged with callers.
//!
//! Request types live in [`crate::models`]; everything here is response
//! side, with amounts written as plain JSON numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::admin::AdjustableDeduction;
use crate::models::{TaxLevel, TaxResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_refund: Decimal,
    pub tax_level: Vec<TaxLevelResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLevelResponse {
    pub level: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
}

impl From<&TaxLevel> for TaxLevelResponse {
    fn from(level: &TaxLevel) -> Self {
        Self {
            level: level.label.clone(),
            tax: level.tax,
        }
    }
}

impl From<&TaxResult> for TaxResponse {
    fn from(result: &TaxResult) -> Self {
        Self {
            tax: result.tax(),
            tax_refund: result.tax_refund(),
            tax_level: result.levels.iter().map(TaxLevelResponse::from).collect(),
        }
    }
}

/// Body of every error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionAmountRequest {
    pub amount: Decimal,
}

/// Confirmation of an administrative update, keyed by the deduction changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeductionUpdated {
    Personal {
        #[serde(rename = "personalDeduction", with = "rust_decimal::serde::float")]
        personal_deduction: Decimal,
    },
    KReceipt {
        #[serde(rename = "kReceipt", with = "rust_decimal::serde::float")]
        k_receipt: Decimal,
    },
}

impl DeductionUpdated {
    pub fn new(
        target: AdjustableDeduction,
        amount: Decimal,
    ) -> Self {
        match target {
            AdjustableDeduction::Personal => Self::Personal {
                personal_deduction: amount,
            },
            AdjustableDeduction::KReceipt => Self::KReceipt { k_receipt: amount },
        }
    }
}
