//! Request validation and the reduction of gross income to taxable income.

use std::collections::HashSet;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::error::TaxError;
use crate::models::{AllowanceType, DeductionPolicy, TaxRequest};
use crate::provider::LookupError;

/// Most allowance claims a single request may carry.
pub const MAX_ALLOWANCES: usize = 2;

/// Rejections of caller input. Messages are part of the public contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("totalIncome must be greater than 0")]
    NonPositiveIncome,

    #[error("Wht must be greater than 0")]
    NegativeWht,

    #[error("Wht must be less than totalIncome")]
    WhtExceedsIncome,

    #[error("Allowances must be less than or equal to 2")]
    TooManyAllowances,

    #[error("Not found allowanceType")]
    UnknownAllowanceType,

    #[error("Amount must be greater than 0")]
    NegativeAllowanceAmount,

    #[error("Duplicate allowanceType")]
    DuplicateAllowanceType,
}

/// An allowance claim that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedClaim {
    pub allowance_type: AllowanceType,
    pub amount: Decimal,
}

/// Checks `request` in a fixed order and stops at the first violation.
///
/// Claims are checked one at a time: type, then amount, then duplication.
pub fn validate_request(request: &TaxRequest) -> Result<Vec<ValidatedClaim>, ValidationError> {
    if request.total_income <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveIncome);
    }
    if request.wht < Decimal::ZERO {
        return Err(ValidationError::NegativeWht);
    }
    if request.wht > request.total_income {
        return Err(ValidationError::WhtExceedsIncome);
    }
    if request.allowances.len() > MAX_ALLOWANCES {
        return Err(ValidationError::TooManyAllowances);
    }

    let mut seen = HashSet::new();
    let mut claims = Vec::with_capacity(request.allowances.len());
    for claim in &request.allowances {
        let allowance_type = AllowanceType::parse(&claim.allowance_type)
            .ok_or(ValidationError::UnknownAllowanceType)?;
        if claim.amount < Decimal::ZERO {
            return Err(ValidationError::NegativeAllowanceAmount);
        }
        if !seen.insert(allowance_type) {
            return Err(ValidationError::DuplicateAllowanceType);
        }
        claims.push(ValidatedClaim {
            allowance_type,
            amount: claim.amount,
        });
    }

    Ok(claims)
}

/// Turns a validated request into taxable income.
///
/// Holds the personal deduction and the allowance policies fetched for the
/// request; a claim whose policy is missing is a lookup failure.
#[derive(Debug, Clone)]
pub struct DeductionResolver<'a> {
    personal: &'a DeductionPolicy,
    policies: &'a [DeductionPolicy],
}

impl<'a> DeductionResolver<'a> {
    pub fn new(
        personal: &'a DeductionPolicy,
        policies: &'a [DeductionPolicy],
    ) -> Self {
        Self { personal, policies }
    }

    /// Validates `request`, then subtracts the personal deduction and every
    /// capped allowance from its total income.
    ///
    /// The result may be zero or negative.
    ///
    /// # Errors
    ///
    /// * [`TaxError::Validation`] for any rejected input.
    /// * [`TaxError::Lookup`] if a claimed allowance has no policy.
    pub fn resolve(
        &self,
        request: &TaxRequest,
    ) -> Result<Decimal, TaxError> {
        let claims = validate_request(request)?;

        let mut income = request.total_income - self.personal.amount;
        for claim in &claims {
            let policy = self.policy_for(claim.allowance_type)?;
            let deducted = policy.cap(claim.amount);
            debug!(
                allowance = claim.allowance_type.as_str(),
                claimed = %claim.amount,
                %deducted,
                "allowance applied"
            );
            income -= deducted;
        }

        Ok(income)
    }

    fn policy_for(
        &self,
        allowance_type: AllowanceType,
    ) -> Result<&'a DeductionPolicy, TaxError> {
        let kind = allowance_type.deduction_kind();
        self.policies
            .iter()
            .find(|policy| policy.is_kind(kind))
            .ok_or_else(|| {
                TaxError::lookup("deduction", LookupError::NotFound(kind.as_str().to_string()))
            })
    }
}
