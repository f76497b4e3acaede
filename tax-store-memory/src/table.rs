use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tax_core::calculations::validate_schedule;
use tax_core::{DeductionKind, DeductionPolicy, LookupError, TaxBracket};

const BUILTIN_TABLE: &str = include_str!("../tables/default.toml");

/// On-disk layout of a tax table. Numbers are read from integers, floats or
/// strings and written back as plain TOML numbers.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TableFile {
    #[serde(default)]
    brackets: Vec<BracketRow>,
    #[serde(default)]
    deductions: Vec<DeductionRow>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BracketRow {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    min_income: Decimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    max_income: Option<Decimal>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    tax_rate: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
struct DeductionRow {
    deduction_type: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    minimum_amount: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    maximum_amount: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    amount: Decimal,
}

impl From<BracketRow> for TaxBracket {
    fn from(row: BracketRow) -> Self {
        TaxBracket::from_bounds(
            row.min_income,
            row.max_income.unwrap_or(Decimal::ZERO),
            row.tax_rate,
        )
    }
}

impl From<&TaxBracket> for BracketRow {
    fn from(bracket: &TaxBracket) -> Self {
        Self {
            min_income: bracket.min_income,
            max_income: bracket.max_income,
            tax_rate: bracket.tax_rate,
        }
    }
}

impl From<DeductionRow> for DeductionPolicy {
    fn from(row: DeductionRow) -> Self {
        DeductionPolicy {
            deduction_type: row.deduction_type,
            minimum_amount: row.minimum_amount,
            maximum_amount: row.maximum_amount,
            amount: row.amount,
        }
    }
}

impl From<&DeductionPolicy> for DeductionRow {
    fn from(policy: &DeductionPolicy) -> Self {
        Self {
            deduction_type: policy.deduction_type.clone(),
            minimum_amount: policy.minimum_amount,
            maximum_amount: policy.maximum_amount,
            amount: policy.amount,
        }
    }
}

/// Bracket schedule plus deduction policies, as held by the memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxTable {
    pub brackets: Vec<TaxBracket>,
    pub deductions: Vec<DeductionPolicy>,
}

impl TaxTable {
    /// The table compiled into this crate.
    pub fn builtin() -> Result<Self, LookupError> {
        Self::from_toml_str(BUILTIN_TABLE)
    }

    /// Parses and validates a TOML table.
    pub fn from_toml_str(source: &str) -> Result<Self, LookupError> {
        let file: TableFile = toml::from_str(source)
            .map_err(|e| LookupError::Configuration(format!("invalid tax table: {e}")))?;
        let table = Self {
            brackets: file.brackets.into_iter().map(TaxBracket::from).collect(),
            deductions: file.deductions.into_iter().map(DeductionPolicy::from).collect(),
        };
        table.validate()?;
        Ok(table)
    }

    pub fn to_toml_string(&self) -> Result<String, LookupError> {
        let file = TableFile {
            brackets: self.brackets.iter().map(BracketRow::from).collect(),
            deductions: self.deductions.iter().map(DeductionRow::from).collect(),
        };
        toml::to_string_pretty(&file)
            .map_err(|e| LookupError::Backend(format!("failed to encode tax table: {e}")))
    }

    /// Checks the schedule shape and the deduction list.
    ///
    /// A `Personal` deduction is mandatory, names are unique, and each
    /// configured amount lies within its own bounds.
    pub fn validate(&self) -> Result<(), LookupError> {
        validate_schedule(&self.brackets)
            .map_err(|e| LookupError::Configuration(format!("invalid tax brackets: {e}")))?;

        let mut seen = HashSet::new();
        for policy in &self.deductions {
            if !seen.insert(policy.deduction_type.as_str()) {
                return Err(LookupError::Configuration(format!(
                    "duplicate deduction {}",
                    policy.deduction_type
                )));
            }
            if policy.minimum_amount > policy.maximum_amount
                || policy.amount < policy.minimum_amount
                || policy.amount > policy.maximum_amount
            {
                return Err(LookupError::Configuration(format!(
                    "deduction {} amount {} outside {}..={}",
                    policy.deduction_type,
                    policy.amount,
                    policy.minimum_amount,
                    policy.maximum_amount
                )));
            }
        }

        if !self
            .deductions
            .iter()
            .any(|policy| policy.is_kind(DeductionKind::Personal))
        {
            return Err(LookupError::Configuration(
                "missing Personal deduction".to_string(),
            ));
        }

        Ok(())
    }

    pub fn deduction(
        &self,
        deduction_type: &str,
    ) -> Option<&DeductionPolicy> {
        self.deductions
            .iter()
            .find(|policy| policy.deduction_type == deduction_type)
    }

    pub fn deduction_mut(
        &mut self,
        deduction_type: &str,
    ) -> Option<&mut DeductionPolicy> {
        self.deductions
            .iter_mut()
            .find(|policy| policy.deduction_type == deduction_type)
    }
}
