use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::calculations::common::format_thousands;

/// One tier of the progressive schedule.
///
/// `max_income` of `None` marks the unbounded top bracket. External tables
/// spell that as a maximum of `0` (or leave it out); both are read as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: Decimal,
    #[serde(
        default,
        deserialize_with = "deserialize_bracket_max",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_income: Option<Decimal>,
    /// Percentage, 0–100.
    pub tax_rate: Decimal,
}

impl TaxBracket {
    /// Builds a bracket from raw table bounds, where a zero maximum is the
    /// unbounded sentinel.
    pub fn from_bounds(
        min_income: Decimal,
        max_income: Decimal,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            min_income,
            max_income: (!max_income.is_zero()).then_some(max_income),
            tax_rate,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_income.is_none()
    }

    /// Breakdown label, e.g. `"150,001-500,000"` or `"2,000,001 and above"`.
    pub fn label(&self) -> String {
        match self.max_income {
            Some(max) => format!(
                "{}-{}",
                format_thousands(self.min_income),
                format_thousands(max)
            ),
            None => format!("{} and above", format_thousands(self.min_income)),
        }
    }
}

fn deserialize_bracket_max<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let max: Option<Decimal> = Option::deserialize(deserializer)?;
    Ok(max.filter(|value| !value.is_zero()))
}
