use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single allowance as submitted by the caller. The type is kept as the raw
/// string so that validation can report unknown types with its own message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceClaim {
    pub allowance_type: String,
    pub amount: Decimal,
}

impl AllowanceClaim {
    pub fn new(
        allowance_type: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            allowance_type: allowance_type.into(),
            amount,
        }
    }
}

/// Calculation request: `{"totalIncome": .., "wht": .., "allowances": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRequest {
    pub total_income: Decimal,
    #[serde(default)]
    pub wht: Decimal,
    #[serde(default)]
    pub allowances: Vec<AllowanceClaim>,
}

impl TaxRequest {
    pub fn new(total_income: Decimal) -> Self {
        Self {
            total_income,
            wht: Decimal::ZERO,
            allowances: Vec::new(),
        }
    }

    pub fn with_wht(
        mut self,
        wht: Decimal,
    ) -> Self {
        self.wht = wht;
        self
    }

    pub fn with_allowance(
        mut self,
        allowance_type: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        self.allowances
            .push(AllowanceClaim::new(allowance_type, amount));
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn deserializes_camel_case_request() {
        let json = r#"{
            "totalIncome": 500000.0,
            "wht": 25000.0,
            "allowances": [{"allowanceType": "donation", "amount": 200000.0}]
        }"#;

        let request: TaxRequest = serde_json::from_str(json).unwrap();

        assert_eq!(
            request,
            TaxRequest::new(dec!(500000))
                .with_wht(dec!(25000))
                .with_allowance("donation", dec!(200000))
        );
    }

    #[test]
    fn missing_wht_and_allowances_default_to_empty() {
        let request: TaxRequest = serde_json::from_str(r#"{"totalIncome": 500000}"#).unwrap();

        assert_eq!(request.wht, dec!(0));
        assert!(request.allowances.is_empty());
    }
}
