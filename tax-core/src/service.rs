//! End-to-end tax calculation against a rate and deduction provider.

use tracing::{debug, info, warn};

use crate::calculations::{BracketSchedule, DeductionResolver, ValidatedClaim, validate_request};
use crate::error::TaxError;
use crate::models::{DeductionKind, DeductionPolicy, Settlement, TaxBracket, TaxRequest, TaxResult};
use crate::provider::{DeductionProvider, RateProvider};

/// Runs the validate, resolve, compute and reconcile pipeline.
///
/// Borrows its provider so that one store can back many services.
pub struct TaxService<'a, P: ?Sized> {
    provider: &'a P,
}

impl<'a, P> TaxService<'a, P>
where
    P: RateProvider + DeductionProvider + ?Sized,
{
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Calculates tax for a single request.
    ///
    /// Validation happens before any provider call, so malformed input
    /// never reaches the store.
    pub async fn calculate(
        &self,
        request: &TaxRequest,
    ) -> Result<TaxResult, TaxError> {
        let claims =
            validate_request(request).inspect_err(|e| warn!(error = %e, "request rejected"))?;
        let tables = self.fetch_tables(&claimed_kinds(&claims)).await?;

        let result = tables.settle(request)?;
        info!(
            total_income = %request.total_income,
            taxable_income = %result.taxable_income,
            net = %result.settlement.net(),
            "tax calculated"
        );
        Ok(result)
    }

    /// Calculates tax for every request, in input order.
    ///
    /// All requests are validated first; the first invalid one aborts the
    /// batch. Brackets and deduction policies are then fetched once and
    /// shared by every request.
    pub async fn calculate_batch(
        &self,
        requests: &[TaxRequest],
    ) -> Result<Vec<TaxResult>, TaxError> {
        let claims = requests
            .iter()
            .enumerate()
            .map(|(row, request)| {
                validate_request(request)
                    .inspect_err(|e| warn!(row, error = %e, "batch request rejected"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let mut kinds = Vec::new();
        for kind in claims.iter().flat_map(|claims| claimed_kinds(claims)) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        let tables = self.fetch_tables(&kinds).await?;

        let results = requests
            .iter()
            .map(|request| tables.settle(request))
            .collect::<Result<Vec<_>, _>>()?;
        info!(requests = results.len(), "batch calculated");
        Ok(results)
    }

    async fn fetch_tables(
        &self,
        kinds: &[DeductionKind],
    ) -> Result<Tables, TaxError> {
        let personal = self
            .provider
            .get_deduction(DeductionKind::Personal.as_str())
            .await
            .map_err(|e| TaxError::lookup("personal deduction", e))?;

        let mut policies = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let policy = self
                .provider
                .get_deduction(kind.as_str())
                .await
                .map_err(|e| TaxError::lookup("deduction", e))?;
            policies.push(policy);
        }

        let brackets = self
            .provider
            .get_brackets()
            .await
            .map_err(|e| TaxError::lookup("tax rate", e))?;

        debug!(
            personal = %personal.amount,
            policies = policies.len(),
            brackets = brackets.len(),
            "tables fetched"
        );
        Ok(Tables {
            personal,
            policies,
            brackets,
        })
    }
}

fn claimed_kinds(claims: &[ValidatedClaim]) -> Vec<DeductionKind> {
    claims
        .iter()
        .map(|claim| claim.allowance_type.deduction_kind())
        .collect()
}

/// Provider data needed to settle requests.
struct Tables {
    personal: DeductionPolicy,
    policies: Vec<DeductionPolicy>,
    brackets: Vec<TaxBracket>,
}

impl Tables {
    fn settle(
        &self,
        request: &TaxRequest,
    ) -> Result<TaxResult, TaxError> {
        let taxable_income =
            DeductionResolver::new(&self.personal, &self.policies).resolve(request)?;
        let computation = BracketSchedule::new(&self.brackets).compute(taxable_income)?;
        let settlement = Settlement::reconcile(computation.total_tax, request.wht);

        Ok(TaxResult {
            taxable_income,
            total_tax: computation.total_tax,
            settlement,
            levels: computation.levels,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::ValidationError;
    use crate::models::TaxLevel;
    use crate::provider::LookupError;

    /// In-memory provider that records every call it receives.
    #[derive(Default)]
    struct FakeProvider {
        brackets: Vec<TaxBracket>,
        policies: Vec<DeductionPolicy>,
        fail_brackets: Option<LookupError>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn with_brackets(brackets: Vec<TaxBracket>) -> Self {
            Self {
                brackets,
                policies: vec![
                    policy("Personal", dec!(60000)),
                    policy("Donation", dec!(100000)),
                    policy("K-Receipt", dec!(50000)),
                ],
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RateProvider for FakeProvider {
        async fn get_brackets(&self) -> Result<Vec<TaxBracket>, LookupError> {
            self.calls.lock().unwrap().push("brackets".to_string());
            match &self.fail_brackets {
                Some(err) => Err(err.clone()),
                None => Ok(self.brackets.clone()),
            }
        }
    }

    #[async_trait]
    impl DeductionProvider for FakeProvider {
        async fn get_deduction(
            &self,
            deduction_type: &str,
        ) -> Result<DeductionPolicy, LookupError> {
            self.calls.lock().unwrap().push(deduction_type.to_string());
            self.policies
                .iter()
                .find(|p| p.deduction_type == deduction_type)
                .cloned()
                .ok_or_else(|| LookupError::NotFound(deduction_type.to_string()))
        }
    }

    fn policy(
        deduction_type: &str,
        amount: Decimal,
    ) -> DeductionPolicy {
        DeductionPolicy {
            deduction_type: deduction_type.to_string(),
            minimum_amount: dec!(0),
            maximum_amount: dec!(100000),
            amount,
        }
    }

    fn two_brackets() -> Vec<TaxBracket> {
        vec![
            TaxBracket::from_bounds(dec!(0), dec!(150000), dec!(0)),
            TaxBracket::from_bounds(dec!(150001), dec!(500000), dec!(10)),
        ]
    }

    fn thai_brackets() -> Vec<TaxBracket> {
        vec![
            TaxBracket::from_bounds(dec!(0), dec!(150000), dec!(0)),
            TaxBracket::from_bounds(dec!(150001), dec!(500000), dec!(10)),
            TaxBracket::from_bounds(dec!(500001), dec!(1000000), dec!(15)),
            TaxBracket::from_bounds(dec!(1000001), dec!(2000000), dec!(20)),
            TaxBracket::from_bounds(dec!(2000001), dec!(0), dec!(35)),
        ]
    }

    #[tokio::test]
    async fn calculate_basic_income() {
        let provider = FakeProvider::with_brackets(two_brackets());
        let service = TaxService::new(&provider);

        let result = service.calculate(&TaxRequest::new(dec!(500000))).await.unwrap();

        assert_eq!(result.taxable_income, dec!(440000));
        assert_eq!(result.total_tax, dec!(29000));
        assert_eq!(result.settlement, Settlement::Due(dec!(29000)));
        assert_eq!(
            result.levels,
            vec![
                TaxLevel {
                    label: "0-150,000".to_string(),
                    tax: dec!(0),
                },
                TaxLevel {
                    label: "150,001-500,000".to_string(),
                    tax: dec!(29000),
                },
            ]
        );
    }

    #[tokio::test]
    async fn calculate_subtracts_withholding() {
        let provider = FakeProvider::with_brackets(two_brackets());
        let service = TaxService::new(&provider);
        let request = TaxRequest::new(dec!(500000)).with_wht(dec!(25000));

        let result = service.calculate(&request).await.unwrap();

        assert_eq!(result.tax(), dec!(4000));
        assert_eq!(result.tax_refund(), dec!(0));
    }

    #[tokio::test]
    async fn calculate_reports_refund_when_withholding_exceeds_tax() {
        let provider = FakeProvider::with_brackets(two_brackets());
        let service = TaxService::new(&provider);
        let request = TaxRequest::new(dec!(500000)).with_wht(dec!(30000));

        let result = service.calculate(&request).await.unwrap();

        assert_eq!(result.settlement, Settlement::Refund(dec!(1000)));
        assert_eq!(result.tax(), dec!(0));
        assert_eq!(result.tax_refund(), dec!(1000));
    }

    #[tokio::test]
    async fn calculate_caps_donation() {
        let provider = FakeProvider::with_brackets(two_brackets());
        let service = TaxService::new(&provider);
        let request = TaxRequest::new(dec!(500000)).with_allowance("donation", dec!(200000));

        let result = service.calculate(&request).await.unwrap();

        assert_eq!(result.tax(), dec!(19000));
        assert_eq!(provider.calls(), vec!["Personal", "Donation", "brackets"]);
    }

    #[tokio::test]
    async fn calculate_across_full_schedule() {
        let provider = FakeProvider::with_brackets(thai_brackets());
        let service = TaxService::new(&provider);

        for (income, expected) in [
            (dec!(1000000), dec!(101000)),
            (dec!(2000000), dec!(298000)),
            (dec!(3000000), dec!(639000)),
        ] {
            let result = service.calculate(&TaxRequest::new(income)).await.unwrap();
            assert_eq!(result.tax(), expected, "income {income}");
            assert_eq!(result.levels.len(), 5);
        }
    }

    #[tokio::test]
    async fn calculate_with_income_below_personal_deduction_is_zero() {
        let provider = FakeProvider::with_brackets(two_brackets());
        let service = TaxService::new(&provider);

        let result = service.calculate(&TaxRequest::new(dec!(50000))).await.unwrap();

        assert_eq!(result.taxable_income, dec!(-10000));
        assert_eq!(result.settlement, Settlement::Due(dec!(0)));
    }

    #[tokio::test]
    async fn calculate_validates_before_any_lookup() {
        let provider = FakeProvider::with_brackets(two_brackets());
        let service = TaxService::new(&provider);
        let request = TaxRequest::new(dec!(100)).with_wht(dec!(200));

        let err = service.calculate(&request).await.unwrap_err();

        assert_eq!(err, TaxError::Validation(ValidationError::WhtExceedsIncome));
        assert!(err.is_client_error());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn calculate_reports_missing_personal_deduction() {
        let provider = FakeProvider {
            brackets: two_brackets(),
            ..FakeProvider::default()
        };
        let service = TaxService::new(&provider);

        let err = service.calculate(&TaxRequest::new(dec!(500000))).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to get personal deduction: record not found: Personal"
        );
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn calculate_reports_missing_allowance_policy() {
        let provider = FakeProvider {
            brackets: two_brackets(),
            policies: vec![policy("Personal", dec!(60000))],
            ..FakeProvider::default()
        };
        let service = TaxService::new(&provider);
        let request = TaxRequest::new(dec!(500000)).with_allowance("k-receipt", dec!(1));

        let err = service.calculate(&request).await.unwrap_err();

        assert_eq!(err.to_string(), "failed to get deduction: record not found: K-Receipt");
    }

    #[tokio::test]
    async fn calculate_reports_bracket_failure() {
        let provider = FakeProvider {
            fail_brackets: Some(LookupError::Backend("disk unavailable".to_string())),
            ..FakeProvider::with_brackets(vec![])
        };
        let service = TaxService::new(&provider);

        let err = service.calculate(&TaxRequest::new(dec!(500000))).await.unwrap_err();

        assert_eq!(err.to_string(), "failed to get tax rate: backend error: disk unavailable");
    }

    #[tokio::test]
    async fn batch_preserves_order_and_fetches_once() {
        let provider = FakeProvider::with_brackets(two_brackets());
        let service = TaxService::new(&provider);
        let requests = vec![
            TaxRequest::new(dec!(500000)).with_wht(dec!(30000)),
            TaxRequest::new(dec!(500000)).with_allowance("donation", dec!(200000)),
            TaxRequest::new(dec!(500000)).with_allowance("Donation", dec!(1000)),
        ];

        let results = service.calculate_batch(&requests).await.unwrap();

        let settlements: Vec<_> = results.iter().map(|r| r.settlement).collect();
        assert_eq!(
            settlements,
            vec![
                Settlement::Refund(dec!(1000)),
                Settlement::Due(dec!(19000)),
                Settlement::Due(dec!(28900)),
            ]
        );
        assert_eq!(provider.calls(), vec!["Personal", "Donation", "brackets"]);
    }

    #[tokio::test]
    async fn batch_aborts_on_first_invalid_request() {
        let provider = FakeProvider::with_brackets(two_brackets());
        let service = TaxService::new(&provider);
        let requests = vec![
            TaxRequest::new(dec!(500000)),
            TaxRequest::new(dec!(0)),
            TaxRequest::new(dec!(500000)).with_wht(dec!(-1)),
        ];

        let err = service.calculate_batch(&requests).await.unwrap_err();

        assert_eq!(err, TaxError::Validation(ValidationError::NonPositiveIncome));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_batch_makes_no_lookups() {
        let provider = FakeProvider::with_brackets(two_brackets());
        let service = TaxService::new(&provider);

        let results = service.calculate_batch(&[]).await.unwrap();

        assert!(results.is_empty());
        assert!(provider.calls().is_empty());
    }
}
