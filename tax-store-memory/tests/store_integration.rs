//! Integration tests driving the calculation service through the registry
//! and the memory backend.

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tax_core::{
    AdjustableDeduction, DeductionProvider, Settlement, StoreConfig, StoreRegistry, TaxRequest,
    TaxService, TaxStore, update_deduction,
};
use tax_store_memory::{BUILTIN_SOURCE, MemoryStoreFactory, TaxTable};

async fn open(source: &str) -> Box<dyn TaxStore> {
    let mut registry = StoreRegistry::new();
    registry.register(Box::new(MemoryStoreFactory));
    registry
        .create(&StoreConfig {
            backend: "memory".to_string(),
            source: source.to_string(),
        })
        .await
        .expect("memory store should open")
}

#[tokio::test]
async fn builtin_table_matches_reference_cases() {
    let store = open(BUILTIN_SOURCE).await;
    let service = TaxService::new(&*store);

    let cases = [
        (TaxRequest::new(dec!(500000)), Settlement::Due(dec!(29000))),
        (
            TaxRequest::new(dec!(500000)).with_wht(dec!(25000)),
            Settlement::Due(dec!(4000)),
        ),
        (
            TaxRequest::new(dec!(500000)).with_wht(dec!(30000)),
            Settlement::Refund(dec!(1000)),
        ),
        (
            TaxRequest::new(dec!(500000)).with_allowance("donation", dec!(200000)),
            Settlement::Due(dec!(19000)),
        ),
        (TaxRequest::new(dec!(1000000)), Settlement::Due(dec!(101000))),
        (TaxRequest::new(dec!(2000000)), Settlement::Due(dec!(298000))),
        (TaxRequest::new(dec!(3000000)), Settlement::Due(dec!(639000))),
    ];

    for (request, expected) in cases {
        let result = service.calculate(&request).await.unwrap();
        assert_eq!(result.settlement, expected, "{request:?}");
    }
}

#[tokio::test]
async fn top_bracket_takes_the_remainder() {
    let store = open(BUILTIN_SOURCE).await;

    let result = TaxService::new(&*store)
        .calculate(&TaxRequest::new(dec!(3000000)))
        .await
        .unwrap();

    let taxes: Vec<_> = result.levels.iter().map(|level| level.tax).collect();
    assert_eq!(
        taxes,
        vec![dec!(0), dec!(35000), dec!(75000), dec!(200000), dec!(329000)]
    );
    assert_eq!(result.levels[4].label, "2,000,001 and above");
}

#[tokio::test]
async fn admin_update_applies_to_later_calculations_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rates.toml");
    std::fs::write(&path, TaxTable::builtin().unwrap().to_toml_string().unwrap()).unwrap();
    let store = open(path.to_str().unwrap()).await;
    let service = TaxService::new(&*store);
    let request = TaxRequest::new(dec!(500000)).with_allowance("k-receipt", dec!(80000));

    // 500000 - 60000 - 50000 = 390000
    let before = service.calculate(&request).await.unwrap();
    update_deduction(&*store, AdjustableDeduction::KReceipt, dec!(80000))
        .await
        .unwrap();
    // 500000 - 60000 - 80000 = 360000
    let after = service.calculate(&request).await.unwrap();

    assert_eq!(before.tax(), dec!(24000));
    assert_eq!(after.tax(), dec!(21000));

    let reopened = open(path.to_str().unwrap()).await;
    let policy = reopened.get_deduction("K-Receipt").await.unwrap();
    assert_eq!(policy.amount, dec!(80000));
}
