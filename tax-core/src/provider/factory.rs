use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{LookupError, TaxStore};

/// Backend-agnostic store configuration.
///
/// `backend` must match the [`StoreFactory::backend_name`] of a registered
/// factory. `source` is passed through to that factory unchanged; its
/// meaning is entirely backend-specific.
///
/// | backend  | source examples                         |
/// |----------|-----------------------------------------|
/// | `memory` | `tax-table.toml`, empty for the default |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"memory"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub source: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            source: String::new(),
        }
    }
}

/// One implementation per store backend. Each backend crate exports a unit
/// struct implementing this trait, registered with a [`StoreRegistry`] at
/// startup.
#[async_trait]
pub trait StoreFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open the backing source and return a ready-to-use store.
    async fn create(&self, config: &StoreConfig) -> Result<Box<dyn TaxStore>, LookupError>;
}

/// Registry of [`StoreFactory`] instances, keyed by backend name.
pub struct StoreRegistry {
    factories: HashMap<&'static str, Box<dyn StoreFactory>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any factory with the same
    /// [`StoreFactory::backend_name`].
    pub fn register(&mut self, factory: Box<dyn StoreFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`LookupError::Configuration`] if no factory is registered for the
    ///   requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Box<dyn TaxStore>, LookupError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                LookupError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// tests
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use crate::models::{DeductionPolicy, TaxBracket};
    use crate::provider::repository::{DeductionProvider, DeductionStore, RateProvider};

    use super::{LookupError, StoreConfig, StoreFactory, StoreRegistry, TaxStore};

    // ── stub store ───────────────────────────────────────────────────────
    // Every method is `unimplemented!()`; the tests only verify routing.
    struct StubStore;

    #[async_trait]
    impl RateProvider for StubStore {
        async fn get_brackets(&self) -> Result<Vec<TaxBracket>, LookupError> {
            unimplemented!()
        }
    }

    #[async_trait]
    impl DeductionProvider for StubStore {
        async fn get_deduction(
            &self,
            _deduction_type: &str,
        ) -> Result<DeductionPolicy, LookupError> {
            unimplemented!()
        }
    }

    #[async_trait]
    impl DeductionStore for StubStore {
        async fn set_deduction_amount(
            &self,
            _deduction_type: &str,
            _amount: Decimal,
        ) -> Result<(), LookupError> {
            unimplemented!()
        }
    }

    // ── stub factories ───────────────────────────────────────────────────
    /// Flips `called` on `create` so tests can prove dispatch happened.
    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl StoreFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &StoreConfig,
        ) -> Result<Box<dyn TaxStore>, LookupError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(StubStore))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl StoreFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(
            &self,
            _config: &StoreConfig,
        ) -> Result<Box<dyn TaxStore>, LookupError> {
            Err(LookupError::Backend("intentional failure".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn StoreFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config(backend: &str) -> StoreConfig {
        StoreConfig {
            backend: backend.to_string(),
            source: String::new(),
        }
    }

    #[test]
    fn store_config_default_is_memory_with_default_table() {
        let cfg = StoreConfig::default();
        assert_eq!(cfg.backend, "memory");
        assert!(cfg.source.is_empty());
    }

    #[test]
    fn new_registry_has_no_backends() {
        assert!(StoreRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn available_backends_is_sorted() {
        let mut reg = StoreRegistry::new();
        let (f1, _) = stub_factory("memory");
        let (f2, _) = stub_factory("fixture");
        reg.register(f1);
        reg.register(f2);
        assert_eq!(reg.available_backends(), vec!["fixture", "memory"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut reg = StoreRegistry::new();
        let (old, _) = stub_factory("memory");
        let (new, _) = stub_factory("memory");
        reg.register(old);
        reg.register(new);
        assert_eq!(reg.available_backends(), vec!["memory"]);
    }

    #[tokio::test]
    async fn create_calls_only_matching_factory() {
        let mut reg = StoreRegistry::new();
        let (memory, memory_called) = stub_factory("memory");
        let (fixture, fixture_called) = stub_factory("fixture");
        reg.register(memory);
        reg.register(fixture);

        let result = reg.create(&config("memory")).await;

        assert!(result.is_ok(), "expected Ok, got {:#?}", result.err());
        assert!(memory_called.load(Ordering::SeqCst));
        assert!(!fixture_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unknown_backend_names_requested_and_available_backends() {
        let mut reg = StoreRegistry::new();
        let (f, _) = stub_factory("memory");
        reg.register(f);

        match reg.create(&config("postgres")).await {
            Err(LookupError::Configuration(msg)) => {
                assert!(msg.contains("postgres"), "error should name the requested backend");
                assert!(msg.contains("memory"), "error should list available backends");
            }
            Err(other) => panic!("expected Configuration error, got {other:#?}"),
            Ok(_) => panic!("expected Configuration error, got a store"),
        }
    }

    #[tokio::test]
    async fn create_propagates_factory_error() {
        let mut reg = StoreRegistry::new();
        reg.register(Box::new(FailingFactory));

        let result = reg.create(&config("failing")).await;

        assert_eq!(
            result.err(),
            Some(LookupError::Backend("intentional failure".to_string()))
        );
    }
}
