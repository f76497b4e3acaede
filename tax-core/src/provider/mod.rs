pub mod factory;
pub mod repository;

pub use factory::{StoreConfig, StoreFactory, StoreRegistry};
pub use repository::{DeductionProvider, DeductionStore, LookupError, RateProvider, TaxStore};
