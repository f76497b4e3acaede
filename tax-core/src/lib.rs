//! Progressive personal income tax: deduction resolution, bracket
//! computation and settlement against withholding.

pub mod admin;
pub mod api;
pub mod calculations;
pub mod error;
pub mod models;
pub mod provider;
pub mod service;

pub use admin::{AdjustableDeduction, AdminError, update_deduction};
pub use error::TaxError;
pub use models::*;
pub use provider::{
    DeductionProvider, DeductionStore, LookupError, RateProvider, StoreConfig, StoreFactory,
    StoreRegistry, TaxStore,
};
pub use service::TaxService;
