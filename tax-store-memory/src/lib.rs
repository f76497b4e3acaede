//! In-memory tax table backend loaded from TOML.

mod factory;
mod store;
mod table;

pub use factory::{BUILTIN_SOURCE, MemoryStoreFactory, TABLE_PATH_ENV};
pub use store::MemoryStore;
pub use table::TaxTable;
