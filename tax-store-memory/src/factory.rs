use std::path::PathBuf;

use async_trait::async_trait;
use tax_core::{LookupError, StoreConfig, StoreFactory, TaxStore};
use tracing::debug;

use crate::store::MemoryStore;
use crate::table::TaxTable;

/// Environment variable naming the tax table file.
pub const TABLE_PATH_ENV: &str = "TAX_TABLE_PATH";

/// Source value that always selects the compiled-in table.
pub const BUILTIN_SOURCE: &str = ":builtin:";

const DEFAULT_TABLE_FILE: &str = "tax-table.toml";

/// Resolve which table file to open, if any.
///
/// Resolution order:
/// 1. **`configured`**, the store config's source, unless empty.
/// 2. **`TAX_TABLE_PATH`** if set and non-empty.
/// 3. **`./tax-table.toml`** if it exists in the current working directory.
///
/// `None` means the built-in table.
fn table_path(configured: &str) -> Option<PathBuf> {
    if configured == BUILTIN_SOURCE {
        return None;
    }
    if !configured.is_empty() {
        return Some(PathBuf::from(configured));
    }
    if let Ok(path) = std::env::var(TABLE_PATH_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    let cwd_table = PathBuf::from(".").join(DEFAULT_TABLE_FILE);
    if cwd_table.is_file() {
        return Some(cwd_table);
    }
    None
}

/// [`StoreFactory`] for the in-memory backend.
///
/// Register this with a [`tax_core::StoreRegistry`] to make the `"memory"`
/// backend available:
///
/// ```rust
/// use tax_core::StoreRegistry;
/// use tax_store_memory::MemoryStoreFactory;
///
/// let mut registry = StoreRegistry::new();
/// registry.register(Box::new(MemoryStoreFactory));
/// assert_eq!(registry.available_backends(), vec!["memory"]);
/// ```
pub struct MemoryStoreFactory;

#[async_trait]
impl StoreFactory for MemoryStoreFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    /// Open the table named by `config.source`.
    ///
    /// Accepted source values:
    /// * A file path, e.g. `"tax-table.toml"`. Deduction updates are written
    ///   back to it.
    /// * `":builtin:"`, the compiled-in table.
    /// * Empty, which falls back to `TAX_TABLE_PATH`, then
    ///   `./tax-table.toml`, then the built-in table.
    async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Box<dyn TaxStore>, LookupError> {
        let store = match table_path(&config.source) {
            Some(path) => MemoryStore::open(path).await?,
            None => {
                debug!("using built-in tax table");
                MemoryStore::new(TaxTable::builtin()?)
            }
        };
        Ok(Box::new(store))
    }
}
