use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tax_core::{DeductionPolicy, DeductionProvider, DeductionStore, LookupError, RateProvider, TaxBracket};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::table::TaxTable;

const READ_ONLY: &str = "built-in tax table is read-only; pass --table <file>";

/// Tax table held in memory.
///
/// A store opened from a file writes deduction updates back to that file.
/// One built from a [`TaxTable`] value is read-only: an update there would
/// not outlive the process.
pub struct MemoryStore {
    table: RwLock<TaxTable>,
    origin: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new(table: TaxTable) -> Self {
        Self {
            table: RwLock::new(table),
            origin: None,
        }
    }

    /// Reads and validates the table at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LookupError> {
        let path = path.into();
        let source = tokio::fs::read_to_string(&path).await.map_err(|e| {
            LookupError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        let table = TaxTable::from_toml_str(&source)?;
        info!(
            path = %path.display(),
            brackets = table.brackets.len(),
            deductions = table.deductions.len(),
            "tax table loaded"
        );

        Ok(Self {
            table: RwLock::new(table),
            origin: Some(path),
        })
    }

    /// File that updates are written to, if any.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Copy of the current table.
    pub async fn snapshot(&self) -> TaxTable {
        self.table.read().await.clone()
    }
}

#[async_trait]
impl RateProvider for MemoryStore {
    async fn get_brackets(&self) -> Result<Vec<TaxBracket>, LookupError> {
        Ok(self.table.read().await.brackets.clone())
    }
}

#[async_trait]
impl DeductionProvider for MemoryStore {
    async fn get_deduction(
        &self,
        deduction_type: &str,
    ) -> Result<DeductionPolicy, LookupError> {
        self.table
            .read()
            .await
            .deduction(deduction_type)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(deduction_type.to_string()))
    }
}

#[async_trait]
impl DeductionStore for MemoryStore {
    async fn set_deduction_amount(
        &self,
        deduction_type: &str,
        amount: Decimal,
    ) -> Result<(), LookupError> {
        let mut table = self.table.write().await;
        let previous = table
            .deduction(deduction_type)
            .map(|policy| policy.amount)
            .ok_or_else(|| LookupError::NotFound(deduction_type.to_string()))?;

        let Some(path) = &self.origin else {
            return Err(LookupError::Configuration(READ_ONLY.to_string()));
        };

        let mut updated = table.clone();
        if let Some(policy) = updated.deduction_mut(deduction_type) {
            policy.amount = amount;
        }

        let encoded = updated.to_toml_string()?;
        tokio::fs::write(path, encoded).await.map_err(|e| {
            LookupError::Backend(format!("failed to write {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "tax table written");

        *table = updated;
        info!(deduction = deduction_type, %previous, %amount, "deduction amount stored");
        Ok(())
    }
}
