use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use rust_decimal::Decimal;
use serde::Serialize;
use tax_core::api::{DeductionUpdated, TaxResponse};
use tax_core::{
    AdjustableDeduction, AdminError, StoreConfig, StoreRegistry, TaxError, TaxRequest, TaxService,
    TaxStore, update_deduction,
};
use tax_data::{BatchError, BatchResponse, compute_batch, parse_batch};
use tax_store_memory::MemoryStoreFactory;
use thiserror::Error;
use tracing::{debug, info};

/// Failure of a CLI command, split by who is at fault.
#[derive(Debug, Error)]
pub enum AppError {
    /// The input was rejected. The message is shown as is.
    #[error("{0}")]
    Rejected(String),

    #[error("{0:#}")]
    Failed(anyhow::Error),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Rejected(_) => 2,
            Self::Failed(_) => 1,
        }
    }

    /// Domain errors already render their cause, so only the message is kept.
    fn classify(
        client: bool,
        err: impl std::fmt::Display,
    ) -> Self {
        if client {
            Self::Rejected(err.to_string())
        } else {
            Self::Failed(anyhow::Error::msg(err.to_string()))
        }
    }
}

impl From<TaxError> for AppError {
    fn from(err: TaxError) -> Self {
        Self::classify(err.is_client_error(), err)
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        Self::classify(err.is_client_error(), err)
    }
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        Self::classify(err.is_client_error(), err)
    }
}

/// Where a command reads its document from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Stdin, Self::File)
    }

    fn open(&self) -> Result<Box<dyn Read>, AppError> {
        match self {
            Self::Stdin => Ok(Box::new(io::stdin())),
            Self::File(path) => File::open(path)
                .map(|file| Box::new(file) as Box<dyn Read>)
                .with_context(|| format!("failed to open {}", path.display()))
                .map_err(AppError::Failed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Calculate(Input),
    Batch(Input),
    SetDeduction {
        target: AdjustableDeduction,
        amount: Decimal,
    },
}

/// Registry with every backend this binary ships.
pub fn build_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::new();
    registry.register(Box::new(MemoryStoreFactory));
    registry
}

/// Calculates tax for one JSON request.
pub async fn calculate<R: Read>(
    store: &dyn TaxStore,
    input: R,
) -> Result<TaxResponse, AppError> {
    let request: TaxRequest = serde_json::from_reader(input).map_err(|e| {
        debug!(error = %e, "undecodable request");
        AppError::Rejected("invalid request".to_string())
    })?;
    let result = TaxService::new(store).calculate(&request).await?;
    Ok(TaxResponse::from(&result))
}

/// Calculates tax for every row of a CSV document.
pub async fn batch<R: Read>(
    store: &dyn TaxStore,
    input: R,
) -> Result<BatchResponse, AppError> {
    let requests = parse_batch(input)?;
    Ok(compute_batch(store, &requests).await?)
}

pub async fn set_deduction(
    store: &dyn TaxStore,
    target: AdjustableDeduction,
    amount: Decimal,
) -> Result<DeductionUpdated, AppError> {
    let policy = update_deduction(store, target, amount).await?;
    Ok(DeductionUpdated::new(target, policy.amount))
}

/// Opens the configured store, runs `action` and returns its JSON output.
pub async fn run(
    config: &StoreConfig,
    action: Action,
) -> Result<String, AppError> {
    let store = build_registry()
        .create(config)
        .await
        .context("failed to open tax table")
        .map_err(AppError::Failed)?;
    info!(backend = %config.backend, ?action, "running command");

    match action {
        Action::Calculate(input) => to_json(&calculate(&*store, input.open()?).await?),
        Action::Batch(input) => to_json(&batch(&*store, input.open()?).await?),
        Action::SetDeduction { target, amount } => {
            to_json(&set_deduction(&*store, target, amount).await?)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .context("failed to encode response")
        .map_err(AppError::Failed)
}
