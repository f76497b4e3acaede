use std::io::Read;

use csv::StringRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tax_core::{DeductionProvider, RateProvider, TaxError, TaxRequest, TaxService};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while reading or computing a CSV batch.
///
/// The CSV variants carry fixed messages that callers show verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("invalid csv")]
    InvalidHeader,

    #[error("invalid csv have not totalIncome")]
    MissingTotalIncome,

    #[error("invalid csv have not value")]
    NoRows,

    #[error("invalid field {0}")]
    InvalidField(BatchColumn),

    #[error("failed to read csv")]
    Unreadable,

    #[error(transparent)]
    Tax(#[from] TaxError),
}

impl BatchError {
    /// True when the uploaded document or one of its rows was rejected.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Tax(err) => err.is_client_error(),
            _ => true,
        }
    }
}

/// Columns a batch document may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchColumn {
    TotalIncome,
    Wht,
    Donation,
    KReceipt,
}

impl BatchColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalIncome => "totalIncome",
            Self::Wht => "wht",
            Self::Donation => "donation",
            Self::KReceipt => "k-receipt",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "totalIncome" => Some(Self::TotalIncome),
            "wht" => Some(Self::Wht),
            "donation" => Some(Self::Donation),
            "k-receipt" => Some(Self::KReceipt),
            _ => None,
        }
    }
}

impl std::fmt::Display for BatchColumn {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of each known column within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchHeader {
    pub total_income: usize,
    pub wht: Option<usize>,
    pub donation: Option<usize>,
    pub k_receipt: Option<usize>,
}

impl BatchHeader {
    /// Reads the header record. Unknown or repeated names reject the whole
    /// document before the `totalIncome` check.
    pub fn from_record(record: &StringRecord) -> Result<Self, BatchError> {
        let mut total_income = None;
        let mut wht = None;
        let mut donation = None;
        let mut k_receipt = None;

        for (index, name) in record.iter().enumerate() {
            let column = BatchColumn::parse(name).ok_or(BatchError::InvalidHeader)?;
            let slot = match column {
                BatchColumn::TotalIncome => &mut total_income,
                BatchColumn::Wht => &mut wht,
                BatchColumn::Donation => &mut donation,
                BatchColumn::KReceipt => &mut k_receipt,
            };
            if slot.replace(index).is_some() {
                return Err(BatchError::InvalidHeader);
            }
        }

        Ok(Self {
            total_income: total_income.ok_or(BatchError::MissingTotalIncome)?,
            wht,
            donation,
            k_receipt,
        })
    }

    /// Builds a request from one data row.
    pub fn request(
        &self,
        row: &StringRecord,
    ) -> Result<TaxRequest, BatchError> {
        let total_income = field(row, self.total_income, BatchColumn::TotalIncome)?;
        let mut request = TaxRequest::new(total_income);

        if let Some(index) = self.wht {
            request = request.with_wht(field(row, index, BatchColumn::Wht)?);
        }
        for (position, column) in [
            (self.donation, BatchColumn::Donation),
            (self.k_receipt, BatchColumn::KReceipt),
        ] {
            if let Some(index) = position {
                request = request.with_allowance(column.as_str(), field(row, index, column)?);
            }
        }

        Ok(request)
    }
}

fn field(
    row: &StringRecord,
    index: usize,
    column: BatchColumn,
) -> Result<Decimal, BatchError> {
    row.get(index)
        .and_then(|value| {
            value
                .parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(value))
                .ok()
        })
        .ok_or(BatchError::InvalidField(column))
}

/// Parse a CSV batch into one request per data row.
///
/// The reader can be any type that implements `Read`, such as a file or a
/// byte slice. Whitespace around fields is ignored.
pub fn parse_batch<R: Read>(reader: R) -> Result<Vec<TaxRequest>, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let records = csv_reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            warn!(error = %e, "unreadable csv");
            BatchError::Unreadable
        })?;

    let (header, rows) = records.split_first().ok_or(BatchError::InvalidHeader)?;
    let header = BatchHeader::from_record(header)?;
    if rows.is_empty() {
        return Err(BatchError::NoRows);
    }

    let requests = rows
        .iter()
        .map(|row| header.request(row))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(rows = requests.len(), "csv batch parsed");
    Ok(requests)
}

/// One row of a batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTax {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_refund: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub taxes: Vec<BatchTax>,
}

/// Calculates every request and pairs each result with its gross income.
pub async fn compute_batch<P>(
    provider: &P,
    requests: &[TaxRequest],
) -> Result<BatchResponse, BatchError>
where
    P: RateProvider + DeductionProvider + ?Sized,
{
    let results = TaxService::new(provider).calculate_batch(requests).await?;
    let taxes = requests
        .iter()
        .zip(&results)
        .map(|(request, result)| BatchTax {
            total_income: request.total_income,
            tax: result.tax(),
            tax_refund: result.tax_refund(),
        })
        .collect();

    Ok(BatchResponse { taxes })
}
