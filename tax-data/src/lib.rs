//! CSV batch input for the tax calculator.

pub mod batch;

pub use batch::{BatchColumn, BatchError, BatchHeader, BatchResponse, BatchTax, compute_batch, parse_batch};
