// Typed failures for the stages whose errors callers need to tell apart.
// Storage and file errors stay as anyhow::Error with context, like db.rs.

use thiserror::Error;

/// Why the bank table could not be extracted from the source page
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("{url} answered with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("no element with id '{anchor_id}' in the page")]
    AnchorNotFound { anchor_id: String },

    #[error("no table follows the element with id '{anchor_id}'")]
    TableNotFound { anchor_id: String },

    #[error("invalid selector: {0}")]
    Selector(String),

    #[error("row {row} has no data cell at index {cell}")]
    MissingCell { row: usize, cell: usize },

    #[error("row {row} has a non-numeric market cap: '{value}'")]
    InvalidMarketCap { row: usize, value: String },
}

/// Why a dataset could not be converted into the target currencies
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("exchange rate for '{currency}' is missing")]
    MissingRate { currency: String },
}
