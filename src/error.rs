//! Error handling for the candidate screener

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Model service returned {status}: {body}")]
    ModelStatus { status: u16, body: String },

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Report error: {0}")]
    Report(#[from] csv::Error),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),

    #[error("Batch cancelled")]
    Cancelled,
}

impl ScreenerError {
    /// Whether a retry of the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ScreenerError::Network(_) => true,
            ScreenerError::ModelStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScreenerError>;

impl From<reqwest::Error> for ScreenerError {
    fn from(err: reqwest::Error) -> Self {
        ScreenerError::Network(err.to_string())
    }
}
