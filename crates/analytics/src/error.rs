use thiserror::Error;

/// The metric calculations themselves never fail; only exporting can.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Failed to write CSV record: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to flush export output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
