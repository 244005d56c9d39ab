use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayoutError {
    #[error("No layout spec found for company: {0}")]
    MissingLayoutSpec(String),

    #[error("No sheet id registered for logical table: {0}")]
    MissingSheetId(String),

    #[error("Worksheet not found: {0}")]
    WorksheetNotFound(String),

    #[error("Worksheet '{0}' has no rows")]
    EmptyWorksheet(String),

    #[error("Required column missing from source table: {0}")]
    MissingColumn(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Spreadsheet backend error: {0}")]
    Gateway(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PayoutError>;
