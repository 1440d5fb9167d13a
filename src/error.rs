use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconError {
    /// A required dataset or parameter is missing or empty. Reported before
    /// any computation starts.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// No column in the uploaded table could be mapped to a required logical
    /// field. Names the field and lists the columns present so the uploader
    /// can fix the spreadsheet.
    #[error("Required field '{field}' could not be mapped to any column. Columns present: {columns:?}")]
    Layout { field: String, columns: Vec<String> },
}

pub type Result<T> = std::result::Result<T, ReconError>;
