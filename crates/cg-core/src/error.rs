use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Missing column: {name}")]
    MissingColumn { name: String },

    #[error("Duplicate column: {name}")]
    DuplicateColumn { name: String },

    #[error("Row length mismatch: expected {expected} values, got {got}")]
    RowLength { expected: usize, got: usize },

    #[error("Cannot parse '{value}' in column '{column}' as a number")]
    Parse { column: String, value: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// True when the error describes a table whose shape or columns do not
    /// match what the caller asked for.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            CoreError::MissingColumn { .. }
                | CoreError::DuplicateColumn { .. }
                | CoreError::RowLength { .. }
        )
    }
}
