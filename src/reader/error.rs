/// Errors that can occur during reading
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// ORC error
    #[error("ORC error: {0}")]
    OrcError(#[from] orc_rust::error::OrcError),

    /// Native ROOT decoding error
    #[error("ROOT error: {0}")]
    RootError(String),

    /// Column not found
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Column present with an element type or width other than declared
    #[error("Column {column} has type {found}, expected {expected}")]
    TypeMismatch {
        /// Column name
        column: String,
        /// Declared type
        expected: String,
        /// Type found in the source
        found: String,
    },

    /// List offsets inconsistent with the backing storage
    #[error("Corrupt list column {column} at row {row}: {detail}")]
    Corrupt {
        /// Column name
        column: String,
        /// Row index within the batch
        row: usize,
        /// What was inconsistent
        detail: String,
    },

    /// A row's list length differs from the arity the analysis requires
    #[error("Malformed entry in {column} at row {row}: expected {expected} elements, found {found}")]
    MalformedEntry {
        /// Column name
        column: String,
        /// Row index within the batch
        row: usize,
        /// Required number of elements
        expected: usize,
        /// Recorded number of elements
        found: usize,
    },
}

impl ReaderError {
    /// Whether this error is confined to a single entry
    pub fn is_entry_local(&self) -> bool {
        matches!(self, ReaderError::MalformedEntry { .. })
    }

    /// Whether this error describes the schema rather than the data
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            ReaderError::ColumnNotFound(_) | ReaderError::TypeMismatch { .. }
        )
    }
}
