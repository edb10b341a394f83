//! # Column Source
//!
//! Opens a columnar file in one of the supported layouts and yields its rows
//! as a finite, non-restartable sequence of Arrow record batches.
//!
//! ## Layouts
//!
//! - **ROOT**: the requested branches of one tree, decoded into a single
//!   full-file table and handed out in zero-copy slices
//! - **ORC**: one batch per stripe chunk, never spanning stripes
//! - **Parquet**: one reader per row group, so batches never span row groups
//! - **Table**: an in-memory table already fully read by other means
//!
//! The layout is resolved once at open time; every later step sees only
//! [`RecordBatch`]es behind a [`RecordBatchIterator`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use colbench::format::FormatDescriptor;
//! use colbench::reader::{ColumnSource, ReaderConfig};
//! use colbench::schema::{ColumnSpec, ElementType};
//!
//! let descriptor = FormatDescriptor::from_path("B2HHH.parquet")?;
//! let columns = [ColumnSpec::scalar("H1_PX", ElementType::Float64)];
//! let mut source = ColumnSource::open(&descriptor, &columns, &ReaderConfig::default())?;
//! while let Some(batch) = source.next_batch() {
//!     println!("{} rows", batch?.num_rows());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod batches;
mod config;
mod error;
mod open;
mod root;
mod summary;
pub(crate) mod utils;

#[cfg(test)]
mod tests;

pub use batches::RecordBatchIterator;
pub use config::ReaderConfig;
pub use error::ReaderError;
pub use summary::{inspect, SourceSummary};

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::format::FileFormat;

/// Where a source's batches come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    /// Streamed from a file of the given layout
    File(FileFormat),
    /// A table fully materialized in memory
    Table,
}

/// A columnar source yielding record batches
pub struct ColumnSource {
    origin: SourceOrigin,
    schema: SchemaRef,
    batches: RecordBatchIterator,
    batches_read: usize,
    rows_read: usize,
}

impl std::fmt::Debug for ColumnSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnSource")
            .field("origin", &self.origin)
            .field("schema", &self.schema)
            .field("batches_read", &self.batches_read)
            .field("rows_read", &self.rows_read)
            .finish_non_exhaustive()
    }
}

impl ColumnSource {
    pub(crate) fn new(origin: SourceOrigin, schema: SchemaRef, batches: RecordBatchIterator) -> Self {
        Self {
            origin,
            schema,
            batches,
            batches_read: 0,
            rows_read: 0,
        }
    }

    /// Schema of the projected columns
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Where this source reads from
    pub fn origin(&self) -> SourceOrigin {
        self.origin
    }

    /// Number of batches handed out so far
    pub fn batches_read(&self) -> usize {
        self.batches_read
    }

    /// Number of rows handed out so far
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Fetch the next batch, `None` once exhausted
    pub fn next_batch(&mut self) -> Option<Result<RecordBatch, ReaderError>> {
        let batch = self.batches.next()?;
        if let Ok(b) = &batch {
            self.batches_read += 1;
            self.rows_read += b.num_rows();
        }
        Some(batch)
    }
}

impl Iterator for ColumnSource {
    type Item = Result<RecordBatch, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch()
    }
}
