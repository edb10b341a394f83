use std::fs::File;

use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::{
    ArrowReaderMetadata, ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder,
};
use parquet::arrow::ProjectionMask;

use super::ReaderError;

/// Streaming iterator over record batches
///
/// Wraps the format-specific reader chosen at open time so that consumers
/// never branch on the format again.
pub struct RecordBatchIterator {
    inner: Box<dyn Iterator<Item = Result<RecordBatch, ReaderError>>>,
}

impl RecordBatchIterator {
    pub(crate) fn new<I, E>(iter: I) -> Self
    where
        I: Iterator<Item = Result<RecordBatch, E>> + 'static,
        E: Into<ReaderError>,
    {
        Self {
            inner: Box::new(iter.map(|r| r.map_err(Into::into))),
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            inner: Box::new(std::iter::empty()),
        }
    }
}

impl Iterator for RecordBatchIterator {
    type Item = Result<RecordBatch, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Reads a Parquet file one row group at a time.
///
/// Each row group gets its own reader built from shared footer metadata, so a
/// batch never spans two row groups.
pub(crate) struct ParquetRowGroups {
    file: File,
    metadata: ArrowReaderMetadata,
    mask: ProjectionMask,
    batch_size: usize,
    next_group: usize,
    current: Option<ParquetRecordBatchReader>,
}

impl ParquetRowGroups {
    pub(crate) fn new(
        file: File,
        metadata: ArrowReaderMetadata,
        mask: ProjectionMask,
        batch_size: usize,
    ) -> Self {
        Self {
            file,
            metadata,
            mask,
            batch_size,
            next_group: 0,
            current: None,
        }
    }

    fn open_group(&mut self, group: usize) -> Result<ParquetRecordBatchReader, ReaderError> {
        let reader = ParquetRecordBatchReaderBuilder::new_with_metadata(
            self.file.try_clone()?,
            self.metadata.clone(),
        )
        .with_projection(self.mask.clone())
        .with_row_groups(vec![group])
        .with_batch_size(self.batch_size)
        .build()?;
        Ok(reader)
    }
}

impl Iterator for ParquetRowGroups {
    type Item = Result<RecordBatch, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(reader) = self.current.as_mut() {
                match reader.next() {
                    Some(batch) => return Some(batch.map_err(ReaderError::from)),
                    None => self.current = None,
                }
            }

            if self.next_group >= self.metadata.metadata().num_row_groups() {
                return None;
            }
            let group = self.next_group;
            self.next_group += 1;
            log::debug!("Reading row group {}", group);
            match self.open_group(group) {
                Ok(reader) => self.current = Some(reader),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Yields zero-copy slices of one in-memory batch
pub(crate) struct BatchSlices {
    batch: RecordBatch,
    batch_size: usize,
    offset: usize,
}

impl BatchSlices {
    pub(crate) fn new(batch: RecordBatch, batch_size: usize) -> Self {
        Self {
            batch,
            batch_size: batch_size.max(1),
            offset: 0,
        }
    }
}

impl Iterator for BatchSlices {
    type Item = Result<RecordBatch, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.batch.num_rows() {
            return None;
        }
        let len = self.batch_size.min(self.batch.num_rows() - self.offset);
        let slice = self.batch.slice(self.offset, len);
        self.offset += len;
        Some(Ok(slice))
    }
}
