use std::fs::File;

use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use orc_rust::projection::ProjectionMask as OrcProjectionMask;
use orc_rust::ArrowReaderBuilder;
use parquet::arrow::arrow_reader::{ArrowReaderMetadata, ArrowReaderOptions};
use parquet::arrow::ProjectionMask;

use crate::format::{FileFormat, FormatDescriptor};
use crate::schema::ColumnSpec;

use super::batches::{BatchSlices, ParquetRowGroups};
use super::utils::{check_columns, root_indices};
use super::{root, ColumnSource, ReaderConfig, ReaderError, RecordBatchIterator, SourceOrigin};

impl ColumnSource {
    /// Open a columnar file, reading exactly the declared columns
    pub fn open(
        descriptor: &FormatDescriptor,
        columns: &[ColumnSpec],
        config: &ReaderConfig,
    ) -> Result<Self, ReaderError> {
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        Self::open_projected(descriptor, columns, &names, config)
    }

    /// Open a columnar file with an explicit projection.
    ///
    /// `projection` lists the top-level columns to read; declared `columns`
    /// missing from it are added. The native format reads only the declared
    /// columns. Every declared column is type-checked before the first batch.
    pub fn open_projected<S: AsRef<str>>(
        descriptor: &FormatDescriptor,
        columns: &[ColumnSpec],
        projection: &[S],
        config: &ReaderConfig,
    ) -> Result<Self, ReaderError> {
        let mut names: Vec<String> = projection.iter().map(|s| s.as_ref().to_string()).collect();
        for column in columns {
            if !names.contains(&column.name) {
                names.push(column.name.clone());
            }
        }

        log::info!(
            "Opening {} as {} ({} columns)",
            descriptor.path.display(),
            descriptor.format,
            names.len()
        );

        let source = match descriptor.format {
            FileFormat::Root => Self::open_root(descriptor, columns, config)?,
            FileFormat::Orc => Self::open_orc(descriptor, &names, config)?,
            FileFormat::Parquet => Self::open_parquet(descriptor, &names, config)?,
        };
        check_columns(&source.schema, columns)?;
        Ok(source)
    }

    fn open_parquet(
        descriptor: &FormatDescriptor,
        names: &[String],
        config: &ReaderConfig,
    ) -> Result<Self, ReaderError> {
        let file = File::open(&descriptor.path)?;
        let metadata = ArrowReaderMetadata::load(&file, ArrowReaderOptions::default())?;

        let field_names: Vec<String> = metadata
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        let indices = root_indices(&field_names, names)?;
        let schema = SchemaRef::new(metadata.schema().project(&indices)?);
        let mask = ProjectionMask::roots(metadata.parquet_schema(), indices);

        log::debug!(
            "Parquet file has {} row groups",
            metadata.metadata().num_row_groups()
        );
        let row_groups = ParquetRowGroups::new(file, metadata, mask, config.batch_rows());
        Ok(Self::new(
            SourceOrigin::File(FileFormat::Parquet),
            schema,
            RecordBatchIterator::new(row_groups),
        ))
    }

    fn open_orc(
        descriptor: &FormatDescriptor,
        names: &[String],
        config: &ReaderConfig,
    ) -> Result<Self, ReaderError> {
        let file = File::open(&descriptor.path)?;
        let builder = ArrowReaderBuilder::try_new(file)?;
        log::debug!(
            "ORC file has {} stripes",
            builder.file_metadata().stripe_metadatas().len()
        );

        let mask = OrcProjectionMask::named_roots(builder.file_metadata().root_data_type(), names);
        let builder = builder
            .with_projection(mask)
            .with_batch_size(config.batch_rows());
        let schema = builder.schema();
        let reader = builder.build();
        let field_names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
        root_indices(&field_names, names)?;

        Ok(Self::new(
            SourceOrigin::File(FileFormat::Orc),
            schema,
            RecordBatchIterator::new(reader),
        ))
    }

    fn open_root(
        descriptor: &FormatDescriptor,
        columns: &[ColumnSpec],
        config: &ReaderConfig,
    ) -> Result<Self, ReaderError> {
        let table = root::read_tree(&descriptor.path, config.tree.as_deref(), columns)?;
        let schema = table.schema();
        Ok(Self::new(
            SourceOrigin::File(FileFormat::Root),
            schema,
            RecordBatchIterator::new(BatchSlices::new(table, config.batch_rows())),
        ))
    }

    /// Build a source over a table already fully materialized in memory.
    ///
    /// The batches are concatenated and yielded as a single batch.
    pub fn from_table(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self, ReaderError> {
        let total: usize = batches.iter().map(RecordBatch::num_rows).sum();
        let iter = if total == 0 {
            RecordBatchIterator::empty()
        } else {
            let table = concat_batches(&schema, batches)?;
            RecordBatchIterator::new(std::iter::once(Ok::<_, ReaderError>(table)))
        };
        Ok(Self::new(SourceOrigin::Table, schema, iter))
    }

    /// Read every remaining batch and return an in-memory table source
    pub fn materialize(self) -> Result<Self, ReaderError> {
        let schema = self.schema.clone();
        let batches = self.collect::<Result<Vec<_>, _>>()?;
        log::debug!("Materialized {} batches", batches.len());
        Self::from_table(schema, &batches)
    }
}
