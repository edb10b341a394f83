use std::fmt;
use std::fs::File;

use orc_rust::ArrowReaderBuilder;
use parquet::file::reader::{FileReader, SerializedFileReader};
use serde::Serialize;

use crate::format::{FileFormat, FormatDescriptor};

use super::{root, ReaderConfig, ReaderError};

/// Storage-level summary of an input file
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    /// Input path
    pub path: String,
    /// Physical layout
    pub format: String,
    /// Number of entries (events)
    pub entries: u64,
    /// Number of native chunks (row groups, stripes; 1 for ROOT trees)
    pub chunks: usize,
    /// Size on disk in bytes
    pub file_size: u64,
    /// Top-level columns with their stored types
    pub columns: Vec<(String, String)>,
}

impl SourceSummary {
    /// Column names in storage order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Format the summary with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use console::style;

            let mut output = String::new();
            output.push_str(&format!("{}\n", style("Source Summary").bold().cyan()));
            output.push_str(&format!("{}\n", style("==============").cyan()));
            output.push_str(&format!("{}: {}\n", style("File").bold(), self.path));
            output.push_str(&format!("{}: {}\n", style("Format").bold(), style(&self.format).green()));
            output.push_str(&format!("{}: {}\n", style("Entries").bold(), style(self.entries).yellow()));
            output.push_str(&format!("{}: {}\n", style("Chunks").bold(), self.chunks));
            output.push_str(&format!("{}: {} bytes\n", style("File size").bold(), self.file_size));
            output.push_str(&format!("{}:\n", style("Columns").bold()));
            for (i, (name, ty)) in self.columns.iter().enumerate() {
                output.push_str(&format!("  {:3}. {} ({})\n", i + 1, name, style(ty).dim()));
            }
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for SourceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source Summary")?;
        writeln!(f, "==============")?;
        writeln!(f, "File: {}", self.path)?;
        writeln!(f, "Format: {}", self.format)?;
        writeln!(f, "Entries: {}", self.entries)?;
        writeln!(f, "Chunks: {}", self.chunks)?;
        writeln!(f, "File size: {} bytes", self.file_size)?;
        writeln!(f, "Columns:")?;
        for (i, (name, ty)) in self.columns.iter().enumerate() {
            writeln!(f, "  {:3}. {} ({})", i + 1, name, ty)?;
        }
        Ok(())
    }
}

/// Summarize a file without running any analysis
pub fn inspect(
    descriptor: &FormatDescriptor,
    config: &ReaderConfig,
) -> Result<SourceSummary, ReaderError> {
    let file_size = std::fs::metadata(&descriptor.path)?.len();
    let path = descriptor.path.display().to_string();
    let format = descriptor.format.to_string();

    let (entries, chunks, columns) = match descriptor.format {
        FileFormat::Parquet => {
            let reader = SerializedFileReader::new(File::open(&descriptor.path)?)?;
            let metadata = reader.metadata();
            let file_meta = metadata.file_metadata();
            let schema = parquet::arrow::parquet_to_arrow_schema(
                file_meta.schema_descr(),
                file_meta.key_value_metadata(),
            )?;
            let columns = schema
                .fields()
                .iter()
                .map(|f| (f.name().clone(), f.data_type().to_string()))
                .collect();
            (
                file_meta.num_rows().max(0) as u64,
                metadata.num_row_groups(),
                columns,
            )
        }
        FileFormat::Orc => {
            let builder = ArrowReaderBuilder::try_new(File::open(&descriptor.path)?)?;
            let entries = builder.file_metadata().number_of_rows();
            let chunks = builder.file_metadata().stripe_metadatas().len();
            let columns = builder
                .schema()
                .fields()
                .iter()
                .map(|f| (f.name().clone(), f.data_type().to_string()))
                .collect();
            (entries, chunks, columns)
        }
        FileFormat::Root => {
            let (entries, columns) = root::describe_tree(&descriptor.path, config.tree.as_deref())?;
            (entries.max(0) as u64, 1, columns)
        }
    };

    Ok(SourceSummary {
        path,
        format,
        entries,
        chunks,
        file_size,
        columns,
    })
}
