use anyhow::{Context, Result};
use std::path::Path;

use colbench::format::{write_column_names, FormatDescriptor};
use colbench::reader::{inspect, ReaderConfig, SourceSummary};

fn summarize(input: &Path, reader: &ReaderConfig) -> Result<SourceSummary> {
    if !input.exists() {
        anyhow::bail!("File does not exist: {}", input.display());
    }
    let descriptor = FormatDescriptor::from_path(input)?;
    inspect(&descriptor, reader).with_context(|| format!("Failed to inspect {}", input.display()))
}

/// Print the top-level column names, or write them as a sidecar list
pub fn list_columns(input: &Path, reader: &ReaderConfig, output: Option<&Path>) -> Result<()> {
    let summary = summarize(input, reader)?;
    let names = summary.column_names();
    match output {
        Some(path) => {
            write_column_names(path, &names)?;
            log::info!("Wrote {} column names to {}", names.len(), path.display());
        }
        None => {
            for name in names {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

/// Print the number of entries
pub fn count_entries(input: &Path, reader: &ReaderConfig) -> Result<()> {
    let summary = summarize(input, reader)?;
    println!("{}", summary.entries);
    Ok(())
}

/// Print the storage summary
pub fn describe(input: &Path, reader: &ReaderConfig, json: bool) -> Result<()> {
    let summary = summarize(input, reader)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    #[cfg(feature = "colorized_output")]
    {
        print!("{}", summary.format_colored());
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        print!("{}", summary);
    }

    Ok(())
}
