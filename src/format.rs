//! # Format Descriptor
//!
//! Identifies which physical layout a path refers to and where the column
//! projection for that layout comes from.
//!
//! | Suffix | Format | Chunking unit | Column names from |
//! |--------|--------|---------------|-------------------|
//! | `root` | [`FileFormat::Root`] | full tree | analysis configuration |
//! | `orc` | [`FileFormat::Orc`] | stripe | `<basename>_columns.txt` |
//! | `parquet` | [`FileFormat::Parquet`] | row group | `<basename>_columns.txt` |

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix appended to the basename to locate the sidecar column list.
pub const SIDECAR_SUFFIX: &str = "_columns.txt";

/// Errors raised while describing an input path
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The suffix does not name a supported layout
    #[error("Invalid file format: {0:?}")]
    UnknownSuffix(String),

    /// The sidecar column list could not be read or written
    #[error("Sidecar column list {path}: {source}")]
    Sidecar {
        /// Sidecar path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Physical layout of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Native ROOT file, row-oriented clusters of columnar branches
    Root,
    /// Compressed stripe-oriented ORC file
    Orc,
    /// Compressed row-group-oriented Parquet file
    Parquet,
}

impl FileFormat {
    /// Map a path suffix to a format
    pub fn from_suffix(suffix: &str) -> Result<Self, FormatError> {
        match suffix {
            "root" => Ok(FileFormat::Root),
            "orc" => Ok(FileFormat::Orc),
            "parquet" => Ok(FileFormat::Parquet),
            other => Err(FormatError::UnknownSuffix(other.to_string())),
        }
    }

    /// Canonical suffix of this format
    pub fn suffix(&self) -> &'static str {
        match self {
            FileFormat::Root => "root",
            FileFormat::Orc => "orc",
            FileFormat::Parquet => "parquet",
        }
    }

    /// Whether the column projection comes from a sidecar list
    pub fn uses_sidecar(&self) -> bool {
        !matches!(self, FileFormat::Root)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Split a path at its last `.` into `(basename, suffix)`.
///
/// A path without a dot yields the whole path as basename and an empty suffix.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('.') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => (path, ""),
    }
}

/// A resolved input path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Path as given
    pub path: PathBuf,
    /// Path without its suffix
    pub basename: String,
    /// Suffix after the last `.`
    pub suffix: String,
    /// Layout selected by the suffix
    pub format: FileFormat,
}

impl FormatDescriptor {
    /// Describe `path`, failing on an unknown suffix
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let text = path.to_string_lossy();
        let (basename, suffix) = split_path(&text);
        let format = FileFormat::from_suffix(suffix)?;
        Ok(Self {
            path: path.to_path_buf(),
            basename: basename.to_string(),
            suffix: suffix.to_string(),
            format,
        })
    }

    /// Location of the sidecar column list for this input
    pub fn sidecar_path(&self) -> PathBuf {
        sidecar_path(&self.basename)
    }
}

/// Location of the sidecar column list for `basename`
pub fn sidecar_path(basename: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", basename, SIDECAR_SUFFIX))
}

/// Split sidecar text into column names, in order of appearance
pub fn parse_column_names(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Read `<basename>_columns.txt`
pub fn read_column_names(basename: &str) -> Result<Vec<String>, FormatError> {
    let path = sidecar_path(basename);
    let text = fs::read_to_string(&path).map_err(|source| FormatError::Sidecar {
        path: path.clone(),
        source,
    })?;
    Ok(parse_column_names(&text))
}

/// Write one column name per line to `path`
pub fn write_column_names<P: AsRef<Path>, S: AsRef<str>>(
    path: P,
    names: &[S],
) -> Result<(), FormatError> {
    let path = path.as_ref();
    let wrap = |source| FormatError::Sidecar {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::File::create(path).map_err(wrap)?;
    for name in names {
        writeln!(file, "{}", name.as_ref()).map_err(wrap)?;
    }
    Ok(())
}
