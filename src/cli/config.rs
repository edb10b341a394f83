//! TOML configuration file support.
//!
//! Everything the flags set can also come from a file; flags win:
//!
//! ```toml
//! # colbench.toml
//! [analysis]
//! kind = "three-body"
//! kaon_prob_min = 0.6
//!
//! [reader]
//! batch_size = 10000
//!
//! [run]
//! strategy = "explicit"
//! materialize = false
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use colbench::analysis::{AnalysisConfig, AnalysisKind};
use colbench::pipeline::Strategy;
use colbench::reader::ReaderConfig;

/// Root configuration structure for colbench.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Analysis selection and its parameters.
    pub analysis: Option<AnalysisConfig>,

    /// Reader settings.
    #[serde(default)]
    pub reader: ReaderConfig,

    /// Run settings.
    #[serde(default)]
    pub run: RunConfig,
}

/// Configuration of one benchmark run.
#[derive(Debug, Default, Deserialize)]
pub struct RunConfig {
    /// Execution strategy.
    pub strategy: Option<Strategy>,

    /// Read the whole file before analyzing it.
    pub materialize: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Analysis to run; a kind named on the command line replaces a file
    /// section of a different kind.
    pub fn analysis(&self, kind: Option<AnalysisKind>) -> AnalysisConfig {
        match (&self.analysis, kind) {
            (Some(config), Some(kind)) if config.kind() == kind => config.clone(),
            (_, Some(kind)) => AnalysisConfig::for_kind(kind),
            (Some(config), None) => config.clone(),
            (None, None) => AnalysisConfig::default(),
        }
    }
}
