use serde::Deserialize;

/// Configuration for reading columnar sources
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Maximum number of rows per batch
    pub batch_size: usize,
    /// Tree to read from native ROOT files; the single tree in the file when unset
    pub tree: Option<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 65536,
            tree: None,
        }
    }
}

impl ReaderConfig {
    /// Set the tree name
    pub fn with_tree(mut self, tree: impl Into<String>) -> Self {
        self.tree = Some(tree.into());
        self
    }

    /// Set the batch size, clamped to at least one row
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Rows per batch handed to the readers; a zero from a config file reads
    /// as one
    pub fn batch_rows(&self) -> usize {
        self.batch_size.max(1)
    }
}
