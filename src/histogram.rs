//! # Fixed-Width Histogram
//!
//! A 1D histogram of `N` equal-width bins over the half-open range `[lo, hi)`.
//! Values below `lo`, at or above `hi`, or NaN are counted in the flow
//! counters and never in any of the `N` bins.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors raised by histogram construction and export
#[derive(Debug, thiserror::Error)]
pub enum HistogramError {
    /// Bin count of zero
    #[error("Histogram {0} needs at least one bin")]
    NoBins(String),

    /// Empty or inverted range
    #[error("Histogram {name} has invalid range [{lo}, {hi})")]
    InvalidRange {
        /// Histogram name
        name: String,
        /// Lower edge
        lo: f64,
        /// Upper edge
        hi: f64,
    },

    /// I/O error during export
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV error during export
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON error during export
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Binning of a fixed-width histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binning {
    /// Histogram name
    pub name: String,
    /// Number of bins
    pub bins: usize,
    /// Lower edge (inclusive)
    pub lo: f64,
    /// Upper edge (exclusive)
    pub hi: f64,
}

impl Binning {
    /// New binning description
    pub fn new(name: impl Into<String>, bins: usize, lo: f64, hi: f64) -> Self {
        Self {
            name: name.into(),
            bins,
            lo,
            hi,
        }
    }
}

/// Fixed-width 1D histogram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram1D {
    name: String,
    lo: f64,
    hi: f64,
    counts: Vec<u64>,
    underflow: u64,
    overflow: u64,
    nan: u64,
}

impl Histogram1D {
    /// Create an empty histogram; needs `bins > 0` and `lo < hi`
    pub fn new(name: impl Into<String>, bins: usize, lo: f64, hi: f64) -> Result<Self, HistogramError> {
        let name = name.into();
        if bins == 0 {
            return Err(HistogramError::NoBins(name));
        }
        if !(lo < hi) || !lo.is_finite() || !hi.is_finite() {
            return Err(HistogramError::InvalidRange { name, lo, hi });
        }
        Ok(Self {
            name,
            lo,
            hi,
            counts: vec![0; bins],
            underflow: 0,
            overflow: 0,
            nan: 0,
        })
    }

    /// Create an empty histogram from a binning description
    pub fn from_binning(binning: &Binning) -> Result<Self, HistogramError> {
        Self::new(binning.name.clone(), binning.bins, binning.lo, binning.hi)
    }

    /// Bin index of `value`, `None` when outside `[lo, hi)` or NaN
    #[inline]
    pub fn find_bin(&self, value: f64) -> Option<usize> {
        let n = self.counts.len();
        let idx = ((value - self.lo) / (self.hi - self.lo) * n as f64).floor();
        if idx >= 0.0 && idx < n as f64 {
            Some(idx as usize)
        } else {
            None
        }
    }

    /// Count `value` in its bin
    #[inline]
    pub fn fill(&mut self, value: f64) {
        match self.find_bin(value) {
            Some(bin) => self.counts[bin] += 1,
            None if value.is_nan() => self.nan += 1,
            None if value < self.lo => self.underflow += 1,
            None => self.overflow += 1,
        }
    }

    /// Histogram name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of bins
    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    /// Lower edge
    pub fn lo(&self) -> f64 {
        self.lo
    }

    /// Upper edge
    pub fn hi(&self) -> f64 {
        self.hi
    }

    /// Per-bin counts
    pub fn bins(&self) -> &[u64] {
        &self.counts
    }

    /// Count of bin `i`
    pub fn bin_content(&self, i: usize) -> Option<u64> {
        self.counts.get(i).copied()
    }

    /// `[low, high)` edges of bin `i`
    pub fn bin_edges(&self, i: usize) -> Option<(f64, f64)> {
        if i >= self.counts.len() {
            return None;
        }
        let width = (self.hi - self.lo) / self.counts.len() as f64;
        Some((self.lo + width * i as f64, self.lo + width * (i + 1) as f64))
    }

    /// Values below `lo`
    pub fn underflow(&self) -> u64 {
        self.underflow
    }

    /// Values at or above `hi`
    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    /// NaN values, dropped from every bin
    pub fn dropped_nan(&self) -> u64 {
        self.nan
    }

    /// Sum of all in-range bins
    pub fn integral(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Every fill, in range or not
    pub fn entries(&self) -> u64 {
        self.integral() + self.underflow + self.overflow + self.nan
    }

    /// Write the histogram for an external renderer.
    ///
    /// `.csv` paths get one row per bin; anything else gets JSON.
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<(), HistogramError> {
        let path = path.as_ref();
        let is_csv = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv {
            self.write_csv(File::create(path)?)
        } else {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
            Ok(())
        }
    }

    /// Write `bin,low,high,count` rows
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), HistogramError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["bin", "low", "high", "count"])?;
        for (i, count) in self.counts.iter().enumerate() {
            if let Some((low, high)) = self.bin_edges(i) {
                csv.write_record(&[
                    i.to_string(),
                    low.to_string(),
                    high.to_string(),
                    count.to_string(),
                ])?;
            }
        }
        csv.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_validates() {
        assert!(matches!(
            Histogram1D::new("h", 0, 0.0, 1.0),
            Err(HistogramError::NoBins(_))
        ));
        assert!(matches!(
            Histogram1D::new("h", 10, 1.0, 1.0),
            Err(HistogramError::InvalidRange { .. })
        ));
        assert!(Histogram1D::new("h", 10, 2.0, 1.0).is_err());
        assert!(Histogram1D::new("h", 10, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_edges_are_half_open() {
        let mut h = Histogram1D::new("h", 10, 0.0, 10.0).unwrap();
        h.fill(0.0);
        h.fill(10.0);
        h.fill(-0.5);
        h.fill(9.999);
        assert_eq!(h.bin_content(0), Some(1));
        assert_eq!(h.bin_content(9), Some(1));
        assert_eq!(h.integral(), 2);
        assert_eq!(h.underflow(), 1);
        assert_eq!(h.overflow(), 1);
        assert_eq!(h.entries(), 4);
    }

    #[test]
    fn test_nan_dropped() {
        let mut h = Histogram1D::new("h", 4, 0.0, 1.0).unwrap();
        h.fill(f64::NAN);
        assert_eq!(h.integral(), 0);
        assert_eq!(h.dropped_nan(), 1);
        assert_eq!(h.underflow() + h.overflow(), 0);
    }

    #[test]
    fn test_dimuon_binning() {
        let h = Histogram1D::new("Dimuon_mass", 2000, 0.25, 300.0).unwrap();
        let value = 45.0;
        let expected = ((value - 0.25) / (300.0 - 0.25) * 2000.0_f64).floor() as usize;
        assert_eq!(h.find_bin(value), Some(expected));
        let (low, high) = h.bin_edges(expected).unwrap();
        assert!(low <= value && value < high);
    }

    #[test]
    fn test_export_csv_and_json() {
        let dir = tempdir().unwrap();
        let mut h = Histogram1D::new("B_mass", 5, 5050.0, 5500.0).unwrap();
        h.fill(5100.0);
        h.fill(5100.0);

        let csv_path = dir.path().join("h.csv");
        h.export(&csv_path).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "bin,low,high,count");
        assert!(lines[1].ends_with(",2"));

        let json_path = dir.path().join("h.json");
        h.export(&json_path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value["name"], "B_mass");
        assert_eq!(value["counts"][0], 2);
    }

    proptest! {
        #[test]
        fn prop_fill_counts_exactly_in_range(values in proptest::collection::vec(-10.0f64..20.0, 0..200)) {
            let mut h = Histogram1D::new("p", 7, 0.0, 10.0).unwrap();
            for &v in &values {
                h.fill(v);
            }
            let in_range = values.iter().filter(|&&v| (0.0..10.0).contains(&v)).count() as u64;
            prop_assert_eq!(h.integral(), in_range);
            prop_assert_eq!(h.entries(), values.len() as u64);
        }
    }
}
