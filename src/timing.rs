//! Wall-clock instrumentation splitting a run into an init phase and an
//! analyze phase at the instant the first entry is materialized.

use std::cell::Cell;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

/// One-shot stamp of the first-entry instant.
///
/// Only the first call to [`FirstEntryMark::stamp`] records anything; later
/// calls are a cheap check of one cell.
#[derive(Debug, Default)]
pub struct FirstEntryMark {
    instant: Cell<Option<Instant>>,
}

impl FirstEntryMark {
    /// Unset mark
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current instant unless already set
    #[inline]
    pub fn stamp(&self) {
        if self.instant.get().is_none() {
            self.instant.set(Some(Instant::now()));
        }
    }

    /// Whether an entry has been observed
    pub fn is_set(&self) -> bool {
        self.instant.get().is_some()
    }

    /// The stamped instant, if any
    pub fn instant(&self) -> Option<Instant> {
        self.instant.get()
    }
}

/// Init and analyze durations of one run, in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimingRecord {
    /// Start of run until the first entry
    pub init_us: u64,
    /// First entry until the end of the run
    pub analyze_us: u64,
}

impl TimingRecord {
    /// Sum of both phases
    pub fn total_us(&self) -> u64 {
        self.init_us.saturating_add(self.analyze_us)
    }
}

impl fmt::Display for TimingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.init_us, self.analyze_us)
    }
}

/// Saturating whole microseconds
pub fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Started before the source is opened, finished after the last entry
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    /// Record the init instant
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Instant the stopwatch was started
    pub fn started_at(&self) -> Instant {
        self.start
    }

    /// Time elapsed since start
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Close the run.
    ///
    /// An unset mark is treated as stamped now, so a run that never saw an
    /// entry reports its whole duration as init and zero analyze time.
    pub fn finish(&self, mark: &FirstEntryMark) -> TimingRecord {
        let end = Instant::now();
        let first = mark.instant().unwrap_or(end).clamp(self.start, end);
        TimingRecord {
            init_us: micros(first.duration_since(self.start)),
            analyze_us: micros(end.duration_since(first)),
        }
    }
}
