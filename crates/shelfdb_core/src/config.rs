//! Database configuration.

/// How `truncate` reacts to documents inserted while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncateMode {
    /// Remove the documents present when truncate started; later inserts
    /// survive.
    #[default]
    Snapshot,
    /// Fail with `ConcurrentModification` when the document count moves in
    /// a way truncate did not cause.
    Strict,
}

/// Configuration for a database and the collections it creates.
#[derive(Debug, Clone)]
pub struct Config {
    /// Emit a warning when an unindexed query scans more documents than this.
    pub scan_warning_threshold: usize,

    /// Truncate discipline.
    pub truncate_mode: TruncateMode,

    /// First id handed out to collections created without an explicit id.
    pub first_collection_id: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_warning_threshold: 1000,
            truncate_mode: TruncateMode::Snapshot,
            first_collection_id: 1,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the full-scan warning threshold.
    #[must_use]
    pub const fn scan_warning_threshold(mut self, value: usize) -> Self {
        self.scan_warning_threshold = value;
        self
    }

    /// Sets the truncate discipline.
    #[must_use]
    pub const fn truncate_mode(mut self, mode: TruncateMode) -> Self {
        self.truncate_mode = mode;
        self
    }

    /// Sets the first automatically assigned collection id.
    #[must_use]
    pub const fn first_collection_id(mut self, id: u64) -> Self {
        self.first_collection_id = id;
        self
    }
}
