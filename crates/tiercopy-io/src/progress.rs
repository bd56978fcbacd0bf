//! Progress reporting seam between copiers and the tracker

/// Receives progress from copiers running on any thread
pub trait ProgressSink: Send + Sync {
    /// Record `bytes` more bytes as done
    fn add_bytes(&self, bytes: u64);

    /// Record one more finished file
    fn increment_files(&self);

    /// Note the file a copier has just started
    fn set_current_file(&self, name: &str);
}

/// A sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn add_bytes(&self, _bytes: u64) {}

    fn increment_files(&self) {}

    fn set_current_file(&self, _name: &str) {}
}
