//! Progress tracking for a running job
//!
//! Copiers on any worker thread report into a [`ProgressTracker`]; observers take
//! [`ProgressSnapshot`]s from it on their own schedule. Byte and file counters are
//! atomics and only ever grow.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tiercopy_io::ProgressSink;
use tiercopy_types::{JobStatus, ProgressSnapshot};

#[derive(Debug)]
struct TrackerState {
    status: JobStatus,
    status_text: String,
    current_file: Option<String>,
    finished_after: Option<Duration>,
}

/// Thread-safe accumulator of one job's progress
#[derive(Debug)]
pub struct ProgressTracker {
    copied_bytes: AtomicU64,
    files_completed: AtomicU64,
    total_bytes: AtomicU64,
    files_total: AtomicU64,
    track_current_file: AtomicBool,
    started_at: Instant,
    state: RwLock<TrackerState>,
}

impl ProgressTracker {
    /// Status line shown while the source is enumerated
    pub const PREPARING: &'static str = "Preparing...";
    /// Status line shown between a cancel request and the job's end
    pub const CANCELLING: &'static str = "Cancelling...";

    /// Create a tracker; the job clock starts now
    pub fn new() -> Self {
        Self {
            copied_bytes: AtomicU64::new(0),
            files_completed: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            files_total: AtomicU64::new(0),
            track_current_file: AtomicBool::new(false),
            started_at: Instant::now(),
            state: RwLock::new(TrackerState {
                status: JobStatus::Preparing,
                status_text: Self::PREPARING.to_string(),
                current_file: None,
                finished_after: None,
            }),
        }
    }

    /// Record the job's totals once enumeration is done
    ///
    /// The current file name is only kept for jobs with more than one file.
    pub fn set_totals(&self, total_bytes: u64, files_total: u64) {
        self.total_bytes.store(total_bytes, Ordering::Relaxed);
        self.files_total.store(files_total, Ordering::Relaxed);
        self.track_current_file.store(files_total > 1, Ordering::Relaxed);
    }

    /// Move to a non-terminal status
    pub fn set_status(&self, status: JobStatus, text: impl Into<String>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.status.is_terminal() {
            return;
        }
        state.status = status;
        state.status_text = text.into();
    }

    /// Replace the status line without changing the status
    ///
    /// Ignored once the job has finished.
    pub fn set_status_text(&self, text: impl Into<String>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.status.is_terminal() {
            state.status_text = text.into();
        }
    }

    /// Enter a terminal status and stop the clock
    pub fn finish(&self, status: JobStatus, text: impl Into<String>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.finished_after.is_none() {
            state.finished_after = Some(self.started_at.elapsed());
        }
        state.status = status;
        state.status_text = text.into();
    }

    /// Current status
    pub fn status(&self) -> JobStatus {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
            .clone()
    }

    /// Bytes reported so far
    pub fn copied_bytes(&self) -> u64 {
        self.copied_bytes.load(Ordering::Relaxed)
    }

    /// Files finished so far
    pub fn files_completed(&self) -> u64 {
        self.files_completed.load(Ordering::Relaxed)
    }

    /// Take a consistent-enough view for an observer
    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        ProgressSnapshot {
            copied_bytes: self.copied_bytes.load(Ordering::Relaxed),
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            files_completed: self.files_completed.load(Ordering::Relaxed),
            files_total: self.files_total.load(Ordering::Relaxed),
            elapsed: state
                .finished_after
                .unwrap_or_else(|| self.started_at.elapsed()),
            current_file: state.current_file.clone(),
            status: state.status.clone(),
            status_text: state.status_text.clone(),
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressTracker {
    fn add_bytes(&self, bytes: u64) {
        self.copied_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    fn increment_files(&self) {
        self.files_completed.fetch_add(1, Ordering::Relaxed);
    }

    fn set_current_file(&self, name: &str) {
        if !self.track_current_file.load(Ordering::Relaxed) {
            return;
        }
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.current_file = Some(name.to_string());
    }
}
