//! Core data types for tiercopy

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::format::format_eta;

const MIB: f64 = 1024.0 * 1024.0;

/// Unique identifier for a copy job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobId(Uuid);

impl JobId {
    /// Create a new random job ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a job copies one file or a whole tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SourceKind {
    /// A single regular file
    File,
    /// A directory copied recursively
    Directory,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// One file's copy task
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkItem {
    source: PathBuf,
    destination: PathBuf,
    size: u64,
}

impl WorkItem {
    /// Create a new work item
    pub fn new(source: PathBuf, destination: PathBuf, size: u64) -> Self {
        Self {
            source,
            destination,
            size,
        }
    }

    /// Source file path
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Destination file path
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Size in bytes observed at enumeration time
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Base name of the source file, used for status lines
    pub fn display_name(&self) -> String {
        self.source.file_name().map_or_else(
            || self.source.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
    }
}

/// The enumerated work of one copy run
#[derive(Debug, Clone)]
pub struct CopyJob {
    source_root: PathBuf,
    destination_root: PathBuf,
    kind: SourceKind,
    items: Vec<WorkItem>,
    total_bytes: u64,
}

impl CopyJob {
    /// Create a job from its work list; the byte total is computed here
    pub fn new<S, D>(
        source_root: S,
        destination_root: D,
        kind: SourceKind,
        items: Vec<WorkItem>,
    ) -> Self
    where
        S: Into<PathBuf>,
        D: Into<PathBuf>,
    {
        let total_bytes = items.iter().map(WorkItem::size).sum();
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
            kind,
            items,
            total_bytes,
        }
    }

    /// Root the items were enumerated from
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Root the items are copied into
    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Whether the job copies a file or a directory
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Work items in enumeration order
    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    /// Consume the job, keeping only its work list
    pub fn into_items(self) -> Vec<WorkItem> {
        self.items
    }

    /// Sum of all item sizes
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Number of work items
    pub fn file_count(&self) -> usize {
        self.items.len()
    }

    /// Whether there is nothing to copy
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of copying one work item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The file was written
    Copied {
        /// Bytes written
        bytes: u64,
    },
    /// The destination already matched by size and mtime
    Skipped,
    /// Cancellation was observed before the file finished
    Cancelled,
}

/// Aggregate result of a scheduler run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CopySummary {
    /// Files actually written
    pub files_copied: u64,
    /// Files satisfied by the identity shortcut
    pub files_skipped: u64,
    /// Whether the run stopped because of cancellation
    pub cancelled: bool,
    /// Size of the worker pool used for the concurrent phase
    pub workers: usize,
}

impl CopySummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one item's outcome into the summary
    pub fn record(&mut self, outcome: CopyOutcome) {
        match outcome {
            CopyOutcome::Copied { .. } => self.files_copied += 1,
            CopyOutcome::Skipped => self.files_skipped += 1,
            CopyOutcome::Cancelled => self.cancelled = true,
        }
    }

    /// Files copied plus files skipped
    pub fn files_processed(&self) -> u64 {
        self.files_copied + self.files_skipped
    }
}

/// Lifecycle state of a copy job
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JobStatus {
    /// Enumerating the source and creating directories
    Preparing,
    /// Copying
    Running,
    /// All items were copied or skipped
    Completed,
    /// Stopped by a cancel request
    Cancelled,
    /// Aborted by an error
    Failed(String),
}

impl JobStatus {
    /// Whether the job has finished, one way or another
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed(_))
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preparing => write!(f, "preparing"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Point-in-time view of a job's progress, sampled by an observer
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressSnapshot {
    /// Bytes written or skipped so far
    pub copied_bytes: u64,
    /// Bytes in the whole job
    pub total_bytes: u64,
    /// Items finished (copied or skipped)
    pub files_completed: u64,
    /// Items in the whole job
    pub files_total: u64,
    /// Wall time since the job started
    pub elapsed: Duration,
    /// Name of the file most recently started, for multi-file jobs
    pub current_file: Option<String>,
    /// Lifecycle state
    pub status: JobStatus,
    /// Human readable status line
    pub status_text: String,
}

impl ProgressSnapshot {
    /// Completion percentage in `0.0..=100.0`
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.copied_bytes as f64 / self.total_bytes as f64 * 100.0).min(100.0)
    }

    /// Average throughput since the start, in MiB/s
    pub fn throughput_mib_per_sec(&self) -> f64 {
        let seconds = self.elapsed.max(Duration::from_millis(1)).as_secs_f64();
        self.copied_bytes as f64 / MIB / seconds
    }

    /// Estimated time remaining, `None` when it cannot be estimated yet
    pub fn eta(&self) -> Option<Duration> {
        let throughput = self.throughput_mib_per_sec();
        if self.total_bytes == 0 || throughput <= 0.0 {
            return None;
        }
        let remaining = self.total_bytes.saturating_sub(self.copied_bytes) as f64 / MIB;
        Some(Duration::from_secs_f64(remaining / throughput))
    }

    /// ETA formatted for display, `-` when undefined
    pub fn eta_display(&self) -> String {
        self.eta().map_or_else(|| "-".to_string(), format_eta)
    }
}
