//! Copy requests and job reports

use std::path::PathBuf;
use tiercopy_types::{CopySummary, JobId, JobStatus, ProgressSnapshot, SourceKind};

/// Copy request containing all parameters for a copy operation
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CopyRequest {
    /// Source file or directory
    pub source: PathBuf,
    /// Destination file or directory
    pub destination: PathBuf,
    /// Source kind; detected from the filesystem when unset
    pub kind: Option<SourceKind>,
    /// Caller has confirmed overwriting an existing destination file
    pub overwrite: bool,
}

impl CopyRequest {
    /// Create a new copy request with default settings
    pub fn new<P1: Into<PathBuf>, P2: Into<PathBuf>>(source: P1, destination: P2) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            kind: None,
            overwrite: false,
        }
    }

    /// Set the source kind explicitly
    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Confirm (or withdraw confirmation for) overwriting an existing destination file
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Final report of a copy job
#[derive(Debug, Clone)]
pub struct CopyReport {
    /// Job ID
    pub job_id: JobId,
    /// Final status
    pub status: JobStatus,
    /// Per-file outcome counts; empty when the job failed
    pub summary: CopySummary,
    /// Progress as it stood when the job ended
    pub snapshot: ProgressSnapshot,
}

impl CopyReport {
    /// Check if the job completed
    pub fn is_success(&self) -> bool {
        matches!(self.status, JobStatus::Completed)
    }

    /// Check if the job was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self.status, JobStatus::Cancelled)
    }

    /// Check if the job failed
    pub fn is_failure(&self) -> bool {
        matches!(self.status, JobStatus::Failed(_))
    }
}
