//! JSON output structures for the tiercopy CLI

use serde::{Deserialize, Serialize};
use tiercopy_engine::{CopyReport, CopyRequest};
use tiercopy_types::JobStatus;

/// Complete JSON output for a copy job
#[derive(Debug, Serialize, Deserialize)]
pub struct CopyResultJson {
    /// Operation metadata
    pub metadata: OperationMetadata,
    /// Copy statistics
    pub copy_stats: CopyStatsJson,
    /// Overall result
    pub result: OperationResult,
}

/// Operation metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationMetadata {
    /// tiercopy version
    pub version: String,
    /// Job ID
    pub job_id: String,
    /// Source path
    pub source_path: String,
    /// Destination path
    pub destination_path: String,
}

/// Copy statistics in JSON format
#[derive(Debug, Serialize, Deserialize)]
pub struct CopyStatsJson {
    /// Files in the job
    pub files_total: u64,
    /// Files written
    pub files_copied: u64,
    /// Files left alone because they were unchanged
    pub files_skipped: u64,
    /// Bytes in the job
    pub bytes_total: u64,
    /// Bytes written or skipped
    pub bytes_copied: u64,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Average throughput in MiB/s
    pub throughput_mib_per_sec: f64,
    /// Worker pool size
    pub workers: usize,
}

/// Overall operation result
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationResult {
    /// `completed`, `cancelled` or `failed`
    pub status: String,
    /// Whether the job completed
    pub success: bool,
    /// Failure reason
    pub error: Option<String>,
}

impl CopyResultJson {
    /// Build the JSON view of a finished job
    pub fn from_report(request: &CopyRequest, report: &CopyReport) -> Self {
        let snapshot = &report.snapshot;
        let (status, error) = match &report.status {
            JobStatus::Failed(reason) => ("failed".to_string(), Some(reason.clone())),
            other => (other.to_string(), None),
        };

        Self {
            metadata: OperationMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                job_id: report.job_id.to_string(),
                source_path: request.source.display().to_string(),
                destination_path: request.destination.display().to_string(),
            },
            copy_stats: CopyStatsJson {
                files_total: snapshot.files_total,
                files_copied: report.summary.files_copied,
                files_skipped: report.summary.files_skipped,
                bytes_total: snapshot.total_bytes,
                bytes_copied: snapshot.copied_bytes,
                duration_ms: snapshot.elapsed.as_millis() as u64,
                throughput_mib_per_sec: snapshot.throughput_mib_per_sec(),
                workers: report.summary.workers,
            },
            result: OperationResult {
                status,
                success: report.is_success(),
                error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;
    use tiercopy_types::{CopySummary, JobId, ProgressSnapshot};

    fn report(status: JobStatus) -> CopyReport {
        CopyReport {
            job_id: JobId::new(),
            status: status.clone(),
            summary: CopySummary {
                files_copied: 2,
                files_skipped: 1,
                cancelled: false,
                workers: 8,
            },
            snapshot: ProgressSnapshot {
                copied_bytes: 300,
                total_bytes: 300,
                files_completed: 3,
                files_total: 3,
                elapsed: Duration::from_millis(1500),
                current_file: None,
                status,
                status_text: String::new(),
            },
        }
    }

    #[rstest]
    #[case(JobStatus::Completed, "completed", true, None)]
    #[case(JobStatus::Cancelled, "cancelled", false, None)]
    #[case(JobStatus::Failed("disk full".into()), "failed", false, Some("disk full"))]
    fn test_result_status(
        #[case] status: JobStatus,
        #[case] expected: &str,
        #[case] success: bool,
        #[case] error: Option<&str>,
    ) {
        let request = CopyRequest::new("/src", "/dst");
        let json = CopyResultJson::from_report(&request, &report(status));

        assert_eq!(json.result.status, expected);
        assert_eq!(json.result.success, success);
        assert_eq!(json.result.error.as_deref(), error);
    }

    #[test]
    fn test_serialized_fields() {
        let request = CopyRequest::new("/src", "/dst");
        let json = CopyResultJson::from_report(&request, &report(JobStatus::Completed));
        let value = serde_json::to_value(&json).unwrap();

        assert_eq!(value["copy_stats"]["files_copied"], 2);
        assert_eq!(value["copy_stats"]["files_skipped"], 1);
        assert_eq!(value["copy_stats"]["duration_ms"], 1500);
        assert_eq!(value["copy_stats"]["workers"], 8);
        assert_eq!(value["metadata"]["source_path"], "/src");
    }
}
