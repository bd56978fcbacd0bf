//! Main copy engine implementation

use crate::{
    monitor::ProgressTracker,
    scheduler::{PoolLease, ScheduleCoordinator, SchedulerConfig},
    task::{CopyReport, CopyRequest},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiercopy_config::{Config, ConfigLoader};
use tiercopy_io::{create_destination_dirs, enumerate, resolve_file_destination};
use tiercopy_types::{
    Cancellable, CopyJob, CopySummary, Error, JobId, JobStatus, ProgressSnapshot, Result,
    SourceKind,
};
use tokio::fs;
use tokio::sync::{watch, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Handle to a started job, cheap to clone
///
/// Observers poll it for snapshots; any clone may cancel the job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: JobId,
    cancel: CancellationToken,
    tracker: Arc<ProgressTracker>,
    report: watch::Receiver<Option<CopyReport>>,
}

impl JobHandle {
    /// Job ID
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Current progress
    pub fn poll(&self) -> ProgressSnapshot {
        self.tracker.snapshot()
    }

    /// Wait for the job to end and return its report
    pub async fn wait(&self) -> Result<CopyReport> {
        let mut report = self.report.clone();
        let done = report
            .wait_for(Option::is_some)
            .await
            .map_err(|_| Error::other(format!("Job {} ended without a report", self.id)))?;
        done.clone()
            .ok_or_else(|| Error::other(format!("Job {} ended without a report", self.id)))
    }
}

impl Cancellable for JobHandle {
    fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            info!("Cancelling job {}", self.id);
            self.tracker.set_status_text(ProgressTracker::CANCELLING);
        }
        self.cancel.cancel();
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Main copy engine; runs at most one job at a time
#[derive(Debug, Clone)]
pub struct CopyEngine {
    config: Arc<Config>,
    scheduler_config: SchedulerConfig,
    job_slot: Arc<Semaphore>,
}

impl CopyEngine {
    /// Create a new copy engine from the default configuration sources
    pub fn new() -> Result<Self> {
        let config = ConfigLoader::load_default()?;
        Ok(Self::with_config(config))
    }

    /// Create a new copy engine with custom configuration
    pub fn with_config(config: Config) -> Self {
        let scheduler_config = SchedulerConfig::from_config(&config);
        debug!(
            "Copy engine initialized with {} hardware threads",
            scheduler_config.available_parallelism
        );
        Self {
            config: Arc::new(config),
            scheduler_config,
            job_slot: Arc::new(Semaphore::new(1)),
        }
    }

    /// Replace the scheduler configuration
    pub fn with_scheduler_config(mut self, scheduler_config: SchedulerConfig) -> Self {
        self.scheduler_config = scheduler_config;
        self
    }

    /// Get the engine's configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether no job, or leftover copy of a cancelled job, is running
    pub fn is_idle(&self) -> bool {
        self.job_slot.available_permits() > 0
    }

    /// Wait until the previous job has fully wound down
    pub async fn wait_idle(&self) {
        // The slot semaphore is never closed
        let _ = self.job_slot.acquire().await;
    }

    /// Validate `request` and start copying in the background
    ///
    /// Fails with [`Error::JobInProgress`] while a previous job still holds the worker
    /// pool, and with [`Error::DestinationExists`] when a single file would overwrite an
    /// existing file and the request does not confirm it.
    pub async fn start_copy(&self, request: CopyRequest) -> Result<JobHandle> {
        let permit = Arc::clone(&self.job_slot)
            .try_acquire_owned()
            .map_err(|_| Error::JobInProgress)?;

        let kind = validate(&request).await?;

        let id = JobId::new();
        let cancel = CancellationToken::new();
        let tracker = Arc::new(ProgressTracker::new());
        let (report_tx, report_rx) = watch::channel(None);

        info!(
            "Starting job {}: {} {} -> {}",
            id,
            kind,
            request.source.display(),
            request.destination.display()
        );

        let job = JobRun {
            id,
            source: request.source,
            destination: request.destination,
            kind,
            cancel: cancel.clone(),
            tracker: Arc::clone(&tracker),
            scheduler_config: self.scheduler_config.clone(),
            lease: PoolLease::new(permit),
        };
        tokio::spawn(async move {
            let report = job.run().await;
            report_tx.send_replace(Some(report));
        });

        Ok(JobHandle {
            id,
            cancel,
            tracker,
            report: report_rx,
        })
    }

    /// Sample a job's progress
    pub fn poll(&self, handle: &JobHandle) -> ProgressSnapshot {
        handle.poll()
    }

    /// Request cancellation of a job; idempotent
    pub fn cancel(&self, handle: &JobHandle) {
        handle.cancel();
    }

    /// Wait for a job to end
    pub async fn wait(&self, handle: &JobHandle) -> Result<CopyReport> {
        handle.wait().await
    }

    /// Start a job and wait for its report
    pub async fn execute(&self, request: CopyRequest) -> Result<CopyReport> {
        let handle = self.start_copy(request).await?;
        handle.wait().await
    }
}

/// Everything a background job owns
struct JobRun {
    id: JobId,
    source: PathBuf,
    destination: PathBuf,
    kind: SourceKind,
    cancel: CancellationToken,
    tracker: Arc<ProgressTracker>,
    scheduler_config: SchedulerConfig,
    lease: PoolLease,
}

impl JobRun {
    async fn run(self) -> CopyReport {
        let Self {
            id,
            source,
            destination,
            kind,
            cancel,
            tracker,
            scheduler_config,
            lease,
        } = self;

        // `None` when there was nothing to copy
        let outcome: Result<Option<CopySummary>> = async {
            let job = prepare(source, destination, kind).await?;
            if cancel.is_cancelled() {
                return Ok(Some(CopySummary {
                    cancelled: true,
                    ..CopySummary::default()
                }));
            }

            tracker.set_totals(job.total_bytes(), job.file_count() as u64);
            if job.is_empty() {
                return Ok(None);
            }

            let status_text = match job.items() {
                [single] => format!("Copying: {}", single.display_name()),
                items => format!("Copying {} files...", items.len()),
            };
            tracker.set_status(JobStatus::Running, status_text);

            ScheduleCoordinator::new(scheduler_config)
                .run(job.into_items(), cancel.clone(), tracker.clone(), lease)
                .await
                .map(Some)
        }
        .await;

        let (status, text, summary) = match outcome {
            Ok(None) => (
                JobStatus::Completed,
                "No files to copy".to_string(),
                CopySummary::default(),
            ),
            Ok(Some(summary)) if summary.cancelled || cancel.is_cancelled() => {
                (JobStatus::Cancelled, "Operation cancelled".to_string(), summary)
            }
            Ok(Some(summary)) => (
                JobStatus::Completed,
                format!("Completed! Copied {} files", tracker.files_completed()),
                summary,
            ),
            Err(e) => {
                error!("Job {} failed: {}", id, e);
                (
                    JobStatus::Failed(e.to_string()),
                    format!("Error: {}", e),
                    CopySummary::default(),
                )
            }
        };

        tracker.finish(status.clone(), text);
        let snapshot = tracker.snapshot();
        info!(
            "Job {} {}: {} of {} files, {} of {} bytes in {:?}",
            id,
            status,
            snapshot.files_completed,
            snapshot.files_total,
            snapshot.copied_bytes,
            snapshot.total_bytes,
            snapshot.elapsed
        );

        CopyReport {
            job_id: id,
            status,
            summary,
            snapshot,
        }
    }
}

/// Enumerate and create destination directories off the async runtime
async fn prepare(source: PathBuf, destination: PathBuf, kind: SourceKind) -> Result<CopyJob> {
    tokio::task::spawn_blocking(move || {
        let job = enumerate(&source, &destination, kind)?;
        create_destination_dirs(&job)?;
        Ok(job)
    })
    .await
    .map_err(|e| Error::other(format!("Enumeration task failed: {}", e)))?
}

/// Check a request before any work starts, returning the source kind to use
async fn validate(request: &CopyRequest) -> Result<SourceKind> {
    let source = &request.source;
    let metadata = fs::metadata(source).await;
    let kind = match request.kind {
        Some(kind) => kind,
        None => match &metadata {
            Ok(m) if m.is_dir() => SourceKind::Directory,
            _ => SourceKind::File,
        },
    };

    match (kind, &metadata) {
        (SourceKind::File, Ok(m)) if m.is_file() => {}
        (SourceKind::File, _) => return Err(Error::NotAFile { path: source.clone() }),
        (SourceKind::Directory, Ok(m)) if m.is_dir() => {}
        (SourceKind::Directory, _) => {
            return Err(Error::NotADirectory {
                path: source.clone(),
            })
        }
    }

    let resolved_source = resolve(source).await;
    if resolved_source == resolve(&request.destination).await {
        return Err(Error::SameSourceAndDestination {
            path: resolved_source,
        });
    }

    if kind == SourceKind::File {
        let target = resolve_file_destination(source, &request.destination);
        if resolve(&target).await == resolved_source {
            return Err(Error::SameSourceAndDestination {
                path: resolved_source,
            });
        }
        let target_is_file = fs::metadata(&target)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if target_is_file && !request.overwrite {
            return Err(Error::DestinationExists { path: target });
        }
    }

    Ok(kind)
}

/// Absolute, symlink-free form of `path`, as far as it exists
async fn resolve(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path).await {
        return resolved;
    }
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if let Ok(resolved) = fs::canonicalize(parent).await {
            return resolved.join(name);
        }
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn engine() -> CopyEngine {
        CopyEngine::with_config(Config::default())
    }

    fn write(path: &Path, len: usize) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, vec![7u8; len]).unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_single_file_into_new_directory() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("report.bin");
        write(&source, 2048);
        let dest = temp.path().join("out").join("report.bin");

        let report = engine()
            .execute(CopyRequest::new(&source, &dest).with_kind(SourceKind::File))
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.summary.files_copied, 1);
        assert_eq!(report.snapshot.files_total, 1);
        assert_eq!(report.snapshot.copied_bytes, 2048);
        assert_eq!(report.snapshot.status_text, "Completed! Copied 1 files");
        assert_eq!(report.snapshot.current_file, None);
        assert_eq!(std::fs::read(&dest).unwrap().len(), 2048);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_empty_directory_completes() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("empty");
        std::fs::create_dir(&source).unwrap();

        let report = engine()
            .execute(CopyRequest::new(&source, temp.path().join("dst")))
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.snapshot.status_text, "No files to copy");
        assert_eq!(report.snapshot.files_total, 0);
    }

    #[tokio::test]
    async fn test_bad_source_kinds() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        write(&file, 1);

        let err = engine()
            .start_copy(
                CopyRequest::new(temp.path(), temp.path().join("x")).with_kind(SourceKind::File),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotAFile { .. }));

        let err = engine()
            .start_copy(
                CopyRequest::new(&file, temp.path().join("x")).with_kind(SourceKind::Directory),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotADirectory { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_kind_detected_when_unset() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("tree");
        write(&source.join("a.txt"), 3);

        let report = engine()
            .execute(CopyRequest::new(&source, temp.path().join("copy")))
            .await
            .unwrap();
        assert!(report.is_success());
        assert!(temp.path().join("copy").join("a.txt").is_file());

        // Anything that is not a directory is treated as a file
        let err = engine()
            .start_copy(CopyRequest::new(temp.path().join("missing"), temp.path().join("y")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotAFile { .. }));
    }

    #[tokio::test]
    async fn test_same_source_and_destination() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        write(&file, 1);

        let err = engine()
            .start_copy(CopyRequest::new(temp.path(), temp.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SameSourceAndDestination { .. }));

        // Copying a file into its own directory targets the file itself
        let err = engine()
            .start_copy(CopyRequest::new(&file, temp.path()).overwrite(true))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SameSourceAndDestination { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_existing_destination_needs_confirmation() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("new.txt");
        let dest = temp.path().join("old.txt");
        write(&source, 10);
        std::fs::write(&dest, b"keep me").unwrap();
        let engine = engine();

        let err = engine
            .start_copy(CopyRequest::new(&source, &dest))
            .await
            .unwrap_err();
        assert!(err.needs_confirmation());
        assert_eq!(std::fs::read(&dest).unwrap(), b"keep me");
        assert!(engine.is_idle());

        let report = engine
            .execute(CopyRequest::new(&source, &dest).overwrite(true))
            .await
            .unwrap();
        assert!(report.is_success());
        assert_eq!(std::fs::read(&dest).unwrap(), vec![7u8; 10]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_overlapping_start_is_rejected() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src");
        for i in 0..50 {
            write(&source.join(format!("{i}.bin")), 64 * 1024);
        }
        let engine = engine();

        let handle = engine
            .start_copy(CopyRequest::new(&source, temp.path().join("dst")))
            .await
            .unwrap();
        let err = engine
            .start_copy(CopyRequest::new(&source, temp.path().join("dst2")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::JobInProgress));

        engine.wait(&handle).await.unwrap();
        engine.wait_idle().await;
        assert!(engine.is_idle());
        engine
            .execute(CopyRequest::new(&source, temp.path().join("dst2")))
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_before_copy_starts() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src");
        for i in 0..20 {
            write(&source.join(format!("{i}.bin")), 1024);
        }
        let engine = engine();

        let handle = engine
            .start_copy(CopyRequest::new(&source, temp.path().join("dst")))
            .await
            .unwrap();
        engine.cancel(&handle);
        engine.cancel(&handle);
        assert!(handle.is_cancelled());

        let report = engine.wait(&handle).await.unwrap();
        assert!(report.is_cancelled());
        assert_eq!(report.snapshot.status_text, "Operation cancelled");

        tokio::time::timeout(Duration::from_secs(10), engine.wait_idle())
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_job_reports_reason() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src");
        write(&source.join("a.bin"), 10);
        // A file where a destination directory is needed
        let dest = temp.path().join("blocker");
        std::fs::write(&dest, b"x").unwrap();

        let report = engine()
            .execute(CopyRequest::new(&source, &dest))
            .await
            .unwrap();

        assert!(report.is_failure());
        assert!(report.snapshot.status_text.starts_with("Error: "));
    }
}
