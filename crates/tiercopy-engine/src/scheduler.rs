//! Two-phase schedule: a bounded worker pool for small and medium files, then the
//! large files one at a time.

use std::sync::Arc;
use tiercopy_config::Config;
use tiercopy_io::{strategy_bucket_for, CopyOptions, FileCopier, ProgressSink, StrategyBucket};
use tiercopy_types::{CopyOutcome, CopySummary, Error, Result, ThreadCount, WorkItem};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Concurrent sets larger than this get an oversubscribed pool
pub const OVERSUBSCRIBE_THRESHOLD: usize = 5000;

/// Configuration for the schedule coordinator
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Hardware parallelism the pool is sized from
    pub available_parallelism: usize,
    /// Options handed to every copier
    pub copy_options: CopyOptions,
}

impl SchedulerConfig {
    /// Create scheduler config from main config
    pub fn from_config(config: &Config) -> Self {
        Self {
            copy_options: CopyOptions {
                skip_identical: config.copy.skip_identical,
                preserve_timestamps: config.copy.preserve_timestamps,
                track_current_file: true,
            },
            ..Self::default()
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            available_parallelism: ThreadCount::available(),
            copy_options: CopyOptions {
                track_current_file: true,
                ..CopyOptions::default()
            },
        }
    }
}

/// Pool size for a concurrent phase of `concurrent_items` files
///
/// Only the oversubscribed pool is capped at [`ThreadCount::MAX`].
pub fn worker_count(concurrent_items: usize, available_parallelism: usize) -> usize {
    let base = available_parallelism.max(ThreadCount::MIN);
    if concurrent_items > OVERSUBSCRIBE_THRESHOLD {
        ThreadCount::new(base.min(ThreadCount::MAX))
            .unwrap_or_default()
            .oversubscribed()
            .get()
    } else {
        base
    }
}

/// A work list split into its two phases
#[derive(Debug, Clone)]
pub struct SchedulePlan {
    /// Files for the worker pool
    pub concurrent: Vec<WorkItem>,
    /// Large files, in enumeration order
    pub serial: Vec<WorkItem>,
    /// Pool size for the concurrent phase
    pub workers: usize,
}

/// Partition `items` by strategy bucket and size the pool
pub fn plan(items: Vec<WorkItem>, available_parallelism: usize) -> SchedulePlan {
    let (concurrent, serial): (Vec<_>, Vec<_>) = items
        .into_iter()
        .partition(|item| strategy_bucket_for(item.size()) == StrategyBucket::Concurrent);
    let workers = worker_count(concurrent.len(), available_parallelism);

    SchedulePlan {
        concurrent,
        serial,
        workers,
    }
}

/// Keeps the engine's single job slot occupied
///
/// Every worker holds a clone, so the slot only frees once the last copy of a job has
/// returned, including copies left running after a cancel.
#[derive(Debug, Clone)]
pub struct PoolLease(Arc<OwnedSemaphorePermit>);

impl PoolLease {
    /// Wrap the permit of the engine's job slot
    pub fn new(permit: OwnedSemaphorePermit) -> Self {
        Self(Arc::new(permit))
    }
}

/// Runs a work list through the copier
#[derive(Debug, Clone)]
pub struct ScheduleCoordinator {
    config: SchedulerConfig,
    copier: Arc<FileCopier>,
}

impl ScheduleCoordinator {
    /// Create a coordinator
    pub fn new(config: SchedulerConfig) -> Self {
        let copier = Arc::new(FileCopier::with_options(config.copy_options.clone()));
        Self { config, copier }
    }

    /// Get the coordinator's configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Copy every item, concurrent phase first
    ///
    /// Cancellation stops dispatch and returns without waiting for in-flight copies,
    /// which stop at their next chunk. The first copy error stops dispatch too, but is
    /// only returned once the in-flight copies have finished.
    pub async fn run(
        &self,
        items: Vec<WorkItem>,
        cancel: CancellationToken,
        progress: Arc<dyn ProgressSink>,
        lease: PoolLease,
    ) -> Result<CopySummary> {
        let plan = plan(items, self.config.available_parallelism);
        let mut summary = CopySummary {
            workers: plan.workers,
            ..CopySummary::default()
        };

        info!(
            "Scheduling {} concurrent files on {} workers, {} serial files",
            plan.concurrent.len(),
            plan.workers,
            plan.serial.len()
        );

        self.run_concurrent(plan.concurrent, plan.workers, &cancel, &progress, &lease, &mut summary)
            .await?;

        if !summary.cancelled {
            self.run_serial(plan.serial, &cancel, &progress, &lease, &mut summary)
                .await?;
        }

        summary.cancelled |= cancel.is_cancelled();
        Ok(summary)
    }

    async fn run_concurrent(
        &self,
        items: Vec<WorkItem>,
        workers: usize,
        cancel: &CancellationToken,
        progress: &Arc<dyn ProgressSink>,
        lease: &PoolLease,
        summary: &mut CopySummary,
    ) -> Result<()> {
        let slots = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        let mut failure: Option<Error> = None;

        for item in items {
            while let Some(joined) = tasks.try_join_next() {
                absorb(joined, summary, &mut failure);
            }
            if failure.is_some() || cancel.is_cancelled() {
                break;
            }

            let permit = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                permit = Arc::clone(&slots).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            // A worker may have failed while we waited for its slot
            while let Some(joined) = tasks.try_join_next() {
                absorb(joined, summary, &mut failure);
            }
            if failure.is_some() {
                break;
            }

            let copier = Arc::clone(&self.copier);
            let cancel = cancel.clone();
            let progress = Arc::clone(progress);
            let lease = lease.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let _lease = lease;
                copier.copy(&item, &cancel, progress.as_ref())
            });
        }

        while !tasks.is_empty() {
            tokio::select! {
                biased;
                () = cancel.cancelled(), if failure.is_none() => break,
                joined = tasks.join_next() => match joined {
                    Some(joined) => absorb(joined, summary, &mut failure),
                    None => break,
                },
            }
        }

        if !tasks.is_empty() {
            debug!("Leaving {} in-flight copies to wind down", tasks.len());
            tasks.detach_all();
        }

        if let Some(e) = failure {
            return Err(e);
        }
        summary.cancelled |= cancel.is_cancelled();
        Ok(())
    }

    async fn run_serial(
        &self,
        items: Vec<WorkItem>,
        cancel: &CancellationToken,
        progress: &Arc<dyn ProgressSink>,
        lease: &PoolLease,
        summary: &mut CopySummary,
    ) -> Result<()> {
        for item in items {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            debug!("Serial copy of {}", item.source().display());
            let copier = Arc::clone(&self.copier);
            let worker_cancel = cancel.clone();
            let worker_progress = Arc::clone(progress);
            let lease = lease.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                let _lease = lease;
                copier.copy(&item, &worker_cancel, worker_progress.as_ref())
            })
            .await
            .map_err(worker_failed)?
            .map_err(|e| {
                error!("{}", e);
                e
            })?;

            summary.record(outcome);
        }
        Ok(())
    }
}

fn absorb(
    joined: std::result::Result<Result<CopyOutcome>, JoinError>,
    summary: &mut CopySummary,
    failure: &mut Option<Error>,
) {
    match joined.map_err(worker_failed).and_then(|result| result) {
        Ok(outcome) => summary.record(outcome),
        Err(e) => {
            error!("{}", e);
            if failure.is_none() {
                *failure = Some(e);
            }
        }
    }
}

fn worker_failed(e: JoinError) -> Error {
    Error::other(format!("Copy worker failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tempfile::TempDir;
    use tiercopy_io::size::{GIB, KIB, LARGE_FILE_THRESHOLD, MIB};

    #[derive(Default)]
    struct Counter {
        bytes: AtomicU64,
        files: AtomicU64,
    }

    impl ProgressSink for Counter {
        fn add_bytes(&self, bytes: u64) {
            self.bytes.fetch_add(bytes, Ordering::SeqCst);
        }

        fn increment_files(&self) {
            self.files.fetch_add(1, Ordering::SeqCst);
        }

        fn set_current_file(&self, _name: &str) {}
    }

    fn lease() -> PoolLease {
        let slot = Arc::new(Semaphore::new(1));
        PoolLease::new(slot.try_acquire_owned().unwrap())
    }

    fn item(name: &str, size: u64) -> WorkItem {
        WorkItem::new(PathBuf::from("/src").join(name), PathBuf::from("/dst").join(name), size)
    }

    fn tree(files: usize, len: usize) -> (TempDir, Vec<WorkItem>) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("dst")).unwrap();
        let items = (0..files)
            .map(|i| {
                let source = temp.path().join(format!("file_{i:03}.bin"));
                fs::write(&source, vec![i as u8; len]).unwrap();
                let destination = temp.path().join("dst").join(format!("file_{i:03}.bin"));
                WorkItem::new(source, destination, len as u64)
            })
            .collect();
        (temp, items)
    }

    #[rstest]
    #[case(0, 8, 8)]
    #[case(5000, 8, 8)]
    #[case(5001, 8, 16)]
    #[case(6000, 4, 8)]
    #[case(6000, 48, 64)]
    #[case(10, 0, 1)]
    #[case(5000, 96, 96)]
    #[case(5001, 96, 64)]
    fn test_worker_count(#[case] items: usize, #[case] cpus: usize, #[case] expected: usize) {
        assert_eq!(worker_count(items, cpus), expected);
    }

    #[test]
    fn test_plan_partitions_by_size_in_order() {
        let items = vec![
            item("small", 10 * KIB),
            item("big_a", 2 * GIB),
            item("medium", 100 * MIB),
            item("edge", LARGE_FILE_THRESHOLD),
            item("just_below", LARGE_FILE_THRESHOLD - 1),
        ];

        let plan = plan(items, 4);

        let concurrent: Vec<_> = plan.concurrent.iter().map(|i| i.display_name()).collect();
        let serial: Vec<_> = plan.serial.iter().map(|i| i.display_name()).collect();
        assert_eq!(concurrent, vec!["small", "medium", "just_below"]);
        assert_eq!(serial, vec!["big_a", "edge"]);
        assert_eq!(plan.workers, 4);
    }

    #[test]
    fn test_plan_escalates_workers_for_many_files() {
        let items = (0..6000).map(|i| item(&format!("f{i}"), 10 * KIB)).collect();
        let plan = plan(items, 6);
        assert_eq!(plan.workers, 12);
        assert_eq!(plan.concurrent.len(), 6000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_copies_everything() {
        let (_temp, items) = tree(40, 3000);
        let destinations: Vec<_> = items.iter().map(|i| i.destination().to_path_buf()).collect();
        let counter = Arc::new(Counter::default());
        let coordinator = ScheduleCoordinator::new(SchedulerConfig::default());

        let summary = coordinator
            .run(items, CancellationToken::new(), counter.clone(), lease())
            .await
            .unwrap();

        assert_eq!(summary.files_copied, 40);
        assert_eq!(summary.files_skipped, 0);
        assert!(!summary.cancelled);
        assert_eq!(counter.bytes.load(Ordering::SeqCst), 40 * 3000);
        assert_eq!(counter.files.load(Ordering::SeqCst), 40);
        for destination in destinations {
            assert_eq!(fs::metadata(destination).unwrap().len(), 3000);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_cancelled_before_start() {
        let (_temp, items) = tree(5, 10);
        let destinations: Vec<_> = items.iter().map(|i| i.destination().to_path_buf()).collect();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = ScheduleCoordinator::new(SchedulerConfig::default())
            .run(items, cancel, Arc::new(Counter::default()), lease())
            .await
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.files_processed(), 0);
        assert!(destinations.iter().all(|d| !d.exists()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_surfaces_copy_error() {
        let (temp, mut items) = tree(3, 10);
        items.push(WorkItem::new(
            temp.path().join("missing.bin"),
            temp.path().join("dst/missing.bin"),
            10,
        ));

        let err = ScheduleCoordinator::new(SchedulerConfig {
            available_parallelism: 1,
            ..SchedulerConfig::default()
        })
        .run(items, CancellationToken::new(), Arc::new(Counter::default()), lease())
        .await
        .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(err.path(), Some(temp.path().join("missing.bin").as_path()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_lease_released_after_run() {
        let slot = Arc::new(Semaphore::new(1));
        let lease = PoolLease::new(Arc::clone(&slot).try_acquire_owned().unwrap());
        let (_temp, items) = tree(4, 100);

        ScheduleCoordinator::new(SchedulerConfig::default())
            .run(items, CancellationToken::new(), Arc::new(Counter::default()), lease)
            .await
            .unwrap();

        assert_eq!(slot.available_permits(), 1);
    }
}
