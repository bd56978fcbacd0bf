//! Adaptive concurrent copy engine for tiercopy
//!
//! This crate turns a source file or directory into a finished copy:
//!
//! - **Job lifecycle**: Validate, enumerate, copy and report, one job at a time
//! - **Two-phase scheduling**: A bounded worker pool for small and medium files, sized
//!   from the machine's parallelism, followed by large files copied one by one
//! - **Progress tracking**: Lock-free byte and file counters sampled by observers
//! - **Cooperative cancellation**: Checked before every chunk; nothing is killed
//!
//! # Examples
//!
//! ```rust,no_run
//! use tiercopy_engine::{CopyEngine, CopyRequest};
//! use tiercopy_config::Config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = CopyEngine::with_config(Config::default());
//! let handle = engine.start_copy(CopyRequest::new("photos", "backup")).await?;
//! println!("{:.1}%", engine.poll(&handle).percent());
//! let report = engine.wait(&handle).await?;
//! println!("Copied {} files", report.summary.files_copied);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod monitor;
pub mod scheduler;
pub mod task;

pub use engine::{CopyEngine, JobHandle};
pub use monitor::ProgressTracker;
pub use scheduler::{
    plan, worker_count, PoolLease, ScheduleCoordinator, SchedulePlan, SchedulerConfig,
    OVERSUBSCRIBE_THRESHOLD,
};
pub use task::{CopyReport, CopyRequest};
