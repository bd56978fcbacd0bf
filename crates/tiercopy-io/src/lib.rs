//! Blocking file I/O for tiercopy
//!
//! This crate holds the three leaf components of the copy engine:
//!
//! - **Size classification**: Fixed buffer tiers and the concurrent/serial split by file size
//! - **Enumeration**: Turning a source file or tree into a flat, sized work list
//! - **Chunked copying**: Copying one work item with the identity shortcut, timestamp
//!   preservation and cooperative cancellation between chunks
//!
//! Everything here blocks the calling thread. The engine crate runs it on tokio's blocking pool.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tiercopy_io::{enumerate, FileCopier, NullProgress};
//! use tiercopy_types::SourceKind;
//! use tokio_util::sync::CancellationToken;
//! use std::path::Path;
//!
//! # fn example() -> tiercopy_types::Result<()> {
//! let job = enumerate(Path::new("photos"), Path::new("backup"), SourceKind::Directory)?;
//! let copier = FileCopier::new();
//! let cancel = CancellationToken::new();
//! for item in job.items() {
//!     copier.copy(item, &cancel, &NullProgress)?;
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod copy;
pub mod enumerate;
pub mod progress;
pub mod size;

pub use copy::{CopyOptions, FileCopier};
pub use enumerate::{create_destination_dirs, enumerate, resolve_file_destination};
pub use progress::{NullProgress, ProgressSink};
pub use size::{
    buffer_size_for, chunk_len_for, strategy_bucket_for, SizeTier, StrategyBucket,
    LARGE_FILE_THRESHOLD,
};
