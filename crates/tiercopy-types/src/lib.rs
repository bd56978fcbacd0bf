//! Core type system and error handling for tiercopy
//!
//! This crate provides the foundational types, error handling, and shared data structures
//! used throughout the tiercopy workspace. It includes:
//!
//! - **Error handling**: The copy engine's error taxonomy with kinds and severity levels
//! - **Core types**: Work items, copy jobs, job status and progress snapshots
//! - **Traits**: Cooperative cancellation
//! - **Formatting**: Human-readable byte counts and ETA strings
//!
//! # Features
//!
//! - `std` (default): Enable standard library features
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use tiercopy_types::{CopySummary, CopyOutcome, Result};
//!
//! fn example_operation() -> Result<CopySummary> {
//!     let mut summary = CopySummary::default();
//!     summary.record(CopyOutcome::Copied { bytes: 1024 });
//!     summary.record(CopyOutcome::Skipped);
//!     Ok(summary)
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod format;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::ThreadCount;
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use format::{format_bytes, format_eta};
pub use result::Result;
pub use traits::*;
pub use types::*;
