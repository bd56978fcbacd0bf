//! Error types and handling for tiercopy
//!
//! This module provides the error taxonomy of the copy engine. Errors are grouped by
//! [`ErrorKind`] and carry an [`ErrorSeverity`] so callers can tell a rejected start
//! (bad source, existing destination) from a per-file stat failure that is only logged,
//! and from a copy failure that aborts the whole job.

use std::path::{Path, PathBuf};

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Low severity - the item is skipped and the job continues
    Low,
    /// Medium severity - the job is not started, caller input is needed
    Medium,
    /// High severity - the job is aborted
    High,
    /// Critical severity - the engine itself is unusable
    Critical,
}

/// Main error type for tiercopy operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Source was expected to be a regular file
    #[error("Source is not a file: {}", .path.display())]
    NotAFile {
        /// Offending source path
        path: PathBuf,
    },

    /// Source was expected to be a directory
    #[error("Source is not a directory: {}", .path.display())]
    NotADirectory {
        /// Offending source path
        path: PathBuf,
    },

    /// Destination file exists and the caller has not confirmed the overwrite
    #[error("Target file exists: {}", .path.display())]
    DestinationExists {
        /// Existing destination file
        path: PathBuf,
    },

    /// Source and destination resolve to the same location
    #[error("Source and destination cannot be the same: {}", .path.display())]
    SameSourceAndDestination {
        /// Resolved path shared by both sides
        path: PathBuf,
    },

    /// I/O failure while copying one file
    #[error("Failed to copy '{}': {source}", .path.display())]
    Copy {
        /// Path of the file whose open/read/write failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failure to stat a file while enumerating
    #[error("Failed to stat '{}': {source}", .path.display())]
    Stat {
        /// Path that could not be inspected
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failure to create a destination directory before copying
    #[error("Failed to create directory '{}': {source}", .path.display())]
    CreateDirectory {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A previous job still owns the worker pool
    #[error("Another copy job is still running")]
    JobInProgress,

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// I/O error outside of a specific file copy
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source path is unusable
    Source,
    /// The destination path is unusable or needs confirmation
    Destination,
    /// A file copy failed
    Copy,
    /// A file could not be inspected during enumeration
    Stat,
    /// Overlapping jobs
    Concurrency,
    /// Configuration errors
    Config,
    /// Other I/O errors
    Io,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAFile { .. } | Self::NotADirectory { .. } => ErrorKind::Source,
            Self::DestinationExists { .. }
            | Self::SameSourceAndDestination { .. }
            | Self::CreateDirectory { .. } => ErrorKind::Destination,
            Self::Copy { .. } => ErrorKind::Copy,
            Self::Stat { .. } => ErrorKind::Stat,
            Self::JobInProgress => ErrorKind::Concurrency,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io { .. } => ErrorKind::Io,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Stat { .. } => ErrorSeverity::Low,
            Self::DestinationExists { .. }
            | Self::SameSourceAndDestination { .. }
            | Self::NotAFile { .. }
            | Self::NotADirectory { .. }
            | Self::JobInProgress => ErrorSeverity::Medium,
            Self::Copy { .. }
            | Self::CreateDirectory { .. }
            | Self::Io { .. }
            | Self::Other { .. } => ErrorSeverity::High,
            Self::Config { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether this error aborts a running job
    pub fn is_fatal(&self) -> bool {
        self.severity() >= ErrorSeverity::High
    }

    /// Whether the caller can resolve this error by confirming and retrying
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Self::DestinationExists { .. })
    }

    /// The path this error is about, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotAFile { path }
            | Self::NotADirectory { path }
            | Self::DestinationExists { path }
            | Self::SameSourceAndDestination { path }
            | Self::Copy { path, .. }
            | Self::Stat { path, .. }
            | Self::CreateDirectory { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Create a new copy error for `path`
    pub fn copy<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Copy {
            path: path.into(),
            source,
        }
    }

    /// Create a new stat error for `path`
    pub fn stat<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Stat {
            path: path.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io;

    fn io_error() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "disk on fire")
    }

    proptest! {
        #[test]
        fn test_message_errors_keep_their_text(message in ".*") {
            let errors = vec![
                Error::config(message.clone()),
                Error::other(message.clone()),
                Error::Io { message: message.clone() },
            ];

            for error in errors {
                prop_assert!(error.to_string().contains(&message));
                prop_assert!(error.path().is_none());
            }
        }

        #[test]
        fn test_path_errors_report_their_path(name in "[a-z]{1,12}") {
            let path = PathBuf::from("/data").join(&name);
            let errors = vec![
                Error::NotAFile { path: path.clone() },
                Error::NotADirectory { path: path.clone() },
                Error::DestinationExists { path: path.clone() },
                Error::copy(path.clone(), io_error()),
                Error::stat(path.clone(), io_error()),
            ];

            for error in errors {
                prop_assert_eq!(error.path(), Some(path.as_path()));
                prop_assert!(error.to_string().contains(&name));
            }
        }
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Low < ErrorSeverity::Medium);
        assert!(ErrorSeverity::Medium < ErrorSeverity::High);
        assert!(ErrorSeverity::High < ErrorSeverity::Critical);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "test file");
        let error = Error::from(io_error);

        assert_eq!(error.kind(), ErrorKind::Io);
        assert!(error.is_fatal());
        assert!(error.to_string().contains("test file"));
    }

    #[test]
    fn test_copy_error_is_fatal_and_keeps_cause() {
        let error = Error::copy("/src/file.bin", io_error());

        assert_eq!(error.kind(), ErrorKind::Copy);
        assert!(error.is_fatal());
        assert!(error.to_string().contains("/src/file.bin"));
        assert!(error.to_string().contains("disk on fire"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_stat_error_is_not_fatal() {
        let error = Error::stat("/src/broken-link", io_error());

        assert_eq!(error.kind(), ErrorKind::Stat);
        assert_eq!(error.severity(), ErrorSeverity::Low);
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_destination_exists_needs_confirmation() {
        let error = Error::DestinationExists {
            path: PathBuf::from("/dst/file.txt"),
        };

        assert_eq!(error.kind(), ErrorKind::Destination);
        assert!(error.needs_confirmation());
        assert!(!error.is_fatal());
        assert!(!Error::JobInProgress.needs_confirmation());
    }

    #[test]
    fn test_bad_source_errors() {
        let not_file = Error::NotAFile {
            path: PathBuf::from("/src"),
        };
        let not_dir = Error::NotADirectory {
            path: PathBuf::from("/src/file"),
        };

        assert_eq!(not_file.kind(), ErrorKind::Source);
        assert_eq!(not_dir.kind(), ErrorKind::Source);
        assert_eq!(not_file.to_string(), "Source is not a file: /src");
        assert_eq!(not_dir.to_string(), "Source is not a directory: /src/file");
    }

    #[test]
    fn test_job_in_progress_error() {
        let error = Error::JobInProgress;

        assert_eq!(error.kind(), ErrorKind::Concurrency);
        assert_eq!(error.severity(), ErrorSeverity::Medium);
        assert!(!error.is_fatal());
        assert_eq!(error.path(), None);
    }
}
