//! Result type alias for tiercopy operations

use crate::Error;

/// Result type alias for tiercopy operations
pub type Result<T> = std::result::Result<T, Error>;
