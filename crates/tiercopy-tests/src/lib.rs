//! tiercopy integration testing support
//!
//! Fixture builders shared by the end-to-end tests in `tests/`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
///
/// Helpers for building source trees and comparing them against copies.
pub mod test_utils;
