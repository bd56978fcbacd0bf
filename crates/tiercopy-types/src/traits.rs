//! Core traits shared across tiercopy crates

/// Trait for operation cancellation
pub trait Cancellable {
    /// Cancel the operation
    ///
    /// Calling this more than once has no further effect.
    fn cancel(&self);

    /// Check if the operation is cancelled
    fn is_cancelled(&self) -> bool;
}
