//! Validated configuration values

/// Worker thread count with validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreadCount(usize);

impl ThreadCount {
    /// Minimum thread count
    pub const MIN: usize = 1;
    /// Maximum thread count
    pub const MAX: usize = 64;
    /// Used when the platform cannot report its parallelism
    pub const FALLBACK: usize = 4;

    /// Create a new thread count with validation
    pub fn new(count: usize) -> Result<Self, String> {
        if count < Self::MIN {
            Err(format!("Thread count {} is below minimum {}", count, Self::MIN))
        } else if count > Self::MAX {
            Err(format!("Thread count {} exceeds maximum {}", count, Self::MAX))
        } else {
            Ok(Self(count))
        }
    }

    /// Get the thread count value
    pub fn get(self) -> usize {
        self.0
    }

    /// Number of hardware threads available to this process
    pub fn available() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(Self::FALLBACK)
    }

    /// Get the optimal thread count for the current system
    pub fn optimal() -> Self {
        Self(Self::available().clamp(Self::MIN, Self::MAX))
    }

    /// Double the count for very large file sets, capped at [`Self::MAX`]
    pub fn oversubscribed(self) -> Self {
        Self((self.0 * 2).min(Self::MAX))
    }
}

impl Default for ThreadCount {
    fn default() -> Self {
        Self::optimal()
    }
}
