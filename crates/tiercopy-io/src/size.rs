//! Size classification
//!
//! Maps a file size to the chunk buffer used to copy it and to the phase of the
//! schedule it runs in. The thresholds are fixed.

/// One kibibyte
pub const KIB: u64 = 1024;
/// One mebibyte
pub const MIB: u64 = 1024 * KIB;
/// One gibibyte
pub const GIB: u64 = 1024 * MIB;

/// Files strictly larger than this use [`BUFFER_HUGE`]
pub const HUGE_FILE_THRESHOLD: u64 = GIB;
/// Files strictly larger than this use [`BUFFER_LARGE`]
pub const LARGE_TIER_THRESHOLD: u64 = 500 * MIB;
/// Files strictly larger than this use [`BUFFER_MEDIUM`]
pub const MEDIUM_TIER_THRESHOLD: u64 = 50 * MIB;

/// Files of at least this size are copied in the serial phase
pub const LARGE_FILE_THRESHOLD: u64 = 800 * MIB;

/// Buffer for files above 1 GiB
pub const BUFFER_HUGE: usize = 64 * MIB as usize;
/// Buffer for files above 500 MiB
pub const BUFFER_LARGE: usize = 16 * MIB as usize;
/// Buffer for files above 50 MiB
pub const BUFFER_MEDIUM: usize = 8 * MIB as usize;
/// Buffer for everything else
pub const BUFFER_SMALL: usize = 4 * MIB as usize;

/// Smallest chunk allocated for a copy, even for tiny or empty files
pub const MIN_CHUNK: usize = 8 * KIB as usize;

/// Buffer tier of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SizeTier {
    /// Up to 50 MiB
    Small,
    /// Up to 500 MiB
    Medium,
    /// Up to 1 GiB
    Large,
    /// Above 1 GiB
    Huge,
}

impl SizeTier {
    /// Classify a size in bytes
    pub fn of(size: u64) -> Self {
        if size > HUGE_FILE_THRESHOLD {
            Self::Huge
        } else if size > LARGE_TIER_THRESHOLD {
            Self::Large
        } else if size > MEDIUM_TIER_THRESHOLD {
            Self::Medium
        } else {
            Self::Small
        }
    }

    /// Chunk buffer size for this tier
    pub fn buffer_size(self) -> usize {
        match self {
            Self::Huge => BUFFER_HUGE,
            Self::Large => BUFFER_LARGE,
            Self::Medium => BUFFER_MEDIUM,
            Self::Small => BUFFER_SMALL,
        }
    }
}

/// Which phase of the schedule a file is copied in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyBucket {
    /// Copied by the worker pool
    Concurrent,
    /// Copied one at a time after the pool drains
    Serial,
}

/// Chunk buffer size for a file of `size` bytes
pub fn buffer_size_for(size: u64) -> usize {
    SizeTier::of(size).buffer_size()
}

/// Schedule phase for a file of `size` bytes
pub fn strategy_bucket_for(size: u64) -> StrategyBucket {
    if size >= LARGE_FILE_THRESHOLD {
        StrategyBucket::Serial
    } else {
        StrategyBucket::Concurrent
    }
}

/// Bytes actually allocated to copy a file of `size` bytes
///
/// Never more than the tier buffer, never less than [`MIN_CHUNK`].
pub fn chunk_len_for(size: u64) -> usize {
    let tier = buffer_size_for(size);
    let wanted = usize::try_from(size).unwrap_or(tier).max(MIN_CHUNK);
    wanted.min(tier)
}
