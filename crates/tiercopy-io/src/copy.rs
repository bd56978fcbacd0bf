//! Chunked single-file copier

use crate::progress::ProgressSink;
use crate::size::chunk_len_for;
use filetime::FileTime;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tiercopy_types::{CopyOutcome, Error, Result, WorkItem};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Copy options for customizing copy behavior
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Skip files whose destination already has the same size and mtime (to the second)
    pub skip_identical: bool,
    /// Copy access and modification times onto the destination
    pub preserve_timestamps: bool,
    /// Report each file's name to the progress sink when it starts
    pub track_current_file: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            skip_identical: true,
            preserve_timestamps: true,
            track_current_file: false,
        }
    }
}

/// Copies one [`WorkItem`] at a time, blocking the calling thread
#[derive(Debug, Clone, Default)]
pub struct FileCopier {
    options: CopyOptions,
}

impl FileCopier {
    /// Create a copier with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a copier with custom options
    pub fn with_options(options: CopyOptions) -> Self {
        Self { options }
    }

    /// Get the copier's options
    pub fn options(&self) -> &CopyOptions {
        &self.options
    }

    /// Copy `item`, reporting written bytes to `progress` after every chunk
    ///
    /// Cancellation is checked on entry and before every read. A cancelled copy leaves
    /// whatever was written so far in place, does not touch timestamps and is not
    /// counted as a finished file.
    pub fn copy(
        &self,
        item: &WorkItem,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<CopyOutcome> {
        if cancel.is_cancelled() {
            return Ok(CopyOutcome::Cancelled);
        }

        if self.options.track_current_file {
            progress.set_current_file(&item.display_name());
        }

        if self.options.skip_identical && is_identical(item.source(), item.destination()) {
            debug!("Unchanged, skipping {}", item.destination().display());
            progress.add_bytes(item.size());
            progress.increment_files();
            return Ok(CopyOutcome::Skipped);
        }

        let chunk_len = chunk_len_for(item.size());
        let mut reader = File::open(item.source()).map_err(|e| Error::copy(item.source(), e))?;
        let mut writer =
            File::create(item.destination()).map_err(|e| Error::copy(item.destination(), e))?;
        let mut buffer = vec![0u8; chunk_len];
        let mut written = 0u64;

        debug!(
            "Copying {} -> {} with {} byte chunks",
            item.source().display(),
            item.destination().display(),
            chunk_len
        );

        while !cancel.is_cancelled() {
            let read = reader
                .read(&mut buffer)
                .map_err(|e| Error::copy(item.source(), e))?;
            if read == 0 {
                break;
            }
            writer
                .write_all(&buffer[..read])
                .map_err(|e| Error::copy(item.destination(), e))?;
            written += read as u64;
            progress.add_bytes(read as u64);
        }

        if cancel.is_cancelled() {
            debug!(
                "Cancelled after {} bytes of {}",
                written,
                item.source().display()
            );
            return Ok(CopyOutcome::Cancelled);
        }

        writer
            .flush()
            .map_err(|e| Error::copy(item.destination(), e))?;
        drop(writer);

        if self.options.preserve_timestamps {
            if let Err(e) = copy_timestamps(item.source(), item.destination()) {
                warn!(
                    "Failed to preserve timestamps on {}: {}",
                    item.destination().display(),
                    e
                );
            }
        }

        progress.increment_files();
        Ok(CopyOutcome::Copied { bytes: written })
    }
}

/// Same size and same modification second; any stat failure means "not identical"
fn is_identical(source: &Path, destination: &Path) -> bool {
    let Ok(dest_meta) = fs::metadata(destination) else {
        return false;
    };
    if !dest_meta.is_file() {
        return false;
    }
    let Ok(src_meta) = fs::metadata(source) else {
        return false;
    };

    src_meta.len() == dest_meta.len()
        && FileTime::from_last_modification_time(&src_meta).unix_seconds()
            == FileTime::from_last_modification_time(&dest_meta).unix_seconds()
}

fn copy_timestamps(source: &Path, destination: &Path) -> std::io::Result<()> {
    let metadata = fs::metadata(source)?;
    filetime::set_file_times(
        destination,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
}
