//! Work list enumeration
//!
//! Symlinks to regular files are followed and their content is copied. Symlinked
//! directories are not descended into, which keeps the walk free of cycles. Entries
//! that cannot be inspected are logged and left out of the job.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tiercopy_types::{CopyJob, Error, Result, SourceKind, WorkItem};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Enumerate `source_root` into a [`CopyJob`] targeting `destination_root`
///
/// Does not touch the destination; see [`create_destination_dirs`].
pub fn enumerate(source_root: &Path, destination_root: &Path, kind: SourceKind) -> Result<CopyJob> {
    let items = match kind {
        SourceKind::File => vec![enumerate_file(source_root, destination_root)?],
        SourceKind::Directory => enumerate_directory(source_root, destination_root)?,
    };

    let job = CopyJob::new(source_root, destination_root, kind, items);
    info!(
        "Enumerated {} files ({} bytes) under {}",
        job.file_count(),
        job.total_bytes(),
        source_root.display()
    );
    Ok(job)
}

/// Where a single-file copy of `source` into `destination_root` lands
///
/// An existing directory receives the file under its own name; any other path is
/// taken as the target file path.
pub fn resolve_file_destination(source: &Path, destination_root: &Path) -> PathBuf {
    if destination_root.is_dir() {
        match source.file_name() {
            Some(name) => destination_root.join(name),
            None => destination_root.to_path_buf(),
        }
    } else {
        destination_root.to_path_buf()
    }
}

fn enumerate_file(source: &Path, destination_root: &Path) -> Result<WorkItem> {
    let metadata = fs::metadata(source).map_err(|_| Error::NotAFile {
        path: source.to_path_buf(),
    })?;
    if !metadata.is_file() {
        return Err(Error::NotAFile {
            path: source.to_path_buf(),
        });
    }

    let destination = resolve_file_destination(source, destination_root);
    Ok(WorkItem::new(source.to_path_buf(), destination, metadata.len()))
}

fn enumerate_directory(source_root: &Path, destination_root: &Path) -> Result<Vec<WorkItem>> {
    let is_dir = fs::metadata(source_root).map(|m| m.is_dir()).unwrap_or(false);
    if !is_dir {
        return Err(Error::NotADirectory {
            path: source_root.to_path_buf(),
        });
    }

    let mut items = Vec::new();
    let walker = WalkDir::new(source_root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                let error = Error::stat(path, e.into());
                warn!("Skipping entry: {}", error);
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }

        let size = if file_type.is_symlink() {
            // Follow the link to see what it points at
            match fs::metadata(entry.path()) {
                Ok(target) if target.is_file() => target.len(),
                Ok(_) => {
                    debug!("Not following symlink {}", entry.path().display());
                    continue;
                }
                Err(e) => {
                    warn!("Skipping entry: {}", Error::stat(entry.path(), e));
                    continue;
                }
            }
        } else if file_type.is_file() {
            match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    warn!("Skipping entry: {}", Error::stat(entry.path(), e.into()));
                    continue;
                }
            }
        } else {
            debug!("Skipping special file {}", entry.path().display());
            continue;
        };

        let Ok(relative) = entry.path().strip_prefix(source_root) else {
            continue;
        };
        items.push(WorkItem::new(
            entry.path().to_path_buf(),
            destination_root.join(relative),
            size,
        ));
    }

    Ok(items)
}

/// Create every directory the job's destinations live in
///
/// Runs before any copy starts so concurrent copiers never race on directory
/// creation. Existing directories are fine.
pub fn create_destination_dirs(job: &CopyJob) -> Result<usize> {
    let dirs: BTreeSet<&Path> = job
        .items()
        .iter()
        .filter_map(|item| item.destination().parent())
        .filter(|dir| !dir.as_os_str().is_empty())
        .collect();

    for dir in &dirs {
        fs::create_dir_all(dir).map_err(|source| Error::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    debug!("Prepared {} destination directories", dirs.len());
    Ok(dirs.len())
}
