//! Fixture builders and tree comparison for tiercopy tests

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Common file sizes for fixtures
pub struct CommonFileSizes;

impl CommonFileSizes {
    /// 1KB
    pub const TINY: usize = 1024;
    /// 2KB
    pub const SMALL: usize = 2 * 1024;
    /// 10KB
    pub const MEDIUM: usize = 10 * 1024;
    /// 64KB
    pub const LARGE: usize = 64 * 1024;
    /// 1MB
    pub const XLARGE: usize = 1024 * 1024;
}

/// Deterministic content for a file of `size` bytes, varied by `seed`
pub fn generate_test_data(size: usize, seed: usize) -> Vec<u8> {
    (0..size).map(|i| ((i * 7 + seed * 13) % 256) as u8).collect()
}

/// Write a file, creating its parent directories
pub fn create_test_file(path: &Path, size: usize, seed: usize) -> io::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, generate_test_data(size, seed))?;
    Ok(path.to_path_buf())
}

/// A file of `len` zero bytes that takes no disk space until written
pub fn create_sparse_file(path: &Path, len: u64) -> io::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::File::create(path)?.set_len(len)?;
    Ok(path.to_path_buf())
}

/// A mixed tree of nested files, returned as paths relative to `root`
pub fn create_test_tree(root: &Path) -> io::Result<Vec<PathBuf>> {
    let files = [
        ("small.txt", CommonFileSizes::TINY),
        ("medium.bin", CommonFileSizes::LARGE),
        ("large.bin", CommonFileSizes::XLARGE),
        ("empty.txt", 0),
        ("subdir1/file1.txt", CommonFileSizes::SMALL),
        ("subdir2/file2.txt", 4096),
        ("subdir1/nested/file3.txt", 8192),
    ];

    let mut created = Vec::with_capacity(files.len());
    for (seed, (name, size)) in files.iter().enumerate() {
        create_test_file(&root.join(name), *size, seed)?;
        created.push(PathBuf::from(name));
    }
    Ok(created)
}

/// `count` files of `size` bytes spread over a few subdirectories
pub fn create_many_files(root: &Path, count: usize, size: usize) -> io::Result<()> {
    for i in 0..count {
        let path = root.join(format!("d{:02}", i % 16)).join(format!("f{:05}.dat", i));
        create_test_file(&path, size, i)?;
    }
    Ok(())
}

/// Source and destination directories inside one temporary directory
pub struct TreeFixture {
    /// Keeps the directory alive
    pub temp_dir: TempDir,
    /// Source root
    pub source: PathBuf,
    /// Destination root, not yet created
    pub destination: PathBuf,
}

impl TreeFixture {
    /// Empty source directory and a missing destination
    pub fn new() -> io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let source = temp_dir.path().join("src");
        let destination = temp_dir.path().join("dst");
        fs::create_dir_all(&source)?;
        Ok(Self {
            temp_dir,
            source,
            destination,
        })
    }
}

/// Relative paths of every regular file under `root`, sorted
pub fn list_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                walk(root, &path, out)?;
            } else if let Ok(relative) = path.strip_prefix(root) {
                out.push(relative.to_path_buf());
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    walk(root, root, &mut files)?;
    files.sort();
    Ok(files)
}

/// Whether `destination` holds a byte-identical copy of every file under `source`
pub fn trees_match(source: &Path, destination: &Path) -> io::Result<bool> {
    let files = list_files(source)?;
    if files != list_files(destination)? {
        return Ok(false);
    }
    for file in files {
        if fs::read(source.join(&file))? != fs::read(destination.join(&file))? {
            return Ok(false);
        }
    }
    Ok(true)
}
