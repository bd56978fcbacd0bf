//! Performance benchmarks for the chunked file copier

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::fs;
use tempfile::TempDir;
use tiercopy_io::{CopyOptions, FileCopier, NullProgress};
use tiercopy_types::WorkItem;
use tokio_util::sync::CancellationToken;

fn bench_chunked_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunked_copy");
    let copier = FileCopier::with_options(CopyOptions {
        skip_identical: false,
        ..CopyOptions::default()
    });
    let cancel = CancellationToken::new();

    for size in [4 * 1024, 256 * 1024, 8 * 1024 * 1024] {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source.bin");
        fs::write(&source, vec![0xA5u8; size]).unwrap();
        let item = WorkItem::new(source, temp_dir.path().join("dest.bin"), size as u64);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("file_copier", size), &item, |b, item| {
            b.iter(|| black_box(copier.copy(item, &cancel, &NullProgress).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("std_fs_copy", size), &item, |b, item| {
            b.iter(|| black_box(fs::copy(item.source(), item.destination()).unwrap()));
        });
    }

    group.finish();
}

fn bench_identity_shortcut(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("source.bin");
    fs::write(&source, vec![1u8; 1024 * 1024]).unwrap();
    let item = WorkItem::new(source, temp_dir.path().join("dest.bin"), 1024 * 1024);
    let copier = FileCopier::new();
    let cancel = CancellationToken::new();
    copier.copy(&item, &cancel, &NullProgress).unwrap();

    c.bench_function("identity_shortcut_1MiB", |b| {
        b.iter(|| black_box(copier.copy(&item, &cancel, &NullProgress).unwrap()));
    });
}

criterion_group!(benches, bench_chunked_copy, bench_identity_shortcut);
criterion_main!(benches);
