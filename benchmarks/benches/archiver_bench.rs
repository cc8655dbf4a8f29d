//! Criterion benchmarks for the tar archiver, one group per source size

use std::fs;
use std::path::Path;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;

use archive_benchmarks::{config::CompressionSettings, Algorithm, TarArchiver};

/// Fill `dir` with compressible text files totalling `size` bytes
fn create_source(dir: &Path, size: usize) {
    let text = "Hello, World! This is test data for compression benchmarks. ";
    let per_file = size / 4;
    for i in 0..4 {
        let content: String = text.chars().cycle().take(per_file).collect();
        fs::write(dir.join(format!("file_{}.txt", i)), content).unwrap();
    }
}

fn bench_archive(c: &mut Criterion) {
    let settings = CompressionSettings::default();
    let mut group = c.benchmark_group("archive");
    group.sample_size(10);

    for size in [64 * 1024, 1024 * 1024] {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        create_source(source.path(), size);
        group.throughput(Throughput::Bytes(size as u64));

        for algorithm in Algorithm::ALL {
            let artifact = target.path().join(algorithm.file_name());
            group.bench_with_input(BenchmarkId::new(algorithm.label(), size), &size, |b, _| {
                b.iter(|| {
                    TarArchiver::archive_blocking(&settings, source.path(), &artifact, algorithm).unwrap()
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_archive);
criterion_main!(benches);
