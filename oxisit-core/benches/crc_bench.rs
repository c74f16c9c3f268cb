//! Throughput benchmarks for the CRC-32 and CRC-16/ARC calculators.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxisit_core::crc::{Crc16, Crc32};
use std::hint::black_box;

/// Reproducible pseudo-random bytes.
fn noise(size: usize) -> Vec<u8> {
    let mut seed: u64 = 0x5EED_1234_ABCD_0001;
    (0..size)
        .map(|_| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            (seed >> 32) as u8
        })
        .collect()
}

fn bench_crc32(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32");
    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let data = noise(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("slice", size), &data, |b, data| {
            b.iter(|| Crc32::compute(black_box(data)))
        });
        group.bench_with_input(BenchmarkId::new("per_byte", size), &data, |b, data| {
            b.iter(|| {
                let mut crc = Crc32::new();
                for &byte in black_box(data) {
                    crc.update_byte(byte);
                }
                crc.finalize()
            })
        });
    }
    group.finish();
}

fn bench_crc16(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc16");
    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let data = noise(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| Crc16::compute(black_box(data)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_crc32, bench_crc16);
criterion_main!(benches);
