//! Spectrum path benchmarks
//!
//! Run with: cargo bench -p spectra-analysis --bench mapper

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spectra_analysis::{BinCombine, MagnitudeAnalyzer, MapperConfig, SpectralMapper};

const SAMPLE_RATE: f32 = 48000.0;

fn test_spectrum(bins: usize) -> Vec<f32> {
    (0..bins)
        .map(|i| -20.0 - 40.0 * (i as f32 / bins as f32) + 3.0 * (i as f32 * 0.37).sin())
        .collect()
}

fn bench_map_to_columns(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_to_columns");

    for &bins in &[1024usize, 4096, 16384] {
        let left = test_spectrum(bins);
        let right: Vec<f32> = left.iter().map(|v| v - 2.0).collect();
        group.throughput(Throughput::Elements(bins as u64));

        let policies = [
            ("peak", BinCombine::PeakEnvelope, false),
            ("average", BinCombine::Average, false),
            ("weighted", BinCombine::Average, true),
        ];
        for (name, combine, frequency_weighted) in policies {
            let config = MapperConfig {
                combine,
                frequency_weighted,
                noise_floor_db: Some(-100.0),
                smoothing_radius: 2,
                ..MapperConfig::default()
            };
            let Ok(mut mapper) = SpectralMapper::new(config) else {
                continue;
            };
            group.bench_with_input(BenchmarkId::new(name, bins), &bins, |b, _| {
                b.iter(|| {
                    black_box(
                        mapper
                            .map_to_columns(black_box(&left), Some(black_box(&right[..])), SAMPLE_RATE)
                            .ok(),
                    )
                })
            });
        }
    }

    group.finish();
}

fn bench_magnitude(c: &mut Criterion) {
    let mut group = c.benchmark_group("magnitude");

    for &size in &[1024usize, 8192] {
        let Ok(mut analyzer) = MagnitudeAnalyzer::new(size) else {
            continue;
        };
        let samples: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        let mut out = vec![0.0; size / 2];
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(analyzer.analyze_into(black_box(&samples), &mut out).ok()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_map_to_columns, bench_magnitude);
criterion_main!(benches);
