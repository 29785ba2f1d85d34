// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the OMR pipeline in the markwerk-vision crate.
// Benchmarks adaptive binarization alone and the full check on a synthetic
// 10x4 sheet.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, Rgb, RgbImage};

use markwerk_vision::{preprocess, OmrChecker};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Paint a synthetic 10x4 sheet with one pencil mark per row.
fn synthetic_sheet(cell: u32) -> DynamicImage {
    let (rows, cols) = (10u32, 4u32);
    let mut img = RgbImage::from_pixel(cols * cell, rows * cell, Rgb([250, 250, 250]));
    for row in 0..rows {
        let col = row % cols;
        let cx = col * cell + cell / 2;
        let cy = row * cell + cell / 2;
        for y in cy - 5..cy + 5 {
            for x in cx - 5..cx + 5 {
                img.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
    }
    DynamicImage::ImageRgb8(img)
}

/// Benchmark adaptive binarization on a 160x400 sheet photo. The integral
/// image makes this linear in the pixel count; this tracks the constant.
fn bench_preprocess(c: &mut Criterion) {
    let sheet = synthetic_sheet(40);

    c.bench_function("preprocess (160x400)", |b| {
        b.iter(|| {
            let mask = preprocess(black_box(&sheet)).unwrap();
            black_box(mask);
        });
    });
}

/// Benchmark the complete check — two binarizations, two extractions,
/// scoring, and annotation — on a pair of synthetic sheets.
fn bench_full_check(c: &mut Criterion) {
    let key = synthetic_sheet(40);
    let student = synthetic_sheet(40);
    let checker = OmrChecker::with_defaults();

    c.bench_function("omr_check (160x400 pair)", |b| {
        b.iter(|| {
            let outcome = checker
                .run(black_box(&key), black_box(&student))
                .unwrap();
            black_box(outcome.score.correct_count);
        });
    });
}

criterion_group!(benches, bench_preprocess, bench_full_check);
criterion_main!(benches);
