//! Benchmarks for per-pass training and inference.
//! Run with: cargo bench -p lutdenoise --bench codec

use std::hint::black_box;

use common::Buffer2;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lutdenoise::{denoise_image, Cascade, Codec, GrayImage};

fn test_image(width: usize, height: usize, seed: usize) -> GrayImage {
    Buffer2::from_fn(width, height, |x, y| {
        let base = if (x / 32 + y / 32) % 2 == 0 { 70 } else { 170 };
        let noise = ((x * 7919 + y * 104_729 + seed * 31) % 11) as i32 - 5;
        (base + noise) as u8
    })
}

fn benchmarks(c: &mut Criterion) {
    let codec = Codec::new(0);
    let mut apply = c.benchmark_group("codec_apply");
    for size in [256, 1024] {
        let image = test_image(size, size, 0);
        apply.throughput(Throughput::Elements((size * size) as u64));
        apply.bench_with_input(
            BenchmarkId::new("size", format!("{size}x{size}")),
            &image,
            |b, image| b.iter(|| black_box(codec.apply(black_box(image)))),
        );
    }
    apply.finish();

    let mut train = c.benchmark_group("codec_train");
    let input = test_image(512, 512, 1);
    let reference = test_image(512, 512, 2);
    train.throughput(Throughput::Elements((512 * 512) as u64));
    train.bench_function("512x512", |b| {
        b.iter(|| codec.train(black_box(&input), black_box(&reference)))
    });
    train.finish();

    let cascade = Cascade::new(3);
    let image = test_image(512, 512, 3);
    c.bench_function("denoise_image_3_passes_512x512", |b| {
        b.iter(|| black_box(denoise_image(&cascade, black_box(&image), 32)))
    });
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
