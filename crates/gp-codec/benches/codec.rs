use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use gp_codec::FrameEncoder;
use gp_codec::dither::disperse;
use gp_codec::encoder::encode_quantized;
use gp_core::frame::{GrayFrame, Grid};

fn gradient(width: usize, height: usize) -> GrayFrame {
    let cells = (0..width * height)
        .map(|i| ((i % width) * 255 / width.max(1)) as u8 ^ ((i / width) as u8).wrapping_mul(13))
        .collect();
    Grid::from_vec(width, height, cells).expect("valid bench frame")
}

fn bench_disperse(c: &mut Criterion) {
    let frame = gradient(80, 22);
    c.bench_function("disperse 80x22", |b| {
        b.iter(|| disperse(black_box(&frame)));
    });
}

fn bench_encode_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_frame");
    for (w, h) in [(80, 22), (160, 45), (320, 90)] {
        let frame = gradient(w, h);
        let encoder = FrameEncoder::new(w, h).expect("valid bench size");
        let quantized = disperse(&frame);
        group.bench_with_input(BenchmarkId::new("full", format!("{w}x{h}")), &frame, |b, f| {
            b.iter(|| encoder.encode(0, black_box(f)));
        });
        group.bench_with_input(
            BenchmarkId::new("quantized", format!("{w}x{h}")),
            &quantized,
            |b, q| b.iter(|| encode_quantized(black_box(q))),
        );
    }
    group.finish();
}

fn bench_encode_batch(c: &mut Criterion) {
    let encoder = FrameEncoder::new(80, 22).expect("valid bench size");
    let frames: Vec<GrayFrame> = (0..256).map(|_| gradient(80, 22)).collect();
    c.bench_function("encode_all 256 frames", |b| {
        b.iter(|| encoder.encode_all(black_box(&frames)));
    });
}

criterion_group!(benches, bench_disperse, bench_encode_frame, bench_encode_batch);
criterion_main!(benches);
