use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use detector::decode::decode_image;
use detector::processing::{
    post::PostProcessor,
    pre::{Letterbox, PreProcessor},
};
use image::{ImageFormat, Rgb, RgbImage};
use ndarray::{Array, IxDyn};
use std::io::Cursor;

/// Gradient image, closer to a real photo than a solid colour
fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 255) / width) as u8,
            ((y * 255) / height) as u8,
            (((x + y) * 127) / (width + height)) as u8,
        ])
    })
}

/// Mock YOLOv8 head with 8400 anchors and `num_detections` confident boxes
fn create_mock_yolo_output(num_detections: usize) -> Array<f32, IxDyn> {
    let num_anchors = 8400;
    let mut output = Array::zeros(IxDyn(&[1, 6, num_anchors]));
    for i in 0..num_anchors {
        output[[0, 4, i]] = 0.01;
    }
    for i in 0..num_detections.min(num_anchors) {
        let cx = 20.0 + (i % 20) as f32 * 30.0;
        let cy = 20.0 + (i / 20) as f32 * 30.0;
        output[[0, 0, i]] = cx;
        output[[0, 1, i]] = cy;
        output[[0, 2, i]] = 25.0;
        output[[0, 3, i]] = 25.0;
        output[[0, 4 + i % 2, i]] = 0.9;
    }
    output
}

fn benchmark_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoding");

    for (width, height) in [(640, 480), (1920, 1080)] {
        let mut jpeg = Cursor::new(Vec::new());
        gradient_image(width, height)
            .write_to(&mut jpeg, ImageFormat::Jpeg)
            .unwrap();
        let bytes = jpeg.into_inner();

        group.bench_with_input(
            BenchmarkId::new("jpeg", format!("{}x{}", width, height)),
            &bytes,
            |b, bytes| b.iter(|| decode_image(black_box(bytes)).unwrap()),
        );
    }

    group.finish();
}

fn benchmark_preprocessing(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocessing");

    let resolutions = [(640, 480), (1280, 720), (1920, 1080)];

    for (width, height) in resolutions {
        let image = gradient_image(width, height);
        let mut preprocessor = PreProcessor::default();

        group.bench_with_input(
            BenchmarkId::new("letterbox", format!("{}x{}", width, height)),
            &image,
            |b, image| b.iter(|| preprocessor.preprocess(black_box(image)).unwrap()),
        );
    }

    group.finish();
}

fn benchmark_postprocessing(c: &mut Criterion) {
    let mut group = c.benchmark_group("postprocessing");
    let post_processor = PostProcessor::new(0.25, 0.7, 300);
    let letterbox = Letterbox {
        orig_width: 1920,
        orig_height: 1080,
        scale: 1.0 / 3.0,
        offset_x: 0.0,
        offset_y: 140.0,
    };

    for num_detections in [0, 5, 50, 200] {
        let output = create_mock_yolo_output(num_detections);

        group.bench_with_input(
            BenchmarkId::new("parse_detections", num_detections),
            &output,
            |b, output| {
                b.iter(|| {
                    post_processor
                        .parse_detections(black_box(&output.view()), black_box(&letterbox))
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_decoding,
    benchmark_preprocessing,
    benchmark_postprocessing
);
criterion_main!(benches);
