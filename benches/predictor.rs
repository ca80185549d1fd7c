use criterion::{black_box, Criterion, Throughput};
use tiffcore::predictor::{hpredict_nsamp, rev_hpredict_nsamp};

fn synthetic_row_major(width: usize, height: usize, samples: usize) -> Vec<u16> {
    let mut data = Vec::with_capacity(width * height * samples);
    for y in 0..height {
        for x in 0..width {
            for s in 0..samples {
                data.push(((x + y * 3 + s) % 4096) as u16);
            }
        }
    }
    data
}

fn main() {
    let mut c = Criterion::default().configure_from_args();
    let mut group = c.benchmark_group("tiff-predictor");

    let shapes: &[(&str, usize, usize, usize)] = &[
        ("gray-512x512", 512, 512, 1),
        ("rgb-512x512", 512, 512, 3),
        ("rgba-256x256", 256, 256, 4),
    ];

    for &(id, width, height, samples) in shapes {
        let raw = synthetic_row_major(width, height, samples);
        let byte_len = (raw.len() * std::mem::size_of::<u16>()) as u64;

        group
            .throughput(Throughput::Bytes(byte_len))
            .bench_function(format!("encode/{id}"), |b| {
                b.iter(|| {
                    let mut buf = raw.clone();
                    hpredict_nsamp(black_box(&mut buf), (width, height), width, samples);
                    black_box(buf)
                })
            });

        let mut predicted = raw.clone();
        hpredict_nsamp(&mut predicted, (width, height), width, samples);

        group
            .throughput(Throughput::Bytes(byte_len))
            .bench_function(format!("decode/{id}"), |b| {
                b.iter(|| {
                    let mut buf = predicted.clone();
                    rev_hpredict_nsamp(black_box(&mut buf), (width, height), width, samples);
                    black_box(buf)
                })
            });
    }
}
