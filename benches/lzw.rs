use criterion::{black_box, Criterion, Throughput};
use tiffcore::chunkio::compression::Lzw;
use tiffcore::chunkio::{Compressor, Decompressor};

/// Deterministic synthetic strip with enough local repetition for LZW to
/// actually shrink, so the benchmark isn't just measuring pass-through.
fn synthetic_strip(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push(((x / 4 + y) % 251) as u8);
        }
    }
    data
}

fn main() {
    let mut c = Criterion::default().configure_from_args();
    let mut group = c.benchmark_group("tiff-lzw");

    let strips: &[(&str, usize, usize)] = &[
        ("256x256", 256, 256),
        ("512x512", 512, 512),
        ("1024x64", 1024, 64),
    ];

    for &(id, width, height) in strips {
        let raw = synthetic_strip(width, height);
        let compressed = {
            let mut lzw = Lzw;
            lzw.compress(&raw).unwrap()
        };

        group
            .throughput(Throughput::Bytes(raw.len() as u64))
            .bench_function(format!("compress/{id}"), |b| {
                b.iter(|| {
                    let mut lzw = Lzw;
                    black_box(lzw.compress(black_box(&raw)).unwrap())
                })
            });

        group
            .throughput(Throughput::Bytes(raw.len() as u64))
            .bench_function(format!("decompress/{id}"), |b| {
                b.iter(|| {
                    let mut lzw = Lzw;
                    let mut dst = vec![0u8; raw.len()];
                    lzw.decompress(black_box(&compressed), &mut dst).unwrap();
                    black_box(dst)
                })
            });
    }
}
