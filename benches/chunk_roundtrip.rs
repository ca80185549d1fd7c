use criterion::{black_box, Criterion, Throughput};
use tiffcore::binary::ByteOrder;
use tiffcore::chunkio::{
    compressor_for, decompressor_for, ChunkDecoder, ChunkEncoder, ChunkSampleShape, SampleBuffer,
    SampleKind,
};
use tiffcore::tags::{CompressionMethod, Predictor};

fn synthetic_tile(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push(((x * 3 + y * 7) % 256) as u8);
        }
    }
    data
}

fn main() {
    let mut c = Criterion::default().configure_from_args();
    let mut group = c.benchmark_group("tiff-chunk-roundtrip");

    let cases: &[(&str, CompressionMethod, Predictor)] = &[
        ("none/no-predictor", CompressionMethod::None, Predictor::None),
        ("packbits/no-predictor", CompressionMethod::PackBits, Predictor::None),
        ("deflate/horizontal", CompressionMethod::Deflate, Predictor::Horizontal),
        ("lzw/horizontal", CompressionMethod::LZW, Predictor::Horizontal),
    ];

    let (width, height) = (256usize, 256usize);
    let shape = ChunkSampleShape {
        width,
        height,
        samples_per_pixel: 1,
    };
    let raw = synthetic_tile(width, height);

    for &(id, compression, predictor) in cases {
        let encoded = {
            let mut encoder = ChunkEncoder::new(compressor_for(compression).unwrap(), predictor, ByteOrder::LittleEndian);
            let samples = SampleBuffer::from_native_bytes(SampleKind::U8, &raw);
            encoder.encode(samples, shape).unwrap()
        };

        group
            .throughput(Throughput::Bytes(raw.len() as u64))
            .bench_function(format!("encode/{id}"), |b| {
                b.iter(|| {
                    let mut encoder =
                        ChunkEncoder::new(compressor_for(compression).unwrap(), predictor, ByteOrder::LittleEndian);
                    let samples = SampleBuffer::from_native_bytes(SampleKind::U8, black_box(&raw));
                    black_box(encoder.encode(samples, shape).unwrap())
                })
            });

        group
            .throughput(Throughput::Bytes(raw.len() as u64))
            .bench_function(format!("decode/{id}"), |b| {
                b.iter(|| {
                    let mut decoder =
                        ChunkDecoder::new(decompressor_for(compression).unwrap(), predictor, ByteOrder::LittleEndian);
                    black_box(
                        decoder
                            .decode(black_box(&encoded), SampleKind::U8, shape)
                            .unwrap(),
                    )
                })
            });
    }
}
