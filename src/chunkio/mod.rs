//! Chunk encoder/decoder (§4.8): predictor + compressor orchestration for a
//! single tile or strip, with scratch-buffer reuse across chunks.
//!
//! Generalizes the teacher's `encoder::compression::{Compressor,
//! CompressionAlgorithm, Compression}` traits (`Write`-sink encoders) and its
//! ad hoc `Read`-adapter decoders (`decoder::stream::{PackBitsReader,
//! LZWReader}`) onto the spec's byte-range `compress`/`decompress` contract
//! (§6.4); see [`compression`] for the concrete algorithms.

pub mod compression;

use half::f16;

use crate::binary::{Byteswap, ByteOrder};
use crate::bytecast;
use crate::error::{TiffFormatError, TiffResult, TiffUnsupportedError};
use crate::predictor::{self, Float24};
use crate::tags::{CompressionMethod, Predictor as PredictorTag};

pub use compression::{Packbits, Uncompressed};

/// A byte-range compression capability (§6.4): "exposes `compress(input) ->
/// output` and a declared identifier". Free of endian/predictor knowledge.
pub trait Compressor {
    fn identifier(&self) -> CompressionMethod;
    fn compress(&mut self, input: &[u8]) -> TiffResult<Vec<u8>>;
}

/// A byte-range decompression capability (§6.4): "`decompress(input, dst) ->
/// bytes_written` with a known expected output size".
pub trait Decompressor {
    fn identifier(&self) -> CompressionMethod;
    fn decompress(&mut self, input: &[u8], dst: &mut [u8]) -> TiffResult<usize>;
}

impl Compressor for Box<dyn Compressor> {
    fn identifier(&self) -> CompressionMethod {
        (**self).identifier()
    }

    fn compress(&mut self, input: &[u8]) -> TiffResult<Vec<u8>> {
        (**self).compress(input)
    }
}

impl Decompressor for Box<dyn Decompressor> {
    fn identifier(&self) -> CompressionMethod {
        (**self).identifier()
    }

    fn decompress(&mut self, input: &[u8], dst: &mut [u8]) -> TiffResult<usize> {
        (**self).decompress(input, dst)
    }
}

/// Native sample type of a chunk buffer (§3 "sample-format" crossed with
/// "bits-per-sample"). Drives which predictor path (§4.6) applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SampleKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F16,
    F24,
    F32,
    F64,
}

impl SampleKind {
    pub fn byte_len(self) -> usize {
        match self {
            SampleKind::U8 | SampleKind::I8 => 1,
            SampleKind::U16 | SampleKind::I16 | SampleKind::F16 => 2,
            SampleKind::F24 => 3,
            SampleKind::U32 | SampleKind::I32 | SampleKind::F32 => 4,
            SampleKind::U64 | SampleKind::I64 | SampleKind::F64 => 8,
        }
    }

    fn is_float(self) -> bool {
        matches!(self, SampleKind::F16 | SampleKind::F24 | SampleKind::F32 | SampleKind::F64)
    }
}

/// A chunk's sample data, already split out by native type so the
/// predictor's per-type traits (`Wrapping` for integers, `AsNeMutBytes` +
/// `Reorder`/`Unshuffle` for floats) apply directly (§4.6).
#[derive(Clone, Debug)]
pub enum SampleBuffer {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    U64(Vec<u64>),
    I64(Vec<i64>),
    F16(Vec<f16>),
    F24(Vec<Float24>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! read_ne {
    ($bytes:expr, $ty:ty, $len:expr) => {
        $bytes
            .chunks_exact($len)
            .map(|c| <$ty>::from_ne_bytes(c.try_into().unwrap()))
            .collect()
    };
}

impl SampleBuffer {
    pub fn kind(&self) -> SampleKind {
        match self {
            SampleBuffer::U8(_) => SampleKind::U8,
            SampleBuffer::I8(_) => SampleKind::I8,
            SampleBuffer::U16(_) => SampleKind::U16,
            SampleBuffer::I16(_) => SampleKind::I16,
            SampleBuffer::U32(_) => SampleKind::U32,
            SampleBuffer::I32(_) => SampleKind::I32,
            SampleBuffer::U64(_) => SampleKind::U64,
            SampleBuffer::I64(_) => SampleKind::I64,
            SampleBuffer::F16(_) => SampleKind::F16,
            SampleBuffer::F24(_) => SampleKind::F24,
            SampleBuffer::F32(_) => SampleKind::F32,
            SampleBuffer::F64(_) => SampleKind::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::U8(v) => v.len(),
            SampleBuffer::I8(v) => v.len(),
            SampleBuffer::U16(v) => v.len(),
            SampleBuffer::I16(v) => v.len(),
            SampleBuffer::U32(v) => v.len(),
            SampleBuffer::I32(v) => v.len(),
            SampleBuffer::U64(v) => v.len(),
            SampleBuffer::I64(v) => v.len(),
            SampleBuffer::F16(v) => v.len(),
            SampleBuffer::F24(v) => v.len(),
            SampleBuffer::F32(v) => v.len(),
            SampleBuffer::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds a sample buffer from raw native-endian bytes (e.g. a
    /// decompressor's output), elementwise (`from_ne_bytes`) rather than by
    /// unsafe reinterpretation, since the source buffer has no alignment
    /// guarantee for wider types.
    pub fn from_native_bytes(kind: SampleKind, bytes: &[u8]) -> Self {
        match kind {
            SampleKind::U8 => SampleBuffer::U8(bytes.to_vec()),
            SampleKind::I8 => SampleBuffer::I8(bytes.iter().map(|&b| b as i8).collect()),
            SampleKind::U16 => SampleBuffer::U16(read_ne!(bytes, u16, 2)),
            SampleKind::I16 => SampleBuffer::I16(read_ne!(bytes, i16, 2)),
            SampleKind::U32 => SampleBuffer::U32(read_ne!(bytes, u32, 4)),
            SampleKind::I32 => SampleBuffer::I32(read_ne!(bytes, i32, 4)),
            SampleKind::U64 => SampleBuffer::U64(read_ne!(bytes, u64, 8)),
            SampleKind::I64 => SampleBuffer::I64(read_ne!(bytes, i64, 8)),
            SampleKind::F16 => SampleBuffer::F16(
                bytes
                    .chunks_exact(2)
                    .map(|c| f16::from_bits(u16::from_ne_bytes(c.try_into().unwrap())))
                    .collect(),
            ),
            SampleKind::F24 => SampleBuffer::F24(
                bytes
                    .chunks_exact(3)
                    .map(|c| Float24::from_bits(u32::from_ne_bytes([0, c[0], c[1], c[2]])))
                    .collect(),
            ),
            SampleKind::F32 => SampleBuffer::F32(read_ne!(bytes, f32, 4)),
            SampleKind::F64 => SampleBuffer::F64(read_ne!(bytes, f64, 8)),
        }
    }

    /// Borrows this buffer's elements as raw native-endian bytes, zero-copy
    /// via [`crate::bytecast`].
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            SampleBuffer::U8(v) => v.clone(),
            SampleBuffer::I8(v) => bytecast::i8_as_ne_bytes(v).to_vec(),
            SampleBuffer::U16(v) => bytecast::u16_as_ne_bytes(v).to_vec(),
            SampleBuffer::I16(v) => bytecast::i16_as_ne_bytes(v).to_vec(),
            SampleBuffer::U32(v) => bytecast::u32_as_ne_bytes(v).to_vec(),
            SampleBuffer::I32(v) => bytecast::i32_as_ne_bytes(v).to_vec(),
            SampleBuffer::U64(v) => bytecast::u64_as_ne_bytes(v).to_vec(),
            SampleBuffer::I64(v) => bytecast::i64_as_ne_bytes(v).to_vec(),
            SampleBuffer::F16(v) => bytecast::f16_as_ne_bytes(v).to_vec(),
            SampleBuffer::F24(v) => bytecast::float24_as_ne_bytes(v).to_vec(),
            SampleBuffer::F32(v) => bytecast::f32_as_ne_bytes(v).to_vec(),
            SampleBuffer::F64(v) => bytecast::f64_as_ne_bytes(v).to_vec(),
        }
    }

    /// Byte-swaps every element in place (§4.8 step (b)/(c): "if wire endian
    /// != host endian, byte-swap"). A no-op for single-byte kinds.
    fn byteswap(&mut self) {
        match self {
            SampleBuffer::U8(_) | SampleBuffer::I8(_) => {}
            SampleBuffer::U16(v) => v.as_mut_slice().byteswap(),
            SampleBuffer::I16(v) => v.as_mut_slice().byteswap(),
            SampleBuffer::U32(v) => v.as_mut_slice().byteswap(),
            SampleBuffer::I32(v) => v.as_mut_slice().byteswap(),
            SampleBuffer::U64(v) => v.as_mut_slice().byteswap(),
            SampleBuffer::I64(v) => v.as_mut_slice().byteswap(),
            SampleBuffer::F32(v) => v.as_mut_slice().byteswap(),
            SampleBuffer::F64(v) => v.as_mut_slice().byteswap(),
            SampleBuffer::F16(v) => {
                for x in v.iter_mut() {
                    *x = f16::from_bits(x.to_bits().swap_bytes());
                }
            }
            SampleBuffer::F24(v) => {
                for x in v.iter_mut() {
                    let [a, b, c] = x.to_be_bytes();
                    *x = Float24::from_be_bytes([c, b, a]);
                }
            }
        }
    }

    /// Applies the horizontal-differencing predictor (§4.6) in place.
    /// `samples` is the chunk's own sample count per pixel (one for planar
    /// chunks, the full vector for chunky chunks).
    fn predict_horizontal(&mut self, width: usize, height: usize, samples: usize, encode: bool) -> TiffResult<()> {
        macro_rules! run {
            ($v:expr) => {
                if encode {
                    predictor::hpredict_nsamp($v, (width, height), width, samples)
                } else {
                    predictor::rev_hpredict_nsamp($v, (width, height), width, samples)
                }
            };
        }
        match self {
            SampleBuffer::U8(v) => run!(v),
            SampleBuffer::I8(v) => run!(v),
            SampleBuffer::U16(v) => run!(v),
            SampleBuffer::I16(v) => run!(v),
            SampleBuffer::U32(v) => run!(v),
            SampleBuffer::I32(v) => run!(v),
            SampleBuffer::U64(v) => run!(v),
            SampleBuffer::I64(v) => run!(v),
            _ => {
                return Err(TiffUnsupportedError::HorizontalPredictor(crate::ColorType::Multiband {
                    bit_depth: self.kind().byte_len() as u8 * 8,
                    num_samples: samples as u16,
                })
                .into())
            }
        }
        Ok(())
    }

    /// Applies the floating-point byte-shuffle predictor (§4.6) in place,
    /// reusing `scratch` for its row buffer rather than allocating one per
    /// call (the caller - `ChunkEncoder`/`ChunkDecoder` - owns `scratch` and
    /// keeps it across chunks, per §4.8).
    fn predict_floating_point(&mut self, width: usize, height: usize, samples: usize, encode: bool, scratch: &mut Vec<u8>) -> TiffResult<()> {
        let byte_len = self.kind().byte_len();
        scratch.clear();
        scratch.resize(width * samples * byte_len, 0);
        macro_rules! run {
            ($v:expr) => {
                if encode {
                    predictor::fp_unpredict($v, scratch, (width, height), width, samples, byte_len)
                } else {
                    predictor::fp_predict($v, scratch, (width, height), width, samples, byte_len)
                }
            };
        }
        match self {
            SampleBuffer::F16(v) => run!(v),
            SampleBuffer::F24(v) => run!(v),
            SampleBuffer::F32(v) => run!(v),
            SampleBuffer::F64(v) => run!(v),
            _ => {
                return Err(TiffUnsupportedError::FloatingPointPredictor(crate::ColorType::Multiband {
                    bit_depth: self.kind().byte_len() as u8 * 8,
                    num_samples: samples as u16,
                })
                .into())
            }
        }
        Ok(())
    }
}

/// The shape a chunk's sample buffer must have for predictor application
/// (§4.6: "row stride and samples-per-pixel are explicit").
#[derive(Clone, Copy, Debug)]
pub struct ChunkSampleShape {
    pub width: usize,
    pub height: usize,
    pub samples_per_pixel: usize,
}

/// Orchestrates predictor -> byteswap -> compress for writing one chunk
/// (§4.8 "Encode"), reusing its compressor and a scratch buffer (the
/// floating-point predictor's row-shuffle workspace) across calls.
pub struct ChunkEncoder<C> {
    predictor: PredictorTag,
    wire_order: ByteOrder,
    compressor: C,
    scratch: Vec<u8>,
}

impl<C: Compressor> ChunkEncoder<C> {
    pub fn new(compressor: C, predictor: PredictorTag, wire_order: ByteOrder) -> Self {
        ChunkEncoder {
            predictor,
            wire_order,
            compressor,
            scratch: Vec::new(),
        }
    }

    /// Encodes one chunk: predictor (if any) in native order, byte-swap to
    /// wire endian (if needed), then compress (§4.8 steps a-c). Returns the
    /// compressed bytes; the caller records `uncompressed_size` (from
    /// `shape`) and `compressed_size` (the returned buffer's length) into
    /// the chunk's metadata.
    pub fn encode(&mut self, mut samples: SampleBuffer, shape: ChunkSampleShape) -> TiffResult<Vec<u8>> {
        match self.predictor {
            PredictorTag::None => {}
            PredictorTag::Horizontal => {
                samples.predict_horizontal(shape.width, shape.height, shape.samples_per_pixel, true)?;
            }
            PredictorTag::FloatingPoint => {
                samples.predict_floating_point(shape.width, shape.height, shape.samples_per_pixel, true, &mut self.scratch)?;
            }
        }

        if host_order() != self.wire_order {
            samples.byteswap();
        }

        self.compressor.compress(&samples.as_bytes())
    }

    pub fn compressor(&self) -> &C {
        &self.compressor
    }

    /// Releases the scratch buffer (§4.8 "`clear()` releases them").
    pub fn clear(&mut self) {
        self.scratch = Vec::new();
    }
}

/// Orchestrates decompress -> byteswap -> predictor-undo for reading one
/// chunk (§4.8 "Decode").
pub struct ChunkDecoder<D> {
    predictor: PredictorTag,
    wire_order: ByteOrder,
    decompressor: D,
    scratch: Vec<u8>,
}

impl<D: Decompressor> ChunkDecoder<D> {
    pub fn new(decompressor: D, predictor: PredictorTag, wire_order: ByteOrder) -> Self {
        ChunkDecoder {
            predictor,
            wire_order,
            decompressor,
            scratch: Vec::new(),
        }
    }

    /// Decodes one chunk into a [`SampleBuffer`] of `kind`, whose element
    /// count must equal `shape.width * shape.height * shape.samples_per_pixel`.
    pub fn decode(&mut self, compressed: &[u8], kind: SampleKind, shape: ChunkSampleShape) -> TiffResult<SampleBuffer> {
        let sample_count = shape.width * shape.height * shape.samples_per_pixel;
        let byte_len = sample_count * kind.byte_len();

        self.scratch.clear();
        self.scratch.resize(byte_len, 0);
        let written = self.decompressor.decompress(compressed, &mut self.scratch)?;
        if written != byte_len {
            return Err(TiffFormatError::UnexpectedCompressedData {
                actual_bytes: written,
                required_bytes: byte_len,
            }
            .into());
        }

        let mut samples = SampleBuffer::from_native_bytes(kind, &self.scratch);

        if host_order() != self.wire_order {
            samples.byteswap();
        }

        match self.predictor {
            PredictorTag::None => {}
            PredictorTag::Horizontal => {
                samples.predict_horizontal(shape.width, shape.height, shape.samples_per_pixel, false)?;
            }
            PredictorTag::FloatingPoint => {
                samples.predict_floating_point(shape.width, shape.height, shape.samples_per_pixel, false, &mut self.scratch)?;
            }
        }

        Ok(samples)
    }

    /// Releases the scratch buffer (§4.8 "`clear()` releases them").
    pub fn clear(&mut self) {
        self.scratch = Vec::new();
    }
}

fn host_order() -> ByteOrder {
    if cfg!(target_endian = "big") {
        ByteOrder::BigEndian
    } else {
        ByteOrder::LittleEndian
    }
}

/// Picks the `Compressor`/`Decompressor` pair the catalogue's
/// `Compression` tag identifier names (§6.3). Unknown identifiers fail with
/// `UnsupportedCompression` (§4.4); feature-gated algorithms that weren't
/// compiled in do the same.
pub fn compressor_for(method: CompressionMethod) -> TiffResult<Box<dyn Compressor>> {
    match method {
        CompressionMethod::None => Ok(Box::new(Uncompressed)),
        CompressionMethod::PackBits => Ok(Box::new(Packbits)),
        #[cfg(feature = "deflate")]
        CompressionMethod::Deflate | CompressionMethod::OldDeflate => Ok(Box::new(compression::Deflate::default())),
        #[cfg(feature = "lzw")]
        CompressionMethod::LZW => Ok(Box::new(compression::Lzw)),
        #[cfg(feature = "zstd")]
        CompressionMethod::ZSTD => Ok(Box::new(compression::Zstd::default())),
        other => Err(TiffUnsupportedError::UnsupportedCompressionMethod(other).into()),
    }
}

pub fn decompressor_for(method: CompressionMethod) -> TiffResult<Box<dyn Decompressor>> {
    match method {
        CompressionMethod::None => Ok(Box::new(Uncompressed)),
        CompressionMethod::PackBits => Ok(Box::new(Packbits)),
        #[cfg(feature = "deflate")]
        CompressionMethod::Deflate | CompressionMethod::OldDeflate => Ok(Box::new(compression::Inflate)),
        #[cfg(feature = "lzw")]
        CompressionMethod::LZW => Ok(Box::new(compression::Lzw)),
        #[cfg(feature = "zstd")]
        CompressionMethod::ZSTD => Ok(Box::new(compression::Unzstd)),
        other => Err(TiffUnsupportedError::UnsupportedCompressionMethod(other).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_round_trips_uncompressed_with_horizontal_predictor() {
        let shape = ChunkSampleShape {
            width: 4,
            height: 2,
            samples_per_pixel: 3,
        };
        let pixels: Vec<u16> = vec![
            10, 20, 30, 11, 22, 33, 15, 25, 35, 14, 24, 34, 1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4,
        ];
        let original = SampleBuffer::U16(pixels.clone());

        let mut encoder = ChunkEncoder::new(Uncompressed, PredictorTag::Horizontal, ByteOrder::LittleEndian);
        let compressed = encoder.encode(original.clone(), shape).unwrap();

        let mut decoder = ChunkDecoder::new(Uncompressed, PredictorTag::Horizontal, ByteOrder::LittleEndian);
        let decoded = decoder.decode(&compressed, SampleKind::U16, shape).unwrap();

        match decoded {
            SampleBuffer::U16(v) => assert_eq!(v, pixels),
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn rgb_row_matches_spec_scenario_4() {
        // §8 scenario 4: a single RGB row, predictor=2.
        let shape = ChunkSampleShape {
            width: 4,
            height: 1,
            samples_per_pixel: 3,
        };
        let pixels: Vec<u8> = vec![10, 20, 30, 11, 22, 33, 15, 25, 35, 14, 24, 34];
        let mut buf = SampleBuffer::U8(pixels.clone());
        buf.predict_horizontal(shape.width, shape.height, shape.samples_per_pixel, true)
            .unwrap();
        match &buf {
            SampleBuffer::U8(v) => {
                assert_eq!(
                    v,
                    &[10, 20, 30, 1, 2, 3, 4, 3, 2, (14i16 - 15) as u8, (24i16 - 25) as u8, (34i16 - 35) as u8]
                );
            }
            _ => unreachable!(),
        }
        buf.predict_horizontal(shape.width, shape.height, shape.samples_per_pixel, false)
            .unwrap();
        match buf {
            SampleBuffer::U8(v) => assert_eq!(v, pixels),
            _ => unreachable!(),
        }
    }

    #[test]
    fn endian_swapped_chunk_round_trips() {
        let shape = ChunkSampleShape {
            width: 2,
            height: 2,
            samples_per_pixel: 1,
        };
        let pixels: Vec<u32> = vec![1, 0x0200, 0x00030000, 0xdead_beef];
        let wire_order = if host_order() == ByteOrder::LittleEndian {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        };

        let mut encoder = ChunkEncoder::new(Uncompressed, PredictorTag::None, wire_order);
        let compressed = encoder.encode(SampleBuffer::U32(pixels.clone()), shape).unwrap();

        let mut decoder = ChunkDecoder::new(Uncompressed, PredictorTag::None, wire_order);
        let decoded = decoder.decode(&compressed, SampleKind::U32, shape).unwrap();
        match decoded {
            SampleBuffer::U32(v) => assert_eq!(v, pixels),
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn unknown_compression_identifier_is_rejected() {
        assert!(compressor_for(CompressionMethod::Huffman).is_err());
    }
}
