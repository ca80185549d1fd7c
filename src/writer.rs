//! TIFF writer (§4.11, component K): orchestrates the header, IFD, and
//! image data for one page through the write planner (§4.10), the chunk
//! encoder (§4.8), and the tile/strip geometry layer (§4.7), and chains
//! pages into a multi-page file by patching each page's next-IFD pointer.
//!
//! Generalizes the teacher's `TiffEncoder`/`encoder::mod` helpers
//! (`write_image`, the mandatory-tag derivation inlined into
//! `ImageEncoder::write_image`) to run through [`crate::planner::WriteConfig`]
//! instead of one fixed "data then directory" strategy, and to validate
//! user-supplied tag overrides per spec step 1 rather than silently
//! trusting the caller.

use crate::binary::{ByteOrder, FileHeader, Format};
use crate::builder::{self, BuiltIfd, BuiltTag};
use crate::chunkio::{compressor_for, ChunkEncoder, ChunkSampleShape, SampleBuffer, SampleKind};
use crate::error::{TiffFormatError, TiffResult, UsageError};
use crate::geometry::{copy, BufferLayout, ChunkExtent, ChunkLayout, ImageShape, PlanarConfig};
use crate::planner::{IfdPlacement, WriteConfig};
use crate::storage::WriteBackend;
use crate::tags::{CompressionMethod, PhotometricInterpretation, PlanarConfiguration, Predictor, SampleFormat, Tag, Type};
use crate::value::Value;

/// A chunk's fixed extent (tile mode), or `None` for a stripped layout
/// (§3 "stripped ... is the tiled case with tile width = image width").
#[derive(Clone, Copy, Debug)]
pub enum Layout {
    Tiled(ChunkExtent),
    Stripped { rows_per_strip: u32 },
}

/// Everything [`TiffWriter::write_page`] needs to encode and place one
/// page's image data (§4.11).
pub struct ImageWriteRequest<'a> {
    pub image: ImageShape,
    pub layout: Layout,
    /// Interleaving convention of `buffer` (§4.7).
    pub buffer_layout: BufferLayout,
    pub sample_kind: SampleKind,
    pub bits_per_sample: u16,
    pub compression: CompressionMethod,
    pub predictor: Predictor,
    /// Overrides the sample-count-derived default (grayscale for 1 sample,
    /// RGB for 3 or 4) when set.
    pub photometric: Option<PhotometricInterpretation>,
    /// Additional tags the caller wants written (metadata, GeoTIFF keys,
    /// ...), plus any mandatory-tag overrides that must agree with the
    /// computed value (§4.11 step 1). Must not name a computed tag
    /// (`*Offsets`/`*ByteCounts`).
    pub extra_tags: Vec<BuiltTag>,
    /// The whole image's sample data in `buffer_layout`, native-endian,
    /// `sample_kind`-typed.
    pub buffer: &'a [u8],
}

fn sample_format_for(kind: SampleKind) -> SampleFormat {
    match kind {
        SampleKind::U8 | SampleKind::U16 | SampleKind::U32 | SampleKind::U64 => SampleFormat::Uint,
        SampleKind::I8 | SampleKind::I16 | SampleKind::I32 | SampleKind::I64 => SampleFormat::Int,
        SampleKind::F16 | SampleKind::F24 | SampleKind::F32 | SampleKind::F64 => SampleFormat::IEEEFP,
    }
}

fn default_photometric(samples_per_pixel: u16) -> PhotometricInterpretation {
    match samples_per_pixel {
        1 => PhotometricInterpretation::BlackIsZero,
        3 | 4 => PhotometricInterpretation::RGB,
        _ => PhotometricInterpretation::BlackIsZero,
    }
}

/// Tags the writer computes itself and will never accept from
/// `extra_tags` (§4.11 step 1 "forbid user supplying chunk offsets / byte
/// counts").
fn is_computed_tag(tag: Tag) -> bool {
    matches!(
        tag,
        Tag::StripOffsets | Tag::StripByteCounts | Tag::TileOffsets | Tag::TileByteCounts
    )
}

/// Derives the mandatory tags (§4.11 step 2) and checks `extra_tags`
/// against them: a user override must either be absent or agree with the
/// computed value (§4.11 step 1), and must never name a computed tag.
fn mandatory_tags(format: Format, req: &ImageWriteRequest, layout: &ChunkLayout, is_tiled: bool) -> TiffResult<Vec<BuiltTag>> {
    for extra in &req.extra_tags {
        if is_computed_tag(extra.tag) {
            return Err(UsageError::ComputedTagSupplied(extra.tag).into());
        }
    }

    let find_override = |tag: Tag| req.extra_tags.iter().find(|t| t.tag == tag);
    let check_scalar_u32 = |tag: Tag, computed: u32| -> TiffResult<()> {
        if let Some(built) = find_override(tag) {
            let supplied = built.value.clone().into_u32()?;
            if supplied != computed {
                return Err(TiffFormatError::ConflictingTag(tag).into());
            }
        }
        Ok(())
    };

    check_scalar_u32(Tag::ImageWidth, req.image.width)?;
    check_scalar_u32(Tag::ImageLength, req.image.height)?;
    check_scalar_u32(Tag::SamplesPerPixel, req.image.samples_per_pixel as u32)?;

    // Only the chunk offset/byte-count arrays actually need the 8-byte wire
    // width in BigTIFF mode (they index into a file that may exceed 4 GiB);
    // plain dimension tags stay `LONG` in both formats, matching how real
    // BigTIFF writers keep `ImageWidth`/`TileWidth`/etc. at their classic
    // width (e.g. the teacher's `impl TiffValue for u32` uses `Type::LONG`
    // unconditionally - only its `u64`/offset impls use `Type::LONG8`).
    let long_type = if format.is_big() { Type::LONG8 } else { Type::LONG };
    let offset_value = |v: u64| -> Value {
        if format.is_big() {
            Value::UnsignedBig(v)
        } else {
            Value::Unsigned(v as u32)
        }
    };

    let mut tags = Vec::new();
    tags.push(BuiltTag::new(Tag::ImageWidth, Type::LONG, Value::Unsigned(req.image.width)));
    tags.push(BuiltTag::new(Tag::ImageLength, Type::LONG, Value::Unsigned(req.image.height)));
    tags.push(BuiltTag::new(
        Tag::BitsPerSample,
        Type::SHORT,
        Value::List(vec![Value::Short(req.bits_per_sample); req.image.samples_per_pixel as usize]),
    ));
    tags.push(BuiltTag::new(Tag::Compression, Type::SHORT, Value::Short(req.compression.to_u16())));
    let photometric = req.photometric.unwrap_or_else(|| default_photometric(req.image.samples_per_pixel));
    tags.push(BuiltTag::new(Tag::PhotometricInterpretation, Type::SHORT, Value::Short(photometric.to_u16())));
    tags.push(BuiltTag::new(
        Tag::SamplesPerPixel,
        Type::SHORT,
        Value::Short(req.image.samples_per_pixel),
    ));
    tags.push(BuiltTag::new(
        Tag::PlanarConfiguration,
        Type::SHORT,
        Value::Short(match req.image.planar_config {
            PlanarConfig::Chunky => PlanarConfiguration::Chunky.to_u16(),
            PlanarConfig::Planar => PlanarConfiguration::Planar.to_u16(),
        }),
    ));
    if req.predictor != Predictor::None {
        tags.push(BuiltTag::new(Tag::Predictor, Type::SHORT, Value::Short(req.predictor.to_u16())));
    }
    tags.push(BuiltTag::new(
        Tag::SampleFormat,
        Type::SHORT,
        Value::List(vec![Value::Short(sample_format_for(req.sample_kind).to_u16()); req.image.samples_per_pixel as usize]),
    ));

    if is_tiled {
        tags.push(BuiltTag::new(Tag::TileWidth, Type::LONG, Value::Unsigned(layout.chunk.width)));
        tags.push(BuiltTag::new(Tag::TileLength, Type::LONG, Value::Unsigned(layout.chunk.height)));
        if layout.chunk.depth > 1 {
            tags.push(BuiltTag::new(Tag::TileDepth, Type::LONG, Value::Unsigned(layout.chunk.depth)));
        }
    } else {
        tags.push(BuiltTag::new(Tag::RowsPerStrip, Type::LONG, Value::Unsigned(layout.chunk.height)));
    }
    if req.image.depth > 1 {
        tags.push(BuiltTag::new(Tag::ImageDepth, Type::LONG, Value::Unsigned(req.image.depth)));
    }

    // Placeholder computed tags (§4.11 step 2 "empty chunk-offset /
    // chunk-byte-count arrays sized to the layout") - filled with real
    // values once chunks are encoded, before the array is sorted and built.
    let chunk_count = layout.chunk_count() as usize;
    let (offsets_tag, counts_tag) = if is_tiled {
        (Tag::TileOffsets, Tag::TileByteCounts)
    } else {
        (Tag::StripOffsets, Tag::StripByteCounts)
    };
    tags.push(BuiltTag::new(offsets_tag, long_type, Value::List(vec![offset_value(0); chunk_count])));
    tags.push(BuiltTag::new(counts_tag, long_type, Value::List(vec![offset_value(0); chunk_count])));

    for extra in &req.extra_tags {
        tags.push(extra.clone());
    }

    tags.sort_by_key(|t| t.tag.to_u16());
    for pair in tags.windows(2) {
        if pair[0].tag == pair[1].tag {
            return Err(TiffFormatError::ConflictingTag(pair[0].tag).into());
        }
    }
    Ok(tags)
}

/// One encoded chunk awaiting placement: its linear index (so the
/// offset/byte-count arrays can be filled in layout order regardless of the
/// order chunks were encoded in) and compressed bytes.
struct EncodedChunk {
    index: u32,
    bytes: Vec<u8>,
}

fn encode_chunks(req: &ImageWriteRequest, layout: &ChunkLayout, is_tiled: bool, config: &WriteConfig, byte_order: ByteOrder) -> TiffResult<Vec<EncodedChunk>> {
    let element_size = req.sample_kind.byte_len();
    let mut encoder = ChunkEncoder::new(compressor_for(req.compression)?, req.predictor, byte_order);

    let mut out = Vec::with_capacity(layout.chunk_count() as usize);
    for index in config.ordered_chunk_indices(layout) {
        let chunk = layout.chunk_at(index)?;
        let samples = chunk.samples_per_pixel(&req.image);

        // Tiles are always padded to the full tile extent on write; a short
        // last strip (rows_per_strip not dividing the image height) is
        // written at its real, unpadded extent instead (§3, §9 Open
        // Question: this rewrite keeps the spec's relaxed short-strip
        // behaviour rather than the source's `rows_per_strip | height`
        // restriction).
        let out_extent = if is_tiled {
            layout.chunk
        } else {
            ChunkExtent {
                width: chunk.width,
                height: chunk.height,
                depth: chunk.depth,
            }
        };

        let mut tile_bytes = vec![0u8; out_extent.width as usize * out_extent.height as usize * out_extent.depth as usize * samples as usize * element_size];
        copy::copy_buffer_to_tile(req.buffer, &req.image, req.buffer_layout, &chunk, out_extent, element_size, &mut tile_bytes);

        let samples_buf = SampleBuffer::from_native_bytes(req.sample_kind, &tile_bytes);
        let shape = ChunkSampleShape {
            width: out_extent.width as usize,
            height: out_extent.height as usize * out_extent.depth as usize,
            samples_per_pixel: samples as usize,
        };
        let compressed = encoder.encode(samples_buf, shape)?;
        out.push(EncodedChunk { index, bytes: compressed });
    }
    Ok(out)
}

fn write_at<W: WriteBackend>(backend: &mut W, offset: u64, bytes: &[u8]) -> TiffResult<()> {
    let end = offset + bytes.len() as u64;
    if end > backend.size() {
        backend.resize(end)?;
    }
    let mut view = backend.write(offset, bytes.len() as u64)?;
    view.as_mut_slice().copy_from_slice(bytes);
    view.flush()
}

/// 2-byte alignment for external/chunk data, per §6.1 "implementations
/// should prefer 2-byte alignment for wide values".
fn align2(offset: u64) -> u64 {
    (offset + 1) & !1
}

/// What [`write_ifd_at`] actually did, so the caller can advance its cursor
/// without needing to keep the (now consumed) `BuiltIfd` around.
struct PlacedIfd {
    /// Absolute position of the trailing next-IFD-offset field, to patch
    /// once the next page's offset (or end-of-chain) is known.
    next_field_offset: u64,
    /// First byte past the external-data block - the end of everything this
    /// IFD occupies.
    end: u64,
}

/// Writes one page's IFD (with already-known chunk offsets patched in) at
/// `ifd_offset`.
fn write_ifd_at<W: WriteBackend>(backend: &mut W, ifd_offset: u64, mut built: BuiltIfd, external_base: u64, byte_order: ByteOrder, format: Format) -> TiffResult<PlacedIfd> {
    built.relocate_external(external_base)?;

    let count = built.entry_count() as u64;
    let mut header = vec![0u8; format.entry_count_len()];
    match format {
        Format::Classic => crate::binary::write_u16(&mut header, count as u16, byte_order)?,
        Format::Big => crate::binary::write_u64(&mut header, count, byte_order)?,
    }
    write_at(backend, ifd_offset, &header)?;
    write_at(backend, ifd_offset + format.entry_count_len() as u64, built.entries())?;

    let next_field_offset = ifd_offset + format.entry_count_len() as u64 + built.entries().len() as u64;
    let next_placeholder = vec![0u8; format.offset_len()];
    write_at(backend, next_field_offset, &next_placeholder)?;

    write_at(backend, external_base, built.external())?;
    let end = external_base + built.external().len() as u64;
    Ok(PlacedIfd {
        next_field_offset,
        end,
    })
}

fn patch_offset<W: WriteBackend>(backend: &mut W, field_offset: u64, value: u64, byte_order: ByteOrder, format: Format) -> TiffResult<()> {
    let mut bytes = vec![0u8; format.offset_len()];
    match format {
        Format::Classic => crate::binary::write_u32(&mut bytes, u32::try_from(value).map_err(|_| crate::error::TiffError::IntSizeError)?, byte_order)?,
        Format::Big => crate::binary::write_u64(&mut bytes, value, byte_order)?,
    }
    write_at(backend, field_offset, &bytes)
}

/// Orchestrates header + IFD + image data for a (possibly multi-page) TIFF
/// file through a [`WriteConfig`] (§4.11).
pub struct TiffWriter<W> {
    backend: W,
    byte_order: ByteOrder,
    format: Format,
    config: WriteConfig,
    cursor: u64,
    first_ifd_offset: Option<u64>,
    /// Trailing next-IFD-offset field of the most recently written page,
    /// still pointing at the chain terminator `0` until either another page
    /// is written (patched to that page's IFD offset) or `finish()` is
    /// called (left at `0`).
    prev_next_field: Option<u64>,
}

impl<W: WriteBackend> TiffWriter<W> {
    pub fn new(backend: W, byte_order: ByteOrder, format: Format, config: WriteConfig) -> Self {
        TiffWriter {
            backend,
            byte_order,
            format,
            config,
            cursor: u64::from(format.header_len() as u32),
            first_ifd_offset: None,
            prev_next_field: None,
        }
    }

    /// Writes one page (§4.11 `write_image`): validates `request`'s tag
    /// overrides, computes the chunk layout and mandatory tags, encodes
    /// every chunk, and places chunk data and IFD per the configured
    /// [`IfdPlacement`]. Chains from the previous page, if any, by patching
    /// its next-IFD-offset field with this page's IFD offset.
    pub fn write_page(&mut self, request: &ImageWriteRequest) -> TiffResult<()> {
        let is_tiled = matches!(request.layout, Layout::Tiled(_));
        let chunk_extent = match request.layout {
            Layout::Tiled(extent) => extent,
            Layout::Stripped { rows_per_strip } => ChunkExtent {
                width: request.image.width,
                height: rows_per_strip.max(1),
                depth: 1,
            },
        };
        let layout = ChunkLayout::new(request.image, chunk_extent)?;

        let mut tags = mandatory_tags(self.format, request, &layout, is_tiled)?;
        let encoded = encode_chunks(request, &layout, is_tiled, &self.config, self.byte_order)?;

        let (offsets_tag, counts_tag) = if is_tiled {
            (Tag::TileOffsets, Tag::TileByteCounts)
        } else {
            (Tag::StripOffsets, Tag::StripByteCounts)
        };

        let (ifd_offset, placed) = match self.config.ifd_placement {
            IfdPlacement::AtStart => {
                // Sizes are already known (chunks are fully encoded above,
                // satisfying the two-pass/streaming precondition
                // `WriteConfig::validate` enforces for this placement), so
                // the directory can be laid out before any chunk data.
                let ifd_offset = self.cursor;
                let provisional = builder::build(&tags, self.byte_order, self.format)?;
                let entries_len = provisional.entry_count() as u64 * self.format.entry_len() as u64;
                let external_base = align2(ifd_offset + self.format.entry_count_len() as u64 + entries_len + self.format.offset_len() as u64);
                let data_start = align2(external_base + provisional.external().len() as u64);

                let mut chunk_offsets = vec![0u64; layout.chunk_count() as usize];
                let mut chunk_counts = vec![0u64; layout.chunk_count() as usize];
                let mut pos = data_start;
                for chunk in &encoded {
                    chunk_offsets[chunk.index as usize] = pos;
                    chunk_counts[chunk.index as usize] = chunk.bytes.len() as u64;
                    pos = align2(pos + chunk.bytes.len() as u64);
                }
                set_chunk_arrays(&mut tags, offsets_tag, counts_tag, &chunk_offsets, &chunk_counts, self.format);

                let built = builder::build(&tags, self.byte_order, self.format)?;
                let placed = write_ifd_at(&mut self.backend, ifd_offset, built, external_base, self.byte_order, self.format)?;
                for chunk in &encoded {
                    write_at(&mut self.backend, chunk_offsets[chunk.index as usize], &chunk.bytes)?;
                }
                self.cursor = placed.end.max(pos);
                (ifd_offset, placed)
            }
            IfdPlacement::AtEnd | IfdPlacement::Inline(_) => {
                let mut chunk_offsets = vec![0u64; layout.chunk_count() as usize];
                let mut chunk_counts = vec![0u64; layout.chunk_count() as usize];
                let mut pos = self.cursor;
                for chunk in &encoded {
                    chunk_offsets[chunk.index as usize] = pos;
                    chunk_counts[chunk.index as usize] = chunk.bytes.len() as u64;
                    write_at(&mut self.backend, pos, &chunk.bytes)?;
                    pos = align2(pos + chunk.bytes.len() as u64);
                }
                set_chunk_arrays(&mut tags, offsets_tag, counts_tag, &chunk_offsets, &chunk_counts, self.format);

                let built = builder::build(&tags, self.byte_order, self.format)?;
                let ifd_offset = match self.config.ifd_placement {
                    IfdPlacement::Inline(target) => target,
                    _ => pos,
                };
                let entries_len = built.entry_count() as u64 * self.format.entry_len() as u64;
                let external_base = align2(ifd_offset + self.format.entry_count_len() as u64 + entries_len + self.format.offset_len() as u64);
                let placed = write_ifd_at(&mut self.backend, ifd_offset, built, external_base, self.byte_order, self.format)?;

                self.cursor = placed.end.max(pos);
                (ifd_offset, placed)
            }
        };

        // Link the previous page to this one, now that this page's IFD
        // offset is known (§4.11 "multi-page files are supported by
        // chaining").
        if let Some(field) = self.prev_next_field.take() {
            patch_offset(&mut self.backend, field, ifd_offset, self.byte_order, self.format)?;
        }
        if self.first_ifd_offset.is_none() {
            self.first_ifd_offset = Some(ifd_offset);
        }
        self.prev_next_field = Some(placed.next_field_offset);

        Ok(())
    }

    /// Writes a sequence of pages, chaining each one's next-IFD-offset
    /// field to the next (§4.11 "Multi-page files are supported by
    /// chaining").
    pub fn write_pages(&mut self, requests: &[ImageWriteRequest]) -> TiffResult<()> {
        for request in requests {
            self.write_page(request)?;
        }
        Ok(())
    }

    /// Finalizes the file: patches the last page's next-IFD-offset field to
    /// `0` (chain terminator, §3) and writes the file header with the first
    /// page's IFD offset.
    pub fn finish(mut self) -> TiffResult<W> {
        if let Some(field) = self.prev_next_field.take() {
            patch_offset(&mut self.backend, field, 0, self.byte_order, self.format)?;
        }
        let first_ifd_offset = self.first_ifd_offset.ok_or(UsageError::IncompatibleWritePolicies("finish() called with no pages written"))?;
        let mut header = vec![0u8; self.format.header_len()];
        FileHeader::write(&mut header, self.byte_order, self.format, first_ifd_offset)?;
        write_at(&mut self.backend, 0, &header)?;
        self.backend.flush()?;
        Ok(self.backend)
    }
}

fn set_chunk_arrays(tags: &mut [BuiltTag], offsets_tag: Tag, counts_tag: Tag, offsets: &[u64], counts: &[u64], format: Format) {
    let wrap = |v: u64| -> Value {
        if format.is_big() {
            Value::UnsignedBig(v)
        } else {
            Value::Unsigned(v as u32)
        }
    };
    for built in tags.iter_mut() {
        if built.tag == offsets_tag {
            built.value = Value::List(offsets.iter().copied().map(wrap).collect());
        } else if built.tag == counts_tag {
            built.value = Value::List(counts.iter().copied().map(wrap).collect());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::WriteConfig;
    use crate::storage::{BorrowedReadBuffer, StreamBackend};
    use crate::tags::{Predictor as PredictorTag};
    use std::io::Cursor;

    fn gray_image(w: u32, h: u32) -> ImageShape {
        ImageShape {
            width: w,
            height: h,
            depth: 1,
            samples_per_pixel: 1,
            planar_config: PlanarConfig::Chunky,
        }
    }

    #[test]
    fn single_tile_page_round_trips_through_ifd_parser() {
        let image = gray_image(64, 64);
        let pixels: Vec<u8> = (0..64u32 * 64).map(|i| (i % 256) as u8).collect();

        let buf = vec![0u8; 0];
        let cursor = Cursor::new(buf);
        let backend = StreamBackend::new(cursor).unwrap();
        let config = WriteConfig::optimised_for_writing();
        let mut writer = TiffWriter::new(backend, ByteOrder::LittleEndian, Format::Classic, config);

        let request = ImageWriteRequest {
            image,
            layout: Layout::Tiled(ChunkExtent {
                width: 64,
                height: 64,
                depth: 1,
            }),
            buffer_layout: BufferLayout::Dhwc,
            sample_kind: SampleKind::U8,
            bits_per_sample: 8,
            compression: CompressionMethod::None,
            predictor: PredictorTag::None,
            photometric: None,
            extra_tags: Vec::new(),
            buffer: &pixels,
        };
        writer.write_page(&request).unwrap();
        let backend = writer.finish().unwrap();
        let bytes = backend.into_inner().into_inner();

        let read_backend = BorrowedReadBuffer::new(&bytes);
        let header = FileHeader::parse(&bytes).unwrap();
        assert_eq!(header.format, Format::Classic);
        let ifd = crate::ifd::read_ifd(&read_backend, header.first_ifd_offset, header.byte_order, header.format, &crate::limits::Limits::default(), true).unwrap();
        assert_eq!(ifd.find(Tag::ImageWidth.to_u16()).cloned().unwrap().into_u32().unwrap(), 64);
        assert_eq!(ifd.find(Tag::ImageLength.to_u16()).cloned().unwrap().into_u32().unwrap(), 64);

        let tile_offsets = ifd.find(Tag::TileOffsets.to_u16()).cloned().unwrap().into_u64_vec().unwrap();
        let tile_counts = ifd.find(Tag::TileByteCounts.to_u16()).cloned().unwrap().into_u64_vec().unwrap();
        assert_eq!(tile_offsets.len(), 1);
        assert_eq!(tile_counts[0], 4096);

        let tile_bytes = read_backend.read(tile_offsets[0], tile_counts[0]).unwrap();
        assert_eq!(&*tile_bytes, pixels.as_slice());
    }

    #[test]
    fn conflicting_user_width_tag_is_rejected() {
        let image = gray_image(512, 16);
        let pixels = vec![0u8; 512 * 16];
        let layout = ChunkLayout::stripped(image, 16).unwrap();
        let request = ImageWriteRequest {
            image,
            layout: Layout::Stripped { rows_per_strip: 16 },
            buffer_layout: BufferLayout::Dhwc,
            sample_kind: SampleKind::U8,
            bits_per_sample: 8,
            compression: CompressionMethod::None,
            predictor: PredictorTag::None,
            photometric: None,
            extra_tags: vec![BuiltTag::new(Tag::ImageWidth, Type::LONG, Value::Unsigned(500))],
            buffer: &pixels,
        };
        assert!(mandatory_tags(Format::Classic, &request, &layout, false).is_err());
    }

    #[test]
    fn user_supplied_chunk_offsets_are_rejected() {
        let image = gray_image(8, 8);
        let pixels = vec![0u8; 64];
        let layout = ChunkLayout::stripped(image, 8).unwrap();
        let request = ImageWriteRequest {
            image,
            layout: Layout::Stripped { rows_per_strip: 8 },
            buffer_layout: BufferLayout::Dhwc,
            sample_kind: SampleKind::U8,
            bits_per_sample: 8,
            compression: CompressionMethod::None,
            predictor: PredictorTag::None,
            photometric: None,
            extra_tags: vec![BuiltTag::new(Tag::StripOffsets, Type::LONG, Value::Unsigned(0))],
            buffer: &pixels,
        };
        let err = mandatory_tags(Format::Classic, &request, &layout, false).unwrap_err();
        matches!(err, crate::error::TiffError::UsageError(UsageError::ComputedTagSupplied(Tag::StripOffsets)));
    }
}
