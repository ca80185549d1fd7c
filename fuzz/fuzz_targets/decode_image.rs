#![no_main]
use libfuzzer_sys::fuzz_target;

use tiffcore::binary::FileHeader;
use tiffcore::catalogue::standard::{MINIMAL_STRIPPED_CLASSIC, MINIMAL_TILED_CLASSIC};
use tiffcore::chunkio::{decompressor_for, ChunkDecoder, ChunkSampleShape, SampleKind};
use tiffcore::extractor::TagRecord;
use tiffcore::geometry::{ChunkExtent, ChunkLayout, ImageShape, PlanarConfig};
use tiffcore::ifd;
use tiffcore::limits::Limits;
use tiffcore::storage::{BorrowedReadBuffer, ReadBackend};
use tiffcore::tags::{CompressionMethod, Predictor, Tag};

// Drives the same parse -> extract -> chunk-decode path as the public
// roundtrip tests, but over arbitrary bytes: every fallible step is allowed
// to fail, the target only cares that nothing panics or runs away.
fuzz_target!(|data: &[u8]| {
    let _ = decode(data);
});

fn decode(data: &[u8]) -> Option<()> {
    let header = FileHeader::parse(data).ok()?;
    let backend = BorrowedReadBuffer::new(data);
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1_000_000;
    limits.ifd_value_size = 1_000_000;
    limits.intermediate_buffer_size = 1_000_000;

    let mut offset = Some(header.first_ifd_offset);
    let mut pages = 0;
    while let Some(o) = offset {
        if o == 0 || pages >= 64 {
            break;
        }
        let ifd = match ifd::read_ifd(&backend, o, header.byte_order, header.format, &limits, false) {
            Ok(ifd) => ifd,
            Err(_) => break,
        };

        let is_tiled = ifd.find(Tag::TileWidth.to_u16()).is_some();
        let catalogue = if is_tiled { MINIMAL_TILED_CLASSIC } else { MINIMAL_STRIPPED_CLASSIC };
        if let Ok(record) = TagRecord::extract(&ifd, catalogue) {
            decode_page(&backend, &record, is_tiled, header.byte_order);
        }

        offset = ifd.next_offset;
        pages += 1;
    }
    Some(())
}

fn decode_page(backend: &BorrowedReadBuffer, record: &TagRecord, is_tiled: bool, byte_order: tiffcore::binary::ByteOrder) -> Option<()> {
    let width = record.require_tag(Tag::ImageWidth).ok()?.into_u32().ok()?;
    let height = record.require_tag(Tag::ImageLength).ok()?.into_u32().ok()?;
    if width == 0 || height == 0 || (width as u64) * (height as u64) > 64 * 1024 * 1024 {
        return None;
    }

    let compression = record
        .find_tag(Tag::Compression)
        .ok()?
        .and_then(|v| v.into_u32().ok())
        .and_then(|v| CompressionMethod::from_u16(v as u16))
        .unwrap_or(CompressionMethod::None);
    let predictor = record
        .find_tag(Tag::Predictor)
        .ok()?
        .and_then(|v| v.into_u32().ok())
        .and_then(|v| Predictor::from_u16(v as u16))
        .unwrap_or(Predictor::None);

    let image = ImageShape {
        width,
        height,
        depth: 1,
        samples_per_pixel: 1,
        planar_config: PlanarConfig::Chunky,
    };

    let (chunk_extent, offsets, counts) = if is_tiled {
        let tile_width = record.require_tag(Tag::TileWidth).ok()?.into_u32().ok()?;
        let tile_height = record.require_tag(Tag::TileLength).ok()?.into_u32().ok()?;
        if tile_width == 0 || tile_height == 0 {
            return None;
        }
        let offsets: Vec<u64> = record.find_tag_uint_vec::<u64>(Tag::TileOffsets).ok()??;
        let counts: Vec<u64> = record.find_tag_uint_vec::<u64>(Tag::TileByteCounts).ok()??;
        (
            ChunkExtent {
                width: tile_width,
                height: tile_height,
                depth: 1,
            },
            offsets,
            counts,
        )
    } else {
        let rows_per_strip = record.require_tag(Tag::RowsPerStrip).ok()?.into_u32().ok()?;
        if rows_per_strip == 0 {
            return None;
        }
        let offsets: Vec<u64> = record.find_tag_uint_vec::<u64>(Tag::StripOffsets).ok()??;
        let counts: Vec<u64> = record.find_tag_uint_vec::<u64>(Tag::StripByteCounts).ok()??;
        (
            ChunkExtent {
                width,
                height: rows_per_strip,
                depth: 1,
            },
            offsets,
            counts,
        )
    };

    let layout = ChunkLayout::new(image, chunk_extent).ok()?;
    let decompressor = decompressor_for(compression).ok()?;
    let mut decoder = ChunkDecoder::new(decompressor, predictor, byte_order);

    for chunk in layout.chunks() {
        let index = chunk.index as usize;
        if index >= offsets.len() || index >= counts.len() {
            break;
        }
        let compressed = match backend.read(offsets[index], counts[index]) {
            Ok(bytes) => bytes,
            Err(_) => continue,
        };
        let shape = ChunkSampleShape {
            width: chunk.width as usize,
            height: chunk.height as usize * chunk.depth as usize,
            samples_per_pixel: 1,
        };
        let _ = decoder.decode(&compressed, SampleKind::U8, shape);
    }
    Some(())
}
