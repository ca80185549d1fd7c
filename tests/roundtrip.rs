//! End-to-end write/read round trips through the public storage, IFD,
//! extractor, geometry, and chunk-codec layers, without going through any
//! fixture files on disk.

use std::io::Cursor;

use tiffcore::binary::{ByteOrder, FileHeader, Format};
use tiffcore::builder::BuiltTag;
use tiffcore::catalogue::standard::{MINIMAL_STRIPPED_CLASSIC, MINIMAL_TILED_CLASSIC};
use tiffcore::chunkio::{decompressor_for, ChunkDecoder, ChunkSampleShape, SampleBuffer, SampleKind};
use tiffcore::extractor::TagRecord;
use tiffcore::geometry::{copy, BufferLayout, ChunkExtent, ChunkLayout, ImageShape, PlanarConfig};
use tiffcore::ifd;
use tiffcore::limits::Limits;
use tiffcore::planner::WriteConfig;
use tiffcore::storage::{BorrowedReadBuffer, StreamBackend};
use tiffcore::tags::{CompressionMethod, Predictor, Tag};
use tiffcore::value::Value;
use tiffcore::writer::{ImageWriteRequest, Layout, TiffWriter};

fn striped_gradient(width: u32, height: u32) -> (ImageShape, Vec<u8>) {
    let image = ImageShape {
        width,
        height,
        depth: 1,
        samples_per_pixel: 1,
        planar_config: PlanarConfig::Chunky,
    };
    let pixels: Vec<u8> = (0..width * height).map(|i| (i % 256) as u8).collect();
    (image, pixels)
}

fn decode_whole_image(bytes: &[u8]) -> (ImageShape, bool, Vec<u8>) {
    let backend = BorrowedReadBuffer::new(bytes);
    let header = FileHeader::parse(bytes).unwrap();
    let limits = Limits::default();
    let ifd = ifd::read_ifd(
        &backend,
        header.first_ifd_offset,
        header.byte_order,
        header.format,
        &limits,
        true,
    )
    .unwrap();

    let is_tiled = ifd.find(Tag::TileWidth.to_u16()).is_some();
    let catalogue = if is_tiled {
        MINIMAL_TILED_CLASSIC
    } else {
        MINIMAL_STRIPPED_CLASSIC
    };
    let record = TagRecord::extract(&ifd, catalogue).unwrap();

    let width = record.require_tag(Tag::ImageWidth).unwrap().into_u32().unwrap();
    let height = record.require_tag(Tag::ImageLength).unwrap().into_u32().unwrap();
    let compression = record
        .find_tag(Tag::Compression)
        .unwrap()
        .map(|v| CompressionMethod::from_u16(v.into_u32().unwrap() as u16).unwrap())
        .unwrap_or(CompressionMethod::None);
    let predictor = record
        .find_tag(Tag::Predictor)
        .unwrap()
        .map(|v| Predictor::from_u16(v.into_u32().unwrap() as u16).unwrap())
        .unwrap_or(Predictor::None);

    let image = ImageShape {
        width,
        height,
        depth: 1,
        samples_per_pixel: 1,
        planar_config: PlanarConfig::Chunky,
    };

    let (chunk_extent, offsets, counts) = if is_tiled {
        let tile_width = record.require_tag(Tag::TileWidth).unwrap().into_u32().unwrap();
        let tile_height = record.require_tag(Tag::TileLength).unwrap().into_u32().unwrap();
        let offsets: Vec<u64> = record
            .find_tag_uint_vec::<u64>(Tag::TileOffsets)
            .unwrap()
            .unwrap();
        let counts: Vec<u64> = record
            .find_tag_uint_vec::<u64>(Tag::TileByteCounts)
            .unwrap()
            .unwrap();
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
        let rows_per_strip = record.require_tag(Tag::RowsPerStrip).unwrap().into_u32().unwrap();
        let offsets: Vec<u64> = record
            .find_tag_uint_vec::<u64>(Tag::StripOffsets)
            .unwrap()
            .unwrap();
        let counts: Vec<u64> = record
            .find_tag_uint_vec::<u64>(Tag::StripByteCounts)
            .unwrap()
            .unwrap();
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

    let layout = ChunkLayout::new(image, chunk_extent).unwrap();
    let mut decoder = ChunkDecoder::new(
        decompressor_for(compression).unwrap(),
        predictor,
        header.byte_order,
    );

    let mut out = vec![0u8; (width * height) as usize];
    for chunk in layout.chunks() {
        let compressed = backend
            .read(offsets[chunk.index as usize], counts[chunk.index as usize])
            .unwrap();
        // Tiles are always padded to the full tile extent on disk; a short
        // last strip is stored at its real, unpadded extent instead - mirror
        // `writer::encode_chunks`'s `out_extent` choice here.
        let out_extent = if is_tiled {
            chunk_extent
        } else {
            ChunkExtent {
                width: chunk.width,
                height: chunk.height,
                depth: chunk.depth,
            }
        };
        let shape = ChunkSampleShape {
            width: out_extent.width as usize,
            height: out_extent.height as usize,
            samples_per_pixel: 1,
        };
        let samples = decoder.decode(&compressed, SampleKind::U8, shape).unwrap();
        let tile_bytes = samples.as_bytes();
        copy::copy_tile_to_buffer(
            &tile_bytes,
            out_extent,
            &image,
            BufferLayout::Dhwc,
            &chunk,
            1,
            &mut out,
        );
    }

    (image, is_tiled, out)
}

#[test]
fn tiled_uncompressed_round_trips() {
    let (image, pixels) = striped_gradient(48, 48);
    let backend = StreamBackend::new(Cursor::new(Vec::new())).unwrap();
    let config = WriteConfig::optimised_for_writing();
    let mut writer = TiffWriter::new(backend, ByteOrder::LittleEndian, Format::Classic, config);

    let request = ImageWriteRequest {
        image,
        layout: Layout::Tiled(ChunkExtent {
            width: 16,
            height: 16,
            depth: 1,
        }),
        buffer_layout: BufferLayout::Dhwc,
        sample_kind: SampleKind::U8,
        bits_per_sample: 8,
        compression: CompressionMethod::None,
        predictor: Predictor::None,
        photometric: None,
        extra_tags: Vec::new(),
        buffer: &pixels,
    };
    writer.write_page(&request).unwrap();
    let backend = writer.finish().unwrap();
    let bytes = backend.into_inner().into_inner();

    let (decoded_image, is_tiled, decoded) = decode_whole_image(&bytes);
    assert!(is_tiled);
    assert_eq!(decoded_image.width, 48);
    assert_eq!(decoded_image.height, 48);
    assert_eq!(decoded, pixels);
}

#[test]
fn stripped_packbits_horizontal_predictor_round_trips() {
    let (image, pixels) = striped_gradient(64, 50);
    let backend = StreamBackend::new(Cursor::new(Vec::new())).unwrap();
    let config = WriteConfig::optimised_for_reading();
    let mut writer = TiffWriter::new(backend, ByteOrder::LittleEndian, Format::Classic, config);

    let request = ImageWriteRequest {
        image,
        layout: Layout::Stripped { rows_per_strip: 8 },
        buffer_layout: BufferLayout::Dhwc,
        sample_kind: SampleKind::U8,
        bits_per_sample: 8,
        compression: CompressionMethod::PackBits,
        predictor: Predictor::Horizontal,
        photometric: None,
        extra_tags: Vec::new(),
        buffer: &pixels,
    };
    writer.write_page(&request).unwrap();
    let backend = writer.finish().unwrap();
    let bytes = backend.into_inner().into_inner();

    // 50 rows at 8 rows/strip leaves a genuinely short final strip (2 rows),
    // not a padded one - exercising the same distinction `writer::encode_chunks`
    // draws between tiled and stripped layouts.
    let (_, is_tiled, decoded) = decode_whole_image(&bytes);
    assert!(!is_tiled);
    assert_eq!(decoded, pixels);
}

#[test]
fn big_tiff_header_round_trips_with_deflate() {
    let (image, pixels) = striped_gradient(32, 32);
    let backend = StreamBackend::new(Cursor::new(Vec::new())).unwrap();
    let config = WriteConfig::optimised_for_writing();
    let mut writer = TiffWriter::new(backend, ByteOrder::LittleEndian, Format::Big, config);

    let request = ImageWriteRequest {
        image,
        layout: Layout::Tiled(ChunkExtent {
            width: 32,
            height: 32,
            depth: 1,
        }),
        buffer_layout: BufferLayout::Dhwc,
        sample_kind: SampleKind::U8,
        bits_per_sample: 8,
        compression: CompressionMethod::Deflate,
        predictor: Predictor::None,
        photometric: None,
        extra_tags: vec![BuiltTag::new(
            Tag::Software,
            tiffcore::tags::Type::ASCII,
            Value::Ascii("roundtrip-test".to_string()),
        )],
        buffer: &pixels,
    };
    writer.write_page(&request).unwrap();
    let backend = writer.finish().unwrap();
    let bytes = backend.into_inner().into_inner();

    let header = FileHeader::parse(&bytes).unwrap();
    assert_eq!(header.format, Format::Big);

    let (_, is_tiled, decoded) = decode_whole_image(&bytes);
    assert!(is_tiled);
    assert_eq!(decoded, pixels);
}
