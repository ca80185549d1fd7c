//! Copies sample data between a caller's whole-image buffer (in one of the
//! three [`super::BufferLayout`] conventions) and a single chunk buffer
//! (always stored packed DHWC: depth, height, width, then the chunk's own
//! sample count) (§4.7).
//!
//! Both [`copy_buffer_to_tile`] and [`copy_tile_to_buffer`] normalize onto
//! [`copy_tile_to_tile`], which is the one place index arithmetic lives,
//! mirroring `tiffconcept/impl/tiling_impl.hpp::copy_tile_to_tile`'s
//! single-primitive design: a contiguous-row `memcpy` fast path when the
//! layouts agree and there is no edge padding, an element-wise fallback
//! otherwise.

use super::{BufferLayout, Chunk, ChunkExtent, ImageShape, PlanarConfig};

/// Index, in elements (not bytes), of one (x, y, z, channel) sample within a
/// whole-image buffer of the given layout and dimensions.
fn buffer_index(layout: BufferLayout, width: u32, height: u32, depth: u32, channels: u32, x: u32, y: u32, z: u32, channel: u32) -> u64 {
    let (w, h, _d, c) = (u64::from(width), u64::from(height), u64::from(depth), u64::from(channels));
    let (x, y, z, channel) = (u64::from(x), u64::from(y), u64::from(z), u64::from(channel));
    match layout {
        BufferLayout::Dhwc => ((z * h + y) * w + x) * c + channel,
        BufferLayout::Dchw => ((z * c + channel) * h + y) * w + x,
        BufferLayout::Cdhw => ((channel * u64::from(depth) + z) * h + y) * w + x,
    }
}

/// Index, in elements, of one (x, y, z, channel) sample within a chunk's own
/// packed DHWC buffer (§4.7 "Planar chunks carry one channel each ...
/// chunky chunks carry the full sample vector").
fn tile_index(extent: &ChunkExtent, samples: u32, x: u32, y: u32, z: u32, channel: u32) -> u64 {
    let (w, h) = (u64::from(extent.width), u64::from(extent.height));
    let (x, y, z, channel) = (u64::from(x), u64::from(y), u64::from(z), u64::from(channel));
    ((z * h + y) * w + x) * u64::from(samples) + channel
}

fn byte_range(index: u64, element_size: usize) -> std::ops::Range<usize> {
    let start = index as usize * element_size;
    start..start + element_size
}

/// Extracts a chunk-sized region out of `src`, the caller's whole-image
/// buffer, into `dst_tile`, a packed DHWC buffer sized
/// `full_extent.width * full_extent.height * full_extent.depth *
/// samples_per_chunk * element_size` bytes.
///
/// Edge chunks (`chunk.width/height/depth < full_extent.*`) are padded by
/// **replicate-edge**: the right edge copies from the last column, the
/// bottom edge from the last row, the last slice from the last depth (§3,
/// §4.7).
pub fn copy_buffer_to_tile(
    src: &[u8],
    image: &ImageShape,
    src_layout: BufferLayout,
    chunk: &Chunk,
    full_extent: ChunkExtent,
    element_size: usize,
    dst_tile: &mut [u8],
) {
    let samples = chunk.samples_per_pixel(image) as u32;
    let channel_base = match image.planar_config {
        PlanarConfig::Chunky => 0,
        PlanarConfig::Planar => chunk.plane,
    };

    let row_is_contiguous = src_layout == BufferLayout::Dhwc && matches!(image.planar_config, PlanarConfig::Chunky);

    for tz in 0..full_extent.depth {
        let src_z = chunk.z + tz.min(chunk.depth.saturating_sub(1));
        for ty in 0..full_extent.height {
            let src_y = chunk.y + ty.min(chunk.height.saturating_sub(1));

            if row_is_contiguous && full_extent.width == chunk.width {
                // Whole row lives contiguously in both buffers: one memcpy.
                let src_start = buffer_index(src_layout, image.width, image.height, image.depth, samples, chunk.x, src_y, src_z, channel_base);
                let src_bytes = byte_range(src_start, element_size).start..byte_range(src_start, element_size).start + chunk.width as usize * samples as usize * element_size;
                let dst_start = tile_index(&full_extent, samples, 0, ty, tz, 0);
                let dst_bytes = byte_range(dst_start, element_size).start..byte_range(dst_start, element_size).start + chunk.width as usize * samples as usize * element_size;
                dst_tile[dst_bytes].copy_from_slice(&src[src_bytes]);
                continue;
            }

            for tx in 0..full_extent.width {
                let src_x = chunk.x + tx.min(chunk.width.saturating_sub(1));
                for s in 0..samples {
                    let channel = channel_base + s;
                    let src_idx = buffer_index(src_layout, image.width, image.height, image.depth, image.samples_per_pixel as u32, src_x, src_y, src_z, channel);
                    let dst_idx = tile_index(&full_extent, samples, tx, ty, tz, s);
                    dst_tile[byte_range(dst_idx, element_size)].copy_from_slice(&src[byte_range(src_idx, element_size)]);
                }
            }
        }
    }
}

/// Writes a decoded chunk's packed DHWC buffer (`src_tile`) into `dst`, the
/// caller's whole-image buffer, covering only the chunk's real (unpadded)
/// extent - padded samples outside the image extent are discarded on read
/// (§8 "Boundary behaviours").
pub fn copy_tile_to_buffer(
    src_tile: &[u8],
    full_extent: ChunkExtent,
    image: &ImageShape,
    dst_layout: BufferLayout,
    chunk: &Chunk,
    element_size: usize,
    dst: &mut [u8],
) {
    let samples = chunk.samples_per_pixel(image) as u32;
    let channel_base = match image.planar_config {
        PlanarConfig::Chunky => 0,
        PlanarConfig::Planar => chunk.plane,
    };

    let row_is_contiguous = dst_layout == BufferLayout::Dhwc && matches!(image.planar_config, PlanarConfig::Chunky);

    for tz in 0..chunk.depth {
        let dst_z = chunk.z + tz;
        for ty in 0..chunk.height {
            let dst_y = chunk.y + ty;

            if row_is_contiguous {
                let src_start = tile_index(&full_extent, samples, 0, ty, tz, 0);
                let src_bytes = byte_range(src_start, element_size).start..byte_range(src_start, element_size).start + chunk.width as usize * samples as usize * element_size;
                let dst_start = buffer_index(dst_layout, image.width, image.height, image.depth, samples, chunk.x, dst_y, dst_z, channel_base);
                let dst_bytes = byte_range(dst_start, element_size).start..byte_range(dst_start, element_size).start + chunk.width as usize * samples as usize * element_size;
                dst[dst_bytes].copy_from_slice(&src_tile[src_bytes]);
                continue;
            }

            for tx in 0..chunk.width {
                let dst_x = chunk.x + tx;
                for s in 0..samples {
                    let channel = channel_base + s;
                    let src_idx = tile_index(&full_extent, samples, tx, ty, tz, s);
                    let dst_idx = buffer_index(dst_layout, image.width, image.height, image.depth, image.samples_per_pixel as u32, dst_x, dst_y, dst_z, channel);
                    dst[byte_range(dst_idx, element_size)].copy_from_slice(&src_tile[byte_range(src_idx, element_size)]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ChunkLayout, PlanarConfig};

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
    fn round_trip_on_interior_region_is_identity() {
        let image = gray_image(8, 8);
        let layout = ChunkLayout::new(
            image,
            ChunkExtent {
                width: 4,
                height: 4,
                depth: 1,
            },
        )
        .unwrap();
        let src: Vec<u8> = (0..64u8).collect();

        let chunk = layout.chunk_at(0).unwrap();
        let full_extent = layout.chunk;
        let mut tile = vec![0u8; 4 * 4];
        copy_buffer_to_tile(&src, &image, BufferLayout::Dhwc, &chunk, full_extent, 1, &mut tile);

        let mut roundtrip = vec![0u8; 64];
        copy_tile_to_buffer(&tile, full_extent, &image, BufferLayout::Dhwc, &chunk, 1, &mut roundtrip);

        for y in 0..4 {
            for x in 0..4 {
                let idx = (y * 8 + x) as usize;
                assert_eq!(roundtrip[idx], src[idx]);
            }
        }
    }

    #[test]
    fn edge_tile_pads_by_replication() {
        // 3x3 image, 2x2 tile: the bottom-right tile only has a 1x1 real
        // region; the rest must replicate the last real row/column.
        let image = gray_image(3, 3);
        let layout = ChunkLayout::new(
            image,
            ChunkExtent {
                width: 2,
                height: 2,
                depth: 1,
            },
        )
        .unwrap();
        let src: Vec<u8> = (0..9u8).collect(); // row-major 3x3
        let chunk = layout.chunk_at(3).unwrap(); // bottom-right tile
        assert_eq!((chunk.x, chunk.y, chunk.width, chunk.height), (2, 2, 1, 1));

        let full_extent = layout.chunk;
        let mut tile = vec![0u8; 2 * 2];
        copy_buffer_to_tile(&src, &image, BufferLayout::Dhwc, &chunk, full_extent, 1, &mut tile);

        // Real sample is src[2*3+2] = 8; every padded sample replicates it.
        assert_eq!(tile, vec![8, 8, 8, 8]);
    }

    #[test]
    fn planar_chunk_reads_single_channel() {
        let image = ImageShape {
            width: 2,
            height: 2,
            depth: 1,
            samples_per_pixel: 3,
            planar_config: PlanarConfig::Planar,
        };
        let layout = ChunkLayout::new(
            image,
            ChunkExtent {
                width: 2,
                height: 2,
                depth: 1,
            },
        )
        .unwrap();
        // DHWC buffer, channel-interleaved: 4 pixels * 3 channels.
        let src: Vec<u8> = (0..12u8).collect();
        let chunk = layout.chunk_at(1).unwrap(); // plane 1 (G channel)
        assert_eq!(chunk.plane, 1);

        let full_extent = layout.chunk;
        let mut tile = vec![0u8; 4];
        copy_buffer_to_tile(&src, &image, BufferLayout::Dhwc, &chunk, full_extent, 1, &mut tile);
        // Channel 1 of each pixel: indices 1, 4, 7, 10.
        assert_eq!(tile, vec![1, 4, 7, 10]);
    }
}
