//! Tile/strip geometry (§4.7): enumerates the chunks of a tiled or stripped
//! image and copies sample data between a caller's image buffer and
//! individual chunk buffers across the three interleaving conventions.
//!
//! Grounded on the teacher's `decoder::image::TileAttributes`
//! (`tiles_across`/`tiles_down`/`get_offset`/`get_padding`), generalized
//! from the 2-D, single-layout read case to 3-D (depth) chunks, the write
//! direction, and the three buffer layouts (`DHWC`/`DCHW`/`CDHW`) using the
//! chunk-numbering and fast-path-copy structure of
//! `tiffconcept/impl/tiling_impl.hpp`.

pub mod copy;

use crate::error::{TiffFormatError, TiffResult, UsageError};

/// One sample plane per channel (`RRR... GGG... BBB...`), or sample
/// interleaving within a pixel (`RGBRGB...`) (§3 "Image shape").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanarConfig {
    Chunky,
    Planar,
}

/// A caller's image-buffer interleaving convention (§4.7).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferLayout {
    /// (depth, height, width, channels): sample-interleaved.
    Dhwc,
    /// (depth, channels, height, width): per-slice planar.
    Dchw,
    /// (channels, depth, height, width): fully planar.
    Cdhw,
}

/// The full image's declared shape (§3 "Image shape").
#[derive(Clone, Copy, Debug)]
pub struct ImageShape {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub samples_per_pixel: u16,
    pub planar_config: PlanarConfig,
}

/// A chunk's fixed extent: tile width x height x depth, or, for a strip,
/// (image width, rows_per_strip, 1) (§3 "Chunk").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkExtent {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

/// One enumerated chunk (§3 "Chunk"): its linear index, image-space origin,
/// extent (clipped to the image for partial edge chunks - §3 "last strip
/// MAY be short"), and, for planar images, which sample plane it carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub index: u32,
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub plane: u32,
    /// Extent actually covered by image data (no larger than `chunk_extent`,
    /// and smaller at the right/bottom/back edge when the image doesn't
    /// divide evenly).
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Chunk {
    /// Number of samples this chunk carries per pixel: the full sample
    /// vector for chunky chunks, one channel for planar chunks (§4.7).
    pub fn samples_per_pixel(&self, image: &ImageShape) -> u16 {
        match image.planar_config {
            PlanarConfig::Chunky => image.samples_per_pixel,
            PlanarConfig::Planar => 1,
        }
    }
}

/// Enumerates the chunks of a tiled (or, with `chunk.height = rows_per_strip`,
/// `chunk.width = image.width`, `chunk.depth = 1`, stripped) image (§4.7).
#[derive(Clone, Copy, Debug)]
pub struct ChunkLayout {
    pub image: ImageShape,
    pub chunk: ChunkExtent,
}

fn ceil_div(a: u32, b: u32) -> u32 {
    (a + b - 1) / b
}

impl ChunkLayout {
    pub fn new(image: ImageShape, chunk: ChunkExtent) -> TiffResult<Self> {
        if chunk.width == 0 || chunk.height == 0 || chunk.depth == 0 {
            return Err(TiffFormatError::InvalidDimensions(image.width, image.height).into());
        }
        Ok(ChunkLayout { image, chunk })
    }

    /// A stripped layout: chunk width = image width, chunk depth = 1, chunk
    /// height = `rows_per_strip` (§4.7 "stripped ... is the tiled case
    /// with ...").
    pub fn stripped(image: ImageShape, rows_per_strip: u32) -> TiffResult<Self> {
        Self::new(
            image,
            ChunkExtent {
                width: image.width,
                height: rows_per_strip.max(1),
                depth: 1,
            },
        )
    }

    pub fn chunks_across(&self) -> u32 {
        ceil_div(self.image.width, self.chunk.width)
    }

    pub fn chunks_down(&self) -> u32 {
        ceil_div(self.image.height, self.chunk.height)
    }

    pub fn chunks_deep(&self) -> u32 {
        ceil_div(self.image.depth, self.chunk.depth)
    }

    /// Number of sample planes a chunk index range spans: `samples_per_pixel`
    /// for planar images, 1 for chunky (each chunk already carries every
    /// sample) (§4.7).
    pub fn planes(&self) -> u32 {
        match self.image.planar_config {
            PlanarConfig::Chunky => 1,
            PlanarConfig::Planar => self.image.samples_per_pixel as u32,
        }
    }

    pub fn chunk_count(&self) -> u32 {
        self.chunks_across() * self.chunks_down() * self.chunks_deep() * self.planes()
    }

    /// Resolves a linear chunk index to its coordinates, numbering chunks in
    /// `(plane, z, y, x)` order - width fastest, then height, then depth,
    /// then plane/sample (§3, confirmed against
    /// `tiffconcept/impl/tiling_impl.hpp`'s index arithmetic).
    pub fn chunk_at(&self, index: u32) -> TiffResult<Chunk> {
        if index >= self.chunk_count() {
            return Err(UsageError::InvalidChunkIndex(index).into());
        }
        let across = self.chunks_across();
        let down = self.chunks_down();
        let deep = self.chunks_deep();

        let mut rem = index;
        let col = rem % across;
        rem /= across;
        let row = rem % down;
        rem /= down;
        let slice = rem % deep;
        rem /= deep;
        let plane = rem;

        let x = col * self.chunk.width;
        let y = row * self.chunk.height;
        let z = slice * self.chunk.depth;

        let width = self.chunk.width.min(self.image.width - x);
        let height = self.chunk.height.min(self.image.height - y);
        let depth = self.chunk.depth.min(self.image.depth - z);

        Ok(Chunk {
            index,
            x,
            y,
            z,
            plane,
            width,
            height,
            depth,
        })
    }

    pub fn chunks(&self) -> impl Iterator<Item = Chunk> + '_ {
        (0..self.chunk_count()).map(move |i| self.chunk_at(i).expect("index in range"))
    }

    /// Number of samples a *full* (unclipped, padded) chunk carries - used
    /// to size the on-disk/compressed buffer, since the last chunk in each
    /// axis is always padded to the full chunk extent on write (§3).
    pub fn full_chunk_samples(&self, chunk: &Chunk) -> u64 {
        u64::from(self.chunk.width)
            * u64::from(self.chunk.height)
            * u64::from(self.chunk.depth)
            * u64::from(chunk.samples_per_pixel(&self.image))
    }

    /// Byte length of a chunk's uncompressed buffer (§3 "uncompressed size").
    pub fn full_chunk_byte_len(&self, chunk: &Chunk, sample_bytes: usize) -> u64 {
        self.full_chunk_samples(chunk) * sample_bytes as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(w: u32, h: u32) -> ImageShape {
        ImageShape {
            width: w,
            height: h,
            depth: 1,
            samples_per_pixel: 1,
            planar_config: PlanarConfig::Chunky,
        }
    }

    #[test]
    fn single_tile_covers_whole_image() {
        let layout = ChunkLayout::new(
            shape(64, 64),
            ChunkExtent {
                width: 64,
                height: 64,
                depth: 1,
            },
        )
        .unwrap();
        assert_eq!(layout.chunk_count(), 1);
        let chunk = layout.chunk_at(0).unwrap();
        assert_eq!((chunk.x, chunk.y, chunk.width, chunk.height), (0, 0, 64, 64));
    }

    #[test]
    fn partial_edge_tile_is_clipped_in_chunk_at() {
        // 100x100 image, 64x64 tiles -> 2x2 tiles, each edge tile is clipped
        // to the image extent (full padding happens only in copy_buffer_to_tile).
        let layout = ChunkLayout::new(
            shape(100, 100),
            ChunkExtent {
                width: 64,
                height: 64,
                depth: 1,
            },
        )
        .unwrap();
        assert_eq!(layout.chunk_count(), 4);
        let last = layout.chunk_at(3).unwrap();
        assert_eq!((last.x, last.y, last.width, last.height), (64, 64, 36, 36));
    }

    #[test]
    fn chunk_numbering_is_plane_z_y_x() {
        let image = ImageShape {
            width: 4,
            height: 4,
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
        // 2x2 tiles per plane, 3 planes -> 12 chunks, tile (0,0) of plane 1
        // comes right after all 4 tiles of plane 0.
        assert_eq!(layout.chunk_count(), 12);
        assert_eq!(layout.chunk_at(4).unwrap().plane, 1);
        assert_eq!(layout.chunk_at(4).unwrap().x, 0);
        assert_eq!(layout.chunk_at(4).unwrap().y, 0);
    }

    #[test]
    fn stripped_layout_uses_full_image_width() {
        let layout = ChunkLayout::stripped(shape(256, 100), 16).unwrap();
        assert_eq!(layout.chunks_across(), 1);
        assert_eq!(layout.chunks_down(), ceil_div(100, 16));
        let last = layout.chunk_at(layout.chunk_count() - 1).unwrap();
        assert_eq!(last.height, 100 - 16 * (layout.chunks_down() - 1));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let layout = ChunkLayout::stripped(shape(8, 8), 8).unwrap();
        assert!(layout.chunk_at(layout.chunk_count()).is_err());
    }
}
