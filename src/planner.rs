//! Write planner (§4.10, component J): the four orthogonal policies that
//! decide where the IFD lands, in what order chunks are enumerated, how
//! writes are buffered, and when offsets get resolved, plus the four named
//! standard configurations spec.md defines.
//!
//! Not present in the teacher, which only ever writes one fixed strategy
//! (append image data, then the directory, at the writer's current
//! position - see `encoder::mod::TiffEncoder`). Modeled on
//! `tiffconcept/include/tiff/write_strategy.hpp`'s four strategy concepts
//! (`IFDPlacementStrategy`, `TileOrderingStrategy`, `BufferingStrategy`,
//! `OffsetResolutionStrategy`), translated into plain Rust enums since none
//! of the four carries per-variant state beyond `IfdPlacement::Inline`'s
//! target offset.

use crate::error::{TiffResult, UsageError};
use crate::geometry::ChunkLayout;

/// Where the IFD array is written relative to the image data (§4.10).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IfdPlacement {
    /// First byte after the file header; chunk data follows. Requires chunk
    /// byte sizes to be known before any chunk is written (`OffsetResolution::
    /// TwoPass`) or a staging `Buffering::Streaming` pass that defers the
    /// physical write until everything is known.
    AtStart,
    /// Appended after all image data, at whatever offset the writer has
    /// reached once chunks are written.
    AtEnd,
    /// A caller-chosen absolute offset, for editing an existing file's
    /// directory in place.
    Inline(u64),
}

/// How chunks are enumerated for encoding (§4.10).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkOrdering {
    /// Sort by `(z, plane, y, x)` - the layout a streaming reader wants, so
    /// rows/slices become available in display order as the file streams in.
    ImageOrder,
    /// Keep the default `(plane, z, y, x)` numbering (§4.7) a
    /// [`ChunkLayout`] already enumerates chunks in.
    Sequential,
    /// Leave whatever order the caller supplies untouched - used when only
    /// specific chunks of an existing layout are being rewritten.
    OnDemand,
}

/// How writes are staged before reaching the storage backend (§4.10).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Buffering {
    /// Forward each write straight to the backend.
    Direct,
    /// Aggregate contiguous writes and flush once a threshold is reached.
    Buffered,
    /// Stage the entire output in memory and commit it as one range at
    /// flush time.
    Streaming,
}

/// When chunk/IFD offsets are computed and written (§4.10).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OffsetResolution {
    /// Compute every chunk's size before any file I/O, so offsets are known
    /// up front.
    TwoPass,
    /// Write chunks first at whatever offsets they land at, then patch the
    /// offset/byte-count tags once all chunks are written.
    Lazy,
    /// Write the offset/byte-count tags immediately as each chunk is
    /// written - edit-in-place mode, where a chunk's offset cannot move.
    Immediate,
}

/// The combination of all four policies (§4.10). Construct with one of the
/// named standard configurations or [`WriteConfig::new`], then call
/// [`WriteConfig::validate`] (done automatically by the named constructors)
/// before handing it to [`crate::writer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteConfig {
    pub ifd_placement: IfdPlacement,
    pub chunk_ordering: ChunkOrdering,
    pub buffering: Buffering,
    pub offset_resolution: OffsetResolution,
}

impl WriteConfig {
    pub fn new(
        ifd_placement: IfdPlacement,
        chunk_ordering: ChunkOrdering,
        buffering: Buffering,
        offset_resolution: OffsetResolution,
    ) -> TiffResult<Self> {
        let config = WriteConfig {
            ifd_placement,
            chunk_ordering,
            buffering,
            offset_resolution,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects mutually inconsistent policy combinations (§4.10): streaming
    /// buffering needs an offset policy that can tolerate staging the whole
    /// output before anything is known to be final, and placing the IFD at
    /// the start of the file needs chunk sizes known before the first chunk
    /// is written - either because sizes were precomputed (`TwoPass`) or
    /// because `Streaming` buffering defers every physical write until the
    /// whole image is staged.
    pub fn validate(&self) -> TiffResult<()> {
        if self.buffering == Buffering::Streaming && self.offset_resolution != OffsetResolution::TwoPass {
            return Err(UsageError::IncompatibleWritePolicies(
                "streaming buffering requires two-pass offset resolution",
            )
            .into());
        }
        if self.ifd_placement == IfdPlacement::AtStart
            && self.offset_resolution != OffsetResolution::TwoPass
            && self.buffering != Buffering::Streaming
        {
            return Err(UsageError::IncompatibleWritePolicies(
                "IFD-at-start requires two-pass offset resolution or streaming buffering",
            )
            .into());
        }
        Ok(())
    }

    /// `at-start + image-order + streaming + two-pass` (§4.10): the whole
    /// file is staged, then committed with the directory up front so a
    /// streaming reader can start decoding from byte zero.
    pub fn optimised_for_reading() -> Self {
        WriteConfig {
            ifd_placement: IfdPlacement::AtStart,
            chunk_ordering: ChunkOrdering::ImageOrder,
            buffering: Buffering::Streaming,
            offset_resolution: OffsetResolution::TwoPass,
        }
        .validated()
    }

    /// `at-end + sequential + direct + lazy` (§4.10): the cheapest write
    /// path - chunks go straight to the backend as they are produced, and
    /// the directory is patched in afterward.
    pub fn optimised_for_writing() -> Self {
        WriteConfig {
            ifd_placement: IfdPlacement::AtEnd,
            chunk_ordering: ChunkOrdering::Sequential,
            buffering: Buffering::Direct,
            offset_resolution: OffsetResolution::Lazy,
        }
        .validated()
    }

    /// `at-end + sequential + streaming + two-pass` (§4.10).
    pub fn streaming() -> Self {
        WriteConfig {
            ifd_placement: IfdPlacement::AtEnd,
            chunk_ordering: ChunkOrdering::Sequential,
            buffering: Buffering::Streaming,
            offset_resolution: OffsetResolution::TwoPass,
        }
        .validated()
    }

    /// `inline + on-demand + direct + immediate` (§4.10): rewrite specific
    /// chunks of an existing file without disturbing the rest of its
    /// layout.
    pub fn edit_in_place(ifd_offset: u64) -> Self {
        WriteConfig {
            ifd_placement: IfdPlacement::Inline(ifd_offset),
            chunk_ordering: ChunkOrdering::OnDemand,
            buffering: Buffering::Direct,
            offset_resolution: OffsetResolution::Immediate,
        }
        .validated()
    }

    fn validated(self) -> Self {
        self.validate().expect("standard write configuration must be internally consistent");
        self
    }

    /// Orders `layout`'s chunk indices per [`Self::chunk_ordering`] (§4.10).
    /// `Sequential`/`OnDemand` both keep the layout's own
    /// `(plane, z, y, x)` numbering (§4.7) - `OnDemand` exists as a distinct
    /// variant so callers can see in their own config that no reordering
    /// pass was requested, even though the effect is identical here.
    pub fn ordered_chunk_indices(&self, layout: &ChunkLayout) -> Vec<u32> {
        let mut indices: Vec<u32> = (0..layout.chunk_count()).collect();
        if self.chunk_ordering == ChunkOrdering::ImageOrder {
            indices.sort_by_key(|&i| {
                let chunk = layout.chunk_at(i).expect("index in range");
                (chunk.z, chunk.plane, chunk.y, chunk.x)
            });
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_buffering_requires_two_pass() {
        let err = WriteConfig::new(
            IfdPlacement::AtEnd,
            ChunkOrdering::Sequential,
            Buffering::Streaming,
            OffsetResolution::Lazy,
        );
        assert!(err.is_err());
    }

    #[test]
    fn at_start_requires_two_pass_or_streaming() {
        assert!(WriteConfig::new(
            IfdPlacement::AtStart,
            ChunkOrdering::ImageOrder,
            Buffering::Direct,
            OffsetResolution::Lazy,
        )
        .is_err());

        assert!(WriteConfig::new(
            IfdPlacement::AtStart,
            ChunkOrdering::ImageOrder,
            Buffering::Direct,
            OffsetResolution::TwoPass,
        )
        .is_ok());
    }

    #[test]
    fn named_configurations_are_internally_consistent() {
        WriteConfig::optimised_for_reading();
        WriteConfig::optimised_for_writing();
        WriteConfig::streaming();
        WriteConfig::edit_in_place(128);
    }

    #[test]
    fn image_order_sorts_by_z_plane_y_x() {
        use crate::geometry::{ChunkExtent, ChunkLayout, ImageShape, PlanarConfig};
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
        let config = WriteConfig::optimised_for_reading();
        let ordered = config.ordered_chunk_indices(&layout);
        // Sequential numbering is (plane, z, y, x), so plane-0 chunks (0..4)
        // come before plane-1 chunks (4..8) by default; image order instead
        // groups by (z, y, x) across all planes first.
        let first_chunk = layout.chunk_at(ordered[0]).unwrap();
        let second_chunk = layout.chunk_at(ordered[1]).unwrap();
        assert!(
            (first_chunk.z, first_chunk.y, first_chunk.x) <= (second_chunk.z, second_chunk.y, second_chunk.x)
        );
    }
}
