//! Standard tag catalogues shipped with the crate (§4.3): minimal
//! stripped/tiled classic catalogues sufficient to read/write baseline
//! grayscale/RGB TIFFs, and an extended catalogue adding the common
//! metadata and GeoTIFF tags the teacher's `geo::geo_key` module consumes.

use super::{TagDescriptor, ValueShape};
use crate::tags::{Tag, Type};

/// Baseline tags for a stripped classic/BigTIFF file. Mirrors the fixed set
/// a `#[derive(TagRecord)]`-style struct would name (§4.5), in ascending
/// tag-code order as the two-pointer extractor requires.
pub static MINIMAL_STRIPPED_CLASSIC: &[TagDescriptor] = &[
    TagDescriptor::required(Tag::ImageWidth, Type::LONG, ValueShape::Scalar)
        .with_alternates(&[Type::SHORT]),
    TagDescriptor::required(Tag::ImageLength, Type::LONG, ValueShape::Scalar)
        .with_alternates(&[Type::SHORT]),
    TagDescriptor::optional(Tag::BitsPerSample, Type::SHORT, ValueShape::Array),
    TagDescriptor::optional(Tag::Compression, Type::SHORT, ValueShape::Scalar),
    TagDescriptor::optional(Tag::PhotometricInterpretation, Type::SHORT, ValueShape::Scalar),
    TagDescriptor::required(Tag::StripOffsets, Type::LONG, ValueShape::Array)
        .with_alternates(&[Type::SHORT, Type::LONG8]),
    TagDescriptor::optional(Tag::SamplesPerPixel, Type::SHORT, ValueShape::Scalar),
    TagDescriptor::required(Tag::RowsPerStrip, Type::LONG, ValueShape::Scalar)
        .with_alternates(&[Type::SHORT]),
    TagDescriptor::required(Tag::StripByteCounts, Type::LONG, ValueShape::Array)
        .with_alternates(&[Type::SHORT, Type::LONG8]),
    TagDescriptor::optional(Tag::PlanarConfiguration, Type::SHORT, ValueShape::Scalar),
    TagDescriptor::optional(Tag::Predictor, Type::SHORT, ValueShape::Scalar),
    TagDescriptor::optional(Tag::SampleFormat, Type::SHORT, ValueShape::Array),
];

/// Baseline tags for a tiled classic/BigTIFF file.
pub static MINIMAL_TILED_CLASSIC: &[TagDescriptor] = &[
    TagDescriptor::required(Tag::ImageWidth, Type::LONG, ValueShape::Scalar)
        .with_alternates(&[Type::SHORT]),
    TagDescriptor::required(Tag::ImageLength, Type::LONG, ValueShape::Scalar)
        .with_alternates(&[Type::SHORT]),
    TagDescriptor::optional(Tag::BitsPerSample, Type::SHORT, ValueShape::Array),
    TagDescriptor::optional(Tag::Compression, Type::SHORT, ValueShape::Scalar),
    TagDescriptor::optional(Tag::PhotometricInterpretation, Type::SHORT, ValueShape::Scalar),
    TagDescriptor::optional(Tag::SamplesPerPixel, Type::SHORT, ValueShape::Scalar),
    TagDescriptor::optional(Tag::PlanarConfiguration, Type::SHORT, ValueShape::Scalar),
    TagDescriptor::optional(Tag::Predictor, Type::SHORT, ValueShape::Scalar),
    TagDescriptor::required(Tag::TileWidth, Type::LONG, ValueShape::Scalar)
        .with_alternates(&[Type::SHORT]),
    TagDescriptor::required(Tag::TileLength, Type::LONG, ValueShape::Scalar)
        .with_alternates(&[Type::SHORT]),
    TagDescriptor::required(Tag::TileOffsets, Type::LONG, ValueShape::Array)
        .with_alternates(&[Type::LONG8]),
    TagDescriptor::required(Tag::TileByteCounts, Type::LONG, ValueShape::Array)
        .with_alternates(&[Type::SHORT, Type::LONG8]),
    TagDescriptor::optional(Tag::SampleFormat, Type::SHORT, ValueShape::Array),
];

/// Common metadata and GeoTIFF tags layered on top of either minimal
/// catalogue, demonstrating that the catalogue system is generic over any
/// non-trivial tag group rather than just the baseline image tags.
pub static EXTENDED: &[TagDescriptor] = &[
    TagDescriptor::optional(Tag::ImageDescription, Type::ASCII, ValueShape::Ascii),
    TagDescriptor::optional(Tag::Make, Type::ASCII, ValueShape::Ascii),
    TagDescriptor::optional(Tag::Model, Type::ASCII, ValueShape::Ascii),
    TagDescriptor::optional(Tag::XResolution, Type::RATIONAL, ValueShape::Rational),
    TagDescriptor::optional(Tag::YResolution, Type::RATIONAL, ValueShape::Rational),
    TagDescriptor::optional(Tag::ResolutionUnit, Type::SHORT, ValueShape::Scalar),
    TagDescriptor::optional(Tag::Software, Type::ASCII, ValueShape::Ascii),
    TagDescriptor::optional(Tag::DateTime, Type::ASCII, ValueShape::Ascii),
    TagDescriptor::optional(Tag::Artist, Type::ASCII, ValueShape::Ascii),
    TagDescriptor::optional(Tag::HostComputer, Type::ASCII, ValueShape::Ascii),
    TagDescriptor::optional(Tag::ColorMap, Type::SHORT, ValueShape::Array),
    TagDescriptor::optional(Tag::SubIfd, Type::LONG, ValueShape::Array)
        .with_alternates(&[Type::IFD]),
    TagDescriptor::optional(Tag::ExtraSamples, Type::SHORT, ValueShape::Array),
    TagDescriptor::optional(Tag::Copyright, Type::ASCII, ValueShape::Ascii),
    TagDescriptor::optional(Tag::ModelPixelScaleTag, Type::DOUBLE, ValueShape::Array),
    TagDescriptor::optional(Tag::ModelTiepointTag, Type::DOUBLE, ValueShape::Array),
    TagDescriptor::optional(Tag::ModelTransformationTag, Type::DOUBLE, ValueShape::Array),
    TagDescriptor::optional(Tag::GeoKeyDirectoryTag, Type::SHORT, ValueShape::Array),
    TagDescriptor::optional(Tag::GeoDoubleParamsTag, Type::DOUBLE, ValueShape::Array),
    TagDescriptor::optional(Tag::GeoAsciiParamsTag, Type::ASCII, ValueShape::Ascii),
];
