use std::error::Error;
use std::fmt;
use std::io;
use std::str;
use std::string;

use crate::tags::{
    CompressionMethod, PhotometricInterpretation, PlanarConfiguration, SampleFormat, Tag,
};
use crate::value::Value;
use crate::ColorType;

/// Tiff error kinds.
#[derive(Debug)]
pub enum TiffError {
    /// The Image is not formatted properly.
    FormatError(TiffFormatError),

    /// The codec does not support features required by the image.
    UnsupportedError(TiffUnsupportedError),

    /// An I/O error occurred while reading or writing through a storage backend.
    IoError(io::Error),

    /// The Limits of the parser are exceeded.
    LimitsExceeded,

    /// An integer conversion to or from a platform size failed, either due to
    /// limits of the platform size or limits of the format (e.g. classic TIFF
    /// offsets do not fit in 32 bits).
    IntSizeError,

    /// The caller attempted an operation the storage/codec cannot support for
    /// this particular file or value (§6.5 `UsageError`).
    UsageError(UsageError),

    /// A registered `Compressor`/`Decompressor` reported an internal failure.
    CompressionError(String),
}

/// The image is not formatted properly.
///
/// This indicates that the encoder producing the image might behave incorrectly or that the input
/// file has been corrupted.
///
/// The list of variants may grow to incorporate errors of future features. Matching against this
/// exhaustively is not covered by interface stability guarantees.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TiffFormatError {
    TiffSignatureNotFound,
    TiffSignatureInvalid,
    /// BigTIFF header's offset-size or reserved field did not match §3's invariants.
    InvalidHeader,
    ImageFileDirectoryNotFound,
    /// An IFD's entries were not in strictly ascending tag-code order and the
    /// caller requested strict-mode parsing (§4.5).
    NotSorted,
    InconsistentSizesEncountered,
    UnexpectedCompressedData {
        actual_bytes: usize,
        required_bytes: usize,
    },
    InconsistentStripSamples {
        actual_samples: usize,
        required_samples: usize,
    },
    InvalidDimensions(u32, u32),
    InvalidTag,
    InvalidTagValueType(Tag),
    RequiredTagNotFound(Tag),
    UnknownPredictor(u16),
    UnknownPlanarConfiguration(u16),
    ByteExpected(Value),
    UnsignedIntegerExpected(Value),
    SignedIntegerExpected(Value),
    Format(String),
    RequiredTagEmpty(Tag),
    StripTileTagConflict,
    CycleInOffsets,
    SamplesPerPixelIsZero,
    /// A storage read/write was attempted fully outside the addressable range
    /// (§4.1: "Reads at `offset >= size` fail with `OutOfBounds`").
    OutOfBounds { offset: u64, size: u64 },
    /// A read ran off the end of the file or buffer while materializing a
    /// fixed-size record (header, IFD entry, external tag payload).
    UnexpectedEndOfFile,
    /// A user-supplied tag override disagreed with the writer's computed
    /// mandatory value (§4.11 step 1).
    ConflictingTag(Tag),
}

impl fmt::Display for TiffFormatError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use self::TiffFormatError::*;
        match *self {
            TiffSignatureNotFound => write!(fmt, "TIFF signature not found."),
            TiffSignatureInvalid => write!(fmt, "TIFF signature invalid."),
            InvalidHeader => write!(fmt, "BigTIFF header offset-size/reserved fields invalid."),
            ImageFileDirectoryNotFound => write!(fmt, "Image file directory not found."),
            NotSorted => write!(fmt, "IFD entries are not sorted by ascending tag code."),
            InconsistentSizesEncountered => write!(fmt, "Inconsistent sizes encountered."),
            UnexpectedCompressedData {
                actual_bytes,
                required_bytes,
            } => {
                write!(
                    fmt,
                    "Decompression returned different amount of bytes than expected: got {}, expected {}.",
                    actual_bytes, required_bytes
                )
            }
            InconsistentStripSamples {
                actual_samples,
                required_samples,
            } => {
                write!(
                    fmt,
                    "Inconsistent elements in strip: got {}, expected {}.",
                    actual_samples, required_samples
                )
            }
            InvalidDimensions(width, height) => write!(fmt, "Invalid dimensions: {}x{}.", width, height),
            InvalidTag => write!(fmt, "Image contains invalid tag."),
            InvalidTagValueType(ref tag) => {
                write!(fmt, "Tag `{:?}` did not have the expected value type.", tag)
            }
            RequiredTagNotFound(ref tag) => write!(fmt, "Required tag `{:?}` not found.", tag),
            UnknownPredictor(ref predictor) => {
                write!(fmt, "Unknown predictor \u{201c}{}\u{201d} encountered", predictor)
            }
            UnknownPlanarConfiguration(ref planar_config) =>  {
                write!(fmt, "Unknown planar configuration \u{201c}{}\u{201d} encountered", planar_config)
            }
            ByteExpected(ref val) => write!(fmt, "Expected byte, {:?} found.", val),
            UnsignedIntegerExpected(ref val) => {
                write!(fmt, "Expected unsigned integer, {:?} found.", val)
            }
            SignedIntegerExpected(ref val) => {
                write!(fmt, "Expected signed integer, {:?} found.", val)
            }
            Format(ref val) => write!(fmt, "Invalid format: {:?}.", val),
            RequiredTagEmpty(ref val) => write!(fmt, "Required tag {:?} was empty.", val),
            StripTileTagConflict => write!(fmt, "File should contain either (StripByteCounts and StripOffsets) or (TileByteCounts and TileOffsets), other combination was found."),
            CycleInOffsets => write!(fmt, "File contained a cycle in the list of IFDs"),
            SamplesPerPixelIsZero => write!(fmt, "Samples per pixel is zero"),
            OutOfBounds { offset, size } => {
                write!(fmt, "Read at offset {} is out of bounds for a source of size {}.", offset, size)
            }
            UnexpectedEndOfFile => write!(fmt, "Unexpected end of file while reading a fixed-layout record."),
            ConflictingTag(ref tag) => write!(fmt, "User-supplied value for mandatory tag `{:?}` disagrees with the computed value.", tag),
        }
    }
}

/// The codec does not support features required by the image.
///
/// This only captures known failures for which the standard either does not require support or an
/// implementation has been planned but not yet completed. Some variants may become unused over
/// time and will then get deprecated before being removed.
///
/// The list of variants may grow. Matching against this exhaustively is not covered by interface
/// stability guarantees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TiffUnsupportedError {
    FloatingPointPredictor(ColorType),
    HorizontalPredictor(ColorType),
    InconsistentBitsPerSample(Vec<u8>),
    InterpretationWithBits(PhotometricInterpretation, Vec<u8>),
    UnknownInterpretation,
    UnknownCompressionMethod,
    UnsupportedCompressionMethod(CompressionMethod),
    UnsupportedSampleDepth(u8),
    UnsupportedSampleFormat(Vec<SampleFormat>),
    UnsupportedColorType(ColorType),
    UnsupportedBitsPerChannel(u8),
    UnsupportedPlanarConfig(Option<PlanarConfiguration>),
    UnsupportedDataType,
    UnsupportedInterpretation(PhotometricInterpretation),
}

impl fmt::Display for TiffUnsupportedError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use self::TiffUnsupportedError::*;
        match *self {
            FloatingPointPredictor(color_type) => write!(
                fmt,
                "Floating point predictor for {:?} is unsupported.",
                color_type
            ),
            HorizontalPredictor(color_type) => write!(
                fmt,
                "Horizontal predictor for {:?} is unsupported.",
                color_type
            ),
            InconsistentBitsPerSample(ref bits_per_sample) => {
                write!(fmt, "Inconsistent bits per sample: {:?}.", bits_per_sample)
            }
            InterpretationWithBits(ref photometric_interpretation, ref bits_per_sample) => write!(
                fmt,
                "{:?} with {:?} bits per sample is unsupported",
                photometric_interpretation, bits_per_sample
            ),
            UnknownInterpretation => write!(
                fmt,
                "The image is using an unknown photometric interpretation."
            ),
            UnknownCompressionMethod => write!(fmt, "Unknown compression method."),
            UnsupportedCompressionMethod(method) => {
                write!(fmt, "Compression method {:?} is unsupported", method)
            }
            UnsupportedSampleDepth(samples) => {
                write!(fmt, "{} samples per pixel is unsupported.", samples)
            }
            UnsupportedSampleFormat(ref formats) => {
                write!(fmt, "Sample format {:?} is unsupported.", formats)
            }
            UnsupportedColorType(color_type) => {
                write!(fmt, "Color type {:?} is unsupported", color_type)
            }
            UnsupportedBitsPerChannel(bits) => {
                write!(fmt, "{} bits per channel not supported", bits)
            }
            UnsupportedPlanarConfig(config) => {
                write!(fmt, "Unsupported planar configuration \u{201c}{:?}\u{201d}.", config)
            }
            UnsupportedDataType => write!(fmt, "Unsupported data type."),
            UnsupportedInterpretation(interpretation) => {
                write!(
                    fmt,
                    "Unsupported photometric interpretation \"{:?}\".",
                    interpretation
                )
            }
        }
    }
}

/// User attempted to use the codec in a way that is incompatible with a
/// specific file, value, or storage backend (§6.5 / §7).
#[derive(Debug)]
pub enum UsageError {
    /// Operation requires a chunk type the image does not have (e.g. reading
    /// a tile offset table from a stripped image).
    InvalidChunkType,
    InvalidChunkIndex(u32),
    /// A write view was requested past the current writer length without a
    /// prior `resize`.
    WriteOutOfBounds { offset: u64, size: u64 },
    /// The caller tried to supply chunk offsets/byte-counts directly; those
    /// are always computed by the writer (§4.11 step 1).
    ComputedTagSupplied(Tag),
    /// A write-planner configuration combined mutually inconsistent policies
    /// (§4.10).
    IncompatibleWritePolicies(&'static str),
    /// Caller asked a [`crate::extractor::TagRecord`] for a tag its
    /// catalogue never named.
    TagNotInCatalogue(Tag),
}

impl fmt::Display for UsageError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::UsageError::*;
        match *self {
            InvalidChunkType => {
                write!(fmt, "Requested operation is only valid for the other chunk encoding.")
            }
            InvalidChunkIndex(index) => write!(fmt, "Image chunk index ({}) requested.", index),
            WriteOutOfBounds { offset, size } => write!(
                fmt,
                "Write at offset {} with size {} exceeds the backend; call resize() first.",
                offset, size
            ),
            ComputedTagSupplied(ref tag) => write!(
                fmt,
                "Tag `{:?}` is computed by the writer and must not be supplied by the caller.",
                tag
            ),
            IncompatibleWritePolicies(reason) => {
                write!(fmt, "Write planner configuration is inconsistent: {}", reason)
            }
            TagNotInCatalogue(ref tag) => {
                write!(fmt, "Tag `{:?}` is not named by this catalogue.", tag)
            }
        }
    }
}

impl fmt::Display for TiffError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match *self {
            TiffError::FormatError(ref e) => write!(fmt, "Format error: {}", e),
            TiffError::UnsupportedError(ref f) => write!(
                fmt,
                "The codec does not support the image format `{}`",
                f
            ),
            TiffError::IoError(ref e) => e.fmt(fmt),
            TiffError::LimitsExceeded => write!(fmt, "The parser limits are exceeded"),
            TiffError::IntSizeError => write!(fmt, "Platform or format size limits exceeded"),
            TiffError::UsageError(ref e) => write!(fmt, "Usage error: {}", e),
            TiffError::CompressionError(ref msg) => write!(fmt, "Compression error: {}", msg),
        }
    }
}

impl Error for TiffError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            TiffError::IoError(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TiffError {
    fn from(err: io::Error) -> TiffError {
        TiffError::IoError(err)
    }
}

impl From<str::Utf8Error> for TiffError {
    fn from(_err: str::Utf8Error) -> TiffError {
        TiffError::FormatError(TiffFormatError::InvalidTag)
    }
}

impl From<string::FromUtf8Error> for TiffError {
    fn from(_err: string::FromUtf8Error) -> TiffError {
        TiffError::FormatError(TiffFormatError::InvalidTag)
    }
}

impl From<TiffFormatError> for TiffError {
    fn from(err: TiffFormatError) -> TiffError {
        TiffError::FormatError(err)
    }
}

impl From<TiffUnsupportedError> for TiffError {
    fn from(err: TiffUnsupportedError) -> TiffError {
        TiffError::UnsupportedError(err)
    }
}

impl From<UsageError> for TiffError {
    fn from(err: UsageError) -> TiffError {
        TiffError::UsageError(err)
    }
}

impl From<std::num::TryFromIntError> for TiffError {
    fn from(_err: std::num::TryFromIntError) -> TiffError {
        TiffError::IntSizeError
    }
}

/// Result of a codec read/write/build operation.
pub type TiffResult<T> = Result<T, TiffError>;
