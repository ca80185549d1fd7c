//! Decoding limits (ambient configuration, §4 "resource limits"): caps a
//! caller can tune to bound memory use against hostile or merely huge files.
//! Grounded on the teacher's `decoder::Limits`.

/// Resource limits applied while parsing IFDs and decoding chunks.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Limits {
    /// Maximum size in bytes of a single decoded chunk (or, if the caller
    /// decodes a whole image in one call, the whole image). Default 256MiB.
    pub decoding_buffer_size: usize,
    /// Maximum size in bytes of any single IFD tag's external value payload.
    /// Default 1MiB.
    pub ifd_value_size: usize,
    /// Maximum size in bytes of the scratch buffer used between
    /// decompression and predictor-undo when a backend cannot decode
    /// in place. Default 128MiB.
    pub intermediate_buffer_size: usize,
}

impl Limits {
    /// A configuration that does not impose any limits.
    ///
    /// Good as a starting point if the caller only wants to impose selective
    /// limits. Likely to exhaust memory on hostile or pathological input.
    pub fn unlimited() -> Limits {
        Limits {
            decoding_buffer_size: usize::MAX,
            ifd_value_size: usize::MAX,
            intermediate_buffer_size: usize::MAX,
        }
    }
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            decoding_buffer_size: 256 * 1024 * 1024,
            ifd_value_size: 1024 * 1024,
            intermediate_buffer_size: 128 * 1024 * 1024,
        }
    }
}
