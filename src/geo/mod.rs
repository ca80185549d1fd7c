//! GeoTIFF key-directory decoding (§4.12), an example consumer of the
//! [`crate::catalogue::standard::EXTENDED`] catalogue's GeoTIFF tags. Kept
//! nearly verbatim from the teacher: it is a self-contained parser over
//! already-decoded tag values and does not touch the storage or binary
//! layers.

pub mod geo_key;

pub use self::geo_key::{get_geo_key, parse_geo_keys, GeoKey, GeoKeyType};
