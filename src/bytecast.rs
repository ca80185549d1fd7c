//! Reinterprets slices of fixed-width numeric samples as raw native-endian
//! bytes (and back), without copying. Used by the predictor transform and
//! the tag value encoders to get at a sample buffer's underlying bytes.

use crate::predictor::Float24;
use half::f16;

macro_rules! bytecast {
    ($name_ref:ident, $name_mut:ident, $t:ty) => {
        pub fn $name_ref(slice: &[$t]) -> &[u8] {
            // SAFETY: `$t` has no padding and any bit pattern is valid, so
            // reinterpreting its bytes is sound; the resulting slice borrows
            // from `slice` and cannot outlive it.
            unsafe {
                std::slice::from_raw_parts(slice.as_ptr() as *const u8, std::mem::size_of_val(slice))
            }
        }

        pub fn $name_mut(slice: &mut [$t]) -> &mut [u8] {
            // SAFETY: see $name_ref.
            unsafe {
                std::slice::from_raw_parts_mut(
                    slice.as_mut_ptr() as *mut u8,
                    std::mem::size_of_val(slice),
                )
            }
        }
    };
}

bytecast!(i8_as_ne_bytes, i8_as_ne_mut_bytes, i8);
bytecast!(u16_as_ne_bytes, u16_as_ne_mut_bytes, u16);
bytecast!(i16_as_ne_bytes, i16_as_ne_mut_bytes, i16);
bytecast!(u32_as_ne_bytes, u32_as_ne_mut_bytes, u32);
bytecast!(i32_as_ne_bytes, i32_as_ne_mut_bytes, i32);
bytecast!(u64_as_ne_bytes, u64_as_ne_mut_bytes, u64);
bytecast!(i64_as_ne_bytes, i64_as_ne_mut_bytes, i64);
bytecast!(f32_as_ne_bytes, f32_as_ne_mut_bytes, f32);
bytecast!(f64_as_ne_bytes, f64_as_ne_mut_bytes, f64);
bytecast!(f16_as_ne_bytes, f16_as_ne_mut_bytes, f16);
bytecast!(float24_as_ne_bytes, float24_as_ne_mut_bytes, Float24);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_round_trips_through_bytes() {
        let mut values = [1u16, 0x0203, 0xFFFF];
        let bytes = u16_as_ne_mut_bytes(&mut values);
        assert_eq!(bytes.len(), 6);
        let restored = u16_as_ne_bytes(&values);
        assert_eq!(restored, bytes);
    }

    #[test]
    fn f32_as_bytes_has_expected_length() {
        let values = [1.0f32, -2.5, 3.125];
        assert_eq!(f32_as_ne_bytes(&values).len(), 12);
    }
}
