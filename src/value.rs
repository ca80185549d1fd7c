//! The native in-memory representation of a decoded tag value (§3 "Wire data
//! types"). One variant per TIFF wire type, plus `List` for count > 1 values
//! that do not have a dedicated pair-like representation (everything except
//! the two rational shapes).

use crate::error::{TiffError, TiffFormatError, TiffResult};

#[allow(unused_qualifications)]
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    Byte(u8),
    Short(u16),
    SignedByte(i8),
    SignedShort(i16),
    Signed(i32),
    SignedBig(i64),
    Unsigned(u32),
    UnsignedBig(u64),
    Float(f32),
    Double(f64),
    List(Vec<Value>),
    Rational(u32, u32),
    RationalBig(u64, u64),
    SRational(i32, i32),
    SRationalBig(i64, i64),
    Ascii(String),
    Ifd(u32),
    IfdBig(u64),
    Undefined(u8),
}

use self::Value::*;

macro_rules! expect_uint {
    ($self:expr, $($pat:pat => $out:expr),* $(,)?) => {
        match $self {
            $($pat => Ok($out),)*
            val => Err(TiffError::FormatError(TiffFormatError::UnsignedIntegerExpected(val))),
        }
    };
}

macro_rules! expect_sint {
    ($self:expr, $($pat:pat => $out:expr),* $(,)?) => {
        match $self {
            $($pat => Ok($out),)*
            val => Err(TiffError::FormatError(TiffFormatError::SignedIntegerExpected(val))),
        }
    };
}

impl Value {
    pub fn into_u8(self) -> TiffResult<u8> {
        match self {
            Byte(val) => Ok(val),
            Undefined(val) => Ok(val),
            val => Err(TiffError::FormatError(TiffFormatError::ByteExpected(val))),
        }
    }

    pub fn into_i8(self) -> TiffResult<i8> {
        expect_sint!(self, SignedByte(v) => v)
    }

    pub fn into_u16(self) -> TiffResult<u16> {
        expect_uint!(self,
            Byte(v) => v.into(),
            Short(v) => v,
            Unsigned(v) => u16::try_from(v)?,
            UnsignedBig(v) => u16::try_from(v)?,
        )
    }

    pub fn into_i16(self) -> TiffResult<i16> {
        expect_sint!(self,
            SignedByte(v) => v.into(),
            SignedShort(v) => v,
            Signed(v) => i16::try_from(v)?,
            SignedBig(v) => i16::try_from(v)?,
        )
    }

    pub fn into_u32(self) -> TiffResult<u32> {
        expect_uint!(self,
            Byte(v) => v.into(),
            Short(v) => v.into(),
            Unsigned(v) => v,
            UnsignedBig(v) => u32::try_from(v)?,
            Ifd(v) => v,
            IfdBig(v) => u32::try_from(v)?,
        )
    }

    pub fn into_i32(self) -> TiffResult<i32> {
        expect_sint!(self,
            SignedByte(v) => v.into(),
            SignedShort(v) => v.into(),
            Signed(v) => v,
            SignedBig(v) => i32::try_from(v)?,
        )
    }

    pub fn into_u64(self) -> TiffResult<u64> {
        expect_uint!(self,
            Byte(v) => v.into(),
            Short(v) => v.into(),
            Unsigned(v) => v.into(),
            UnsignedBig(v) => v,
            Ifd(v) => v.into(),
            IfdBig(v) => v,
        )
    }

    pub fn into_i64(self) -> TiffResult<i64> {
        expect_sint!(self,
            SignedByte(v) => v.into(),
            SignedShort(v) => v.into(),
            Signed(v) => v.into(),
            SignedBig(v) => v,
        )
    }

    pub fn into_f32(self) -> TiffResult<f32> {
        match self {
            Float(v) => Ok(v),
            Rational(num, den) => Ok(num as f32 / den as f32),
            SRational(num, den) => Ok(num as f32 / den as f32),
            val => Err(TiffError::FormatError(TiffFormatError::SignedIntegerExpected(val))),
        }
    }

    pub fn into_f64(self) -> TiffResult<f64> {
        match self {
            Float(v) => Ok(v as f64),
            Double(v) => Ok(v),
            Rational(num, den) => Ok(num as f64 / den as f64),
            SRational(num, den) => Ok(num as f64 / den as f64),
            val => Err(TiffError::FormatError(TiffFormatError::SignedIntegerExpected(val))),
        }
    }

    pub fn into_string(self) -> TiffResult<String> {
        match self {
            Ascii(val) => Ok(val),
            val => Err(TiffError::FormatError(TiffFormatError::SignedIntegerExpected(val))),
        }
    }

    pub fn into_rational(self) -> TiffResult<(u32, u32)> {
        match self {
            Rational(n, d) => Ok((n, d)),
            RationalBig(n, d) => Ok((u32::try_from(n)?, u32::try_from(d)?)),
            val => Err(TiffError::FormatError(TiffFormatError::UnsignedIntegerExpected(val))),
        }
    }

    pub fn into_srational(self) -> TiffResult<(i32, i32)> {
        match self {
            SRational(n, d) => Ok((n, d)),
            SRationalBig(n, d) => Ok((i32::try_from(n)?, i32::try_from(d)?)),
            val => Err(TiffError::FormatError(TiffFormatError::SignedIntegerExpected(val))),
        }
    }

    /// Widens any single scalar or `List` of same-family scalars to `u64`.
    /// Used throughout the extractor for count arrays (`BitsPerSample`,
    /// `TileOffsets`, `StripByteCounts`, ...) regardless of which width the
    /// wire type happened to use.
    pub fn into_u64_vec(self) -> TiffResult<Vec<u64>> {
        match self {
            List(vec) => vec.into_iter().map(Value::into_u64).collect(),
            Rational(n, d) => Ok(vec![n.into(), d.into()]),
            RationalBig(n, d) => Ok(vec![n, d]),
            other => Ok(vec![other.into_u64()?]),
        }
    }

    pub fn into_u32_vec(self) -> TiffResult<Vec<u32>> {
        match self {
            List(vec) => vec.into_iter().map(Value::into_u32).collect(),
            Rational(n, d) => Ok(vec![n, d]),
            other => Ok(vec![other.into_u32()?]),
        }
    }

    pub fn into_u16_vec(self) -> TiffResult<Vec<u16>> {
        match self {
            List(vec) => vec.into_iter().map(Value::into_u16).collect(),
            other => Ok(vec![other.into_u16()?]),
        }
    }

    pub fn into_u8_vec(self) -> TiffResult<Vec<u8>> {
        match self {
            List(vec) => vec.into_iter().map(Value::into_u8).collect(),
            other => Ok(vec![other.into_u8()?]),
        }
    }

    pub fn into_f64_vec(self) -> TiffResult<Vec<f64>> {
        match self {
            List(vec) => vec.into_iter().map(Value::into_f64).collect(),
            other => Ok(vec![other.into_f64()?]),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Byte(v) => write!(f, "{v}"),
            Short(v) => write!(f, "{v}"),
            SignedByte(v) => write!(f, "{v}"),
            SignedShort(v) => write!(f, "{v}"),
            Signed(v) => write!(f, "{v}"),
            SignedBig(v) => write!(f, "{v}"),
            Unsigned(v) => write!(f, "{v}"),
            UnsignedBig(v) => write!(f, "{v}"),
            Float(v) => write!(f, "{v}"),
            Double(v) => write!(f, "{v}"),
            Rational(n, d) => write!(f, "{n}/{d}"),
            RationalBig(n, d) => write!(f, "{n}/{d}"),
            SRational(n, d) => write!(f, "{n}/{d}"),
            SRationalBig(n, d) => write!(f, "{n}/{d}"),
            Ascii(v) => write!(f, "{v}"),
            Ifd(v) => write!(f, "IFD offset: {v}"),
            IfdBig(v) => write!(f, "IFD offset: {v}"),
            Undefined(v) => write!(f, "{v}"),
            List(v) => write!(f, "{v:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widens_list_of_shorts_to_u64() {
        let v = List(vec![Short(1), Short(2), Short(3)]);
        assert_eq!(v.into_u64_vec().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn rational_into_f64() {
        assert_eq!(Rational(1, 2).into_f64().unwrap(), 0.5);
    }

    #[test]
    fn byte_does_not_widen_to_signed() {
        assert!(Byte(1).into_i32().is_err());
    }
}
