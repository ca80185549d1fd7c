//! Binary-layer primitives (§4.2): fixed-layout records for the classic and
//! BigTIFF header, IFD header, and tag entry, plus the free functions that
//! read/write them to/from a byte slice in a chosen [`ByteOrder`].
//!
//! Everything here operates on plain `&[u8]` / `&mut [u8]` rather than on a
//! `Read`/`Write` stream: the storage layer (§4.1, [`crate::storage`])
//! already hands the rest of the codec byte ranges (`ReadView`/`WriteView`),
//! so the binary layer's job is exactly the wire<->native conversion, not
//! I/O. This generalizes the teacher's `decoder::stream::EndianReader`
//! (which read element-at-a-time from a `Read`) to also serve serialization
//! and to read from an already-materialized slice.

use crate::error::{TiffError, TiffFormatError, TiffResult};

/// Byte order of a TIFF file (§3 "Wire endian").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// The 2-byte magic identifying this order in a classic/BigTIFF header.
    pub const fn magic(self) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => *b"II",
            ByteOrder::BigEndian => *b"MM",
        }
    }

    pub fn from_magic(bytes: [u8; 2]) -> Option<Self> {
        match &bytes {
            b"II" => Some(ByteOrder::LittleEndian),
            b"MM" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }
}

macro_rules! read_fn {
    ($name:ident, $ty:ty, $len:expr) => {
        pub fn $name(bytes: &[u8], order: ByteOrder) -> TiffResult<$ty> {
            let arr: [u8; $len] = bytes
                .get(..$len)
                .ok_or(TiffError::FormatError(TiffFormatError::UnexpectedEndOfFile))?
                .try_into()
                .unwrap();
            Ok(match order {
                ByteOrder::LittleEndian => <$ty>::from_le_bytes(arr),
                ByteOrder::BigEndian => <$ty>::from_be_bytes(arr),
            })
        }
    };
}

macro_rules! write_fn {
    ($name:ident, $ty:ty, $len:expr) => {
        pub fn $name(buf: &mut [u8], value: $ty, order: ByteOrder) -> TiffResult<()> {
            let dst = buf
                .get_mut(..$len)
                .ok_or(TiffError::FormatError(TiffFormatError::UnexpectedEndOfFile))?;
            dst.copy_from_slice(&match order {
                ByteOrder::LittleEndian => value.to_le_bytes(),
                ByteOrder::BigEndian => value.to_be_bytes(),
            });
            Ok(())
        }
    };
}

read_fn!(read_u8, u8, 1);
read_fn!(read_i8, i8, 1);
read_fn!(read_u16, u16, 2);
read_fn!(read_i16, i16, 2);
read_fn!(read_u32, u32, 4);
read_fn!(read_i32, i32, 4);
read_fn!(read_u64, u64, 8);
read_fn!(read_i64, i64, 8);

write_fn!(write_u8, u8, 1);
write_fn!(write_i8, i8, 1);
write_fn!(write_u16, u16, 2);
write_fn!(write_i16, i16, 2);
write_fn!(write_u32, u32, 4);
write_fn!(write_i32, i32, 4);
write_fn!(write_u64, u64, 8);
write_fn!(write_i64, i64, 8);

pub fn read_f32(bytes: &[u8], order: ByteOrder) -> TiffResult<f32> {
    Ok(f32::from_bits(read_u32(bytes, order)?))
}

pub fn read_f64(bytes: &[u8], order: ByteOrder) -> TiffResult<f64> {
    Ok(f64::from_bits(read_u64(bytes, order)?))
}

pub fn write_f32(buf: &mut [u8], value: f32, order: ByteOrder) -> TiffResult<()> {
    write_u32(buf, value.to_bits(), order)
}

pub fn write_f64(buf: &mut [u8], value: f64, order: ByteOrder) -> TiffResult<()> {
    write_u64(buf, value.to_bits(), order)
}

/// Byteswaps every element of a typed slice in place. Used by the chunk
/// encoder/decoder (§4.8 step (b)/(c)) when wire endian != host endian, and
/// is an involution (little->big->little is identity, §8).
pub trait Byteswap {
    fn byteswap(&mut self);
}

macro_rules! byteswap_impl {
    ($ty:ty) => {
        impl Byteswap for [$ty] {
            fn byteswap(&mut self) {
                for v in self.iter_mut() {
                    *v = v.swap_bytes();
                }
            }
        }
    };
}

byteswap_impl!(u16);
byteswap_impl!(i16);
byteswap_impl!(u32);
byteswap_impl!(i32);
byteswap_impl!(u64);
byteswap_impl!(i64);

impl Byteswap for [f32] {
    fn byteswap(&mut self) {
        for v in self.iter_mut() {
            *v = f32::from_bits(v.to_bits().swap_bytes());
        }
    }
}

impl Byteswap for [f64] {
    fn byteswap(&mut self) {
        for v in self.iter_mut() {
            *v = f64::from_bits(v.to_bits().swap_bytes());
        }
    }
}

/// Which container format a file uses (§3 "File header").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// 4-byte magic + 4-byte first-IFD offset, 12-byte tag entries, 32-bit
    /// offsets throughout.
    Classic,
    /// 4-byte magic + 2-byte offset size (8) + 2-byte reserved (0) +
    /// 8-byte first-IFD offset, 20-byte tag entries, 64-bit offsets.
    Big,
}

impl Format {
    pub const fn header_len(self) -> usize {
        match self {
            Format::Classic => 8,
            Format::Big => 16,
        }
    }

    /// Size in bytes of the IFD's leading entry-count field.
    pub const fn entry_count_len(self) -> usize {
        match self {
            Format::Classic => 2,
            Format::Big => 8,
        }
    }

    /// Size in bytes of a single tag entry.
    pub const fn entry_len(self) -> usize {
        match self {
            Format::Classic => 12,
            Format::Big => 20,
        }
    }

    /// Size in bytes of an offset field (next-IFD pointer, inline slot, ...).
    pub const fn offset_len(self) -> usize {
        match self {
            Format::Classic => 4,
            Format::Big => 8,
        }
    }

    pub const fn is_big(self) -> bool {
        matches!(self, Format::Big)
    }
}

/// A parsed classic/BigTIFF file header (§3, §6.1).
#[derive(Clone, Copy, Debug)]
pub struct FileHeader {
    pub byte_order: ByteOrder,
    pub format: Format,
    pub first_ifd_offset: u64,
}

impl FileHeader {
    /// Parses the leading 8 (classic) or 16 (BigTIFF) bytes of a file.
    pub fn parse(bytes: &[u8]) -> TiffResult<Self> {
        if bytes.len() < 4 {
            return Err(TiffFormatError::TiffSignatureNotFound.into());
        }
        let byte_order = ByteOrder::from_magic([bytes[0], bytes[1]])
            .ok_or(TiffFormatError::TiffSignatureNotFound)?;
        let version = read_u16(&bytes[2..], byte_order)?;
        match version {
            42 => {
                let first_ifd_offset = read_u32(&bytes[4..], byte_order)?.into();
                Ok(FileHeader {
                    byte_order,
                    format: Format::Classic,
                    first_ifd_offset,
                })
            }
            43 => {
                let offset_size = read_u16(&bytes[4..], byte_order)?;
                let reserved = read_u16(&bytes[6..], byte_order)?;
                if offset_size != 8 || reserved != 0 {
                    return Err(TiffFormatError::InvalidHeader.into());
                }
                let first_ifd_offset = read_u64(&bytes[8..], byte_order)?;
                Ok(FileHeader {
                    byte_order,
                    format: Format::Big,
                    first_ifd_offset,
                })
            }
            _ => Err(TiffFormatError::TiffSignatureInvalid.into()),
        }
    }

    /// Serializes the header into `buf`, which must be at least
    /// `format.header_len()` bytes. The first-IFD offset is written as given
    /// (callers typically back-patch it once known).
    pub fn write(buf: &mut [u8], byte_order: ByteOrder, format: Format, first_ifd_offset: u64) -> TiffResult<()> {
        if buf.len() < format.header_len() {
            return Err(TiffFormatError::UnexpectedEndOfFile.into());
        }
        buf[0..2].copy_from_slice(&byte_order.magic());
        match format {
            Format::Classic => {
                write_u16(&mut buf[2..], 42, byte_order)?;
                write_u32(&mut buf[4..], first_ifd_offset.try_into().map_err(|_| TiffError::IntSizeError)?, byte_order)?;
            }
            Format::Big => {
                write_u16(&mut buf[2..], 43, byte_order)?;
                write_u16(&mut buf[4..], 8, byte_order)?;
                write_u16(&mut buf[6..], 0, byte_order)?;
                write_u64(&mut buf[8..], first_ifd_offset, byte_order)?;
            }
        }
        Ok(())
    }
}

/// A single raw tag entry as laid out on disk (§3 "Tag entry"), still in
/// wire endian and not yet resolved to a [`crate::value::Value`].
#[derive(Clone, Debug)]
pub struct RawEntry {
    pub tag_code: u16,
    pub wire_type: u16,
    pub count: u64,
    /// The inline value-or-offset slot, exactly as stored on disk (4 bytes
    /// classic, 8 bytes BigTIFF), still in wire endian.
    pub slot: Vec<u8>,
}

impl RawEntry {
    /// Parses one entry of `format.entry_len()` bytes from `bytes`.
    pub fn parse(bytes: &[u8], order: ByteOrder, format: Format) -> TiffResult<Self> {
        if bytes.len() < format.entry_len() {
            return Err(TiffFormatError::UnexpectedEndOfFile.into());
        }
        let tag_code = read_u16(bytes, order)?;
        let wire_type = read_u16(&bytes[2..], order)?;
        let count = match format {
            Format::Classic => u64::from(read_u32(&bytes[4..], order)?),
            Format::Big => read_u64(&bytes[4..], order)?,
        };
        let slot_start = match format {
            Format::Classic => 8,
            Format::Big => 12,
        };
        let slot = bytes[slot_start..slot_start + format.offset_len()].to_vec();
        Ok(RawEntry {
            tag_code,
            wire_type,
            count,
            slot,
        })
    }

    /// Serializes this entry into `buf` (`format.entry_len()` bytes).
    pub fn write(&self, buf: &mut [u8], order: ByteOrder, format: Format) -> TiffResult<()> {
        if buf.len() < format.entry_len() || self.slot.len() != format.offset_len() {
            return Err(TiffFormatError::UnexpectedEndOfFile.into());
        }
        write_u16(buf, self.tag_code, order)?;
        write_u16(&mut buf[2..], self.wire_type, order)?;
        match format {
            Format::Classic => write_u32(&mut buf[4..], self.count.try_into().map_err(|_| TiffError::IntSizeError)?, order)?,
            Format::Big => write_u64(&mut buf[4..], self.count, order)?,
        }
        let slot_start = match format {
            Format::Classic => 8,
            Format::Big => 12,
        };
        buf[slot_start..slot_start + format.offset_len()].copy_from_slice(&self.slot);
        Ok(())
    }

    /// Whether this entry's value fits inline (§3: `count * wire_size <= slot_size`).
    pub fn is_inline(&self, format: Format) -> bool {
        self.value_byte_len() <= format.offset_len() as u64
    }

    /// The wire type's element size times `count`, saturating to avoid
    /// overflow on malicious files.
    pub fn value_byte_len(&self) -> u64 {
        let type_size = crate::tags::Type::from_u16(self.wire_type)
            .map(|t| t.size() as u64)
            .unwrap_or(0);
        self.count.saturating_mul(type_size)
    }

    /// Interprets the inline slot as an absolute file offset (only valid
    /// when `!is_inline`).
    pub fn external_offset(&self, order: ByteOrder, format: Format) -> TiffResult<u64> {
        Ok(match format {
            Format::Classic => read_u32(&self.slot, order)?.into(),
            Format::Big => read_u64(&self.slot, order)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_le_header_roundtrip() {
        let bytes = [0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        let header = FileHeader::parse(&bytes).unwrap();
        assert_eq!(header.byte_order, ByteOrder::LittleEndian);
        assert_eq!(header.format, Format::Classic);
        assert_eq!(header.first_ifd_offset, 8);
    }

    #[test]
    fn big_tiff_be_header_roundtrip() {
        let mut buf = [0u8; 16];
        FileHeader::write(&mut buf, ByteOrder::BigEndian, Format::Big, 16).unwrap();
        let header = FileHeader::parse(&buf).unwrap();
        assert_eq!(header.format, Format::Big);
        assert_eq!(header.first_ifd_offset, 16);
    }

    #[test]
    fn rejects_bad_bigtiff_reserved_field() {
        let mut buf = [0u8; 16];
        FileHeader::write(&mut buf, ByteOrder::LittleEndian, Format::Big, 16).unwrap();
        buf[6] = 1; // corrupt reserved field
        assert!(FileHeader::parse(&buf).is_err());
    }

    #[test]
    fn byteswap_is_involution() {
        let mut data = vec![1u32, 2, 0xdead_beef];
        let original = data.clone();
        data.as_mut_slice().byteswap();
        data.as_mut_slice().byteswap();
        assert_eq!(data, original);
    }

    #[test]
    fn inline_entry_classic() {
        // count=1, SHORT (size 2) fits in the 4-byte classic slot.
        let entry = RawEntry {
            tag_code: 256,
            wire_type: 3,
            count: 1,
            slot: vec![0x80, 0x02, 0x00, 0x00],
        };
        assert!(entry.is_inline(Format::Classic));
    }
}
