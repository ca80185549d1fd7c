//! IFD parsing (§4.4, §4.5): reads an Image File Directory and the chain of
//! directories it leads into, resolving each entry to a [`Value`] through the
//! storage layer rather than a `Read + Seek` stream.
//!
//! Generalizes the teacher's `decoder::decoded_entry::DecodedEntry::val`
//! (which special-cased "fits inline" vs "needs a seek" across four branches
//! per wire type) into one inline/external split driven by
//! [`RawEntry::is_inline`], since the storage layer already gives us
//! arbitrary byte ranges instead of a cursor we must seek.

pub mod cycles;

use crate::binary::{read_f32, read_f64, read_i16, read_i32, read_i64, read_u16, read_u32, read_u64};
use crate::binary::{ByteOrder, Format, RawEntry};
use crate::error::{TiffError, TiffFormatError, TiffResult};
use crate::limits::Limits;
use crate::storage::ReadBackend;
use crate::tags::Type;
use crate::value::Value;

/// One resolved entry of an IFD: the raw tag code (not yet matched against a
/// [`crate::catalogue::TagCatalogue`]), the on-wire type and count it was
/// decoded from, and its decoded value. `wire_type`/`count` are kept
/// alongside `value` (rather than discarded once decoded) so the extractor
/// can validate a descriptor's accepted wire types and scalar-count
/// requirement against what was actually on disk (§4.4, §4.5).
#[derive(Clone, Debug)]
pub struct IfdEntry {
    pub tag_code: u16,
    pub wire_type: Type,
    pub count: u64,
    pub value: Value,
}

/// A fully parsed Image File Directory (§3).
#[derive(Clone, Debug, Default)]
pub struct Ifd {
    /// Ascending by `tag_code`, per §4.5's strict-ordering requirement (or
    /// sorted by the caller if parsed in lenient mode).
    pub entries: Vec<IfdEntry>,
    pub next_offset: Option<u64>,
}

impl Ifd {
    /// Binary-searches for an entry by raw tag code. `entries` must be
    /// ascending, which `read_ifd` guarantees.
    pub fn find(&self, tag_code: u16) -> Option<&Value> {
        self.entries
            .binary_search_by_key(&tag_code, |e| e.tag_code)
            .ok()
            .map(|i| &self.entries[i].value)
    }
}

/// Reads the entry-count field at `offset` and returns it as a plain `u64`
/// regardless of whether it is the classic `u16` or the BigTIFF `u64` form.
pub fn read_ifd_header(
    backend: &dyn ReadBackend,
    offset: u64,
    order: ByteOrder,
    format: Format,
) -> TiffResult<u64> {
    let view = backend.read(offset, format.entry_count_len() as u64)?;
    Ok(match format {
        Format::Classic => u64::from(read_u16(&view, order)?),
        Format::Big => read_u64(&view, order)?,
    })
}

/// Reads the next-IFD pointer stored immediately after an IFD's entries.
/// Returns `None` for the chain-terminating value `0` (§3).
pub fn next_ifd_offset(
    backend: &dyn ReadBackend,
    entries_end: u64,
    order: ByteOrder,
    format: Format,
) -> TiffResult<Option<u64>> {
    let view = backend.read(entries_end, format.offset_len() as u64)?;
    let raw = match format {
        Format::Classic => u64::from(read_u32(&view, order)?),
        Format::Big => read_u64(&view, order)?,
    };
    Ok(if raw == 0 { None } else { Some(raw) })
}

/// Decodes `count` contiguous elements of `type_` out of `bytes`, returning a
/// scalar `Value` for `count == 1` and `Value::List` otherwise (§4.4).
fn decode_elements(bytes: &[u8], type_: Type, count: usize, order: ByteOrder) -> TiffResult<Value> {
    if type_ == Type::ASCII {
        let mut buf = bytes
            .get(..count)
            .ok_or(TiffFormatError::UnexpectedEndOfFile)?
            .to_vec();
        // Trim all trailing NULs, not just the first terminator - the spec
        // tolerates strings with no NUL at all rather than failing outright.
        while buf.last() == Some(&0) {
            buf.pop();
        }
        if !buf.is_ascii() {
            return Err(TiffFormatError::InvalidTag.into());
        }
        return Ok(Value::Ascii(String::from_utf8(buf)?));
    }

    let size = type_.size() as usize;
    let decode_one = |i: usize| -> TiffResult<Value> {
        let start = i * size;
        let b = bytes
            .get(start..start + size)
            .ok_or(TiffFormatError::UnexpectedEndOfFile)?;
        Ok(match type_ {
            Type::BYTE | Type::UNDEFINED => Value::Byte(b[0]),
            Type::SBYTE => Value::SignedByte(b[0] as i8),
            Type::SHORT => Value::Short(read_u16(b, order)?),
            Type::SSHORT => Value::SignedShort(read_i16(b, order)?),
            Type::LONG => Value::Unsigned(read_u32(b, order)?),
            Type::SLONG => Value::Signed(read_i32(b, order)?),
            Type::FLOAT => Value::Float(read_f32(b, order)?),
            Type::DOUBLE => Value::Double(read_f64(b, order)?),
            Type::RATIONAL => Value::Rational(read_u32(b, order)?, read_u32(&b[4..], order)?),
            Type::SRATIONAL => Value::SRational(read_i32(b, order)?, read_i32(&b[4..], order)?),
            Type::IFD => Value::Ifd(read_u32(b, order)?),
            Type::LONG8 => Value::UnsignedBig(read_u64(b, order)?),
            Type::SLONG8 => Value::SignedBig(read_i64(b, order)?),
            Type::IFD8 => Value::IfdBig(read_u64(b, order)?),
            Type::ASCII => unreachable!("handled above"),
        })
    };

    if count == 1 {
        return decode_one(0);
    }
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        out.push(decode_one(i)?);
    }
    Ok(Value::List(out))
}

/// Resolves one raw entry to a [`Value`], fetching its external payload
/// through `backend` if the value does not fit in the entry's inline slot.
pub fn parse_tag(
    raw: &RawEntry,
    backend: &dyn ReadBackend,
    order: ByteOrder,
    format: Format,
    limits: &Limits,
) -> TiffResult<Value> {
    let type_ = Type::from_u16(raw.wire_type).ok_or(TiffFormatError::InvalidTag)?;
    let count = usize::try_from(raw.count).map_err(|_| TiffError::LimitsExceeded)?;

    if count == 0 {
        return Ok(Value::List(Vec::new()));
    }

    if raw.is_inline(format) {
        return decode_elements(&raw.slot, type_, count, order);
    }

    let byte_len = raw.value_byte_len();
    if byte_len as usize > limits.ifd_value_size {
        return Err(TiffError::LimitsExceeded);
    }
    let offset = raw.external_offset(order, format)?;
    let view = backend.read(offset, byte_len)?;
    if (view.len() as u64) < byte_len {
        return Err(TiffFormatError::UnexpectedEndOfFile.into());
    }
    decode_elements(&view, type_, count, order)
}

/// Reads one full IFD starting at `offset`: entry count, every entry
/// (resolved to a `Value`), and the trailing next-IFD pointer.
///
/// When `strict` is set, entries out of ascending tag-code order fail with
/// `NotSorted` (§4.5); otherwise they are accepted and re-sorted so `find`'s
/// binary search remains valid.
pub fn read_ifd(
    backend: &dyn ReadBackend,
    offset: u64,
    order: ByteOrder,
    format: Format,
    limits: &Limits,
    strict: bool,
) -> TiffResult<Ifd> {
    let count = read_ifd_header(backend, offset, order, format)?;
    let count = usize::try_from(count).map_err(|_| TiffError::LimitsExceeded)?;

    let entries_start = offset + format.entry_count_len() as u64;
    let mut entries = Vec::with_capacity(count);
    let mut prev_code: Option<u16> = None;
    let mut sorted = true;

    for i in 0..count {
        let entry_offset = entries_start + (i as u64) * format.entry_len() as u64;
        let view = backend.read(entry_offset, format.entry_len() as u64)?;
        let raw = RawEntry::parse(&view, order, format)?;

        if let Some(prev) = prev_code {
            if raw.tag_code <= prev {
                if strict {
                    return Err(TiffFormatError::NotSorted.into());
                }
                sorted = false;
            }
        }
        prev_code = Some(raw.tag_code);

        let value = parse_tag(&raw, backend, order, format, limits)?;
        let wire_type = Type::from_u16(raw.wire_type).ok_or(TiffFormatError::InvalidTag)?;
        entries.push(IfdEntry {
            tag_code: raw.tag_code,
            wire_type,
            count: raw.count,
            value,
        });
    }

    if !sorted {
        entries.sort_by_key(|e| e.tag_code);
    }

    let entries_end = entries_start + (count as u64) * format.entry_len() as u64;
    let next_offset = next_ifd_offset(backend, entries_end, order, format)?;

    Ok(Ifd {
        entries,
        next_offset,
    })
}

/// Walks the full chain of IFDs starting at `header.first_ifd_offset`,
/// rejecting any cycle the chain forms (§4.5) via [`cycles::IfdCycles`].
pub fn read_ifd_chain(
    backend: &dyn ReadBackend,
    first_ifd_offset: u64,
    order: ByteOrder,
    format: Format,
    limits: &Limits,
    strict: bool,
) -> TiffResult<Vec<Ifd>> {
    use crate::tags::IfdPointer;
    use cycles::IfdCycles;

    let mut cycles = IfdCycles::new();
    let mut out = Vec::new();
    let mut next = Some(first_ifd_offset);

    while let Some(offset) = next {
        let ifd = read_ifd(backend, offset, order, format, limits, strict)?;
        cycles.insert_next(IfdPointer(offset), ifd.next_offset.map(IfdPointer))?;
        next = ifd.next_offset;
        out.push(ifd);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BorrowedReadBuffer;

    fn classic_le_one_short_tag() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u16.to_le_bytes()); // entry count
        bytes.extend_from_slice(&256u16.to_le_bytes()); // tag: ImageWidth
        bytes.extend_from_slice(&3u16.to_le_bytes()); // type: SHORT
        bytes.extend_from_slice(&1u32.to_le_bytes()); // count
        bytes.extend_from_slice(&[0x80, 0x02, 0x00, 0x00]); // value 0x0280 = 640, inline
        bytes.extend_from_slice(&0u32.to_le_bytes()); // next IFD offset: none
        bytes
    }

    #[test]
    fn reads_single_inline_short_entry() {
        let bytes = classic_le_one_short_tag();
        let backend = BorrowedReadBuffer::new(&bytes);
        let limits = Limits::default();
        let ifd = read_ifd(
            &backend,
            0,
            ByteOrder::LittleEndian,
            Format::Classic,
            &limits,
            true,
        )
        .unwrap();
        assert_eq!(ifd.entries.len(), 1);
        assert_eq!(ifd.next_offset, None);
        assert_eq!(ifd.find(256), Some(&Value::Short(640)));
        assert_eq!(ifd.find(999), None);
    }

    #[test]
    fn external_ascii_value_is_trimmed_at_nul() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&270u16.to_le_bytes()); // ImageDescription
        bytes.extend_from_slice(&2u16.to_le_bytes()); // ASCII
        bytes.extend_from_slice(&6u32.to_le_bytes()); // count, too big to inline
        let external_offset = bytes.len() as u32 + 4 + 4; // after slot + next-ifd pointer
        bytes.extend_from_slice(&external_offset.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes()); // next IFD offset
        bytes.extend_from_slice(b"hi\0\0\0\0");

        let backend = BorrowedReadBuffer::new(&bytes);
        let limits = Limits::default();
        let ifd = read_ifd(
            &backend,
            0,
            ByteOrder::LittleEndian,
            Format::Classic,
            &limits,
            true,
        )
        .unwrap();
        assert_eq!(ifd.find(270), Some(&Value::Ascii("hi".to_string())));
    }

    #[test]
    fn out_of_order_entries_fail_strict_mode() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u16.to_le_bytes());
        // Entry 1: tag 300
        bytes.extend_from_slice(&300u16.to_le_bytes());
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 0, 0, 0]);
        // Entry 2: tag 256 (out of order)
        bytes.extend_from_slice(&256u16.to_le_bytes());
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&[2, 0, 0, 0]);
        bytes.extend_from_slice(&0u32.to_le_bytes());

        let backend = BorrowedReadBuffer::new(&bytes);
        let limits = Limits::default();
        assert!(read_ifd(
            &backend,
            0,
            ByteOrder::LittleEndian,
            Format::Classic,
            &limits,
            true
        )
        .is_err());

        let ifd = read_ifd(
            &backend,
            0,
            ByteOrder::LittleEndian,
            Format::Classic,
            &limits,
            false,
        )
        .unwrap();
        assert_eq!(ifd.entries[0].tag_code, 256);
        assert_eq!(ifd.entries[1].tag_code, 300);
    }

    #[test]
    fn chain_with_cycle_is_rejected() {
        // Offset 0 is reserved as the "no next IFD" sentinel, so a cycle must
        // be built from two nonzero offsets: the IFD at 8 points to 14, which
        // points back to 8.
        let mut bytes = vec![0u8; 8]; // padding up to the first IFD's offset
        bytes.extend_from_slice(&0u16.to_le_bytes()); // entry count
        bytes.extend_from_slice(&14u32.to_le_bytes()); // next = offset 14
        assert_eq!(bytes.len(), 14);
        bytes.extend_from_slice(&0u16.to_le_bytes()); // entry count
        bytes.extend_from_slice(&8u32.to_le_bytes()); // next = offset 8 (cycle)

        let backend = BorrowedReadBuffer::new(&bytes);
        let limits = Limits::default();
        let result = read_ifd_chain(
            &backend,
            8,
            ByteOrder::LittleEndian,
            Format::Classic,
            &limits,
            true,
        );
        assert!(result.is_err());
    }
}
