//! IFD construction (§4.11 component I): assembles a set of tags into the
//! on-disk IFD entry array plus its external-data block, as two independent
//! byte buffers a write-planner placement strategy can position anywhere in
//! the file.
//!
//! Grounds on the teacher's `encoder::directory_encoder::DirectoryEncoder`
//! (`write_tag`, `write_directory`'s inline-vs-external split,
//! `finish_internal`'s offset back-patch): the teacher writes straight to a
//! `Write + Seek` stream and immediately knows the external block's absolute
//! offset because it always lands right after the directory. This rewrite
//! defers that knowledge - `build` returns the IFD array and external block
//! as two byte buffers with only *relative* external offsets recorded, and
//! [`BuiltIfd::relocate_external`] patches them to absolute file offsets once
//! a placement strategy has decided where the external block lives (§4.11
//! step 3).

use crate::binary::{ByteOrder, Format};
use crate::error::{TiffFormatError, TiffResult, UsageError};
use crate::tags::{Tag, Type};
use crate::value::Value;

/// One tag queued for writing: its wire type (the primary or an alternate a
/// catalogue accepts) and already-resolved value. `count` is derived from
/// `value` except for `Ascii`, where the written byte count
/// (string length + 1 for the teacher's trailing NUL convention) differs
/// from the logical string length.
#[derive(Clone, Debug)]
pub struct BuiltTag {
    pub tag: Tag,
    pub type_: Type,
    pub value: Value,
}

impl BuiltTag {
    pub fn new(tag: Tag, type_: Type, value: Value) -> Self {
        BuiltTag { tag, type_, value }
    }
}

/// Encodes one tag's logical value into the flat wire-type element bytes
/// that will either sit inline or in the external block, plus the element
/// count those bytes represent.
fn encode_elements(type_: Type, value: &Value, order: ByteOrder) -> TiffResult<(Vec<u8>, u64)> {
    use crate::binary::{write_f32, write_f64, write_i16, write_i32, write_i64, write_u16, write_u32, write_u64};

    if type_ == Type::ASCII {
        let s = match value {
            Value::Ascii(s) => s.clone(),
            _ => return Err(TiffFormatError::InvalidTag.into()),
        };
        if !s.is_ascii() || s.bytes().any(|b| b == 0) {
            return Err(TiffFormatError::InvalidTag.into());
        }
        let mut bytes = s.into_bytes();
        bytes.push(0);
        let count = bytes.len() as u64;
        return Ok((bytes, count));
    }

    let scalars: Vec<Value> = match value {
        Value::List(items) => items.clone(),
        other => vec![other.clone()],
    };

    let elem_size = type_.size() as usize;
    let mut bytes = Vec::with_capacity(scalars.len() * elem_size);
    for scalar in &scalars {
        let mut slot = vec![0u8; elem_size];
        match type_ {
            Type::BYTE | Type::UNDEFINED => slot[0] = scalar.clone().into_u8()?,
            Type::SBYTE => slot[0] = scalar.clone().into_i8()? as u8,
            Type::SHORT => write_u16(&mut slot, scalar.clone().into_u16()?, order)?,
            Type::SSHORT => write_i16(&mut slot, scalar.clone().into_i16()?, order)?,
            Type::LONG | Type::IFD => write_u32(&mut slot, scalar.clone().into_u32()?, order)?,
            Type::SLONG => write_i32(&mut slot, scalar.clone().into_i32()?, order)?,
            Type::FLOAT => write_f32(&mut slot, scalar.clone().into_f32()?, order)?,
            Type::DOUBLE => write_f64(&mut slot, scalar.clone().into_f64()?, order)?,
            Type::LONG8 | Type::IFD8 => write_u64(&mut slot, scalar.clone().into_u64()?, order)?,
            Type::SLONG8 => write_i64(&mut slot, scalar.clone().into_i64()?, order)?,
            Type::RATIONAL => {
                let (n, d) = scalar.clone().into_rational()?;
                write_u32(&mut slot, n, order)?;
                write_u32(&mut slot[4..], d, order)?;
            }
            Type::SRATIONAL => {
                let (n, d) = scalar.clone().into_srational()?;
                write_i32(&mut slot, n, order)?;
                write_i32(&mut slot[4..], d, order)?;
            }
            Type::ASCII => unreachable!("handled above"),
        }
        bytes.extend_from_slice(&slot);
    }
    Ok((bytes, scalars.len() as u64))
}

/// A tag entry whose value lives in the external block, recorded before the
/// block's absolute base offset is known.
struct PendingExternal {
    entry_index: usize,
    relative_offset: u64,
}

/// The IFD entry array plus external-data block built by [`build`], still
/// addressed relative to the start of the external block (§4.11 step 3).
pub struct BuiltIfd {
    order: ByteOrder,
    format: Format,
    /// `format.entry_len()`-byte records, ascending by tag code, with
    /// external slots holding a *relative* offset into `external` until
    /// [`Self::relocate_external`] patches them.
    entries: Vec<u8>,
    external: Vec<u8>,
    pending: Vec<PendingExternal>,
}

impl BuiltIfd {
    /// Number of entries in this directory.
    pub fn entry_count(&self) -> usize {
        self.entries.len() / self.format.entry_len()
    }

    /// The IFD's entry-array bytes (`entry_count` records, `format.entry_len()`
    /// bytes each), not including the leading entry-count field or the
    /// trailing next-IFD pointer - the caller (§4.11, `writer.rs`) owns those.
    pub fn entries(&self) -> &[u8] {
        &self.entries
    }

    /// The external-value block's bytes, to be written wherever the write
    /// planner places it.
    pub fn external(&self) -> &[u8] {
        &self.external
    }

    /// Patches every external-valued entry's stored offset from
    /// "relative to the start of `external()`" to an absolute file offset,
    /// now that `external_base` (where `external()`'s bytes will land) is
    /// known.
    pub fn relocate_external(&mut self, external_base: u64) -> TiffResult<()> {
        use crate::binary::{write_u32, write_u64};

        let entry_len = self.format.entry_len();
        let slot_start = if self.format.is_big() { 12 } else { 8 };
        let offset_len = self.format.offset_len();

        for pending in &self.pending {
            let absolute = external_base
                .checked_add(pending.relative_offset)
                .ok_or(TiffFormatError::InconsistentSizesEncountered)?;
            let entry_start = pending.entry_index * entry_len;
            let slot = &mut self.entries[entry_start + slot_start..entry_start + slot_start + offset_len];
            match self.format {
                Format::Classic => write_u32(slot, u32::try_from(absolute).map_err(|_| crate::error::TiffError::IntSizeError)?, self.order)?,
                Format::Big => write_u64(slot, absolute, self.order)?,
            }
        }
        Ok(())
    }
}

/// Builds an IFD from `tags`, which must already be in strictly ascending
/// tag-code order (§4.11 step 1 validates this upstream; this function
/// enforces it as a cheap sanity check since it both simplifies the
/// entry-array layout and matches what every reader's strict mode expects).
///
/// Each tag's value is split inline-vs-external per `format.offset_len()`
/// (§3), mirroring the teacher's `write_directory`: values that fit inline
/// are zero-padded into the slot directly; larger values are appended to the
/// external block and the slot instead records - for now - their offset
/// relative to the start of that block.
pub fn build(tags: &[BuiltTag], order: ByteOrder, format: Format) -> TiffResult<BuiltIfd> {
    for pair in tags.windows(2) {
        if pair[0].tag.to_u16() >= pair[1].tag.to_u16() {
            return Err(UsageError::IncompatibleWritePolicies("tags passed to builder::build must be strictly ascending by tag code").into());
        }
    }

    let entry_len = format.entry_len();
    let offset_len = format.offset_len();
    let slot_start = if format.is_big() { 12 } else { 8 };

    let mut entries = vec![0u8; tags.len() * entry_len];
    let mut external = Vec::new();
    let mut pending = Vec::new();

    for (index, built) in tags.iter().enumerate() {
        let (bytes, count) = encode_elements(built.type_, &built.value, order)?;
        let entry_start = index * entry_len;

        {
            use crate::binary::write_u16;
            write_u16(&mut entries[entry_start..], built.tag.to_u16(), order)?;
            write_u16(&mut entries[entry_start + 2..], built.type_.to_u16(), order)?;
            match format {
                Format::Classic => {
                    use crate::binary::write_u32;
                    write_u32(&mut entries[entry_start + 4..], u32::try_from(count).map_err(|_| crate::error::TiffError::IntSizeError)?, order)?;
                }
                Format::Big => {
                    use crate::binary::write_u64;
                    write_u64(&mut entries[entry_start + 4..], count, order)?;
                }
            }
        }

        let slot = &mut entries[entry_start + slot_start..entry_start + slot_start + offset_len];
        if bytes.len() <= offset_len {
            slot[..bytes.len()].copy_from_slice(&bytes);
        } else {
            let relative_offset = external.len() as u64;
            external.extend_from_slice(&bytes);
            pending.push(PendingExternal {
                entry_index: index,
                relative_offset,
            });
            // Placeholder; `relocate_external` fills this in once the
            // external block's absolute base is known.
            match format {
                Format::Classic => {
                    use crate::binary::write_u32;
                    write_u32(slot, 0, order)?;
                }
                Format::Big => {
                    use crate::binary::write_u64;
                    write_u64(slot, 0, order)?;
                }
            }
        }
    }

    Ok(BuiltIfd {
        order,
        format,
        entries,
        external,
        pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{read_u16, read_u32};

    #[test]
    fn inline_scalar_needs_no_external_block() {
        let tags = vec![BuiltTag::new(Tag::ImageWidth, Type::LONG, Value::Unsigned(640))];
        let built = build(&tags, ByteOrder::LittleEndian, Format::Classic).unwrap();
        assert!(built.external().is_empty());
        assert_eq!(built.entry_count(), 1);
        assert_eq!(read_u16(built.entries(), ByteOrder::LittleEndian).unwrap(), Tag::ImageWidth.to_u16());
        let value = read_u32(&built.entries()[8..], ByteOrder::LittleEndian).unwrap();
        assert_eq!(value, 640);
    }

    #[test]
    fn oversized_array_is_relocated_to_external_block() {
        let tags = vec![BuiltTag::new(
            Tag::StripOffsets,
            Type::LONG,
            Value::List(vec![Value::Unsigned(10), Value::Unsigned(20), Value::Unsigned(30)]),
        )];
        let mut built = build(&tags, ByteOrder::LittleEndian, Format::Classic).unwrap();
        assert_eq!(built.external().len(), 12);

        built.relocate_external(1000).unwrap();
        let stored_offset = read_u32(&built.entries()[8..], ByteOrder::LittleEndian).unwrap();
        assert_eq!(stored_offset, 1000);
    }

    #[test]
    fn ascii_value_gets_trailing_nul() {
        let tags = vec![BuiltTag::new(Tag::Software, Type::ASCII, Value::Ascii("hi".to_string()))];
        let built = build(&tags, ByteOrder::LittleEndian, Format::Classic).unwrap();
        // "hi\0" is 3 bytes, fits inline for classic TIFF's 4-byte slot.
        assert!(built.external().is_empty());
        let count = read_u32(&built.entries()[4..], ByteOrder::LittleEndian).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn out_of_order_tags_are_rejected() {
        let tags = vec![
            BuiltTag::new(Tag::StripOffsets, Type::LONG, Value::Unsigned(1)),
            BuiltTag::new(Tag::ImageWidth, Type::LONG, Value::Unsigned(2)),
        ];
        assert!(build(&tags, ByteOrder::LittleEndian, Format::Classic).is_err());
    }
}
