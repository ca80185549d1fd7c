//! Tag-descriptor system (§4.3): a catalogue maps each tag code to its wire
//! type, native value shape, optionality, and any wire types the parser is
//! willing to promote from. `tags.rs`'s macro-generated `Tag`/`Type`
//! vocabulary is kept verbatim as the code/wire-type namespace; this module
//! adds the descriptor record and catalogue container the spec asks for on
//! top of it.
//!
//! The source's build-time (consteval) validation has no equivalent
//! const-eval-time sort/validate story in stable Rust, so `validate` runs as
//! a `#[test]` instead (documented as an Open Question in DESIGN.md) rather
//! than at const-eval time.

pub mod standard;

use crate::tags::{Tag, Type};

/// The native shape a tag's value takes once parsed (§3 "Tag descriptor").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueShape {
    /// A single scalar of the primary wire type.
    Scalar,
    /// `count` scalars of the primary wire type.
    Array,
    /// `count` unsigned rational pairs (numerator, denominator).
    Rational,
    /// `count` signed rational pairs.
    SRational,
    /// A single NUL-trimmed ASCII string.
    Ascii,
}

/// A compile-time tag descriptor (§4.3): (code, primary wire type, native
/// shape, optionality, accepted alternate wire types).
#[derive(Clone, Copy, Debug)]
pub struct TagDescriptor {
    pub tag: Tag,
    pub primary: Type,
    pub shape: ValueShape,
    pub optional: bool,
    /// Wire types the parser will additionally accept and widen from. Must
    /// be empty for `Rational`/`SRational` shapes: "promotion across
    /// rational shapes is not defined" (§4.3).
    pub alternates: &'static [Type],
}

impl TagDescriptor {
    pub const fn required(tag: Tag, primary: Type, shape: ValueShape) -> Self {
        TagDescriptor {
            tag,
            primary,
            shape,
            optional: false,
            alternates: &[],
        }
    }

    pub const fn optional(tag: Tag, primary: Type, shape: ValueShape) -> Self {
        TagDescriptor {
            tag,
            primary,
            shape,
            optional: true,
            alternates: &[],
        }
    }

    pub const fn with_alternates(mut self, alternates: &'static [Type]) -> Self {
        self.alternates = alternates;
        self
    }

    /// Whether `wire_type` is acceptable for this descriptor, either as the
    /// primary type or as one of the declared alternates (§4.4 `parse_tag`).
    pub fn accepts(&self, wire_type: Type) -> bool {
        wire_type == self.primary || self.alternates.contains(&wire_type)
    }
}

/// A strictly-ascending-sorted (by tag code) list of descriptors (§4.3).
pub type TagCatalogue = &'static [TagDescriptor];

/// Binary-searches a catalogue for the descriptor matching `code`. The
/// catalogue must be sorted ascending by tag code, which `validate` checks.
pub fn find(catalogue: TagCatalogue, code: u16) -> Option<&'static TagDescriptor> {
    catalogue
        .binary_search_by_key(&code, |d| d.tag.to_u16())
        .ok()
        .map(|i| &catalogue[i])
}

/// Validates the invariants §4.3 imposes on a catalogue at "build time". Run
/// from `#[test]` (see module docs) rather than at const-eval time.
pub fn validate(catalogue: TagCatalogue) -> Result<(), String> {
    for pair in catalogue.windows(2) {
        if pair[0].tag.to_u16() >= pair[1].tag.to_u16() {
            return Err(format!(
                "catalogue not strictly ascending at tag {:?} -> {:?}",
                pair[0].tag, pair[1].tag
            ));
        }
    }
    for d in catalogue {
        match d.shape {
            ValueShape::Rational | ValueShape::SRational if !d.alternates.is_empty() => {
                return Err(format!(
                    "rational descriptor {:?} declares alternate wire types, which is undefined",
                    d.tag
                ));
            }
            ValueShape::Ascii if d.primary != Type::ASCII => {
                return Err(format!(
                    "ascii-shaped descriptor {:?} must have Type::ASCII as its primary wire type",
                    d.tag
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::standard::{EXTENDED, MINIMAL_STRIPPED_CLASSIC, MINIMAL_TILED_CLASSIC};

    #[test]
    fn standard_catalogues_are_valid() {
        validate(MINIMAL_STRIPPED_CLASSIC).expect("stripped catalogue");
        validate(MINIMAL_TILED_CLASSIC).expect("tiled catalogue");
        validate(EXTENDED).expect("extended catalogue");
    }

    #[test]
    fn find_locates_descriptor() {
        let d = find(MINIMAL_STRIPPED_CLASSIC, Tag::ImageWidth.to_u16()).unwrap();
        assert_eq!(d.tag, Tag::ImageWidth);
    }

    #[test]
    fn find_misses_unknown_code() {
        assert!(find(MINIMAL_STRIPPED_CLASSIC, 0xFFFF).is_none());
    }
}
