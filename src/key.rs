//! # Primitive Types & Key Module
//!
//! Defines the names and numeric identifiers used to address a single datum
//! in the store, and the four-tuple key built out of them.

use std::fmt;

/// Maximum length, in bytes, of an [`Object`] name once NUL-padded.
pub const OBJECT_NAME_LEN: usize = 20;

/// An ASCII object name, at most [`OBJECT_NAME_LEN`] bytes. Equality and
/// hashing are case-insensitive: both sides are compared via their
/// upper-case canonical form.
#[derive(Clone, Eq)]
pub struct Object(String);

/// A field's ordinal number within an object.
pub type Field = u32;

/// A record's zero-based slot index within an object.
pub type Record = u32;

/// An element's zero-based index within a (possibly array) field.
pub type Index = u32;

/// The smallest addressable quantum of data: an object, one of its fields,
/// one of its records, and (for array fields) an element within that field.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Ofri {
    pub object: Object,
    pub field: Field,
    pub record: Record,
    pub index: Index,
}

/// References an entire record of a given object.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Or {
    pub object: Object,
    pub record: Record,
}

impl Object {
    /// Builds a canonical [`Object`] name, rejecting names that would not
    /// survive round-tripping through [`OBJECT_NAME_LEN`]-byte NUL-padded
    /// storage.
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref();
        if name.is_empty() || name.len() > OBJECT_NAME_LEN || !name.is_ascii() {
            return None;
        }
        Some(Object(name.to_ascii_uppercase()))
    }

    /// Returns the canonical (upper-case) name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encodes the name as a fixed-size, NUL-padded byte array suitable for
    /// the manifest or the wire.
    pub fn to_padded_bytes(&self) -> [u8; OBJECT_NAME_LEN] {
        let mut buf = [0u8; OBJECT_NAME_LEN];
        let bytes = self.0.as_bytes();
        buf[..bytes.len()].copy_from_slice(bytes);
        buf
    }

    /// Decodes a NUL-padded byte array back into an [`Object`], trimming at
    /// the first NUL.
    pub fn from_padded_bytes(bytes: &[u8]) -> Option<Self> {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        std::str::from_utf8(&bytes[..end]).ok().and_then(Object::new)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl std::hash::Hash for Object {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({:?})", self.0)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Ofri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, field={}, record={}, index={})",
            self.object, self.field, self.record, self.index
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn object_names_are_case_insensitive() {
        let a = Object::new("bass").unwrap();
        let b = Object::new("BASS").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "BASS");
    }

    #[test]
    fn object_names_over_limit_are_rejected() {
        assert!(Object::new("a".repeat(OBJECT_NAME_LEN + 1)).is_none());
        assert!(Object::new("").is_none());
    }

    #[test]
    fn padded_round_trip() {
        let o = Object::new("bass").unwrap();
        let bytes = o.to_padded_bytes();
        assert_eq!(bytes.len(), OBJECT_NAME_LEN);
        let back = Object::from_padded_bytes(&bytes).unwrap();
        assert_eq!(o, back);
    }
}
