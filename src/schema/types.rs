//! # Schema Type Codes Module
//!
//! The one-letter type codes a schema field can declare (§6.1), and the
//! byte width each occupies per element.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A field's declared primitive type.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TypeCode {
    /// `O` — object name, 20 bytes.
    Object,
    /// `F` — field id, 4 bytes.
    FieldId,
    /// `R` — record id, 4 bytes.
    RecordId,
    /// `I` — index, 4 bytes.
    IndexId,
    /// `C` — char, 1 byte.
    Char,
    /// `S` — string element, 1 byte.
    StringElement,
    /// `N` — signed int, 4 bytes.
    SignedInt,
    /// `U` — unsigned int, 4 bytes.
    UnsignedInt,
    /// `B` — bool, 1 byte.
    Bool,
    /// `Y` — unsigned byte, 1 byte.
    Byte,
    /// `X` — pad byte, 1 byte.
    Pad,
}

impl TypeCode {
    /// Parses one of the one-letter codes from §6.1.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'O' => Some(TypeCode::Object),
            'F' => Some(TypeCode::FieldId),
            'R' => Some(TypeCode::RecordId),
            'I' => Some(TypeCode::IndexId),
            'C' => Some(TypeCode::Char),
            'S' => Some(TypeCode::StringElement),
            'N' => Some(TypeCode::SignedInt),
            'U' => Some(TypeCode::UnsignedInt),
            'B' => Some(TypeCode::Bool),
            'Y' => Some(TypeCode::Byte),
            'X' => Some(TypeCode::Pad),
            _ => None,
        }
    }

    /// The one-letter code this variant was parsed from.
    pub fn as_char(self) -> char {
        match self {
            TypeCode::Object => 'O',
            TypeCode::FieldId => 'F',
            TypeCode::RecordId => 'R',
            TypeCode::IndexId => 'I',
            TypeCode::Char => 'C',
            TypeCode::StringElement => 'S',
            TypeCode::SignedInt => 'N',
            TypeCode::UnsignedInt => 'U',
            TypeCode::Bool => 'B',
            TypeCode::Byte => 'Y',
            TypeCode::Pad => 'X',
        }
    }

    /// Byte size of a single element of this type.
    pub fn element_size(self) -> usize {
        match self {
            TypeCode::Object => 20,
            TypeCode::FieldId | TypeCode::RecordId | TypeCode::IndexId => 4,
            TypeCode::Char | TypeCode::StringElement => 1,
            TypeCode::SignedInt | TypeCode::UnsignedInt => 4,
            TypeCode::Bool | TypeCode::Byte | TypeCode::Pad => 1,
        }
    }

    /// `true` for type codes whose values are read/written as text
    /// (memcpy'd byte ranges) rather than parsed as numbers or booleans.
    pub fn is_string_like(self) -> bool {
        matches!(
            self,
            TypeCode::Char | TypeCode::StringElement | TypeCode::Object | TypeCode::Byte
        )
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
