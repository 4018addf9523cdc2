//! # Schema Descriptor Module
//!
//! The compiled, in-memory layout for a field and for an object: the result
//! of running the schema compiler (C3) over one schema file.

use serde::{Deserialize, Serialize};

use crate::key::{Field, Object};
use crate::schema::types::TypeCode;

/// A single field's compiled layout within its enclosing object.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldDescriptor {
    number: u32,
    name: String,
    type_code: TypeCode,
    num_elements: u32,
    offset: usize,
}

impl FieldDescriptor {
    pub(crate) fn new(
        number: u32,
        name: String,
        type_code: TypeCode,
        num_elements: u32,
        offset: usize,
    ) -> Self {
        FieldDescriptor {
            number,
            name,
            type_code,
            num_elements,
            offset,
        }
    }

    /// The field's ordinal number, as declared in the schema file.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The field's declared name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's declared type.
    pub fn type_code(&self) -> TypeCode {
        self.type_code
    }

    /// Number of elements; greater than one for array fields.
    pub fn num_elements(&self) -> u32 {
        self.num_elements
    }

    /// Byte size of a single element.
    pub fn element_size(&self) -> usize {
        self.type_code.element_size()
    }

    /// Total byte size occupied by this field: `element_size * num_elements`.
    pub fn size(&self) -> usize {
        self.element_size() * self.num_elements as usize
    }

    /// Byte offset of this field within its record. Equal to the sum of the
    /// sizes of every field declared before it.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// An object's compiled layout: its record count, total record size, and
/// the ordered list of fields within one record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    number: u32,
    #[serde(with = "object_as_str")]
    name: Object,
    record_count: u32,
    fields: Vec<FieldDescriptor>,
    record_size: usize,
}

/// (De)serializes an [`Object`] through its canonical string form, since
/// `Object` itself intentionally exposes no public constructor fields.
mod object_as_str {
    use super::Object;
    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(object: &Object, serializer: S) -> Result<S::Ok, S::Error> {
        object.as_str().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Object, D::Error> {
        let name = String::deserialize(deserializer)?;
        Object::new(&name).ok_or_else(|| D::Error::custom(format!("invalid object name {name:?}")))
    }
}

impl ObjectDescriptor {
    pub(crate) fn new(
        number: u32,
        name: Object,
        record_count: u32,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        let record_size = fields.iter().map(FieldDescriptor::size).sum();
        ObjectDescriptor {
            number,
            name,
            record_count,
            fields,
            record_size,
        }
    }

    /// The object's ordinal number. Stable across schema recompilations; it
    /// is the line index of this object in the generated manifest.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The object's canonical name.
    pub fn name(&self) -> &Object {
        &self.name
    }

    /// Number of record slots provisioned for this object.
    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    /// The fields declared for this object, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by its zero-based position in declaration order —
    /// the same indexing an `OFRI`'s `field` component addresses (§3.1).
    /// This is positional, not the schema-declared `field_number`, which
    /// exists only to catch authoring mistakes at compile time.
    pub fn field(&self, index: Field) -> Option<&FieldDescriptor> {
        self.fields.get(index as usize)
    }

    /// Total size, in bytes, of one record: the sum of every field's size.
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Total size, in bytes, the backing file must have:
    /// `record_count * record_size`.
    pub fn file_size(&self) -> u64 {
        self.record_count as u64 * self.record_size as u64
    }

    /// `true` iff `record_size` is a multiple of 4, the alignment
    /// precondition enforced at compile time (§3.3, §8 invariant 4).
    pub fn is_aligned(&self) -> bool {
        self.record_size % 4 == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::types::TypeCode;

    fn bass() -> ObjectDescriptor {
        let mut offset = 0;
        let fields: Vec<_> = (1..=4u32)
            .map(|n| {
                let f = FieldDescriptor::new(n, format!("F{n}"), TypeCode::Char, 4, offset);
                offset += f.size();
                f
            })
            .collect();
        ObjectDescriptor::new(1, Object::new("BASS").unwrap(), 10, fields)
    }

    #[test]
    fn s1_schema_round_trip() {
        let bass = bass();
        assert_eq!(bass.record_size(), 16);
        assert_eq!(bass.file_size(), 160);
        assert_eq!(bass.fields().len(), 4);
        for (i, field) in bass.fields().iter().enumerate() {
            assert_eq!(field.size(), 4);
            assert_eq!(field.offset(), i * 4);
        }
        assert!(bass.is_aligned());
    }

    #[test]
    fn offsets_are_prefix_sums_of_prior_sizes() {
        let bass = bass();
        let mut running = 0;
        for field in bass.fields() {
            assert_eq!(field.offset(), running);
            running += field.size();
        }
    }

    #[test]
    fn misaligned_record_size_is_detected() {
        let fields = vec![FieldDescriptor::new(1, "F1".into(), TypeCode::Byte, 3, 0)];
        let obj = ObjectDescriptor::new(1, Object::new("ODD").unwrap(), 1, fields);
        assert!(!obj.is_aligned());
    }

    #[test]
    fn s2_field_lookup_is_positional_not_by_declared_number() {
        let bass = bass();
        let third = bass.field(2).unwrap();
        assert_eq!(third.name(), "F3");
        assert_eq!(third.offset(), 8);
    }
}
