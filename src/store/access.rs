//! # Typed Record Access Module
//!
//! `ReadValue`/`WriteValue` (§4.2): textual conversion on top of
//! [`MappedView`]'s raw byte access, following the per-type-code rules in
//! §6.1. String-like fields (`C`, `S`, `O`, `Y`) hold one text value across
//! the whole field, independent of `index`; every other type addresses a
//! single element at `index`.

use crate::error::KdbError;
use crate::key::Ofri;
use crate::schema::types::TypeCode;
use crate::store::mapped::MappedView;

fn out_of_range(ofri: &Ofri) -> KdbError {
    KdbError::OutOfRange {
        ofri: ofri.to_string(),
    }
}

fn encode_value(type_code: TypeCode, field: &str, value: &str) -> Result<Vec<u8>, KdbError> {
    let bad_value = || KdbError::BadValue {
        field: field.to_string(),
        type_code: type_code.as_char(),
        value: value.to_string(),
    };
    match type_code {
        TypeCode::Char | TypeCode::StringElement | TypeCode::Object | TypeCode::Byte => {
            Ok(value.as_bytes().to_vec())
        }
        TypeCode::SignedInt => {
            let parsed: i32 = value.parse().map_err(|_| bad_value())?;
            Ok(bytemuck::bytes_of(&parsed.to_le()).to_vec())
        }
        TypeCode::FieldId | TypeCode::RecordId | TypeCode::IndexId | TypeCode::UnsignedInt => {
            let parsed: u32 = value.parse().map_err(|_| bad_value())?;
            Ok(bytemuck::bytes_of(&parsed.to_le()).to_vec())
        }
        TypeCode::Bool => {
            let upper = value.to_ascii_uppercase();
            let truthy = !(upper == "FALSE" || upper == "0");
            Ok(vec![truthy as u8])
        }
        TypeCode::Pad => Err(bad_value()),
    }
}

fn decode_value(type_code: TypeCode, field: &str, bytes: &[u8]) -> Result<String, KdbError> {
    let short = || KdbError::ShortRead {
        expected: type_code.element_size(),
        got: bytes.len(),
    };
    match type_code {
        TypeCode::Char | TypeCode::StringElement | TypeCode::Object | TypeCode::Byte => {
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
        }
        TypeCode::SignedInt => {
            if bytes.len() != 4 {
                return Err(short());
            }
            Ok(i32::from_le(bytemuck::pod_read_unaligned(bytes)).to_string())
        }
        TypeCode::FieldId | TypeCode::RecordId | TypeCode::IndexId | TypeCode::UnsignedInt => {
            if bytes.len() != 4 {
                return Err(short());
            }
            Ok(u32::from_le(bytemuck::pod_read_unaligned(bytes)).to_string())
        }
        TypeCode::Bool => Ok(if bytes.first().copied().unwrap_or(0) != 0 {
            "TRUE".to_string()
        } else {
            "FALSE".to_string()
        }),
        TypeCode::Pad => {
            let _ = field;
            Ok(String::new())
        }
    }
}

impl MappedView {
    /// Reads the value addressed by `ofri` as text, converted per its
    /// field's type code.
    pub fn read_value(&self, ofri: &Ofri) -> Result<String, KdbError> {
        let field = self.descriptor.field(ofri.field).ok_or_else(|| out_of_range(ofri))?;
        let type_code = field.type_code();
        let name = field.name().to_string();

        if type_code.is_string_like() {
            let (start, field) = self.field_span(ofri).ok_or_else(|| out_of_range(ofri))?;
            let end = start + field.size();
            let bytes = self
                .mmap
                .as_ref()
                .and_then(|m| m.get(start..end))
                .ok_or_else(|| out_of_range(ofri))?;
            decode_value(type_code, &name, bytes)
        } else {
            let bytes = self.get(ofri).ok_or_else(|| out_of_range(ofri))?;
            decode_value(type_code, &name, bytes)
        }
    }

    /// Writes `value` to the field addressed by `ofri`, converted per its
    /// type code. Oversize string writes are rejected before anything is
    /// written, leaving the existing bytes untouched (§8, S4).
    pub fn write_value(&mut self, ofri: &Ofri, value: &str) -> Result<(), KdbError> {
        let field = self.descriptor.field(ofri.field).ok_or_else(|| out_of_range(ofri))?;
        let type_code = field.type_code();
        let name = field.name().to_string();
        let capacity = field.size();

        let encoded = encode_value(type_code, &name, value)?;
        if encoded.len() > capacity {
            return Err(KdbError::Oversize {
                field: name,
                got: encoded.len(),
                max: capacity,
            });
        }

        let (start, end) = if type_code.is_string_like() {
            let (start, field) = self.field_span(ofri).ok_or_else(|| out_of_range(ofri))?;
            (start, start + field.size())
        } else {
            let field = self.descriptor.field(ofri.field).ok_or_else(|| out_of_range(ofri))?;
            let base = (ofri.record as usize)
                .checked_mul(self.descriptor.record_size())
                .ok_or_else(|| out_of_range(ofri))?;
            let start = base
                .checked_add(field.offset())
                .and_then(|s| s.checked_add((ofri.index as usize) * field.element_size()))
                .ok_or_else(|| out_of_range(ofri))?;
            (start, start + field.element_size())
        };

        let slot = self
            .mmap
            .as_mut()
            .and_then(|m| m.get_mut(start..end))
            .ok_or_else(|| out_of_range(ofri))?;
        slot[..encoded.len()].copy_from_slice(&encoded);
        if type_code.is_string_like() {
            for b in &mut slot[encoded.len()..] {
                *b = 0;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::key::Object;
    use crate::schema::descriptor::{FieldDescriptor, ObjectDescriptor};
    use crate::schema::types::TypeCode;
    use std::fs::OpenOptions;
    use std::sync::Arc;

    fn bass() -> Arc<ObjectDescriptor> {
        let mut offset = 0;
        let fields: Vec<_> = (1..=4u32)
            .map(|n| {
                let f = FieldDescriptor::new(n, format!("F{n}"), TypeCode::Char, 4, offset);
                offset += f.size();
                f
            })
            .collect();
        Arc::new(ObjectDescriptor::new(1, Object::new("BASS").unwrap(), 10, fields))
    }

    fn opened(dir: &std::path::Path, descriptor: Arc<ObjectDescriptor>) -> MappedView {
        let path = dir.join(format!("{}.db", descriptor.name()));
        let file = OpenOptions::new().read(true).write(true).create(true).open(&path).unwrap();
        file.set_len(descriptor.file_size()).unwrap();
        MappedView::open(dir, descriptor).unwrap()
    }

    fn ofri(field: u32, record: u32, index: u32) -> Ofri {
        Ofri {
            object: Object::new("BASS").unwrap(),
            field,
            record,
            index,
        }
    }

    #[test]
    fn s3_write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut view = opened(dir.path(), bass());
        let target = ofri(0, 0, 0);
        view.write_value(&target, "A").unwrap();
        assert_eq!(view.read_value(&target).unwrap(), "A");
    }

    #[test]
    fn s4_oversize_write_is_rejected_and_bytes_are_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut view = opened(dir.path(), bass());
        let target = ofri(0, 0, 0);
        view.write_value(&target, "A").unwrap();

        let err = view.write_value(&target, "ABCDE").unwrap_err();
        assert!(matches!(err, KdbError::Oversize { .. }));
        assert_eq!(view.read_value(&target).unwrap(), "A");
    }

    #[test]
    fn numeric_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fields = vec![FieldDescriptor::new(1, "N1".into(), TypeCode::SignedInt, 1, 0)];
        let descriptor = Arc::new(ObjectDescriptor::new(1, Object::new("NUMS").unwrap(), 4, fields));
        let mut view = opened(dir.path(), descriptor);
        let target = Ofri {
            object: Object::new("NUMS").unwrap(),
            field: 0,
            record: 1,
            index: 0,
        };
        view.write_value(&target, "-42").unwrap();
        assert_eq!(view.read_value(&target).unwrap(), "-42");
    }

    #[test]
    fn zero_is_a_legitimate_numeric_value() {
        let dir = tempfile::tempdir().unwrap();
        let fields = vec![FieldDescriptor::new(1, "U1".into(), TypeCode::UnsignedInt, 1, 0)];
        let descriptor = Arc::new(ObjectDescriptor::new(1, Object::new("NUMS").unwrap(), 1, fields));
        let mut view = opened(dir.path(), descriptor);
        let target = Ofri {
            object: Object::new("NUMS").unwrap(),
            field: 0,
            record: 0,
            index: 0,
        };
        view.write_value(&target, "0").unwrap();
        assert_eq!(view.read_value(&target).unwrap(), "0");
    }

    #[test]
    fn bool_accepts_false_and_0_as_false() {
        let dir = tempfile::tempdir().unwrap();
        let fields = vec![FieldDescriptor::new(1, "B1".into(), TypeCode::Bool, 1, 0)];
        let descriptor = Arc::new(ObjectDescriptor::new(1, Object::new("FLAGS").unwrap(), 1, fields));
        let mut view = opened(dir.path(), descriptor);
        let target = Ofri {
            object: Object::new("FLAGS").unwrap(),
            field: 0,
            record: 0,
            index: 0,
        };
        view.write_value(&target, "false").unwrap();
        assert_eq!(view.read_value(&target).unwrap(), "FALSE");
        view.write_value(&target, "yes").unwrap();
        assert_eq!(view.read_value(&target).unwrap(), "TRUE");
    }

    #[test]
    fn unknown_field_is_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut view = opened(dir.path(), bass());
        let target = ofri(99, 0, 0);
        assert!(view.read_value(&target).is_err());
        assert!(view.write_value(&target, "x").is_err());
    }
}
