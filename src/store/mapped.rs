//! # Mapped View Module
//!
//! Opens one object's backing file and maps it shared read/write, and
//! resolves an `OFRI` into a byte range within that mapping (§4.2). This is
//! the only module in the crate that does pointer-shaped arithmetic; every
//! caller above deals exclusively in `&[u8]` / `&mut [u8]`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use memmap2::MmapMut;

use crate::error::KdbError;
use crate::key::Ofri;
use crate::schema::descriptor::{FieldDescriptor, ObjectDescriptor};

/// A process-local handle onto one object's backing file. Lives from
/// [`MappedView::open`] until dropped; the kernel keeps the mapping
/// coherent with every other process mapping the same file.
pub struct MappedView {
    pub(crate) descriptor: Arc<ObjectDescriptor>,
    pub(crate) mmap: Option<MmapMut>,
}

fn byte_range(record_size: usize, record: u32, field: &FieldDescriptor, index: u32) -> Option<(usize, usize)> {
    if index >= field.num_elements() {
        return None;
    }
    let base = (record as usize).checked_mul(record_size)?;
    let field_start = base.checked_add(field.offset())?;
    let element_start = field_start.checked_add((index as usize).checked_mul(field.element_size())?)?;
    let element_end = element_start.checked_add(field.element_size())?;
    Some((element_start, element_end))
}

impl MappedView {
    /// Opens `<db_dir>/<object>.db` and maps it shared read/write. The file
    /// must already exist at exactly `descriptor.file_size()` bytes — it is
    /// the schema compiler's job to provision it, not this call's.
    pub fn open(db_dir: &Path, descriptor: Arc<ObjectDescriptor>) -> Result<Self, KdbError> {
        let path = db_dir.join(format!("{}.db", descriptor.name()));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| KdbError::Io {
                path: path.display().to_string(),
                source,
            })?;

        let len = file
            .metadata()
            .map_err(|source| KdbError::Io {
                path: path.display().to_string(),
                source,
            })?
            .len();
        if len != descriptor.file_size() {
            return Err(KdbError::MapFailed {
                object: descriptor.name().to_string(),
                reason: format!("backing file is {len} bytes, expected {}", descriptor.file_size()),
            });
        }

        let mmap = if len == 0 {
            None
        } else {
            let mmap = unsafe { MmapMut::map_mut(&file) }.map_err(|source| KdbError::MapFailed {
                object: descriptor.name().to_string(),
                reason: source.to_string(),
            })?;
            Some(mmap)
        };

        Ok(MappedView { descriptor, mmap })
    }

    /// The compiled layout this view was opened against.
    pub fn descriptor(&self) -> &Arc<ObjectDescriptor> {
        &self.descriptor
    }

    /// Resolves `ofri` to its byte range and returns it, or `None` if the
    /// field doesn't exist or the range falls outside the mapping (§4.2,
    /// invariant 3 of §8 — a `Get` past the mapped length is null, not an
    /// error).
    pub fn get(&self, ofri: &Ofri) -> Option<&[u8]> {
        let field = self.descriptor.field(ofri.field)?;
        let (start, end) = byte_range(self.descriptor.record_size(), ofri.record, field, ofri.index)?;
        self.mmap.as_ref()?.get(start..end)
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub fn get_mut(&mut self, ofri: &Ofri) -> Option<&mut [u8]> {
        let field = self.descriptor.field(ofri.field)?;
        let (start, end) = byte_range(self.descriptor.record_size(), ofri.record, field, ofri.index)?;
        self.mmap.as_mut()?.get_mut(start..end)
    }

    /// Byte range spanning the entire field — every element, ignoring
    /// `index` — used by string-like `ReadValue`/`WriteValue`, whose values
    /// occupy the whole field rather than a single element (§4.2).
    pub(crate) fn field_span(&self, ofri: &Ofri) -> Option<(usize, &FieldDescriptor)> {
        let field = self.descriptor.field(ofri.field)?;
        let base = (ofri.record as usize).checked_mul(self.descriptor.record_size())?;
        let start = base.checked_add(field.offset())?;
        Some((start, field))
    }

    /// Raw bytes spanning the entire addressed field, `field.size()` bytes
    /// long — the whole-field counterpart of [`get`](Self::get), for the
    /// wire protocol's `DB_READ` response and write-notification payloads,
    /// which carry the whole field rather than one element (§4.4, §4.6).
    pub fn get_field(&self, ofri: &Ofri) -> Option<&[u8]> {
        let (start, field) = self.field_span(ofri)?;
        self.mmap.as_ref()?.get(start..start + field.size())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::key::Object;
    use crate::schema::descriptor::FieldDescriptor;
    use crate::schema::types::TypeCode;
    use std::io::Write;

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

    fn provisioned(dir: &Path, descriptor: &ObjectDescriptor) {
        let path = dir.join(format!("{}.db", descriptor.name()));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .unwrap();
        file.set_len(descriptor.file_size()).unwrap();
    }

    #[test]
    fn open_rejects_a_backing_file_of_the_wrong_length() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = bass();
        let path = dir.path().join("BASS.db");
        std::fs::write(&path, vec![0u8; 12]).unwrap();
        assert!(MappedView::open(dir.path(), descriptor).is_err());
    }

    #[test]
    fn s2_addressing_arithmetic() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = bass();
        provisioned(dir.path(), &descriptor);
        let view = MappedView::open(dir.path(), descriptor).unwrap();

        let ofri = Ofri {
            object: Object::new("BASS").unwrap(),
            field: 2,
            record: 5,
            index: 1,
        };
        let base = view.mmap.as_ref().unwrap().as_ptr() as usize;
        let slice = view.get(&ofri).unwrap();
        let got = slice.as_ptr() as usize;
        assert_eq!(got - base, 5 * 16 + 8 + 1);
    }

    #[test]
    fn get_past_the_mapping_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = bass();
        provisioned(dir.path(), &descriptor);
        let view = MappedView::open(dir.path(), descriptor).unwrap();

        let ofri = Ofri {
            object: Object::new("BASS").unwrap(),
            field: 0,
            record: 10,
            index: 0,
        };
        assert!(view.get(&ofri).is_none());
    }

    #[test]
    fn index_past_num_elements_is_none_and_does_not_bleed_into_the_next_field() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = bass();
        provisioned(dir.path(), &descriptor);
        let view = MappedView::open(dir.path(), descriptor).unwrap();

        // F1 has 4 elements (indices 0..4); index 4 would otherwise land on
        // F2's first byte if the bound weren't checked (§8 invariant 3).
        let ofri = Ofri {
            object: Object::new("BASS").unwrap(),
            field: 0,
            record: 0,
            index: 4,
        };
        assert!(view.get(&ofri).is_none());
    }

    #[test]
    fn get_field_returns_the_whole_field_regardless_of_index() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = bass();
        provisioned(dir.path(), &descriptor);
        let mut view = MappedView::open(dir.path(), descriptor).unwrap();

        let ofri = Ofri {
            object: Object::new("BASS").unwrap(),
            field: 0,
            record: 0,
            index: 0,
        };
        view.get_mut(&ofri).unwrap().copy_from_slice(b"Z");
        assert_eq!(view.get_field(&ofri).unwrap(), b"Z\0\0\0");
    }

    #[test]
    fn unknown_field_index_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = bass();
        provisioned(dir.path(), &descriptor);
        let view = MappedView::open(dir.path(), descriptor).unwrap();

        let ofri = Ofri {
            object: Object::new("BASS").unwrap(),
            field: 99,
            record: 0,
            index: 0,
        };
        assert!(view.get(&ofri).is_none());
    }

    #[test]
    fn writes_through_get_mut_are_visible_to_get() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = bass();
        provisioned(dir.path(), &descriptor);
        let mut view = MappedView::open(dir.path(), descriptor).unwrap();

        let ofri = Ofri {
            object: Object::new("BASS").unwrap(),
            field: 0,
            record: 0,
            index: 0,
        };
        view.get_mut(&ofri).unwrap().copy_from_slice(b"Z");
        assert_eq!(view.get(&ofri).unwrap(), b"Z");
    }

    #[test]
    fn unmapping_an_empty_file_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let fields = vec![FieldDescriptor::new(1, "F1".into(), TypeCode::Char, 0, 0)];
        let descriptor = Arc::new(ObjectDescriptor::new(2, Object::new("EMPTY").unwrap(), 0, fields));
        let path = dir.path().join("EMPTY.db");
        std::fs::File::create(&path).unwrap().flush().unwrap();
        let view = MappedView::open(dir.path(), descriptor).unwrap();
        assert!(view.mmap.is_none());
        drop(view);
    }
}
