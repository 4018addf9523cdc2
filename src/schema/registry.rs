//! # Object Registry Module
//!
//! The global, read-only mapping from canonical object name to compiled
//! [`ObjectDescriptor`]. Built once by the schema compiler (or loaded back
//! from a manifest) and shared behind an `Arc` rather than exposed as a
//! process-wide static.

use std::collections::HashMap;
use std::sync::Arc;

use crate::key::Object;
use crate::schema::descriptor::ObjectDescriptor;

/// Immutable, read-only registry of every compiled object descriptor.
#[derive(Debug, Default)]
pub struct Registry {
    by_name: HashMap<String, Arc<ObjectDescriptor>>,
}

impl Registry {
    /// Builds a registry out of a set of compiled descriptors. Later entries
    /// for the same object name overwrite earlier ones.
    pub fn new(objects: impl IntoIterator<Item = ObjectDescriptor>) -> Self {
        let mut by_name = HashMap::new();
        for object in objects {
            by_name.insert(object.name().as_str().to_owned(), Arc::new(object));
        }
        Registry { by_name }
    }

    /// Exact-match lookup on the canonical object name.
    pub fn lookup(&self, object: &Object) -> Option<Arc<ObjectDescriptor>> {
        self.by_name.get(object.as_str()).cloned()
    }

    /// Lookup by `object_number`, the numeric id the wire protocol carries
    /// in place of a full object name (§4.4).
    pub fn lookup_by_number(&self, number: u32) -> Option<Arc<ObjectDescriptor>> {
        self.by_name.values().find(|o| o.number() == number).cloned()
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// `true` iff no objects are registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterates over every registered descriptor, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ObjectDescriptor>> {
        self.by_name.values()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::descriptor::FieldDescriptor;
    use crate::schema::types::TypeCode;

    fn bass() -> ObjectDescriptor {
        let fields = vec![FieldDescriptor::new(1, "F1".into(), TypeCode::Char, 4, 0)];
        ObjectDescriptor::new(1, Object::new("BASS").unwrap(), 10, fields)
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = Registry::new(vec![bass()]);
        assert!(registry.lookup(&Object::new("bass").unwrap()).is_some());
        assert!(registry.lookup(&Object::new("BASS").unwrap()).is_some());
        assert!(registry.lookup(&Object::new("TREBLE").unwrap()).is_none());
    }

    #[test]
    fn registry_reports_its_size() {
        let registry = Registry::new(vec![bass()]);
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn lookup_by_number_finds_the_same_object() {
        let registry = Registry::new(vec![bass()]);
        let found = registry.lookup_by_number(1).unwrap();
        assert_eq!(found.name().as_str(), "BASS");
        assert!(registry.lookup_by_number(99).is_none());
    }
}
