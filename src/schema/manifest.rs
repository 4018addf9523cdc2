//! # Manifest Module
//!
//! Persists compiled object descriptors to a single text file, one JSON
//! line per object, so that a full schema recompile is not required just to
//! look an object up again. Per §4.1, the manifest's line *k* always holds
//! the object whose `object_number` is *k* — stability that lets other
//! processes address an object by its number across partial regenerations.

use std::fs;
use std::path::Path;

use crate::error::KdbError;
use crate::schema::descriptor::ObjectDescriptor;
use crate::schema::registry::Registry;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> KdbError + '_ {
    move |source| KdbError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Loads every object recorded in the manifest at `path` into a [`Registry`].
/// A missing manifest is treated as an empty registry (nothing has been
/// compiled yet).
pub fn load(path: &Path) -> Result<Registry, KdbError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Registry::default()),
        Err(source) => {
            return Err(KdbError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    let objects = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<ObjectDescriptor>(line).ok());

    Ok(Registry::new(objects))
}

/// Upserts `object` into the manifest at `path`, keyed by its
/// `object_number` as a zero-based line index. Extends the file with blank
/// lines if `object_number` falls past the current end; replaces the line
/// in place otherwise. Creates the manifest (and its parent directory) if it
/// does not already exist.
pub fn upsert(path: &Path, object: &ObjectDescriptor) -> Result<(), KdbError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err(path))?;
    }

    let mut lines: Vec<String> = match fs::read_to_string(path) {
        Ok(text) => text.lines().map(str::to_owned).collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(source) => {
            return Err(KdbError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    let index = object.number() as usize;
    if lines.len() <= index {
        lines.resize(index + 1, String::new());
    }
    lines[index] = serde_json::to_string(object).map_err(|source| KdbError::Io {
        path: path.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, source),
    })?;

    let mut text = lines.join("\n");
    text.push('\n');
    fs::write(path, text).map_err(io_err(path))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::key::Object;
    use crate::schema::descriptor::FieldDescriptor;
    use crate::schema::types::TypeCode;

    fn object(number: u32, name: &str) -> ObjectDescriptor {
        let fields = vec![FieldDescriptor::new(1, "F1".into(), TypeCode::Char, 4, 0)];
        ObjectDescriptor::new(number, Object::new(name).unwrap(), 10, fields)
    }

    #[test]
    fn missing_manifest_is_an_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let registry = load(&dir.path().join("manifest")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn object_numbers_stay_stable_across_partial_regenerations() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("manifest");

        upsert(&manifest, &object(3, "THIRD")).unwrap();
        let lines: Vec<String> = fs::read_to_string(&manifest)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].is_empty());
        assert!(lines[3].contains("THIRD"));

        upsert(&manifest, &object(1, "FIRST")).unwrap();
        let registry = load(&manifest).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.lookup(&Object::new("THIRD").unwrap()).is_some());
        assert!(registry.lookup(&Object::new("FIRST").unwrap()).is_some());

        // Replacing object 3 in place must not disturb object 1's line.
        upsert(&manifest, &object(3, "THIRD-REV2")).unwrap();
        let registry = load(&manifest).unwrap();
        assert!(registry.lookup(&Object::new("FIRST").unwrap()).is_some());
        assert!(registry
            .lookup(&Object::new("THIRD-REV2").unwrap())
            .is_some());
        assert!(registry.lookup(&Object::new("THIRD").unwrap()).is_none());
    }
}
