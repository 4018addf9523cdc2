//! # Schema Compiler Module
//!
//! Translates a directory of human-edited schema files into compiled
//! [`ObjectDescriptor`]s, provisions their backing files, and persists the
//! result as a manifest (§4.1).
//!
//! Malformed or unreadable schema files are reported and skipped; the rest
//! of the directory is still processed, and whatever compiled successfully
//! is still flushed to the manifest so repeat runs converge.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{KdbError, RetCode};
use crate::key::Object;
use crate::schema::descriptor::{FieldDescriptor, ObjectDescriptor};
use crate::schema::manifest;
use crate::schema::registry::Registry;
use crate::schema::types::TypeCode;

/// Everything the compiler produced from one run over a schema directory.
pub struct CompileOutcome {
    /// The registry built from every schema that compiled successfully.
    pub registry: Registry,
    /// `(schema file, error)` for every file that failed to compile and was
    /// not registered.
    pub failures: Vec<(PathBuf, KdbError)>,
    /// Schema files whose record size was not a multiple of 4 (§3.3, §8
    /// invariant 4). Still compiled and registered per §4.1 — "the object is
    /// still registered" — but the condition must be observable by a caller
    /// that cares about the exit code (§6.5).
    pub misaligned: Vec<PathBuf>,
}

impl CompileOutcome {
    /// Unions every failure's and misalignment's [`RetCode`] into one value,
    /// so a caller can pick a single process exit code for the whole run
    /// without losing which kinds of problems occurred (§6.5, §7).
    pub fn code(&self) -> RetCode {
        let mut code = RetCode::empty();
        for (_, error) in &self.failures {
            code |= error.code();
        }
        if !self.misaligned.is_empty() {
            code |= RetCode::BAD_ARG;
        }
        code
    }
}

/// Compiles every `*.skm` file in `schema_dir`, provisioning a backing file
/// for each resulting object under `db_dir` and recording it in the
/// manifest at `manifest_path`. Returns the resulting registry plus any
/// per-file failures.
pub fn compile_directory(
    schema_dir: &Path,
    db_dir: &Path,
    manifest_path: &Path,
) -> Result<CompileOutcome, KdbError> {
    fs::create_dir_all(db_dir).map_err(|source| KdbError::Io {
        path: db_dir.display().to_string(),
        source,
    })?;

    let mut objects = Vec::new();
    let mut failures = Vec::new();
    let mut misaligned = Vec::new();

    let entries = fs::read_dir(schema_dir).map_err(|source| KdbError::Io {
        path: schema_dir.display().to_string(),
        source,
    })?;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                failures.push((
                    schema_dir.to_path_buf(),
                    KdbError::Io {
                        path: schema_dir.display().to_string(),
                        source,
                    },
                ));
                continue;
            }
        };
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("skm") {
            continue;
        }

        match compile_file(&path) {
            Ok(object) => {
                if !object.is_aligned() {
                    warn!(
                        schema = %path.display(),
                        object = %object.name(),
                        record_size = object.record_size(),
                        "record size is not a multiple of 4; consider adding a pad field"
                    );
                    misaligned.push(path.clone());
                }
                if let Err(e) = provision_backing_file(db_dir, &object) {
                    warn!(schema = %path.display(), error = %e, "failed to provision backing file");
                    failures.push((path, e));
                    continue;
                }
                if let Err(e) = manifest::upsert(manifest_path, &object) {
                    warn!(schema = %path.display(), error = %e, "failed to update manifest");
                    failures.push((path, e));
                    continue;
                }
                info!(
                    object = %object.name(),
                    record_size = object.record_size(),
                    record_count = object.record_count(),
                    "compiled schema"
                );
                objects.push(object);
            }
            Err(e) => {
                warn!(schema = %path.display(), error = %e, "skipping malformed schema");
                failures.push((path, e));
            }
        }
    }

    Ok(CompileOutcome {
        registry: Registry::new(objects),
        failures,
        misaligned,
    })
}

/// Parses a single schema file into a compiled [`ObjectDescriptor`].
pub fn compile_file(path: &Path) -> Result<ObjectDescriptor, KdbError> {
    let text = fs::read_to_string(path).map_err(|source| KdbError::Io {
        path: path.display().to_string(),
        source,
    })?;
    compile_text(path, &text)
}

/// Parses schema text (already read from disk) into a compiled
/// [`ObjectDescriptor`]. Split out from [`compile_file`] so it can be
/// exercised directly in tests without touching the filesystem.
pub fn compile_text(path: &Path, text: &str) -> Result<ObjectDescriptor, KdbError> {
    let malformed = |reason: String| KdbError::MalformedSchema {
        path: path.display().to_string(),
        reason,
    };

    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    let header = lines
        .next()
        .ok_or_else(|| malformed("schema file has no object header".to_string()))?;
    let mut header_parts = header.split_whitespace();
    let object_number: u32 = header_parts
        .next()
        .ok_or_else(|| malformed("missing object number".to_string()))?
        .parse()
        .map_err(|_| malformed(format!("object number {:?} is not an integer", header)))?;
    let object_name = header_parts
        .next()
        .ok_or_else(|| malformed("missing object name".to_string()))?;
    let object_name = Object::new(object_name)
        .ok_or_else(|| malformed(format!("invalid object name {:?}", object_name)))?;
    let record_count: u32 = header_parts
        .next()
        .ok_or_else(|| malformed("missing record count".to_string()))?
        .parse()
        .map_err(|_| malformed("record count is not an integer".to_string()))?;

    let mut fields = Vec::new();
    let mut offset = 0usize;

    for line in lines {
        if line.starts_with('0') {
            break;
        }
        let mut parts = line.split_whitespace();
        let field_number: u32 = parts
            .next()
            .ok_or_else(|| malformed(format!("empty field line: {:?}", line)))?
            .parse()
            .map_err(|_| malformed(format!("field number is not an integer: {:?}", line)))?;
        let field_name = parts
            .next()
            .ok_or_else(|| malformed(format!("missing field name: {:?}", line)))?;
        let type_char = parts
            .next()
            .ok_or_else(|| malformed(format!("missing type code: {:?}", line)))?;
        let type_code = type_char
            .chars()
            .next()
            .and_then(TypeCode::from_char)
            .ok_or_else(|| malformed(format!("unknown type code {:?}", type_char)))?;
        let num_elements: u32 = parts
            .next()
            .ok_or_else(|| malformed(format!("missing element count: {:?}", line)))?
            .parse()
            .map_err(|_| malformed(format!("element count is not an integer: {:?}", line)))?;

        let field = FieldDescriptor::new(field_number, field_name.to_string(), type_code, num_elements, offset);
        offset += field.size();
        fields.push(field);
    }

    let object = ObjectDescriptor::new(object_number, object_name, record_count, fields);
    Ok(object)
}

/// Ensures a backing file of exactly `object.file_size()` bytes exists under
/// `db_dir`, creating it if necessary. Never truncates away bytes that
/// `ftruncate` would otherwise preserve: growing zero-fills, shrinking only
/// discards the trailing region beyond the new length.
pub fn provision_backing_file(db_dir: &Path, object: &ObjectDescriptor) -> Result<(), KdbError> {
    let path = db_dir.join(format!("{}.db", object.name()));
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(&path)
        .map_err(|source| KdbError::Io {
            path: path.display().to_string(),
            source,
        })?;
    file.set_len(object.file_size())
        .map_err(|source| KdbError::Io {
            path: path.display().to_string(),
            source,
        })?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::Path;

    const BASS_SCHEMA: &str = "\
        1 BASS 10\n\
        1 F1 C 4\n\
        2 F2 C 4\n\
        3 F3 C 4\n\
        4 F4 C 4\n\
        0\n\
    ";

    #[test]
    fn s1_schema_round_trip() {
        let object = compile_text(Path::new("BASS.skm"), BASS_SCHEMA).unwrap();
        assert_eq!(object.name().as_str(), "BASS");
        assert_eq!(object.record_count(), 10);
        assert_eq!(object.record_size(), 16);
        assert_eq!(object.file_size(), 160);
        let offsets: Vec<_> = object.fields().iter().map(FieldDescriptor::offset).collect();
        assert_eq!(offsets, vec![0, 4, 8, 12]);
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let schema = "# a comment\n\n1 BASS 10\n# another\n1 F1 C 4\n0\n";
        let object = compile_text(Path::new("BASS.skm"), schema).unwrap();
        assert_eq!(object.fields().len(), 1);
    }

    #[test]
    fn missing_header_is_malformed() {
        assert!(compile_text(Path::new("empty.skm"), "").is_err());
    }

    #[test]
    fn unknown_type_code_is_malformed() {
        let schema = "1 BASS 10\n1 F1 Q 4\n0\n";
        assert!(compile_text(Path::new("BASS.skm"), schema).is_err());
    }

    #[test]
    fn provisioning_creates_a_file_of_exact_length() {
        let dir = tempfile::tempdir().unwrap();
        let object = compile_text(Path::new("BASS.skm"), BASS_SCHEMA).unwrap();
        provision_backing_file(dir.path(), &object).unwrap();
        let meta = fs::metadata(dir.path().join("BASS.db")).unwrap();
        assert_eq!(meta.len(), 160);
    }

    #[test]
    fn provisioning_does_not_clobber_existing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let object = compile_text(Path::new("BASS.skm"), BASS_SCHEMA).unwrap();
        provision_backing_file(dir.path(), &object).unwrap();

        let path = dir.path().join("BASS.db");
        {
            use std::io::Write;
            let mut file = OpenOptions::new().write(true).open(&path).unwrap();
            file.write_all(b"A").unwrap();
        }

        provision_backing_file(dir.path(), &object).unwrap();
        let contents = fs::read(&path).unwrap();
        assert_eq!(contents[0], b'A');
        assert_eq!(contents.len(), 160);
    }

    #[test]
    fn compile_directory_skips_malformed_files_but_keeps_going() {
        let schema_dir = tempfile::tempdir().unwrap();
        let db_dir = tempfile::tempdir().unwrap();
        fs::write(schema_dir.path().join("BASS.skm"), BASS_SCHEMA).unwrap();
        fs::write(schema_dir.path().join("BROKEN.skm"), "not a schema").unwrap();
        fs::write(schema_dir.path().join("README.txt"), "ignored, wrong extension").unwrap();

        let manifest_path = schema_dir.path().join("manifest");
        let outcome = compile_directory(schema_dir.path(), db_dir.path(), &manifest_path).unwrap();
        assert_eq!(outcome.registry.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(db_dir.path().join("BASS.db").exists());
        assert!(manifest_path.exists());
    }

    #[test]
    fn misaligned_record_size_is_still_registered_but_reported_as_bad_arg() {
        let schema_dir = tempfile::tempdir().unwrap();
        let db_dir = tempfile::tempdir().unwrap();
        // A single 3-byte field: record_size = 3, not a multiple of 4.
        let odd_schema = "1 ODD 10\n1 F1 Y 3\n0\n";
        fs::write(schema_dir.path().join("ODD.skm"), odd_schema).unwrap();

        let manifest_path = schema_dir.path().join("manifest");
        let outcome = compile_directory(schema_dir.path(), db_dir.path(), &manifest_path).unwrap();

        // §4.1: still registered and provisioned despite the misalignment.
        assert_eq!(outcome.registry.len(), 1);
        assert!(outcome.failures.is_empty());
        assert!(db_dir.path().join("ODD.db").exists());

        // §8 invariant 4 / §6.5: the condition is reported as BAD_ARG.
        assert_eq!(outcome.misaligned, vec![schema_dir.path().join("ODD.skm")]);
        assert_eq!(outcome.code(), RetCode::BAD_ARG);
    }
}
