//! # Schema Module
//!
//! Everything involved in turning human-edited schema text into the compiled
//! descriptors the rest of the store consumes: the descriptor types (C2),
//! the registry they live in (C2), the compiler that produces them (C3),
//! and the manifest format compiled schemas are persisted as.

pub mod compiler;
pub mod descriptor;
pub mod manifest;
pub mod registry;
pub mod types;

pub use descriptor::{FieldDescriptor, ObjectDescriptor};
pub use registry::Registry;
