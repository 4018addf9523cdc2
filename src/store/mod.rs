//! # Mapped-File Record Store Module
//!
//! File lifecycle, mmap, and typed read/write over a backing file (C4):
//! [`mapped`] confines the unsafe pointer arithmetic to a single module,
//! resolving an `OFRI` to a byte range; [`access`] layers typed
//! `ReadValue`/`WriteValue` conversion on top.

pub mod access;
pub mod mapped;

pub use mapped::MappedView;
