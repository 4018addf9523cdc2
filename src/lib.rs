//! Embedded, schema-driven record store for fixed-layout objects.
//!
//! A named object is a file of fixed-size record slots, memory-mapped by
//! any process that needs it; fields within a record are addressed by the
//! four-part key `(object, field, record, index)` ([`key::Ofri`]). The
//! [`schema`] module compiles human-edited schema files into that layout;
//! [`store`] opens and addresses the resulting backing files; [`concurrency`],
//! [`wire`], [`net`], and [`daemon`] make up the TCP update daemon that lets
//! several processes share write access without racing the mapped file
//! directly.

pub mod concurrency;
pub mod config;
pub mod daemon;
pub mod error;
pub mod key;
pub mod logging;
pub mod net;
pub mod schema;
pub mod store;
pub mod wire;
