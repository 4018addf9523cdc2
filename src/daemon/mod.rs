//! # Update Daemon Module
//!
//! The coordinator that ties the wire format (C6), acceptor (C7), and the
//! mapped-file store together: dispatches `DB_READ`/`DB_WRITE` frames,
//! maintains the monitored-objects and subscription tables, and fans write
//! notifications out to subscribers (C8, §4.6).

pub mod coordinator;

pub use coordinator::UpdateDaemon;
