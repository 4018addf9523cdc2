//! # Networking Module
//!
//! The TCP transport the update daemon and CLIs share (C7, §4.5):
//! [`acceptor`] runs the accept loop and tracks live peers; [`hook`] is the
//! small multicast delegate list used to observe connects, disconnects, and
//! inbound frames.

pub mod acceptor;
pub mod hook;

pub use acceptor::{Acceptor, Reply};
pub use hook::Hook;
