//! # Wire Framing Module
//!
//! The header+payload framing every daemon connection speaks (C6, §4.4):
//! [`frame`] defines the frame types and their byte layout; [`codec`] reads
//! and writes them off a stream, retrying partial sends and looping partial
//! receives per §4.4's "short reads mid-header are fatal" rule.

pub mod codec;
pub mod frame;

pub use frame::{DataType, Frame};
