//! # Stream Codec Module
//!
//! Turns a [`Frame`] into exactly one `write_all` and turns a byte stream
//! back into frames, looping a partial header or payload read to completion
//! rather than treating it as end-of-stream (§4.4: a short read mid-header
//! is fatal only once the peer has actually hung up).

use std::io::{self, Read, Write};

use crate::error::KdbError;
use crate::wire::frame::{Frame, HEADER_LEN};

fn io_err(source: io::Error) -> KdbError {
    KdbError::Io {
        path: "<stream>".to_string(),
        source,
    }
}

/// Reads exactly `buf.len()` bytes, looping over short reads. Returns a
/// [`KdbError::ShortRead`] only once the peer closes the stream before
/// `buf` is full.
fn read_exact_or_short(stream: &mut impl Read, buf: &mut [u8]) -> Result<(), KdbError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = stream.read(&mut buf[filled..]).map_err(io_err)?;
        if n == 0 {
            return Err(KdbError::ShortRead {
                expected: buf.len(),
                got: filled,
            });
        }
        filled += n;
    }
    Ok(())
}

/// Writes `frame` to `stream` as one header-then-payload sequence,
/// retrying on short writes.
pub fn send(stream: &mut impl Write, frame: &Frame) -> Result<(), KdbError> {
    let bytes = frame.encode()?;
    stream.write_all(&bytes).map_err(io_err)
}

/// Reads one complete frame off `stream`: the fixed header first, then
/// exactly as many payload bytes as the header's `message_size` names.
pub fn recv(stream: &mut impl Read) -> Result<Frame, KdbError> {
    let mut header = [0u8; HEADER_LEN];
    read_exact_or_short(stream, &mut header)?;

    let message_size = u32::from_le_bytes(header[HEADER_LEN - 4..HEADER_LEN].try_into().unwrap()) as usize;
    let mut bytes = header.to_vec();
    bytes.resize(HEADER_LEN + message_size, 0);
    read_exact_or_short(stream, &mut bytes[HEADER_LEN..])?;

    Frame::decode(&bytes)
}
