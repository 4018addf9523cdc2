//! # Frame Layout Module
//!
//! The fixed little-endian header, the `OFRI` wire tuple it can carry, and
//! the per-`DataType` payload shapes from §4.4.

use crate::error::KdbError;

/// Width, in bytes, of the NUL-padded peer address field.
pub const ADDRESS_LEN: usize = 46;
/// Width, in bytes, of the NUL-padded peer port field.
pub const PORT_LEN: usize = 6;
/// Total header width: address + port + `data_type` + `message_size`.
pub const HEADER_LEN: usize = ADDRESS_LEN + PORT_LEN + 4 + 4;
/// Width, in bytes, of an `OFRI` encoded on the wire (§4.4, S5): the object
/// is carried as its numeric `object_number` rather than its name, so the
/// tuple is four `u32`s.
pub const WIRE_OFRI_LEN: usize = 16;

/// What a frame's payload means (§4.4).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataType {
    None = 0,
    Text = 1,
    Ack = 2,
    DbRead = 3,
    DbWrite = 4,
}

impl DataType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(DataType::None),
            1 => Some(DataType::Text),
            2 => Some(DataType::Ack),
            3 => Some(DataType::DbRead),
            4 => Some(DataType::DbWrite),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// A peer's return address, carried in every frame's header so a response
/// or notification knows where to go.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Connection {
    pub address: String,
    pub port: String,
}

impl Connection {
    pub fn new(address: impl Into<String>, port: impl Into<String>) -> Self {
        Connection {
            address: address.into(),
            port: port.into(),
        }
    }
}

/// The wire encoding of an `OFRI`: the object by its numeric
/// `object_number` (a connection already targets a single daemon's object
/// space), plus field, record, and index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WireOfri {
    pub object_number: u32,
    pub field: u32,
    pub record: u32,
    pub index: u32,
}

impl WireOfri {
    pub fn to_bytes(self) -> [u8; WIRE_OFRI_LEN] {
        let mut bytes = [0u8; WIRE_OFRI_LEN];
        bytes[0..4].copy_from_slice(&self.object_number.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.field.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.record.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.index.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KdbError> {
        if bytes.len() < WIRE_OFRI_LEN {
            return Err(KdbError::ShortRead {
                expected: WIRE_OFRI_LEN,
                got: bytes.len(),
            });
        }
        let word = |range: std::ops::Range<usize>| u32::from_le_bytes(bytes[range].try_into().unwrap());
        Ok(WireOfri {
            object_number: word(0..4),
            field: word(4..8),
            record: word(8..12),
            index: word(12..16),
        })
    }
}

/// One header+payload unit on the wire (§4.4).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    pub connection: Connection,
    pub data_type: DataType,
    pub payload: Vec<u8>,
}

fn pad_ascii(value: &str, width: usize) -> Result<[u8; 64], (usize, usize)> {
    debug_assert!(width <= 64);
    if value.len() > width {
        return Err((value.len(), width));
    }
    let mut buf = [0u8; 64];
    buf[..value.len()].copy_from_slice(value.as_bytes());
    Ok(buf)
}

fn unpad_ascii(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

impl Frame {
    pub fn new(connection: Connection, data_type: DataType, payload: Vec<u8>) -> Self {
        Frame {
            connection,
            data_type,
            payload,
        }
    }

    /// A `DB_READ` request/response frame carrying a wire `OFRI` (request)
    /// or raw field bytes (response) — callers choose which by what they
    /// pass as `payload`.
    pub fn db_read(connection: Connection, payload: Vec<u8>) -> Self {
        Frame::new(connection, DataType::DbRead, payload)
    }

    /// A `DB_WRITE` frame: a wire `OFRI` followed by the value's raw bytes.
    pub fn db_write(connection: Connection, ofri: WireOfri, value: &[u8]) -> Self {
        let mut payload = ofri.to_bytes().to_vec();
        payload.extend_from_slice(value);
        Frame::new(connection, DataType::DbWrite, payload)
    }

    /// A `TEXT` frame: a NUL-terminated UTF-8 string.
    pub fn text(connection: Connection, text: &str) -> Self {
        let mut payload = text.as_bytes().to_vec();
        payload.push(0);
        Frame::new(connection, DataType::Text, payload)
    }

    /// Encodes the frame as header bytes followed by its payload.
    pub fn encode(&self) -> Result<Vec<u8>, KdbError> {
        let address =
            pad_ascii(&self.connection.address, ADDRESS_LEN).map_err(|(got, max)| KdbError::Oversize {
                field: "connection.address".to_string(),
                got,
                max,
            })?;
        let port = pad_ascii(&self.connection.port, PORT_LEN).map_err(|(got, max)| KdbError::Oversize {
            field: "connection.port".to_string(),
            got,
            max,
        })?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + self.payload.len());
        bytes.extend_from_slice(&address[..ADDRESS_LEN]);
        bytes.extend_from_slice(&port[..PORT_LEN]);
        bytes.extend_from_slice(&self.data_type.as_u32().to_le_bytes());
        bytes.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&self.payload);
        Ok(bytes)
    }

    /// Decodes a complete frame (header + exactly `message_size` payload
    /// bytes) from `bytes`. Callers are responsible for having already
    /// accumulated that many bytes off the stream (§4.4).
    pub fn decode(bytes: &[u8]) -> Result<Self, KdbError> {
        if bytes.len() < HEADER_LEN {
            return Err(KdbError::ShortRead {
                expected: HEADER_LEN,
                got: bytes.len(),
            });
        }

        let address = unpad_ascii(&bytes[0..ADDRESS_LEN]);
        let port = unpad_ascii(&bytes[ADDRESS_LEN..ADDRESS_LEN + PORT_LEN]);
        let type_offset = ADDRESS_LEN + PORT_LEN;
        let data_type_raw = u32::from_le_bytes(bytes[type_offset..type_offset + 4].try_into().unwrap());
        let data_type = DataType::from_u32(data_type_raw).ok_or_else(|| KdbError::BadValue {
            field: "data_type".to_string(),
            type_code: 'U',
            value: data_type_raw.to_string(),
        })?;
        let size_offset = type_offset + 4;
        let message_size =
            u32::from_le_bytes(bytes[size_offset..size_offset + 4].try_into().unwrap()) as usize;

        let payload = bytes
            .get(HEADER_LEN..HEADER_LEN + message_size)
            .ok_or_else(|| KdbError::ShortRead {
                expected: HEADER_LEN + message_size,
                got: bytes.len(),
            })?
            .to_vec();

        Ok(Frame {
            connection: Connection::new(address, port),
            data_type,
            payload,
        })
    }
}
