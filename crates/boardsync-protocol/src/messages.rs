//! Board response messages.
//!
//! Every response starts with a 3-byte header: the message id followed by
//! the total message length split into two 7-bit halves.
//!
//! ```text
//! ┌──────┬────────────┬───────────┬──────────────────┐
//! │  id  │ len >> 7   │ len & 7f  │ payload ...      │
//! └──────┴────────────┴───────────┴──────────────────┘
//!   0      1            2           3..
//! ```
//!
//! The framer only counts bytes, so decoders here trust the length they are
//! handed and ignore the id byte. The encoders exist to build device
//! responses for the mock transport and tests.

use boardsync_core::{Cell, Error, Result, Snapshot, Square, constants::BOARD_SIZE};
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pieces::{decode_piece, encode_piece};

pub const HEADER_LEN: usize = 3;
pub const SERIAL_NUMBER_LEN: usize = 8;
pub const VERSION_LEN: usize = 5;
pub const BOARD_DUMP_LEN: usize = HEADER_LEN + BOARD_SIZE;
pub const FIELD_UPDATE_LEN: usize = 5;

/// First byte of each response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageId {
    BoardDump = 0x86,
    FieldUpdate = 0x8e,
    SerialNumber = 0x91,
    Version = 0x93,
}

fn header(id: MessageId, len: usize, buf: &mut BytesMut) {
    buf.put_u8(id as u8);
    buf.put_u8(((len >> 7) & 0x7f) as u8);
    buf.put_u8((len & 0x7f) as u8);
}

fn check_len(bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() != expected {
        return Err(Error::UnexpectedLength {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Board serial number, the ASCII payload of the serial number response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialNumber(String);

impl SerialNumber {
    pub fn new(serial: impl Into<String>) -> Self {
        Self(serial.into())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        check_len(bytes, SERIAL_NUMBER_LEN)?;
        let payload = &bytes[HEADER_LEN..];
        if !payload.is_ascii() {
            return Err(Error::InvalidMessageFormat(
                "serial number is not ASCII".to_string(),
            ));
        }
        let serial = String::from_utf8_lossy(payload);
        Ok(Self(serial.trim_end_matches('\0').to_string()))
    }

    /// Serial number response, payload padded with NULs to 5 bytes.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(SERIAL_NUMBER_LEN);
        header(MessageId::SerialNumber, SERIAL_NUMBER_LEN, &mut buf);
        let mut payload = [0u8; SERIAL_NUMBER_LEN - HEADER_LEN];
        for (slot, byte) in payload.iter_mut().zip(self.0.bytes()) {
            *slot = byte;
        }
        buf.put_slice(&payload);
        buf.freeze()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Firmware version, `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl FirmwareVersion {
    #[must_use]
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        check_len(bytes, VERSION_LEN)?;
        Ok(Self {
            major: bytes[3],
            minor: bytes[4],
        })
    }

    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(VERSION_LEN);
        header(MessageId::Version, VERSION_LEN, &mut buf);
        buf.put_u8(self.major);
        buf.put_u8(self.minor);
        buf.freeze()
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Decode a 67-byte board dump into a snapshot.
pub fn decode_board_dump(bytes: &[u8]) -> Result<Snapshot> {
    check_len(bytes, BOARD_DUMP_LEN)?;
    let mut snapshot = Snapshot::empty();
    for (square, code) in Square::all().zip(&bytes[HEADER_LEN..]) {
        snapshot.set(square, decode_piece(*code));
    }
    Ok(snapshot)
}

/// Encode a snapshot as a board dump response.
#[must_use]
pub fn encode_board_dump(snapshot: &Snapshot) -> Bytes {
    let mut buf = BytesMut::with_capacity(BOARD_DUMP_LEN);
    header(MessageId::BoardDump, BOARD_DUMP_LEN, &mut buf);
    for cell in snapshot.cells() {
        buf.put_u8(encode_piece(*cell));
    }
    buf.freeze()
}

/// Single-field update from the continuous update stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub square: Square,
    pub cell: Cell,
}

impl FieldUpdate {
    #[must_use]
    pub fn new(square: Square, cell: Cell) -> Self {
        Self { square, cell }
    }

    /// Decode a 5-byte update frame (field index at 3, piece code at 4).
    ///
    /// # Errors
    /// Returns `Error::UnexpectedLength` for frames of the wrong size and
    /// `Error::InvalidMessageFormat` for field indices outside the board.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        check_len(bytes, FIELD_UPDATE_LEN)?;
        let square = Square::new(bytes[3]).map_err(|_| {
            Error::InvalidMessageFormat(format!("field index {} out of range", bytes[3]))
        })?;
        Ok(Self {
            square,
            cell: decode_piece(bytes[4]),
        })
    }

    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(FIELD_UPDATE_LEN);
        header(MessageId::FieldUpdate, FIELD_UPDATE_LEN, &mut buf);
        buf.put_u8(self.square.index() as u8);
        buf.put_u8(encode_piece(self.cell));
        buf.freeze()
    }
}

impl fmt::Display for FieldUpdate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}={}", self.square, self.cell)
    }
}
