//! Command codes understood by the board.
//!
//! Every command is a single byte written to the serial port. Some commands
//! produce a fixed-length response, others switch the board into a
//! continuous reporting mode or produce nothing at all.
//!
//! ```text
//! reset              40   no response
//! send board         42   67-byte board dump
//! send update        43   5-byte field updates (continuous)
//! send update board  44   5-byte field updates (continuous, default)
//! send serial number 45   8-byte serial number
//! send update nice   4b   5-byte field updates (continuous)
//! send version       4d   5-byte firmware version
//! ```
//!
//! # Examples
//!
//! ```
//! use boardsync_protocol::Command;
//!
//! let cmd = Command::parse("4d").unwrap();
//! assert_eq!(cmd, Command::SendVersion);
//! assert_eq!(cmd.as_byte(), 0x4d);
//! assert_eq!(cmd.response_len(), Some(5));
//! ```

use crate::messages::{BOARD_DUMP_LEN, SERIAL_NUMBER_LEN, VERSION_LEN};
use boardsync_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single-byte board command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Reset the board's communication state.
    Reset,

    /// Request a full board dump.
    SendBoard,

    /// Continuous field updates.
    SendUpdate,

    /// Continuous field updates, board mode.
    SendUpdateBoard,

    /// Request the serial number.
    SendSerialNumber,

    /// Continuous field updates, "nice" mode.
    SendUpdateNice,

    /// Request the firmware version.
    SendVersion,
}

impl Command {
    const ALL: [Command; 7] = [
        Command::Reset,
        Command::SendBoard,
        Command::SendUpdate,
        Command::SendUpdateBoard,
        Command::SendSerialNumber,
        Command::SendUpdateNice,
        Command::SendVersion,
    ];

    /// Wire byte for this command.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        match self {
            Command::Reset => 0x40,
            Command::SendBoard => 0x42,
            Command::SendUpdate => 0x43,
            Command::SendUpdateBoard => 0x44,
            Command::SendSerialNumber => 0x45,
            Command::SendUpdateNice => 0x4b,
            Command::SendVersion => 0x4d,
        }
    }

    /// Look up a command by its wire byte.
    ///
    /// # Errors
    /// Returns `Error::InvalidCommandCode` for bytes that are not commands.
    pub fn from_byte(byte: u8) -> Result<Self> {
        Command::ALL
            .into_iter()
            .find(|cmd| cmd.as_byte() == byte)
            .ok_or_else(|| Error::InvalidCommandCode(format!("{byte:02x}")))
    }

    /// Parse a command from its two-digit hex form (`"4d"`).
    pub fn parse(hex: &str) -> Result<Self> {
        let byte = u8::from_str_radix(hex.trim(), 16)
            .map_err(|_| Error::InvalidCommandCode(hex.to_string()))?;
        Command::from_byte(byte)
    }

    /// Two-digit lowercase hex form.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("{:02x}", self.as_byte())
    }

    /// Length of the single response this command produces, if any.
    ///
    /// Update-mode commands return `None`: they start a continuous stream of
    /// field updates instead of a single response.
    #[must_use]
    pub fn response_len(self) -> Option<usize> {
        match self {
            Command::SendBoard => Some(BOARD_DUMP_LEN),
            Command::SendSerialNumber => Some(SERIAL_NUMBER_LEN),
            Command::SendVersion => Some(VERSION_LEN),
            Command::Reset
            | Command::SendUpdate
            | Command::SendUpdateBoard
            | Command::SendUpdateNice => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        Command::from_byte(byte)
    }
}

/// Continuous reporting mode selected after the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateMode {
    Update,
    #[default]
    UpdateBoard,
    UpdateNice,
}

impl UpdateMode {
    /// Command that switches the board into this mode.
    #[must_use]
    pub fn command(self) -> Command {
        match self {
            UpdateMode::Update => Command::SendUpdate,
            UpdateMode::UpdateBoard => Command::SendUpdateBoard,
            UpdateMode::UpdateNice => Command::SendUpdateNice,
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UpdateMode::Update => write!(f, "update"),
            UpdateMode::UpdateBoard => write!(f, "update-board"),
            UpdateMode::UpdateNice => write!(f, "update-nice"),
        }
    }
}
