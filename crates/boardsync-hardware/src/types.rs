//! Types published by the board task.

use boardsync_core::{BoardMove, Color, Placement, Snapshot};
use boardsync_protocol::{FieldUpdate, FirmwareVersion, SerialNumber};
use serde::{Deserialize, Serialize};

/// Identity of a connected board, reported once the handshake completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Transport name, e.g. the serial device path.
    pub name: String,

    pub serial_number: SerialNumber,

    pub firmware_version: FirmwareVersion,
}

impl DeviceInfo {
    pub fn new(
        name: impl Into<String>,
        serial_number: SerialNumber,
        firmware_version: FirmwareVersion,
    ) -> Self {
        Self {
            name: name.into(),
            serial_number,
            firmware_version,
        }
    }
}

/// Event broadcast by the board task.
///
/// Every subscriber sees every event in the order the board task produced
/// it. A `Changed` event is always sent after the snapshot mutation it
/// describes, and before the move events inferred from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    /// Handshake finished; the live and confirmed snapshots hold the dump.
    Ready(DeviceInfo),

    /// A single decoded field update, before debouncing.
    Data(FieldUpdate),

    /// A debounced burst was applied; carries the new live snapshot.
    Changed { board: Snapshot },

    /// A complete move of `color` was recognized.
    Move { color: Color, mv: BoardMove },

    /// Pieces of `color` changed without forming a move.
    InvalidChanges {
        color: Color,
        vacated: Vec<Placement>,
        occupied: Vec<Placement>,
    },
}

impl BoardEvent {
    /// Short event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            BoardEvent::Ready(_) => "ready",
            BoardEvent::Data(_) => "data",
            BoardEvent::Changed { .. } => "changed",
            BoardEvent::Move { .. } => "move",
            BoardEvent::InvalidChanges { .. } => "invalid_changes",
        }
    }
}
