//! Common test utilities for protocol integration tests.
//!
//! Builds the byte stream a board sends during a session: the handshake
//! responses followed by a run of field updates.

#![allow(dead_code)]

use boardsync_core::{Cell, Snapshot, Square, constants::START_RAW};
use boardsync_protocol::{
    FieldUpdate, FirmwareVersion, SerialNumber, encode_board_dump,
    messages::{BOARD_DUMP_LEN, FIELD_UPDATE_LEN, SERIAL_NUMBER_LEN, VERSION_LEN},
};

/// Tag used by the tests to identify expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Serial,
    Version,
    Dump,
    Update,
}

impl Expect {
    pub fn len(self) -> usize {
        match self {
            Expect::Serial => SERIAL_NUMBER_LEN,
            Expect::Version => VERSION_LEN,
            Expect::Dump => BOARD_DUMP_LEN,
            Expect::Update => FIELD_UPDATE_LEN,
        }
    }
}

pub const TEST_SERIAL: &str = "24680";

pub fn start_position() -> Snapshot {
    Snapshot::from_raw(START_RAW).unwrap()
}

pub fn update(label: &str, letter: char) -> FieldUpdate {
    let square: Square = label.parse().unwrap();
    FieldUpdate::new(square, Cell::from_letter(letter).unwrap())
}

/// Handshake responses for the start position, in request order.
pub fn handshake_stream() -> Vec<u8> {
    let mut stream = Vec::new();
    stream.extend_from_slice(&SerialNumber::new(TEST_SERIAL).encode());
    stream.extend_from_slice(&FirmwareVersion::new(1, 7).encode());
    stream.extend_from_slice(&encode_board_dump(&start_position()));
    stream
}

/// Update frames for e2-e4.
pub fn pawn_push_updates() -> Vec<FieldUpdate> {
    vec![update("e2", '.'), update("e4", 'P')]
}

pub fn encode_updates(updates: &[FieldUpdate]) -> Vec<u8> {
    updates.iter().flat_map(|u| u.encode()).collect()
}
