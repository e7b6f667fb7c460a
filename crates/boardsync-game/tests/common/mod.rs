//! Common test utilities for game integration tests.
//!
//! Every test runs a real board task on a mock transport. Moves are played
//! by sending the field updates a person would cause by moving pieces.

#![allow(dead_code)]

use boardsync_core::{Cell, Snapshot, Square};
use boardsync_game::GameEvent;
use boardsync_hardware::{
    Board, BoardConfig, BoardHandle,
    mock::{MockTransport, MockTransportHandle},
};
use boardsync_protocol::{FieldUpdate, FirmwareVersion, SerialNumber};
use tokio::sync::broadcast;

pub fn update(label: &str, letter: char) -> FieldUpdate {
    let square: Square = label.parse().unwrap();
    FieldUpdate::new(square, Cell::from_letter(letter).unwrap())
}

/// Spawn a board showing `fen` and complete the handshake.
pub async fn ready_board(fen: &str) -> (BoardHandle, MockTransportHandle) {
    let (transport, mut device) = MockTransport::new();
    let board = Board::spawn(transport, BoardConfig::default()).unwrap();

    device
        .serve_handshake(
            &SerialNumber::new("13579"),
            FirmwareVersion::new(1, 7),
            &Snapshot::from_fen(fen).unwrap(),
        )
        .await
        .unwrap();
    board.wait_ready().await.unwrap();

    (board, device)
}

/// Lift and place pieces: each pair is a square and the letter it shows
/// afterwards (`.` for empty).
pub async fn touch(device: &MockTransportHandle, changes: &[(&str, char)]) {
    for (label, letter) in changes {
        device.send_update(update(label, *letter)).await.unwrap();
    }
}

/// Skip game events until one named `name` arrives.
pub async fn wait_for(events: &mut broadcast::Receiver<GameEvent>, name: &str) -> GameEvent {
    loop {
        let event = events.recv().await.unwrap();
        if event.name() == name {
            return event;
        }
    }
}

/// Names of all game events received so far.
pub fn drain_names(events: &mut broadcast::Receiver<GameEvent>) -> Vec<&'static str> {
    let mut names = Vec::new();
    while let Ok(event) = events.try_recv() {
        names.push(event.name());
    }
    names
}
