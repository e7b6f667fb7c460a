//! Wire protocol for sensor chessboards.
//!
//! This crate knows the board's command bytes, the layout of its responses
//! and the piece code table, and provides [`FrameQueue`], the length-counting
//! framer that cuts the raw serial stream into responses.

pub mod commands;
pub mod frame_queue;
pub mod messages;
pub mod pieces;

pub use commands::{Command, UpdateMode};
pub use frame_queue::{DrainFrames, Frame, FrameQueue};
pub use messages::{
    BOARD_DUMP_LEN, FIELD_UPDATE_LEN, FirmwareVersion, FieldUpdate, HEADER_LEN, MessageId,
    SERIAL_NUMBER_LEN, SerialNumber, VERSION_LEN, decode_board_dump, encode_board_dump,
};
pub use pieces::{decode_piece, encode_piece};
