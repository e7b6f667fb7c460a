//! Core constants for the board link and game synchronization.
//!
//! This module centralizes board geometry, serial link parameters and the
//! default timing values used by the board driver and game controller.
//!
//! # Board Layout
//!
//! The device reports the 64 fields in a fixed order, rank 8 first:
//!
//! ```text
//! index  0 ..  7  →  a8 .. h8
//! index  8 .. 15  →  a7 .. h7
//!  ...
//! index 56 .. 63  →  a1 .. h1
//! ```
//!
//! # Usage
//!
//! ```
//! use boardsync_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(BOARD_SIZE, 64);
//! let debounce = Duration::from_millis(DEFAULT_DEBOUNCE_MS);
//! assert!(debounce.as_millis() >= 600);
//! ```

// ============================================================================
// Board Geometry
// ============================================================================

/// Number of fields on the board.
pub const BOARD_SIZE: usize = 64;

/// Number of files (and ranks) on the board.
pub const BOARD_WIDTH: usize = 8;

/// Character used for an empty field in raw board strings.
pub const EMPTY_LETTER: char = '.';

/// Field labels in device order (index 0 = a8, index 63 = h1).
///
/// # Examples
///
/// ```
/// use boardsync_core::constants::FIELD_LABELS;
///
/// assert_eq!(FIELD_LABELS[0], "a8");
/// assert_eq!(FIELD_LABELS[52], "e2");
/// assert_eq!(FIELD_LABELS[63], "h1");
/// ```
pub const FIELD_LABELS: [&str; BOARD_SIZE] = [
    "a8", "b8", "c8", "d8", "e8", "f8", "g8", "h8", //
    "a7", "b7", "c7", "d7", "e7", "f7", "g7", "h7", //
    "a6", "b6", "c6", "d6", "e6", "f6", "g6", "h6", //
    "a5", "b5", "c5", "d5", "e5", "f5", "g5", "h5", //
    "a4", "b4", "c4", "d4", "e4", "f4", "g4", "h4", //
    "a3", "b3", "c3", "d3", "e3", "f3", "g3", "h3", //
    "a2", "b2", "c2", "d2", "e2", "f2", "g2", "h2", //
    "a1", "b1", "c1", "d1", "e1", "f1", "g1", "h1", //
];

/// Raw board string of the standard starting position.
pub const START_RAW: &str = "rnbqkbnrpppppppp................................PPPPPPPPRNBQKBNR";

/// Full FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ============================================================================
// Serial Link
// ============================================================================

/// Fixed baud rate of the board's serial link.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Quiet window required after reset before the handshake starts (milliseconds).
///
/// The device emits spurious bytes right after a reset. Any byte received
/// during the window restarts it.
///
/// # Value: 600ms
pub const DEFAULT_QUIET_WINDOW_MS: u64 = 600;

/// Debounce window for field updates (milliseconds).
///
/// One physical move produces a burst of field events (lift, optional
/// capture removal, place) spread over tens to hundreds of milliseconds.
///
/// # Value: 600ms
pub const DEFAULT_DEBOUNCE_MS: u64 = 600;

/// Minimum accepted debounce or quiet window (milliseconds).
pub const MIN_SETTLE_MS: u64 = 10;

/// Default capacity of the board event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

// ============================================================================
// Game Synchronization
// ============================================================================

/// Delay before a "board not synced" diagnostic is emitted (milliseconds).
///
/// # Value: 1250ms
pub const DEFAULT_SYNC_GRACE_MS: u64 = 1250;

/// Extra grace added for castling moves, which take two hands (milliseconds).
///
/// # Value: 1000ms
pub const CASTLING_EXTRA_GRACE_MS: u64 = 1000;

/// Default engine search depth.
pub const DEFAULT_SEARCH_DEPTH: u32 = 1;

/// Default number of principal variations requested from engines.
pub const DEFAULT_MULTI_PV: u32 = 5;
