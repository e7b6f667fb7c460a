//! Full 64-field board state.
//!
//! A [`Snapshot`] is the state of every field at one instant, in device
//! order (a8 first, h1 last). It is used both for the live physical board and
//! for the confirmed-previous state the game controller commits into.
//!
//! # Raw Board Strings
//!
//! Snapshots convert to and from 64-character raw strings:
//!
//! ```
//! use boardsync_core::{Snapshot, constants::START_RAW};
//!
//! let snapshot = Snapshot::from_raw(START_RAW).unwrap();
//! assert_eq!(snapshot.to_raw(), START_RAW);
//! ```

use crate::{
    Result,
    constants::{BOARD_SIZE, BOARD_WIDTH},
    error::Error,
    fen,
    types::{Cell, Color, Square},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered sequence of 64 cells, index 0 = a8, index 63 = h1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Snapshot([Cell; BOARD_SIZE]);

impl Snapshot {
    /// Snapshot with every field empty.
    #[must_use]
    pub const fn empty() -> Self {
        Snapshot([Cell::Empty; BOARD_SIZE])
    }

    /// Parse a 64-character raw board string.
    ///
    /// # Errors
    /// Returns `Error::InvalidRaw` if the string is not exactly 64 characters
    /// or contains anything other than the 12 piece letters and `.`.
    pub fn from_raw(raw: &str) -> Result<Self> {
        let count = raw.chars().count();
        if count != BOARD_SIZE {
            return Err(Error::InvalidRaw(format!(
                "expected {BOARD_SIZE} fields, got {count}"
            )));
        }

        let mut cells = [Cell::Empty; BOARD_SIZE];
        for (slot, letter) in cells.iter_mut().zip(raw.chars()) {
            *slot = Cell::from_letter(letter)
                .map_err(|_| Error::InvalidRaw(format!("unexpected letter {letter:?}")))?;
        }
        Ok(Snapshot(cells))
    }

    /// Parse the board field of a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self> {
        Snapshot::from_raw(&fen::fen_to_raw(fen)?)
    }

    /// Raw 64-character representation.
    #[must_use]
    pub fn to_raw(&self) -> String {
        self.0.iter().map(|cell| cell.letter()).collect()
    }

    /// Board field of a FEN string for this snapshot.
    #[must_use]
    pub fn to_fen(&self) -> String {
        fen::raw_to_fen(&self.to_raw())
    }

    #[must_use]
    pub fn get(&self, square: Square) -> Cell {
        self.0[square.index()]
    }

    pub fn set(&mut self, square: Square, cell: Cell) {
        self.0[square.index()] = cell;
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell; BOARD_SIZE] {
        &self.0
    }

    /// Iterate over `(square, cell)` pairs in device order.
    pub fn iter(&self) -> impl Iterator<Item = (Square, Cell)> + '_ {
        Square::all().zip(self.0.iter().copied())
    }

    /// Copy of this snapshot holding only `color`'s pieces.
    ///
    /// # Examples
    ///
    /// ```
    /// use boardsync_core::{Color, Snapshot, constants::START_RAW};
    ///
    /// let white = Snapshot::from_raw(START_RAW).unwrap().project(Color::White);
    /// assert!(white.to_raw().starts_with("................"));
    /// assert!(white.to_raw().ends_with("PPPPPPPPRNBQKBNR"));
    /// ```
    #[must_use]
    pub fn project(&self, color: Color) -> Snapshot {
        let mut cells = self.0;
        for cell in cells.iter_mut() {
            if !cell.is_color(color) {
                *cell = Cell::Empty;
            }
        }
        Snapshot(cells)
    }

    /// Merge `color`'s part of `overlay` into this snapshot.
    ///
    /// Fields where the overlay holds a `color` piece take that piece; fields
    /// the overlay leaves empty lose any `color` piece they held. Fields of the
    /// other color are untouched, except `cleared` squares, which are emptied
    /// unconditionally (the pawn taken by an en-passant capture).
    ///
    /// Applying the same overlay twice yields the same result as applying it
    /// once.
    pub fn commit_overlay(
        &mut self,
        color: Color,
        overlay: &Snapshot,
        cleared: impl IntoIterator<Item = Square>,
    ) {
        for (slot, incoming) in self.0.iter_mut().zip(overlay.0.iter()) {
            if incoming.is_color(color) {
                *slot = *incoming;
            } else if incoming.is_empty() && slot.is_color(color) {
                *slot = Cell::Empty;
            }
        }

        for square in cleared {
            self.set(square, Cell::Empty);
        }
    }

    /// Human-readable board diagram, rank 8 at the top.
    #[must_use]
    pub fn ascii(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(BOARD_WIDTH + 3);
        out.push("   +------------------------+".to_string());
        for (row, cells) in self.0.chunks(BOARD_WIDTH).enumerate() {
            let letters: Vec<String> = cells.iter().map(|c| c.letter().to_string()).collect();
            out.push(format!(" {} | {} |", BOARD_WIDTH - row, letters.join("  ")));
        }
        out.push("   +------------------------+".to_string());
        out.push("     a  b  c  d  e  f  g  h".to_string());
        out
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot::empty()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_raw())
    }
}

impl std::str::FromStr for Snapshot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Snapshot::from_raw(s)
    }
}

impl From<Snapshot> for String {
    fn from(snapshot: Snapshot) -> Self {
        snapshot.to_raw()
    }
}

impl TryFrom<String> for Snapshot {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self> {
        Snapshot::from_raw(&raw)
    }
}
