//! Piece code table.
//!
//! The board reports each field as a single byte. Codes 1-6 are the white
//! pieces and 7-12 the black pieces, in the order pawn, rook, knight,
//! bishop, king, queen. Zero is an empty field; the board also uses higher
//! codes for special markers, which are treated as empty.

use boardsync_core::{Cell, Color, PieceKind};

/// Piece order within one color's block of codes.
const KIND_ORDER: [PieceKind; 6] = [
    PieceKind::Pawn,
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::King,
    PieceKind::Queen,
];

/// Decode a field byte. Unknown codes decode as [`Cell::Empty`].
#[must_use]
pub fn decode_piece(code: u8) -> Cell {
    let (color, offset) = match code {
        1..=6 => (Color::White, code - 1),
        7..=12 => (Color::Black, code - 7),
        _ => return Cell::Empty,
    };
    Cell::piece(color, KIND_ORDER[usize::from(offset)])
}

/// Encode a cell as its field byte.
#[must_use]
pub fn encode_piece(cell: Cell) -> u8 {
    let (Some(color), Some(kind)) = (cell.color(), cell.kind()) else {
        return 0;
    };
    let offset = KIND_ORDER
        .iter()
        .position(|k| *k == kind)
        .map_or(0, |i| i as u8);
    match color {
        Color::White => 1 + offset,
        Color::Black => 7 + offset,
    }
}
