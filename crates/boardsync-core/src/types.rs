use crate::{
    Result,
    constants::{BOARD_SIZE, BOARD_WIDTH, EMPTY_LETTER, FIELD_LABELS},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side to move / owner of a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Both colors, in the order the board driver runs move detection.
    pub const ALL: [Color; 2] = [Color::Black, Color::White];

    /// The other color.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Whether `square` is on the rank where this color's pawns promote.
    #[must_use]
    pub fn is_last_rank(self, square: Square) -> bool {
        match self {
            Color::White => square.rank() == 8,
            Color::Black => square.rank() == 1,
        }
    }

    /// Offset from a pawn's destination to the pawn it captured en passant.
    #[must_use]
    pub fn en_passant_offset(self) -> i8 {
        match self {
            Color::White => 8,
            Color::Black => -8,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

impl std::str::FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "white" | "w" => Ok(Color::White),
            "black" | "b" => Ok(Color::Black),
            other => Err(Error::InvalidMessageFormat(format!("Invalid color: {other}"))),
        }
    }
}

/// Kind of chess piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Lowercase letter for this kind (`n` for knight).
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    /// Parse a piece letter, ignoring case.
    pub fn from_letter(letter: char) -> Result<Self> {
        match letter.to_ascii_lowercase() {
            'p' => Ok(PieceKind::Pawn),
            'n' => Ok(PieceKind::Knight),
            'b' => Ok(PieceKind::Bishop),
            'r' => Ok(PieceKind::Rook),
            'q' => Ok(PieceKind::Queen),
            'k' => Ok(PieceKind::King),
            _ => Err(Error::InvalidPiece(letter)),
        }
    }

    /// Whether a pawn may promote to this kind.
    #[must_use]
    pub fn is_promotion_target(self) -> bool {
        matches!(
            self,
            PieceKind::Queen | PieceKind::Rook | PieceKind::Bishop | PieceKind::Knight
        )
    }
}

/// Content of one board field.
///
/// Serialized as its single-letter form: uppercase for white, lowercase for
/// black, `.` for an empty field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "char", try_from = "char")]
pub enum Cell {
    #[default]
    Empty,
    Piece { kind: PieceKind, color: Color },
}

impl Cell {
    /// Shorthand for a piece cell.
    #[must_use]
    pub const fn piece(color: Color, kind: PieceKind) -> Self {
        Cell::Piece { kind, color }
    }

    /// Letter form of the cell.
    ///
    /// # Examples
    ///
    /// ```
    /// use boardsync_core::{Cell, Color, PieceKind};
    ///
    /// assert_eq!(Cell::piece(Color::White, PieceKind::Knight).letter(), 'N');
    /// assert_eq!(Cell::piece(Color::Black, PieceKind::Queen).letter(), 'q');
    /// assert_eq!(Cell::Empty.letter(), '.');
    /// ```
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Cell::Empty => EMPTY_LETTER,
            Cell::Piece {
                kind,
                color: Color::White,
            } => kind.letter().to_ascii_uppercase(),
            Cell::Piece {
                kind,
                color: Color::Black,
            } => kind.letter(),
        }
    }

    /// Parse a cell from its letter form.
    pub fn from_letter(letter: char) -> Result<Self> {
        if letter == EMPTY_LETTER {
            return Ok(Cell::Empty);
        }
        let kind = PieceKind::from_letter(letter)?;
        let color = if letter.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Ok(Cell::Piece { kind, color })
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    #[must_use]
    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Empty => None,
            Cell::Piece { color, .. } => Some(color),
        }
    }

    #[must_use]
    pub fn kind(self) -> Option<PieceKind> {
        match self {
            Cell::Empty => None,
            Cell::Piece { kind, .. } => Some(kind),
        }
    }

    /// Whether the cell holds a piece of `color`.
    #[must_use]
    pub fn is_color(self, color: Color) -> bool {
        self.color() == Some(color)
    }

    /// Whether the cell holds the given piece.
    #[must_use]
    pub fn is(self, color: Color, kind: PieceKind) -> bool {
        self == Cell::piece(color, kind)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl From<Cell> for char {
    fn from(cell: Cell) -> Self {
        cell.letter()
    }
}

impl TryFrom<char> for Cell {
    type Error = Error;

    fn try_from(letter: char) -> Result<Self> {
        Cell::from_letter(letter)
    }
}

/// Linear board field index (0 = a8, 63 = h1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Square(u8);

impl Square {
    /// Create a square from its linear index.
    ///
    /// # Errors
    /// Returns `Error::InvalidSquare` if the index is 64 or more.
    pub fn new(index: u8) -> Result<Self> {
        if usize::from(index) >= BOARD_SIZE {
            return Err(Error::InvalidSquare(format!(
                "Index must be 0-63, got {index}"
            )));
        }
        Ok(Square(index))
    }

    /// Iterate over all 64 squares in device order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE as u8).map(Square)
    }

    /// Linear index (0-63).
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Coordinate label such as `e2`.
    #[must_use]
    pub fn label(self) -> &'static str {
        FIELD_LABELS[self.index()]
    }

    /// File, 0 (a) to 7 (h).
    #[must_use]
    pub fn file(self) -> usize {
        self.index() % BOARD_WIDTH
    }

    /// Rank, 1 to 8.
    #[must_use]
    pub fn rank(self) -> usize {
        BOARD_WIDTH - self.index() / BOARD_WIDTH
    }

    /// Square at a signed linear offset, if it stays on the board.
    #[must_use]
    pub fn offset(self, delta: i8) -> Option<Square> {
        let target = i16::from(self.0) + i16::from(delta);
        u8::try_from(target).ok().and_then(|i| Square::new(i).ok())
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Square {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FIELD_LABELS
            .iter()
            .position(|label| *label == s)
            .map(|index| Square(index as u8))
            .ok_or_else(|| Error::InvalidSquare(s.to_string()))
    }
}

impl TryFrom<u8> for Square {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self> {
        Square::new(index)
    }
}

impl From<Square> for u8 {
    fn from(square: Square) -> Self {
        square.0
    }
}

/// Side of the board a castling move goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastlingSide {
    KingSide,
    QueenSide,
}

impl fmt::Display for CastlingSide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CastlingSide::KingSide => write!(f, "O-O"),
            CastlingSide::QueenSide => write!(f, "O-O-O"),
        }
    }
}
