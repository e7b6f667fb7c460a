//! Move inference from snapshot differences.
//!
//! [`find_move`] compares two snapshots from one color's point of view and
//! classifies what changed. It never consults chess rules: it only recognizes
//! the physical shapes of a move, and leaves legality to the rules delegate.
//!
//! # Classification Order
//!
//! ```text
//! vacated/occupied sets (king first, then by index)
//!     │
//!     ├─ 1 + 1, pawn onto last rank ──► promotion, or rejected
//!     ├─ 1 + 1, same piece          ──► ordinary move
//!     ├─ exact castling template    ──► castling
//!     ├─ anything left over         ──► invalid change
//!     └─ nothing                    ──► no move
//! ```
//!
//! The promotion check must run before the ordinary-move check because both
//! produce 1 + 1 sets. Castling always produces 2 + 2 sets; a 2 + 2 change
//! that does not match a template exactly is reported as invalid.

use crate::{
    snapshot::Snapshot,
    types::{CastlingSide, Cell, Color, PieceKind, Square},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A piece standing on a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub square: Square,
    pub cell: Cell,
}

impl Placement {
    #[must_use]
    pub fn new(square: Square, cell: Cell) -> Self {
        Self { square, cell }
    }

    fn is_king(&self) -> bool {
        self.cell.kind() == Some(PieceKind::King)
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.cell, self.square)
    }
}

/// A move recognized on the physical board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMove {
    pub from: Placement,
    pub to: Placement,
    pub promotion: Option<PieceKind>,
    pub castling: Option<CastlingSide>,
}

impl BoardMove {
    /// UCI long algebraic form, e.g. `e2e4` or `a7a8q`.
    #[must_use]
    pub fn uci(&self) -> String {
        let mut uci = format!("{}{}", self.from.square, self.to.square);
        if let Some(kind) = self.promotion {
            uci.push(kind.letter());
        }
        uci
    }
}

impl fmt::Display for BoardMove {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.uci())
    }
}

/// Outcome of comparing two snapshots for one color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detection {
    /// No piece of the color changed.
    NoMove,

    /// A complete ordinary, promotion or castling move.
    Move(BoardMove),

    /// A pawn left its square and something that is not a valid promotion
    /// piece appeared on the last rank.
    Rejected {
        vacated: Placement,
        occupied: Placement,
    },

    /// A change that does not form a recognizable move.
    Invalid {
        vacated: Vec<Placement>,
        occupied: Vec<Placement>,
    },
}

impl Detection {
    #[must_use]
    pub fn as_move(&self) -> Option<&BoardMove> {
        match self {
            Detection::Move(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_move(&self) -> bool {
        matches!(self, Detection::Move(_))
    }
}

/// Castling shape: king from/to and rook from/to, as linear indices.
struct CastlingTemplate {
    color: Color,
    side: CastlingSide,
    king: (u8, u8),
    rook: (u8, u8),
}

const CASTLING_TEMPLATES: [CastlingTemplate; 4] = [
    CastlingTemplate {
        color: Color::White,
        side: CastlingSide::KingSide,
        king: (60, 62),
        rook: (63, 61),
    },
    CastlingTemplate {
        color: Color::White,
        side: CastlingSide::QueenSide,
        king: (60, 58),
        rook: (56, 59),
    },
    CastlingTemplate {
        color: Color::Black,
        side: CastlingSide::KingSide,
        king: (4, 6),
        rook: (7, 5),
    },
    CastlingTemplate {
        color: Color::Black,
        side: CastlingSide::QueenSide,
        king: (4, 2),
        rook: (0, 3),
    },
];

impl CastlingTemplate {
    fn matches(&self, vacated: &[Placement], occupied: &[Placement]) -> bool {
        let king = Cell::piece(self.color, PieceKind::King);
        let rook = Cell::piece(self.color, PieceKind::Rook);
        let fits = |set: &[Placement], king_at: u8, rook_at: u8| match set {
            [k, r] => {
                k.cell == king
                    && r.cell == rook
                    && k.square.index() == usize::from(king_at)
                    && r.square.index() == usize::from(rook_at)
            }
            _ => false,
        };
        fits(vacated, self.king.0, self.rook.0) && fits(occupied, self.king.1, self.rook.1)
    }
}

/// Pieces of `color` on `data` that are not on the same field of `reference`.
fn pieces_only_on(color: Color, data: &Snapshot, reference: &Snapshot) -> Vec<Placement> {
    let mut only: Vec<Placement> = data
        .iter()
        .filter(|(sq, cell)| cell.is_color(color) && reference.get(*sq) != *cell)
        .map(|(sq, cell)| Placement::new(sq, cell))
        .collect();

    // Kings first so castling templates line up, then by field index.
    only.sort_by_key(|p| (!p.is_king(), p.square));
    only
}

/// Classify the difference between `prev` and `curr` for `color`.
///
/// # Examples
///
/// ```
/// use boardsync_core::{Color, Detection, Snapshot, constants::START_RAW, find_move};
///
/// let prev = Snapshot::from_raw(START_RAW).unwrap();
/// let mut curr = prev;
/// let e2 = "e2".parse().unwrap();
/// let e4 = "e4".parse().unwrap();
/// curr.set(e4, prev.get(e2));
/// curr.set(e2, Default::default());
///
/// let detection = find_move(Color::White, &prev, &curr);
/// assert_eq!(detection.as_move().unwrap().uci(), "e2e4");
/// assert_eq!(find_move(Color::Black, &prev, &curr), Detection::NoMove);
/// ```
#[must_use]
pub fn find_move(color: Color, prev: &Snapshot, curr: &Snapshot) -> Detection {
    let vacated = pieces_only_on(color, prev, curr);
    let occupied = pieces_only_on(color, curr, prev);

    if let ([from], [to]) = (vacated.as_slice(), occupied.as_slice()) {
        let (from, to) = (*from, *to);

        if from.cell.is(color, PieceKind::Pawn) && color.is_last_rank(to.square) {
            return match to.cell.kind() {
                Some(kind) if kind.is_promotion_target() => Detection::Move(BoardMove {
                    from,
                    to,
                    promotion: Some(kind),
                    castling: None,
                }),
                _ => Detection::Rejected {
                    vacated: from,
                    occupied: to,
                },
            };
        }

        if from.cell == to.cell && from.square != to.square {
            return Detection::Move(BoardMove {
                from,
                to,
                promotion: None,
                castling: None,
            });
        }
    }

    if let Some(template) = CASTLING_TEMPLATES
        .iter()
        .find(|t| t.matches(&vacated, &occupied))
    {
        return Detection::Move(BoardMove {
            from: vacated[0],
            to: occupied[0],
            promotion: None,
            castling: Some(template.side),
        });
    }

    if !vacated.is_empty() || !occupied.is_empty() {
        return Detection::Invalid { vacated, occupied };
    }

    Detection::NoMove
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::START_RAW;
    use rstest::rstest;

    fn sq(label: &str) -> Square {
        label.parse().unwrap()
    }

    fn board(raw: &str) -> Snapshot {
        Snapshot::from_raw(raw).unwrap()
    }

    /// Snapshot built from `(label, letter)` pairs on an empty board.
    fn position(pieces: &[(&str, char)]) -> Snapshot {
        let mut snapshot = Snapshot::empty();
        for (label, letter) in pieces {
            snapshot.set(sq(label), Cell::from_letter(*letter).unwrap());
        }
        snapshot
    }

    fn moved(prev: &Snapshot, from: &str, to: &str) -> Snapshot {
        let mut curr = *prev;
        curr.set(sq(to), prev.get(sq(from)));
        curr.set(sq(from), Cell::Empty);
        curr
    }

    #[test]
    fn test_no_move() {
        let prev = board(START_RAW);
        assert_eq!(find_move(Color::White, &prev, &prev), Detection::NoMove);
        assert_eq!(find_move(Color::Black, &prev, &prev), Detection::NoMove);
    }

    #[test]
    fn test_pawn_push_scenario() {
        let prev = board(START_RAW);
        let mut curr = prev;
        // Two field events: e2 emptied, e4 filled.
        curr.set(Square::new(52).unwrap(), Cell::Empty);
        curr.set(
            Square::new(36).unwrap(),
            Cell::piece(Color::White, PieceKind::Pawn),
        );

        let detection = find_move(Color::White, &prev, &curr);
        let mv = detection.as_move().unwrap();

        assert_eq!(mv.from.square.index(), 52);
        assert_eq!(mv.from.cell.letter(), 'P');
        assert_eq!(mv.to.square.index(), 36);
        assert_eq!(mv.to.cell.letter(), 'P');
        assert!(mv.promotion.is_none());
        assert!(mv.castling.is_none());
    }

    #[rstest]
    #[case(Color::White, "g1", "f3")]
    #[case(Color::White, "b1", "c3")]
    #[case(Color::Black, "b8", "c6")]
    #[case(Color::Black, "e7", "e5")]
    fn test_ordinary_moves(#[case] color: Color, #[case] from: &str, #[case] to: &str) {
        let prev = board(START_RAW);
        let curr = moved(&prev, from, to);

        let mv = find_move(color, &prev, &curr);
        let mv = mv.as_move().unwrap();
        assert_eq!(mv.from.square, sq(from));
        assert_eq!(mv.to.square, sq(to));
        assert_eq!(mv.from.cell, mv.to.cell);

        // The other color sees nothing of its own.
        assert_eq!(find_move(color.opposite(), &prev, &curr), Detection::NoMove);
    }

    #[test]
    fn test_capture_is_ordinary_for_mover() {
        let prev = position(&[("e4", 'P'), ("d5", 'p'), ("e1", 'K'), ("e8", 'k')]);
        let curr = moved(&prev, "e4", "d5");

        let white = find_move(Color::White, &prev, &curr);
        assert_eq!(white.as_move().unwrap().uci(), "e4d5");

        // Black just lost a piece: one vacated field, nothing occupied.
        match find_move(Color::Black, &prev, &curr) {
            Detection::Invalid { vacated, occupied } => {
                assert_eq!(vacated, vec![Placement::new(sq("d5"), Cell::from_letter('p').unwrap())]);
                assert!(occupied.is_empty());
            }
            other => panic!("unexpected detection: {other:?}"),
        }
    }

    #[rstest]
    #[case('Q', PieceKind::Queen)]
    #[case('R', PieceKind::Rook)]
    #[case('B', PieceKind::Bishop)]
    #[case('N', PieceKind::Knight)]
    fn test_white_promotion(#[case] letter: char, #[case] kind: PieceKind) {
        let prev = position(&[("b7", 'P'), ("e1", 'K'), ("h8", 'k')]);
        let mut curr = prev;
        curr.set(sq("b7"), Cell::Empty);
        curr.set(sq("b8"), Cell::from_letter(letter).unwrap());

        let detection = find_move(Color::White, &prev, &curr);
        let mv = detection.as_move().unwrap();
        assert_eq!(mv.promotion, Some(kind));
        assert_eq!(mv.from.square, sq("b7"));
        assert_eq!(mv.to.square, sq("b8"));
        assert_eq!(mv.uci(), format!("b7b8{}", kind.letter()));
    }

    #[test]
    fn test_black_promotion_with_capture() {
        let prev = position(&[("b2", 'p'), ("a1", 'R'), ("e1", 'K'), ("e8", 'k')]);
        let mut curr = prev;
        curr.set(sq("b2"), Cell::Empty);
        curr.set(sq("a1"), Cell::from_letter('q').unwrap());

        let detection = find_move(Color::Black, &prev, &curr);
        let mv = detection.as_move().unwrap();
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
        assert_eq!(mv.uci(), "b2a1q");
    }

    #[rstest]
    #[case('K')]
    #[case('P')]
    fn test_promotion_to_invalid_piece_is_rejected(#[case] letter: char) {
        let prev = position(&[("b7", 'P'), ("e1", 'K'), ("h8", 'k')]);
        let mut curr = prev;
        curr.set(sq("b7"), Cell::Empty);
        curr.set(sq("b8"), Cell::from_letter(letter).unwrap());

        let detection = find_move(Color::White, &prev, &curr);
        assert!(matches!(detection, Detection::Rejected { .. }));
        assert!(!detection.is_move());
    }

    #[test]
    fn test_pawn_to_last_rank_same_letter_not_ordinary() {
        // A pawn "arriving" on the last rank as a pawn must not be treated as
        // an ordinary pawn move even though the letters match.
        let prev = position(&[("c7", 'P'), ("e1", 'K'), ("h8", 'k')]);
        let curr = moved(&prev, "c7", "c8");
        assert!(matches!(
            find_move(Color::White, &prev, &curr),
            Detection::Rejected { .. }
        ));
    }

    #[rstest]
    #[case(Color::White, CastlingSide::KingSide, "e1", "g1", "h1", "f1")]
    #[case(Color::White, CastlingSide::QueenSide, "e1", "c1", "a1", "d1")]
    #[case(Color::Black, CastlingSide::KingSide, "e8", "g8", "h8", "f8")]
    #[case(Color::Black, CastlingSide::QueenSide, "e8", "c8", "a8", "d8")]
    fn test_castling(
        #[case] color: Color,
        #[case] side: CastlingSide,
        #[case] king_from: &str,
        #[case] king_to: &str,
        #[case] rook_from: &str,
        #[case] rook_to: &str,
    ) {
        let prev = position(&[
            ("e1", 'K'),
            ("a1", 'R'),
            ("h1", 'R'),
            ("e8", 'k'),
            ("a8", 'r'),
            ("h8", 'r'),
        ]);
        let curr = moved(&moved(&prev, king_from, king_to), rook_from, rook_to);

        let detection = find_move(color, &prev, &curr);
        let mv = detection.as_move().unwrap();
        assert_eq!(mv.castling, Some(side));
        assert_eq!(mv.from.square, sq(king_from));
        assert_eq!(mv.to.square, sq(king_to));
        assert_eq!(mv.from.cell.kind(), Some(PieceKind::King));
    }

    #[test]
    fn test_white_king_side_castling_indices() {
        let mut prev = board(START_RAW);
        prev.set(Square::new(61).unwrap(), Cell::Empty);
        prev.set(Square::new(62).unwrap(), Cell::Empty);
        let curr = moved(&moved(&prev, "e1", "g1"), "h1", "f1");

        let detection = find_move(Color::White, &prev, &curr);
        let mv = detection.as_move().unwrap();
        assert_eq!(mv.from.square.index(), 60);
        assert_eq!(mv.to.square.index(), 62);
        assert_eq!(mv.castling, Some(CastlingSide::KingSide));
    }

    #[test]
    fn test_two_piece_change_not_matching_castling_is_invalid() {
        // King and rook both move, but the rook lands on the wrong field.
        let prev = position(&[("e1", 'K'), ("h1", 'R'), ("e8", 'k')]);
        let curr = moved(&moved(&prev, "e1", "g1"), "h1", "h2");

        match find_move(Color::White, &prev, &curr) {
            Detection::Invalid { vacated, occupied } => {
                assert_eq!(vacated.len(), 2);
                assert_eq!(occupied.len(), 2);
                assert_eq!(vacated[0].cell.kind(), Some(PieceKind::King));
                assert_eq!(occupied[0].cell.kind(), Some(PieceKind::King));
            }
            other => panic!("unexpected detection: {other:?}"),
        }
    }

    #[test]
    fn test_lifted_piece_is_invalid() {
        let prev = board(START_RAW);
        let mut curr = prev;
        curr.set(sq("d1"), Cell::Empty);

        match find_move(Color::White, &prev, &curr) {
            Detection::Invalid { vacated, occupied } => {
                assert_eq!(vacated.len(), 1);
                assert_eq!(vacated[0].square, sq("d1"));
                assert!(occupied.is_empty());
            }
            other => panic!("unexpected detection: {other:?}"),
        }
    }

    #[test]
    fn test_piece_swapped_in_place_is_invalid() {
        let prev = position(&[("d1", 'Q'), ("e1", 'K')]);
        let mut curr = prev;
        curr.set(sq("d1"), Cell::from_letter('R').unwrap());

        assert!(matches!(
            find_move(Color::White, &prev, &curr),
            Detection::Invalid { .. }
        ));
    }

    #[test]
    fn test_sets_are_king_first_then_by_index() {
        let prev = position(&[("a1", 'R'), ("e1", 'K'), ("h1", 'R')]);
        let mut curr = prev;
        curr.set(sq("a1"), Cell::Empty);
        curr.set(sq("e1"), Cell::Empty);
        curr.set(sq("h1"), Cell::Empty);

        match find_move(Color::White, &prev, &curr) {
            Detection::Invalid { vacated, .. } => {
                let labels: Vec<_> = vacated.iter().map(|p| p.square.label()).collect();
                assert_eq!(labels, vec!["e1", "a1", "h1"]);
            }
            other => panic!("unexpected detection: {other:?}"),
        }
    }
}
