//! Property-based tests for the board model and move inference.
//!
//! Random boards are generated as raw strings so the same inputs exercise
//! the raw, FEN and inference paths.

use boardsync_core::{
    Cell, Color, Detection, PieceKind, Snapshot, Square, find_move,
    fen::{fen_to_raw, raw_to_fen},
};
use proptest::prelude::*;

/// Strategy for a single field letter, biased towards empty fields.
fn field_letter() -> impl Strategy<Value = char> {
    prop_oneof![
        6 => Just('.'),
        1 => prop::sample::select(vec!['P', 'R', 'N', 'B', 'Q', 'K', 'p', 'r', 'n', 'b', 'q', 'k']),
    ]
}

/// Strategy for arbitrary 64-field raw strings.
fn raw_board() -> impl Strategy<Value = String> {
    prop::collection::vec(field_letter(), 64).prop_map(|letters| letters.into_iter().collect())
}

fn valid_color() -> impl Strategy<Value = Color> {
    prop_oneof![Just(Color::White), Just(Color::Black)]
}

/// Non-pawn, non-king piece kinds that can slide anywhere on an empty board.
fn movable_kind() -> impl Strategy<Value = PieceKind> {
    prop_oneof![
        Just(PieceKind::Rook),
        Just(PieceKind::Knight),
        Just(PieceKind::Bishop),
        Just(PieceKind::Queen),
    ]
}

proptest! {
    /// Property: raw -> FEN -> raw is lossless for any board.
    #[test]
    fn prop_fen_roundtrip(raw in raw_board()) {
        let fen = raw_to_fen(&raw);
        prop_assert_eq!(fen_to_raw(&fen).unwrap(), raw.clone());
        prop_assert_eq!(fen.matches('/').count(), 7);
    }

    /// Property: snapshots survive the raw string form unchanged.
    #[test]
    fn prop_snapshot_raw_roundtrip(raw in raw_board()) {
        let snapshot = Snapshot::from_raw(&raw).unwrap();
        prop_assert_eq!(snapshot.to_raw(), raw);
    }

    /// Property: an unchanged board never yields a move for either color.
    #[test]
    fn prop_identical_boards_have_no_move(raw in raw_board(), color in valid_color()) {
        let snapshot = Snapshot::from_raw(&raw).unwrap();
        prop_assert_eq!(find_move(color, &snapshot, &snapshot), Detection::NoMove);
    }

    /// Property: a lone piece relocated on an otherwise empty board is always
    /// recognized as an ordinary move by its own color only.
    #[test]
    fn prop_single_piece_move_detected(
        color in valid_color(),
        kind in movable_kind(),
        from in 0u8..64,
        to in 0u8..64,
    ) {
        prop_assume!(from != to);

        let piece = Cell::piece(color, kind);
        let from = Square::new(from).unwrap();
        let to = Square::new(to).unwrap();

        let mut prev = Snapshot::empty();
        prev.set(from, piece);
        let mut curr = Snapshot::empty();
        curr.set(to, piece);

        let detection = find_move(color, &prev, &curr);
        let mv = detection.as_move().unwrap();
        prop_assert_eq!(mv.from.square, from);
        prop_assert_eq!(mv.to.square, to);
        prop_assert!(mv.promotion.is_none());
        prop_assert!(mv.castling.is_none());

        prop_assert_eq!(find_move(color.opposite(), &prev, &curr), Detection::NoMove);
    }

    /// Property: committing the mover's projection makes the confirmed board
    /// agree with the physical board for that color, and doing it again
    /// changes nothing.
    #[test]
    fn prop_commit_overlay_idempotent(
        confirmed in raw_board(),
        physical in raw_board(),
        color in valid_color(),
    ) {
        let physical = Snapshot::from_raw(&physical).unwrap();
        let overlay = physical.project(color);

        let mut once = Snapshot::from_raw(&confirmed).unwrap();
        once.commit_overlay(color, &overlay, []);
        prop_assert_eq!(once.project(color), overlay);

        let mut twice = once;
        twice.commit_overlay(color, &overlay, []);
        prop_assert_eq!(once, twice);
    }
}
