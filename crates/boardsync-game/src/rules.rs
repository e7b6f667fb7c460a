//! Chess rules delegate.
//!
//! The controller never decides legality itself. It hands every candidate
//! move to a [`Rules`] implementation and acts on the [`AppliedMove`] it gets
//! back. [`ShakmatyRules`] is the implementation used in practice; the trait
//! exists so the controller can be driven by a scripted delegate.
//!
//! # Example
//!
//! ```
//! use boardsync_game::rules::{MoveRequest, Rules, ShakmatyRules};
//!
//! let mut rules = ShakmatyRules::new();
//! let applied = rules.play(&"e2e4".parse::<MoveRequest>().unwrap()).unwrap();
//! assert_eq!(applied.san, "e4");
//! assert_eq!(rules.turn(), boardsync_core::Color::Black);
//! ```

use crate::error::RulesError;
use boardsync_core::{BoardMove, CastlingSide, Color, PieceKind, Snapshot, Square};
use serde::{Deserialize, Serialize};
use shakmaty::{
    CastlingMode, Chess, EnPassantMode, Move, Position, Role, fen::Fen, san::San, uci::UciMove,
};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// A candidate move: source, destination and optional promotion piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl MoveRequest {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }

    /// UCI long algebraic form.
    pub fn uci(&self) -> String {
        let mut uci = format!("{}{}", self.from, self.to);
        if let Some(kind) = self.promotion {
            uci.push(kind.letter());
        }
        uci
    }
}

impl From<&BoardMove> for MoveRequest {
    fn from(mv: &BoardMove) -> Self {
        Self {
            from: mv.from.square,
            to: mv.to.square,
            promotion: mv.promotion,
        }
    }
}

impl FromStr for MoveRequest {
    type Err = RulesError;

    /// Parse `e2e4` or `e7e8q`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RulesError::InvalidNotation(s.to_string());

        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(invalid());
        }
        let from: Square = s[0..2].parse().map_err(|_| invalid())?;
        let to: Square = s[2..4].parse().map_err(|_| invalid())?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(letter) => {
                let kind = PieceKind::from_letter(letter).map_err(|_| invalid())?;
                if !kind.is_promotion_target() {
                    return Err(invalid());
                }
                Some(kind)
            }
        };

        Ok(Self { from, to, promotion })
    }
}

impl fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.uci())
    }
}

/// A move accepted by the rules, with the flags the controller needs.
///
/// For castling, `to` is the king's destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMove {
    pub color: Color,
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub capture: bool,
    pub en_passant: bool,
    pub castling: Option<CastlingSide>,
    /// The move gives check.
    pub check: bool,
    pub san: String,
}

impl AppliedMove {
    /// Square of the pawn removed by an en-passant capture.
    pub fn en_passant_square(&self) -> Option<Square> {
        if !self.en_passant {
            return None;
        }
        self.to.offset(self.color.en_passant_offset())
    }

    pub fn uci(&self) -> String {
        MoveRequest {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
        .uci()
    }
}

impl fmt::Display for AppliedMove {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.san, self.uci())
    }
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Terminal {
    /// Fifty-move rule or insufficient material.
    Draw,
    Stalemate,
    ThreefoldRepetition,
    Checkmate { winner: Color },
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Terminal::Draw => write!(f, "Game is a draw"),
            Terminal::Stalemate => write!(f, "Game is stalemate"),
            Terminal::ThreefoldRepetition => write!(f, "Game is in threefold repetition"),
            Terminal::Checkmate { winner } => write!(f, "Checkmate, {winner} wins"),
        }
    }
}

/// Legality delegate used by the game controller.
pub trait Rules {
    /// Replace the current game with the position in `fen`.
    fn load(&mut self, fen: &str) -> Result<(), RulesError>;

    fn fen(&self) -> String;

    /// Side to move.
    fn turn(&self) -> Color;

    /// Placement of the current position.
    fn board(&self) -> Result<Snapshot, RulesError>;

    /// Validate and apply a move for the side to move.
    fn play(&mut self, request: &MoveRequest) -> Result<AppliedMove, RulesError>;

    /// Fifty-move rule or insufficient material.
    fn is_draw(&self) -> bool;

    fn is_stalemate(&self) -> bool;

    fn is_threefold_repetition(&self) -> bool;

    fn is_checkmate(&self) -> bool;

    /// First terminal condition that holds, checked in the order draw,
    /// stalemate, threefold repetition, checkmate.
    fn terminal(&self) -> Option<Terminal> {
        if self.is_draw() {
            Some(Terminal::Draw)
        } else if self.is_stalemate() {
            Some(Terminal::Stalemate)
        } else if self.is_threefold_repetition() {
            Some(Terminal::ThreefoldRepetition)
        } else if self.is_checkmate() {
            Some(Terminal::Checkmate {
                winner: self.turn().opposite(),
            })
        } else {
            None
        }
    }
}

/// [`Rules`] backed by `shakmaty`.
#[derive(Debug, Clone)]
pub struct ShakmatyRules {
    position: Chess,
    /// Occurrences of each position since the last load.
    repetitions: HashMap<String, u32>,
}

impl ShakmatyRules {
    /// Rules at the standard starting position.
    pub fn new() -> Self {
        let mut rules = Self {
            position: Chess::default(),
            repetitions: HashMap::new(),
        };
        rules.record_position();
        rules
    }

    /// # Errors
    /// Returns `RulesError::InvalidFen` if `fen` is not a legal position.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let mut rules = Self::new();
        rules.load(fen)?;
        Ok(rules)
    }

    fn record_position(&mut self) {
        *self.repetitions.entry(self.repetition_key()).or_insert(0) += 1;
    }

    /// Placement, side to move, castling rights and en-passant square.
    fn repetition_key(&self) -> String {
        self.fen()
            .split_whitespace()
            .take(4)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn resolve(&self, request: &MoveRequest) -> Result<Move, RulesError> {
        let uci = request.uci();
        let parsed: UciMove = uci
            .parse()
            .map_err(|_| RulesError::InvalidNotation(uci.clone()))?;
        parsed
            .to_move(&self.position)
            .map_err(|_| RulesError::IllegalMove(uci))
    }
}

impl Default for ShakmatyRules {
    fn default() -> Self {
        Self::new()
    }
}

impl Rules for ShakmatyRules {
    fn load(&mut self, fen: &str) -> Result<(), RulesError> {
        let parsed: Fen = fen
            .parse()
            .map_err(|e| RulesError::InvalidFen(format!("{e}")))?;
        self.position = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| RulesError::InvalidFen(format!("{e}")))?;
        self.repetitions.clear();
        self.record_position();
        Ok(())
    }

    fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    fn turn(&self) -> Color {
        color_from(self.position.turn())
    }

    fn board(&self) -> Result<Snapshot, RulesError> {
        Snapshot::from_fen(&self.fen()).map_err(|e| RulesError::InvalidFen(e.to_string()))
    }

    fn play(&mut self, request: &MoveRequest) -> Result<AppliedMove, RulesError> {
        let m = self.resolve(request)?;
        let color = self.turn();
        let san = San::from_move(&self.position, &m).to_string();

        // King destination for castles, not the rook square.
        let normalized: MoveRequest = UciMove::from_move(&m, CastlingMode::Standard)
            .to_string()
            .parse()?;

        self.position.play_unchecked(&m);
        self.record_position();

        let applied = AppliedMove {
            color,
            from: normalized.from,
            to: normalized.to,
            promotion: m.promotion().map(kind_from),
            capture: m.is_capture(),
            en_passant: m.is_en_passant(),
            castling: m.castling_side().map(|side| match side {
                shakmaty::CastlingSide::KingSide => CastlingSide::KingSide,
                shakmaty::CastlingSide::QueenSide => CastlingSide::QueenSide,
            }),
            check: self.position.is_check(),
            san,
        };
        trace!(%applied, fen = %self.fen(), "Move applied");
        Ok(applied)
    }

    fn is_draw(&self) -> bool {
        self.position.halfmoves() >= 100 || self.position.is_insufficient_material()
    }

    fn is_stalemate(&self) -> bool {
        self.position.is_stalemate()
    }

    fn is_threefold_repetition(&self) -> bool {
        self.repetitions
            .get(&self.repetition_key())
            .is_some_and(|count| *count >= 3)
    }

    fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }
}

fn color_from(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

fn kind_from(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}
