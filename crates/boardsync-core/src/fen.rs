//! Conversion between FEN board fields and raw board strings.
//!
//! Only the piece-placement field of FEN is handled here: digits encode runs
//! of empty squares and `/` separates ranks. Side to move, castling rights and
//! move counters belong to the rules delegate.
//!
//! ```
//! use boardsync_core::fen::{fen_to_raw, raw_to_fen};
//! use boardsync_core::constants::{START_FEN, START_RAW};
//!
//! assert_eq!(fen_to_raw(START_FEN).unwrap(), START_RAW);
//! assert_eq!(raw_to_fen(START_RAW), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
//! ```

use crate::{
    Result,
    constants::{BOARD_SIZE, BOARD_WIDTH, EMPTY_LETTER},
    error::Error,
    types::PieceKind,
};

/// Expand a FEN board field into a 64-character raw string.
///
/// Anything after the first whitespace (side to move, castling, ...) is
/// ignored, so full FEN strings are accepted.
///
/// # Errors
/// Returns `Error::InvalidFen` if the placement does not describe exactly 64
/// fields or contains an unknown character.
pub fn fen_to_raw(fen: &str) -> Result<String> {
    let placement = fen
        .split_whitespace()
        .next()
        .ok_or_else(|| Error::InvalidFen("empty FEN".to_string()))?;

    let mut raw = String::with_capacity(BOARD_SIZE);
    let mut count = 0usize;

    for ch in placement.chars() {
        match ch {
            '/' => continue,
            '1'..='8' => {
                let run = ch as usize - '0' as usize;
                raw.extend(std::iter::repeat_n(EMPTY_LETTER, run));
                count += run;
            }
            letter => {
                PieceKind::from_letter(letter)
                    .map_err(|_| Error::InvalidFen(format!("unexpected character {letter:?}")))?;
                raw.push(letter);
                count += 1;
            }
        }

        if count > BOARD_SIZE {
            return Err(Error::InvalidFen(format!(
                "placement describes more than {BOARD_SIZE} fields"
            )));
        }
    }

    if count != BOARD_SIZE {
        return Err(Error::InvalidFen(format!(
            "placement describes {count} fields, expected {BOARD_SIZE}"
        )));
    }

    Ok(raw)
}

/// Compress a 64-character raw string into a FEN board field.
///
/// Characters other than `.` are copied through unchanged; the caller is
/// expected to pass a valid raw string.
pub fn raw_to_fen(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut fen = String::with_capacity(BOARD_SIZE + BOARD_WIDTH);

    for (rank, row) in chars.chunks(BOARD_WIDTH).enumerate() {
        let mut empty_run = 0u32;
        for &ch in row {
            if ch == EMPTY_LETTER {
                empty_run += 1;
            } else {
                if empty_run > 0 {
                    fen.push_str(&empty_run.to_string());
                    empty_run = 0;
                }
                fen.push(ch);
            }
        }
        if empty_run > 0 {
            fen.push_str(&empty_run.to_string());
        }
        if rank + 1 < BOARD_WIDTH {
            fen.push('/');
        }
    }

    fen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::START_RAW;
    use rstest::rstest;

    #[rstest]
    #[case(
        "8/8/8/8/8/8/8/8",
        "................................................................"
    )]
    #[case(
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        "rnbqkbnrpppppppp....................P...........PPPP.PPPRNBQKBNR"
    )]
    #[case(
        "8/3k4/8/8/2p5/5K2/1P1P4/8",
        "...........k......................p..........K...P.P............"
    )]
    fn test_fen_to_raw(#[case] fen: &str, #[case] raw: &str) {
        assert_eq!(fen_to_raw(fen).unwrap(), raw);
    }

    #[test]
    fn test_raw_to_fen_start_position() {
        assert_eq!(raw_to_fen(START_RAW), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
    }

    #[test]
    fn test_raw_to_fen_trailing_runs() {
        let raw = format!("{}{}", "k".to_string() + &".".repeat(62), "K");
        assert_eq!(raw_to_fen(&raw), "k7/8/8/8/8/8/8/7K");
    }

    #[rstest]
    #[case("")]
    #[case("8/8/8")]
    #[case("9/8/8/8/8/8/8/8")]
    #[case("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNRR")]
    #[case("rnbqkbnr/ppxppppp/8/8/8/8/PPPPPPPP/RNBQKBNR")]
    fn test_fen_to_raw_invalid(#[case] fen: &str) {
        assert!(fen_to_raw(fen).is_err());
    }
}
