use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Board model errors
    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid piece letter: {0:?}")]
    InvalidPiece(char),

    #[error("Invalid raw board: {0}")]
    InvalidRaw(String),

    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    // Protocol errors
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    #[error("Unexpected message length: expected {expected}, got {actual}")]
    UnexpectedLength { expected: usize, actual: usize },

    #[error("Invalid command code: {0}")]
    InvalidCommandCode(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
