pub mod constants;
pub mod error;
pub mod fen;
pub mod inference;
pub mod snapshot;
pub mod types;

pub use error::{Error, Result};
pub use inference::{BoardMove, Detection, Placement, find_move};
pub use snapshot::Snapshot;
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
