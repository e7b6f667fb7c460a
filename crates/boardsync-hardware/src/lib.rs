//! Board link layer for sensor chessboards.
//!
//! This crate connects to a board over a byte transport, runs the device
//! handshake, keeps the live and confirmed snapshots, debounces field
//! updates and publishes what it sees as [`BoardEvent`]s.
//!
//! # Architecture
//!
//! ```text
//!  Transport ──bytes──► Board task ──BoardEvent──► subscribers
//!  (serial / mock)       │  FrameQueue                (broadcast)
//!                        │  ChangeAggregator
//!                        │  live + confirmed Snapshot
//!                        ▲
//!                  BoardHandle commands (mpsc)
//! ```
//!
//! The board task is the single owner of all board state. Everything else
//! talks to it through a [`BoardHandle`], which is cheap to clone.
//!
//! # Example
//!
//! ```no_run
//! use boardsync_hardware::{Board, BoardConfig, BoardEvent, mock::MockTransport};
//!
//! # async fn example() -> boardsync_hardware::Result<()> {
//! let (transport, _device) = MockTransport::new();
//! let board = Board::spawn(transport, BoardConfig::default())?;
//!
//! let mut events = board.subscribe();
//! board.wait_ready().await?;
//!
//! while let Ok(event) = events.recv().await {
//!     if let BoardEvent::Changed { board } = event {
//!         for line in board.ascii() {
//!             println!("{line}");
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] with a
//! [`HardwareError`]. The board task itself never returns errors to its
//! handles: it logs the failure and stops, after which every handle call
//! fails with `Disconnected`.

pub mod aggregator;
pub mod board;
pub mod config;
pub mod error;
pub mod link;
pub mod mock;
pub mod transport;
pub mod types;

pub use aggregator::{ChangeAggregator, DebounceState};
pub use board::{Board, BoardHandle};
pub use config::BoardConfig;
pub use error::{HardwareError, Result};
pub use link::LinkState;
pub use transport::{SerialTransport, Transport};
pub use types::{BoardEvent, DeviceInfo};
