//! Board link state machine.
//!
//! # States
//!
//! - `Stabilizing`: reset sent, waiting for the line to go quiet
//! - `ReadingSerial`, `ReadingVersion`, `ReadingBoard`: handshake steps,
//!   each started only after the previous response arrived
//! - `Streaming`: update mode selected, field updates flowing
//! - `Closed`: transport gone
//!
//! # Valid Transitions
//!
//! - Stabilizing → ReadingSerial → ReadingVersion → ReadingBoard → Streaming
//! - any state → Closed
//!
//! ```
//! use boardsync_hardware::LinkState;
//!
//! let state = LinkState::Stabilizing;
//! assert!(state.can_transition_to(&LinkState::ReadingSerial));
//! assert!(!state.can_transition_to(&LinkState::Streaming));
//! ```

use crate::{HardwareError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Stabilizing,
    ReadingSerial,
    ReadingVersion,
    ReadingBoard,
    Streaming,
    Closed,
}

impl LinkState {
    pub fn can_transition_to(&self, target: &LinkState) -> bool {
        matches!(
            (self, target),
            (LinkState::Stabilizing, LinkState::ReadingSerial)
                | (LinkState::ReadingSerial, LinkState::ReadingVersion)
                | (LinkState::ReadingVersion, LinkState::ReadingBoard)
                | (LinkState::ReadingBoard, LinkState::Streaming)
                | (_, LinkState::Closed)
        )
    }

    /// Validated transition.
    ///
    /// # Errors
    /// Returns `HardwareError::InvalidTransition` if the move is not allowed.
    pub fn transition_to(self, target: LinkState) -> Result<LinkState> {
        if !self.can_transition_to(&target) {
            return Err(HardwareError::InvalidTransition {
                from: self.to_string(),
                to: target.to_string(),
            });
        }
        Ok(target)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            LinkState::Stabilizing => "Stabilizing",
            LinkState::ReadingSerial => "ReadingSerial",
            LinkState::ReadingVersion => "ReadingVersion",
            LinkState::ReadingBoard => "ReadingBoard",
            LinkState::Streaming => "Streaming",
            LinkState::Closed => "Closed",
        };
        write!(f, "{name}")
    }
}
