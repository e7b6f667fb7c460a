//! Debouncing of field updates.
//!
//! A single physical move produces a burst of field updates: the lift, an
//! optional capture removal and the placement, spread over a few hundred
//! milliseconds. The [`ChangeAggregator`] buffers them and releases the
//! whole burst once the board has been quiet for the debounce window.
//!
//! # Debounce State
//!
//! ```text
//!            push                         push (re-arm)
//!  ┌──────┐ ──────► ┌────────────────┐ ◄──────────────┐
//!  │ Idle │         │ Armed{deadline}│ ───────────────┘
//!  └──────┘ ◄────── └────────────────┘
//!        fire at deadline (drains buffer)
//! ```
//!
//! The aggregator never reads the clock itself. The board task passes the
//! current instant in, and sleeps until [`ChangeAggregator::deadline`].

use boardsync_protocol::FieldUpdate;
use std::time::Duration;
use tokio::time::Instant;

/// Debounce timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No updates buffered.
    Idle,

    /// Updates buffered; release them at `deadline` unless another arrives.
    Armed { deadline: Instant },
}

/// Buffer of field updates awaiting the end of a burst.
#[derive(Debug)]
pub struct ChangeAggregator {
    window: Duration,
    buffer: Vec<FieldUpdate>,
    state: DebounceState,
}

impl ChangeAggregator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            buffer: Vec::new(),
            state: DebounceState::Idle,
        }
    }

    /// Buffer an update and restart the debounce window from `now`.
    pub fn push(&mut self, update: FieldUpdate, now: Instant) {
        self.buffer.push(update);
        self.state = DebounceState::Armed {
            deadline: now + self.window,
        };
    }

    /// When the buffered burst is due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Idle => None,
            DebounceState::Armed { deadline } => Some(deadline),
        }
    }

    /// Release the buffered updates if the window has elapsed at `now`.
    ///
    /// Returns the updates in arrival order and returns to `Idle`. Returns
    /// `None` while idle or before the deadline.
    pub fn fire(&mut self, now: Instant) -> Option<Vec<FieldUpdate>> {
        match self.state {
            DebounceState::Armed { deadline } if now >= deadline => {
                self.state = DebounceState::Idle;
                Some(std::mem::take(&mut self.buffer))
            }
            _ => None,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
