//! Mock chess engine.
//!
//! [`MockEngine`] answers searches with moves queued through its paired
//! [`MockEngineHandle`], and reports every request it receives back to the
//! handle.

use crate::{
    config::SearchBudget,
    engine::{Engine, SearchResult},
    error::EngineError,
};
use tokio::sync::mpsc;
use tracing::trace;

/// Request received by a mock engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineRequest {
    Position(String),
    Go(SearchBudget),
}

/// Engine half given to an [`EngineAdapter`](crate::EngineAdapter).
///
/// # Examples
///
/// ```
/// use boardsync_game::{Engine, SearchBudget, mock::MockEngine};
///
/// #[tokio::main]
/// async fn main() -> Result<(), boardsync_game::error::EngineError> {
///     let (mut engine, _handle) = MockEngine::scripted("mock", ["e2e4"]);
///     let result = engine.go(SearchBudget::default()).await?;
///     assert_eq!(result.best_move, "e2e4");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockEngine {
    name: String,
    moves_rx: mpsc::UnboundedReceiver<String>,
    requests_tx: mpsc::UnboundedSender<EngineRequest>,
}

impl MockEngine {
    pub fn new(name: impl Into<String>) -> (Self, MockEngineHandle) {
        let name = name.into();
        let (moves_tx, moves_rx) = mpsc::unbounded_channel();
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();

        let engine = Self {
            name: name.clone(),
            moves_rx,
            requests_tx,
        };
        let handle = MockEngineHandle {
            name,
            moves_tx,
            requests_rx,
        };
        (engine, handle)
    }

    /// Engine with `moves` already queued, in order.
    pub fn scripted<I, S>(name: impl Into<String>, moves: I) -> (Self, MockEngineHandle)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (engine, handle) = Self::new(name);
        for uci in moves {
            // Receiver is alive: it is owned by `engine`.
            let _ = handle.moves_tx.send(uci.into());
        }
        (engine, handle)
    }

    fn record(&self, request: EngineRequest) {
        // Nobody listening is fine.
        let _ = self.requests_tx.send(request);
    }
}

impl Engine for MockEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn position(&mut self, fen: &str) -> Result<(), EngineError> {
        trace!(engine = %self.name, fen, "Mock engine position");
        self.record(EngineRequest::Position(fen.to_string()));
        Ok(())
    }

    async fn go(&mut self, budget: SearchBudget) -> Result<SearchResult, EngineError> {
        self.record(EngineRequest::Go(budget));
        let best_move = self
            .moves_rx
            .recv()
            .await
            .ok_or_else(|| EngineError::disconnected(&self.name))?;
        Ok(SearchResult::new(best_move))
    }
}

/// Script half of a mock engine.
#[derive(Debug)]
pub struct MockEngineHandle {
    name: String,
    moves_tx: mpsc::UnboundedSender<String>,
    requests_rx: mpsc::UnboundedReceiver<EngineRequest>,
}

impl MockEngineHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue the answer to a future search.
    pub fn queue_move(&self, uci: impl Into<String>) -> Result<(), EngineError> {
        self.moves_tx
            .send(uci.into())
            .map_err(|_| EngineError::disconnected(&self.name))
    }

    /// Next request the engine received, waiting for one if needed.
    ///
    /// Returns `None` once the engine is dropped and all requests are read.
    pub async fn next_request(&mut self) -> Option<EngineRequest> {
        self.requests_rx.recv().await
    }

    pub fn try_next_request(&mut self) -> Option<EngineRequest> {
        self.requests_rx.try_recv().ok()
    }
}
