//! Chess engine abstraction and the rotating engine pool.
//!
//! Engines use native `async fn` methods, so [`Engine`] is not object-safe.
//! Pools are generic over one engine type; mixing engine kinds goes through
//! an enum wrapper that implements the trait by delegation.

#![allow(async_fn_in_trait)]

use crate::config::SearchBudget;
use crate::error::EngineError;
use futures::future::try_join_all;
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of one engine search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Best move in UCI notation.
    pub best_move: String,

    pub ponder: Option<String>,
}

impl SearchResult {
    pub fn new(best_move: impl Into<String>) -> Self {
        Self {
            best_move: best_move.into(),
            ponder: None,
        }
    }
}

/// A chess engine: FEN in, best move out.
///
/// # Examples
///
/// ```no_run
/// use boardsync_game::{Engine, SearchBudget};
/// use boardsync_game::error::EngineError;
///
/// async fn think<E: Engine>(engine: &mut E, fen: &str) -> Result<String, EngineError> {
///     engine.position(fen).await?;
///     let result = engine.go(SearchBudget::default()).await?;
///     Ok(result.best_move)
/// }
/// ```
pub trait Engine {
    fn name(&self) -> &str;

    /// Set the position for the next search.
    async fn position(&mut self, fen: &str) -> Result<(), EngineError>;

    /// Search the current position within `budget`.
    async fn go(&mut self, budget: SearchBudget) -> Result<SearchResult, EngineError>;
}

/// Best move chosen for a turn, and which engine chose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineMove {
    pub engine: String,
    pub result: SearchResult,
}

/// Pool of engines taking turns.
///
/// The pool is shuffled once when built. Every turn all engines receive the
/// position, and the engine at the rotating index searches it.
#[derive(Debug)]
pub struct EngineAdapter<E> {
    engines: Vec<E>,
    budget: SearchBudget,
    /// Engine that searches the next turn.
    index: usize,
    /// Engine that searched the last turn.
    last_index: usize,
}

impl<E: Engine> EngineAdapter<E> {
    /// # Errors
    /// Returns `EngineError::NoEngines` if `engines` is empty.
    pub fn new(engines: Vec<E>, budget: SearchBudget) -> Result<Self, EngineError> {
        Self::with_rng(engines, budget, &mut rand::thread_rng())
    }

    /// Build the pool with an explicit shuffle source.
    ///
    /// # Errors
    /// Returns `EngineError::NoEngines` if `engines` is empty.
    pub fn with_rng<R: Rng + ?Sized>(
        mut engines: Vec<E>,
        budget: SearchBudget,
        rng: &mut R,
    ) -> Result<Self, EngineError> {
        if engines.is_empty() {
            return Err(EngineError::NoEngines);
        }
        engines.shuffle(rng);

        let names: Vec<&str> = engines.iter().map(Engine::name).collect();
        info!(engines = ?names, "Engine pool ready");

        Ok(Self {
            engines,
            budget,
            index: 0,
            last_index: 0,
        })
    }

    /// Name of the engine that searched last, or will search first.
    pub fn name(&self) -> &str {
        self.engines
            .get(self.last_index)
            .map(Engine::name)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn budget(&self) -> SearchBudget {
        self.budget
    }

    pub fn engines(&self) -> &[E] {
        &self.engines
    }

    /// Ask the pool for a move in `fen`.
    ///
    /// A `retry` is a second request for the same turn, after the previous
    /// answer was rejected; it goes to the engine that answered last and does
    /// not advance the rotation.
    ///
    /// # Errors
    /// Returns the first engine error raised while sending the position or
    /// searching.
    pub async fn best_move(&mut self, fen: &str, retry: bool) -> Result<EngineMove, EngineError> {
        try_join_all(self.engines.iter_mut().map(|engine| engine.position(fen))).await?;

        let index = if retry { self.last_index } else { self.index };
        let engine = self
            .engines
            .get_mut(index)
            .ok_or(EngineError::NoEngines)?;
        let result = engine.go(self.budget).await?;
        let name = engine.name().to_string();
        debug!(engine = %name, best_move = %result.best_move, retry, "Engine answered");

        self.last_index = index;
        if !retry && self.engines.len() > 1 {
            self.index = (index + 1) % self.engines.len();
        }

        Ok(EngineMove {
            engine: name,
            result,
        })
    }

    /// Undo the rotation step of the last turn.
    pub fn take_back(&mut self) {
        self.index = self.last_index;
    }
}
