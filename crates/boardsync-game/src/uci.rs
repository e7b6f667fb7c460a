//! UCI engine driven over a child process's standard streams.
//!
//! # Session
//!
//! ```text
//! uci          ──► id ... / option ... / uciok
//! ucinewgame
//! isready      ──► readyok
//! position fen <fen>
//! go depth <n> ──► info ... / bestmove <uci> [ponder <uci>]
//! ```
//!
//! `MultiPV` is sent as a `setoption` before the first search and again only
//! when the budget changes it.

use crate::{
    config::SearchBudget,
    engine::{Engine, SearchResult},
    error::EngineError,
};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, trace, warn};

/// Default time allowed for any single engine reply.
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 10_000;

/// How to start one UCI engine.
///
/// # Examples
///
/// ```
/// use boardsync_game::uci::UciEngineConfig;
///
/// let config: UciEngineConfig =
///     serde_json::from_str(r#"{ "name": "sf", "path": "/usr/bin/stockfish" }"#).unwrap();
/// assert!(config.args.is_empty());
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UciEngineConfig {
    /// Name used in logs and events.
    pub name: String,

    /// Engine binary.
    pub path: String,

    pub args: Vec<String>,

    pub response_timeout_ms: u64,
}

impl Default for UciEngineConfig {
    fn default() -> Self {
        Self {
            name: "stockfish".to_string(),
            path: "stockfish".to_string(),
            args: Vec::new(),
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
        }
    }
}

impl UciEngineConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// # Errors
    /// Returns `Error::Config` if the path is empty or the timeout is zero.
    pub fn validate(&self) -> boardsync_core::Result<()> {
        if self.path.trim().is_empty() {
            return Err(boardsync_core::Error::Config(format!(
                "engine {}: path must not be empty",
                self.name
            )));
        }
        if self.response_timeout_ms == 0 {
            return Err(boardsync_core::Error::Config(format!(
                "engine {}: response_timeout_ms must be greater than zero",
                self.name
            )));
        }
        Ok(())
    }
}

/// A UCI engine speaking over a writer and a line reader.
///
/// [`UciEngine::spawn`] wires it to a child process; [`UciEngine::from_io`]
/// accepts any pair of async streams.
pub struct UciEngine<W = ChildStdin, R = ChildStdout> {
    name: String,
    writer: W,
    lines: Lines<BufReader<R>>,
    timeout: Duration,
    /// `MultiPV` last sent to the engine.
    multi_pv: Option<u32>,
    /// Kept so the process lives as long as the engine and is killed with it.
    _child: Option<Child>,
}

impl UciEngine {
    /// Start the engine process and complete the UCI handshake.
    ///
    /// # Errors
    /// Returns an error if the config is invalid, the process cannot be
    /// started, or the handshake fails or times out.
    pub async fn spawn(config: &UciEngineConfig) -> Result<Self, EngineError> {
        config
            .validate()
            .map_err(|e| EngineError::failed(&config.name, e.to_string()))?;

        info!(engine = %config.name, path = %config.path, "Starting UCI engine");
        let mut child = Command::new(&config.path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::failed(&config.name, e.to_string()))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(EngineError::failed(&config.name, "standard streams not piped"));
        };

        let mut engine = Self::from_io(&config.name, stdin, stdout, config.response_timeout());
        engine._child = Some(child);
        engine.init().await?;
        Ok(engine)
    }
}

impl<W, R> UciEngine<W, R>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    /// Engine on already connected streams. Call [`init`](Self::init) before use.
    pub fn from_io(name: impl Into<String>, writer: W, reader: R, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            writer,
            lines: BufReader::new(reader).lines(),
            timeout,
            multi_pv: None,
            _child: None,
        }
    }

    /// Run the UCI handshake and start a new game.
    ///
    /// # Errors
    /// Returns an error if the engine does not answer `uciok` and `readyok`.
    pub async fn init(&mut self) -> Result<(), EngineError> {
        self.send("uci").await?;
        loop {
            let line = self.read_line().await?;
            if let Some(id) = line.strip_prefix("id name ") {
                debug!(engine = %self.name, id, "Engine identified");
            } else if line.trim() == "uciok" {
                break;
            }
        }
        self.send("ucinewgame").await?;
        self.is_ready().await?;
        info!(engine = %self.name, "UCI engine ready");
        Ok(())
    }

    /// # Errors
    /// Returns an error if the engine does not answer `readyok`.
    pub async fn is_ready(&mut self) -> Result<(), EngineError> {
        self.send("isready").await?;
        while self.read_line().await?.trim() != "readyok" {}
        Ok(())
    }

    async fn send(&mut self, command: &str) -> Result<(), EngineError> {
        trace!(engine = %self.name, command, "UCI >");
        let writer = &mut self.writer;
        let write = async {
            writer.write_all(command.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        };
        match tokio::time::timeout(self.timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!(engine = %self.name, "Write failed: {e}");
                Err(EngineError::disconnected(&self.name))
            }
            Err(_) => Err(EngineError::failed(
                &self.name,
                format!("write timeout after {}ms", self.timeout.as_millis()),
            )),
        }
    }

    async fn read_line(&mut self) -> Result<String, EngineError> {
        match tokio::time::timeout(self.timeout, self.lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                trace!(engine = %self.name, %line, "UCI <");
                Ok(line)
            }
            Ok(Ok(None)) => {
                warn!(engine = %self.name, "Engine closed its output");
                Err(EngineError::disconnected(&self.name))
            }
            Ok(Err(e)) => Err(EngineError::failed(&self.name, e.to_string())),
            Err(_) => Err(EngineError::failed(
                &self.name,
                format!("no response within {}ms", self.timeout.as_millis()),
            )),
        }
    }
}

impl<W, R> Engine for UciEngine<W, R>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn position(&mut self, fen: &str) -> Result<(), EngineError> {
        self.send(&format!("position fen {fen}")).await
    }

    async fn go(&mut self, budget: SearchBudget) -> Result<SearchResult, EngineError> {
        if self.multi_pv != Some(budget.multi_pv) {
            self.send(&format!("setoption name MultiPV value {}", budget.multi_pv))
                .await?;
            self.is_ready().await?;
            self.multi_pv = Some(budget.multi_pv);
        }

        self.send(&format!("go depth {}", budget.depth)).await?;
        loop {
            let line = self.read_line().await?;
            if let Some(result) = parse_bestmove(&line) {
                return result.ok_or_else(|| EngineError::failed(&self.name, "no legal move"));
            }
        }
    }
}

impl<W, R> std::fmt::Debug for UciEngine<W, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UciEngine")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("multi_pv", &self.multi_pv)
            .finish_non_exhaustive()
    }
}

/// `Some` for a `bestmove` line; the inner `None` means the engine had no move.
fn parse_bestmove(line: &str) -> Option<Option<SearchResult>> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "bestmove" {
        return None;
    }
    let best = match tokens.next() {
        Some(mv) if mv != "(none)" && mv != "0000" => mv,
        _ => return Some(None),
    };
    let ponder = match (tokens.next(), tokens.next()) {
        (Some("ponder"), Some(mv)) => Some(mv.to_string()),
        _ => None,
    };
    Some(Some(SearchResult {
        best_move: best.to_string(),
        ponder,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tokio::io::{DuplexStream, ReadHalf, WriteHalf, duplex, split};
    use tokio::task::JoinHandle;

    type TestEngine = UciEngine<WriteHalf<DuplexStream>, ReadHalf<DuplexStream>>;

    /// Fake engine answering every `go` with `bestmove`. Returns the commands
    /// it received once the client hangs up.
    fn fake_engine(bestmove: &'static str) -> (TestEngine, JoinHandle<Vec<String>>) {
        let (client, server) = duplex(4096);
        let (client_r, client_w) = split(client);
        let engine = UciEngine::from_io("fake", client_w, client_r, Duration::from_secs(1));

        let task = tokio::spawn(async move {
            let (server_r, mut server_w) = split(server);
            let mut lines = BufReader::new(server_r).lines();
            let mut seen = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                let reply = match line.split_whitespace().next() {
                    Some("uci") => "id name Fake 1.0\noption name MultiPV type spin\nuciok\n".to_string(),
                    Some("isready") => "readyok\n".to_string(),
                    Some("go") => format!("info depth 1 score cp 20 pv {bestmove}\n{bestmove}\n"),
                    _ => String::new(),
                };
                seen.push(line);
                if server_w.write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
            }
            seen
        });
        (engine, task)
    }

    #[rstest]
    #[case("bestmove e2e4", Some(("e2e4", None)))]
    #[case("bestmove e7e8q ponder a2a1", Some(("e7e8q", Some("a2a1"))))]
    #[case("bestmove e2e4 ponder", Some(("e2e4", None)))]
    fn test_parse_bestmove(#[case] line: &str, #[case] expected: Option<(&str, Option<&str>)>) {
        let expected = expected.map(|(best, ponder)| SearchResult {
            best_move: best.to_string(),
            ponder: ponder.map(str::to_string),
        });
        assert_eq!(parse_bestmove(line), Some(expected));
    }

    #[rstest]
    #[case("bestmove (none)")]
    #[case("bestmove 0000")]
    #[case("bestmove")]
    fn test_parse_bestmove_without_move(#[case] line: &str) {
        assert_eq!(parse_bestmove(line), Some(None));
    }

    #[test]
    fn test_parse_ignores_other_lines() {
        assert_eq!(parse_bestmove("info depth 1 pv e2e4"), None);
        assert_eq!(parse_bestmove(""), None);
    }

    #[test]
    fn test_config_validation() {
        assert!(UciEngineConfig::default().validate().is_ok());
        let empty = UciEngineConfig {
            path: " ".to_string(),
            ..Default::default()
        };
        assert!(empty.validate().is_err());
        let no_timeout = UciEngineConfig {
            response_timeout_ms: 0,
            ..Default::default()
        };
        assert!(no_timeout.validate().is_err());
    }

    #[tokio::test]
    async fn test_session_commands() {
        let (mut engine, task) = fake_engine("bestmove e7e5 ponder g1f3");
        engine.init().await.unwrap();
        engine
            .position("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
            .await
            .unwrap();
        let result = engine.go(SearchBudget::default()).await.unwrap();
        assert_eq!(result.best_move, "e7e5");
        assert_eq!(result.ponder.as_deref(), Some("g1f3"));

        // Same budget again: no second setoption.
        engine.go(SearchBudget::default()).await.unwrap();
        drop(engine);

        let seen = task.await.unwrap();
        assert_eq!(
            seen,
            vec![
                "uci",
                "ucinewgame",
                "isready",
                "position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
                "setoption name MultiPV value 5",
                "isready",
                "go depth 1",
                "go depth 1",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_legal_move_fails() {
        let (mut engine, _task) = fake_engine("bestmove (none)");
        engine.init().await.unwrap();
        let err = engine.go(SearchBudget::default()).await.unwrap_err();
        assert!(matches!(err, EngineError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_closed_output_is_disconnect() {
        let (client, server) = duplex(256);
        let (client_r, client_w) = split(client);
        let mut engine = UciEngine::from_io("gone", client_w, client_r, Duration::from_secs(1));
        drop(server);

        let err = engine.init().await.unwrap_err();
        assert_eq!(err, EngineError::disconnected("gone"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_engine_times_out() {
        let (client, _server) = duplex(256);
        let (client_r, client_w) = split(client);
        let mut engine = UciEngine::from_io("mute", client_w, client_r, Duration::from_secs(2));

        let err = engine.init().await.unwrap_err();
        assert!(matches!(err, EngineError::Failed { ref name, .. } if name == "mute"));
    }
}
