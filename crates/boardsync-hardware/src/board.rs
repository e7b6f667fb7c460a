//! Board task and its handle.
//!
//! [`Board::spawn`] starts one tokio task per board connection. The task
//! owns everything mutable about the board: the framer, the live snapshot,
//! the confirmed snapshot and the change aggregator. It is driven by four
//! sources, multiplexed with `tokio::select!`:
//!
//! - inbound byte chunks from the transport
//! - commands from [`BoardHandle`]s
//! - the quiet-window deadline while stabilizing
//! - the debounce deadline while a burst of updates is buffered
//!
//! # Lifecycle
//!
//! ```text
//! reset ─► quiet window ─► serial (8) ─► version (5) ─► dump (67)
//!                                                         │
//!          Ready, confirmed = dump, update mode ◄─────────┘
//!                                                         │
//!          5-byte field updates ─► debounce ─► Changed ─► move detection
//! ```
//!
//! Bytes that arrive during the quiet window are discarded and restart it.
//! The task ends when the transport closes or every handle is dropped.

use crate::{
    HardwareError, Result,
    aggregator::ChangeAggregator,
    config::BoardConfig,
    link::LinkState,
    transport::Transport,
    types::{BoardEvent, DeviceInfo},
};
use boardsync_core::{Color, Detection, Snapshot, Square, find_move};
use boardsync_protocol::{
    Command, FieldUpdate, FirmwareVersion, Frame, FrameQueue, SerialNumber, decode_board_dump,
    messages::{BOARD_DUMP_LEN, FIELD_UPDATE_LEN, SERIAL_NUMBER_LEN, VERSION_LEN},
};
use bytes::Bytes;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, trace, warn};

/// Capacity of the command mailbox.
const COMMAND_CAPACITY: usize = 32;

/// What an expected frame will contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    SerialNumber,
    Version,
    BoardDump,
    FieldUpdate,
    /// Commands with no response.
    Discard,
}

/// Requests sent from a [`BoardHandle`] to the board task.
#[derive(Debug)]
enum BoardCommand {
    Snapshot(oneshot::Sender<Snapshot>),
    Confirmed(oneshot::Sender<Snapshot>),
    Commit {
        color: Color,
        overlay: Snapshot,
        cleared: Vec<Square>,
    },
    Reset,
    ResetTo(Snapshot),
    Redetect,
    SetDetectMoves(bool),
}

/// The board task.
pub struct Board<T: Transport> {
    transport: T,
    config: BoardConfig,
    state: LinkState,
    frames: FrameQueue<Expect>,
    quiet_until: Option<Instant>,
    aggregator: ChangeAggregator,

    /// Live physical state.
    data: Snapshot,
    /// Last state known to be in sync with the game.
    prev: Snapshot,
    detect_moves: bool,

    serial_number: Option<SerialNumber>,
    firmware_version: Option<FirmwareVersion>,

    events: broadcast::Sender<BoardEvent>,
    ready: watch::Sender<Option<DeviceInfo>>,
}

impl<T: Transport> Board<T> {
    /// Validate `config`, start the board task on the current runtime and
    /// return a handle to it.
    ///
    /// The reset command is written before this returns.
    ///
    /// # Errors
    /// Returns an error if the config is invalid, the transport's inbound
    /// stream was already taken, or the reset cannot be written.
    pub fn spawn(mut transport: T, config: BoardConfig) -> Result<BoardHandle> {
        config.validate()?;

        let inbound = transport
            .take_inbound()
            .ok_or_else(|| HardwareError::communication("transport inbound already taken"))?;

        let (events, _) = broadcast::channel(config.event_capacity);
        let (ready, ready_rx) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);

        let mut board = Board {
            transport,
            aggregator: ChangeAggregator::new(config.debounce()),
            detect_moves: config.detect_moves,
            config,
            state: LinkState::Stabilizing,
            frames: FrameQueue::new(),
            quiet_until: None,
            data: Snapshot::empty(),
            prev: Snapshot::empty(),
            serial_number: None,
            firmware_version: None,
            events: events.clone(),
            ready,
        };

        info!("Resetting board on {}", board.transport.name());
        board.transport.write_all(&[Command::Reset.as_byte()])?;
        board.restart_quiet_window();

        tokio::spawn(board.run(inbound, command_rx));

        Ok(BoardHandle {
            commands: command_tx,
            events,
            ready: ready_rx,
        })
    }

    async fn run(
        mut self,
        mut inbound: mpsc::Receiver<Bytes>,
        mut commands: mpsc::Receiver<BoardCommand>,
    ) {
        loop {
            let quiet = self.quiet_until;
            let debounce = self.aggregator.deadline();

            let step = tokio::select! {
                chunk = inbound.recv() => match chunk {
                    Some(bytes) => self.on_bytes(&bytes),
                    None => {
                        info!("Transport {} closed", self.transport.name());
                        break;
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => {
                        debug!("All board handles dropped");
                        break;
                    }
                },
                _ = sleep_until_some(quiet) => self.on_quiet(),
                _ = sleep_until_some(debounce) => {
                    self.on_debounce();
                    Ok(())
                }
            };

            if let Err(e) = step {
                warn!("Board task stopping: {}", e);
                break;
            }
        }

        self.state = LinkState::Closed;
        self.ready.send_replace(None);
    }

    fn restart_quiet_window(&mut self) {
        self.quiet_until = Some(Instant::now() + self.config.quiet_window());
    }

    fn set_state(&mut self, next: LinkState) -> Result<()> {
        self.state = self.state.transition_to(next)?;
        debug!(state = %self.state, "Board link state changed");
        Ok(())
    }

    /// Write `command` (if any) and expect a `len`-byte response.
    fn request(&mut self, command: Option<Command>, len: usize, expect: Expect) -> Result<()> {
        if let Some(command) = command {
            trace!(%command, len, "Sending command");
            self.transport.write_all(&[command.as_byte()])?;
        }
        self.frames.enqueue(len, expect);
        Ok(())
    }

    fn emit(&self, event: BoardEvent) {
        trace!(event = event.name(), "Board event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn on_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.state == LinkState::Stabilizing {
            trace!(len = bytes.len(), "Discarding bytes during stabilization");
            self.restart_quiet_window();
            return Ok(());
        }

        self.frames.feed(bytes);
        while let Some(frame) = self.frames.next_frame() {
            self.on_frame(frame)?;
        }
        Ok(())
    }

    fn on_quiet(&mut self) -> Result<()> {
        self.quiet_until = None;
        debug!("Board line quiet, starting handshake");
        self.set_state(LinkState::ReadingSerial)?;
        self.request(
            Some(Command::SendSerialNumber),
            SERIAL_NUMBER_LEN,
            Expect::SerialNumber,
        )
    }

    fn on_frame(&mut self, frame: Frame<Expect>) -> Result<()> {
        match frame.tag {
            Expect::SerialNumber => {
                let serial = SerialNumber::decode(&frame.payload).unwrap_or_else(|e| {
                    warn!("Unreadable serial number: {}", e);
                    SerialNumber::new(String::new())
                });
                debug!(serial = %serial, "Serial number received");
                self.serial_number = Some(serial);

                self.set_state(LinkState::ReadingVersion)?;
                self.request(Some(Command::SendVersion), VERSION_LEN, Expect::Version)
            }
            Expect::Version => {
                let version = FirmwareVersion::decode(&frame.payload)?;
                debug!(version = %version, "Firmware version received");
                self.firmware_version = Some(version);

                self.set_state(LinkState::ReadingBoard)?;
                self.request(Some(Command::SendBoard), BOARD_DUMP_LEN, Expect::BoardDump)
            }
            Expect::BoardDump => {
                self.data = decode_board_dump(&frame.payload)?;
                self.prev = self.data;
                self.set_state(LinkState::Streaming)?;

                let info = DeviceInfo::new(
                    self.transport.name(),
                    self.serial_number.clone().unwrap_or_else(|| SerialNumber::new("")),
                    self.firmware_version.unwrap_or(FirmwareVersion::new(0, 0)),
                );
                info!(
                    serial = %info.serial_number,
                    version = %info.firmware_version,
                    "Board ready"
                );
                self.ready.send_replace(Some(info.clone()));
                self.emit(BoardEvent::Ready(info));

                let mode = self.config.update_mode;
                debug!(%mode, "Selecting update mode");
                self.request(Some(mode.command()), 0, Expect::Discard)?;
                self.request(None, FIELD_UPDATE_LEN, Expect::FieldUpdate)
            }
            Expect::FieldUpdate => {
                match FieldUpdate::decode(&frame.payload) {
                    Ok(update) => {
                        trace!(%update, "Field update");
                        self.emit(BoardEvent::Data(update));
                        self.aggregator.push(update, Instant::now());
                    }
                    Err(e) => warn!("Dropping field update: {}", e),
                }
                self.request(None, FIELD_UPDATE_LEN, Expect::FieldUpdate)
            }
            Expect::Discard => Ok(()),
        }
    }

    fn on_debounce(&mut self) {
        let Some(changes) = self.aggregator.fire(Instant::now()) else {
            return;
        };

        for change in &changes {
            self.data.set(change.square, change.cell);
        }
        debug!(changes = changes.len(), "Applied field updates");
        self.emit(BoardEvent::Changed { board: self.data });

        if self.detect_moves {
            self.detect();
        }
    }

    /// Run move detection for both colors against the confirmed snapshot.
    fn detect(&self) {
        for color in Color::ALL {
            match find_move(color, &self.prev, &self.data) {
                Detection::Move(mv) => {
                    info!(%color, mv = %mv, "Move detected");
                    self.emit(BoardEvent::Move { color, mv });
                }
                Detection::Invalid { vacated, occupied } => {
                    debug!(
                        %color,
                        vacated = vacated.len(),
                        occupied = occupied.len(),
                        "Invalid changes"
                    );
                    self.emit(BoardEvent::InvalidChanges {
                        color,
                        vacated,
                        occupied,
                    });
                }
                Detection::Rejected { vacated, occupied } => {
                    debug!(%color, %vacated, %occupied, "Promotion piece rejected");
                }
                Detection::NoMove => {}
            }
        }
    }

    fn on_command(&mut self, command: BoardCommand) -> Result<()> {
        match command {
            BoardCommand::Snapshot(reply) => {
                let _ = reply.send(self.data);
            }
            BoardCommand::Confirmed(reply) => {
                let _ = reply.send(self.prev);
            }
            BoardCommand::Commit {
                color,
                overlay,
                cleared,
            } => {
                self.prev.commit_overlay(color, &overlay, cleared);
                debug!(%color, confirmed = %self.prev, "Committed overlay");
            }
            BoardCommand::Reset => {
                self.prev = self.data;
                debug!("Confirmed snapshot reset to live board");
                self.emit(BoardEvent::Changed { board: self.data });
            }
            BoardCommand::ResetTo(snapshot) => {
                self.prev = snapshot;
                debug!(confirmed = %self.prev, "Confirmed snapshot replaced");
            }
            BoardCommand::Redetect => {
                if self.detect_moves {
                    self.detect();
                }
            }
            BoardCommand::SetDetectMoves(enabled) => {
                self.detect_moves = enabled;
                debug!(enabled, "Move detection toggled");
            }
        }
        Ok(())
    }
}

async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Cloneable handle to a running board task.
///
/// # Examples
///
/// ```no_run
/// use boardsync_hardware::{Board, BoardConfig, BoardEvent, SerialTransport};
///
/// # async fn example() -> boardsync_hardware::Result<()> {
/// let config = BoardConfig::with_port("/dev/ttyUSB0");
/// let board = Board::spawn(SerialTransport::open(&config)?, config)?;
///
/// let mut events = board.subscribe();
/// let info = board.wait_ready().await?;
/// println!("Board {} ready", info.serial_number);
///
/// while let Ok(event) = events.recv().await {
///     if let BoardEvent::Move { color, mv } = event {
///         println!("{color} played {mv}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BoardHandle {
    commands: mpsc::Sender<BoardCommand>,
    events: broadcast::Sender<BoardEvent>,
    ready: watch::Receiver<Option<DeviceInfo>>,
}

impl BoardHandle {
    /// Subscribe to board events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Wait until the handshake has completed.
    ///
    /// Returns at once if the board is already ready.
    ///
    /// # Errors
    /// Returns `Disconnected` if the board task ends first.
    pub async fn wait_ready(&self) -> Result<DeviceInfo> {
        let mut ready = self.ready.clone();
        let info = ready
            .wait_for(Option::is_some)
            .await
            .map_err(|_| HardwareError::disconnected("board task"))?;
        info.clone()
            .ok_or_else(|| HardwareError::disconnected("board task"))
    }

    /// Device info, if the handshake has completed.
    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.ready.borrow().clone()
    }

    /// Current live snapshot.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(BoardCommand::Snapshot(tx)).await?;
        rx.await
            .map_err(|_| HardwareError::disconnected("board task"))
    }

    /// Current confirmed snapshot.
    pub async fn confirmed(&self) -> Result<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(BoardCommand::Confirmed(tx)).await?;
        rx.await
            .map_err(|_| HardwareError::disconnected("board task"))
    }

    /// Merge `color`'s part of `overlay` into the confirmed snapshot and
    /// empty the `cleared` squares.
    pub async fn commit(
        &self,
        color: Color,
        overlay: Snapshot,
        cleared: impl IntoIterator<Item = Square>,
    ) -> Result<()> {
        self.send(BoardCommand::Commit {
            color,
            overlay,
            cleared: cleared.into_iter().collect(),
        })
        .await
    }

    /// Make the confirmed snapshot equal to the live board and publish a
    /// `Changed` event.
    pub async fn reset(&self) -> Result<()> {
        self.send(BoardCommand::Reset).await
    }

    /// Replace the confirmed snapshot.
    pub async fn reset_to(&self, snapshot: Snapshot) -> Result<()> {
        self.send(BoardCommand::ResetTo(snapshot)).await
    }

    /// Run move detection again without waiting for new field updates.
    pub async fn redetect(&self) -> Result<()> {
        self.send(BoardCommand::Redetect).await
    }

    pub async fn set_detect_moves(&self, enabled: bool) -> Result<()> {
        self.send(BoardCommand::SetDetectMoves(enabled)).await
    }

    async fn send(&self, command: BoardCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| HardwareError::disconnected("board task"))
    }
}
