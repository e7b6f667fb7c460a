//! Mock serial transport.
//!
//! [`MockTransport`] is handed to the board task like a real transport.
//! The paired [`MockTransportHandle`] plays the device: it sees every command
//! the host writes and pushes response bytes back.

use crate::{HardwareError, Result, transport::Transport};
use boardsync_core::Snapshot;
use boardsync_protocol::{Command, FieldUpdate, FirmwareVersion, SerialNumber, encode_board_dump};
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::trace;

const MOCK_CHANNEL_CAPACITY: usize = 64;

/// Transport half given to the board task.
///
/// # Examples
///
/// ```
/// use boardsync_hardware::mock::MockTransport;
/// use boardsync_hardware::transport::Transport;
/// use boardsync_protocol::Command;
///
/// #[tokio::main]
/// async fn main() -> boardsync_hardware::Result<()> {
///     let (mut transport, mut device) = MockTransport::new();
///     let mut inbound = transport.take_inbound().unwrap();
///
///     transport.write_all(&[Command::SendVersion.as_byte()])?;
///     assert_eq!(device.next_command().await?, Command::SendVersion);
///
///     device.send_bytes(vec![0x93, 0x00, 0x05, 1, 7]).await?;
///     assert_eq!(inbound.recv().await.unwrap().len(), 5);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    name: String,
    outbound_tx: mpsc::UnboundedSender<Bytes>,
    inbound_rx: Option<mpsc::Receiver<Bytes>>,
}

impl MockTransport {
    /// Create a mock transport with the default name.
    pub fn new() -> (Self, MockTransportHandle) {
        Self::with_name("mock-board")
    }

    /// Create a mock transport with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockTransportHandle) {
        let name = name.into();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::channel(MOCK_CHANNEL_CAPACITY);

        let transport = Self {
            name: name.clone(),
            outbound_tx,
            inbound_rx: Some(inbound_rx),
        };
        let handle = MockTransportHandle {
            name,
            inbound_tx,
            outbound_rx,
        };
        (transport, handle)
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.outbound_tx
            .send(Bytes::copy_from_slice(bytes))
            .map_err(|_| HardwareError::disconnected(&self.name))
    }

    fn take_inbound(&mut self) -> Option<mpsc::Receiver<Bytes>> {
        self.inbound_rx.take()
    }
}

/// Device half of a [`MockTransport`].
#[derive(Debug)]
pub struct MockTransportHandle {
    name: String,
    inbound_tx: mpsc::Sender<Bytes>,
    outbound_rx: mpsc::UnboundedReceiver<Bytes>,
}

impl MockTransportHandle {
    /// Push raw bytes to the host.
    ///
    /// # Errors
    /// Returns an error if the board task has dropped the inbound channel.
    pub async fn send_bytes(&self, bytes: impl Into<Bytes>) -> Result<()> {
        self.inbound_tx
            .send(bytes.into())
            .await
            .map_err(|_| HardwareError::disconnected(&self.name))
    }

    /// Push one field update frame.
    pub async fn send_update(&self, update: FieldUpdate) -> Result<()> {
        self.send_bytes(update.encode()).await
    }

    /// Wait for the next command the host writes.
    ///
    /// # Errors
    /// Returns `Disconnected` once the host side is dropped, and
    /// `InvalidData` if the host wrote something that is not a command.
    pub async fn next_command(&mut self) -> Result<Command> {
        let bytes = self
            .outbound_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(&self.name))?;
        let byte = bytes
            .first()
            .copied()
            .ok_or_else(|| HardwareError::invalid_data("empty write"))?;
        let command = Command::from_byte(byte)?;
        trace!(%command, "Mock device received command");
        Ok(command)
    }

    /// Wait for a specific command.
    pub async fn expect_command(&mut self, expected: Command) -> Result<()> {
        let command = self.next_command().await?;
        if command != expected {
            return Err(HardwareError::invalid_data(format!(
                "expected command {expected}, got {command}"
            )));
        }
        Ok(())
    }

    /// Play the device side of the handshake.
    ///
    /// Waits for the reset, answers the serial number, version and board
    /// requests in turn, and returns the update-mode command the host sends
    /// once it is ready.
    pub async fn serve_handshake(
        &mut self,
        serial: &SerialNumber,
        version: FirmwareVersion,
        board: &Snapshot,
    ) -> Result<Command> {
        self.expect_command(Command::Reset).await?;

        self.expect_command(Command::SendSerialNumber).await?;
        self.send_bytes(serial.encode()).await?;

        self.expect_command(Command::SendVersion).await?;
        self.send_bytes(version.encode()).await?;

        self.expect_command(Command::SendBoard).await?;
        self.send_bytes(encode_board_dump(board)).await?;

        self.next_command().await
    }
}
