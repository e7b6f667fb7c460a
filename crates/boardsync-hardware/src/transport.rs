//! Byte transports between the host and a board.
//!
//! A [`Transport`] is split in two halves: a synchronous writer for the
//! single-byte commands the host sends, and an inbound channel of byte
//! chunks that the board task consumes. The board task takes the inbound
//! half once when it starts.
//!
//! [`SerialTransport`] reads the serial port on a dedicated OS thread, since
//! `serialport` only offers blocking reads. The thread forwards every chunk
//! it reads into the inbound channel and stops once the channel is closed.

use crate::{Result, config::BoardConfig};
use bytes::Bytes;
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Capacity of the inbound chunk channel.
pub(crate) const INBOUND_CAPACITY: usize = 64;

/// Read timeout of the serial reader thread; bounds how long the thread
/// takes to notice the board task is gone.
const READ_POLL_MS: u64 = 200;

/// Size of one serial read.
const READ_CHUNK: usize = 256;

/// Byte link to a board.
pub trait Transport: Send + 'static {
    /// Human-readable transport name, used in logs and device info.
    fn name(&self) -> &str;

    /// Write `bytes` to the board.
    ///
    /// # Errors
    /// Returns an error if the transport is closed or the write fails.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Take the inbound chunk stream. Returns `None` after the first call.
    fn take_inbound(&mut self) -> Option<mpsc::Receiver<Bytes>>;
}

/// Transport over a serial port.
pub struct SerialTransport {
    name: String,
    port: Box<dyn SerialPort>,
    inbound: Option<mpsc::Receiver<Bytes>>,
}

impl SerialTransport {
    /// Open the port named in `config` and start the reader thread.
    ///
    /// # Errors
    /// Returns `HardwareError::Serial` if the port cannot be opened or
    /// cloned, and `HardwareError::Io` if the reader thread cannot start.
    pub fn open(config: &BoardConfig) -> Result<Self> {
        info!("Opening serial port {} at {} baud", config.port, config.baud_rate);

        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(Duration::from_millis(READ_POLL_MS))
            .open()?;
        let reader = port.try_clone()?;

        let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
        let name = config.port.clone();
        std::thread::Builder::new()
            .name(format!("serial-reader {name}"))
            .spawn(move || read_loop(reader, tx))?;

        Ok(Self {
            name: config.port.clone(),
            port,
            inbound: Some(rx),
        })
    }
}

impl Transport for SerialTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        trace!(port = %self.name, ?bytes, "Writing to serial port");
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn take_inbound(&mut self) -> Option<mpsc::Receiver<Bytes>> {
        self.inbound.take()
    }
}

fn read_loop(mut reader: Box<dyn SerialPort>, tx: mpsc::Sender<Bytes>) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {}
            Ok(n) => {
                if tx.blocking_send(Bytes::copy_from_slice(&buf[..n])).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => {
                if tx.is_closed() {
                    break;
                }
            }
            Err(e) => {
                warn!("Serial read failed: {}", e);
                break;
            }
        }
    }
    debug!("Serial reader stopped");
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

