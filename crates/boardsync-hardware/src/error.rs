//! Error types for board link operations.
//!
//! Covers transport failures (serial port, closed channels), bad data from
//! the device and invalid link state transitions.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while talking to a board.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Board task or transport is gone.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Writing to or reading from the transport failed.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Invalid data received from the device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Link state machine asked for a transition it does not allow.
    #[error("Invalid link transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Board model or protocol error.
    #[error(transparent)]
    Board(#[from] boardsync_core::Error),

    /// Serial port error.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("/dev/ttyUSB0");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: /dev/ttyUSB0");
    }

    #[test]
    fn test_communication_error() {
        let error = HardwareError::communication("write failed");
        assert_eq!(error.to_string(), "Communication error: write failed");
    }

    #[test]
    fn test_invalid_data_error() {
        let error = HardwareError::invalid_data("field index 70");
        assert_eq!(error.to_string(), "Invalid data: field index 70");
    }

    #[test]
    fn test_board_error_is_transparent() {
        let error: HardwareError = boardsync_core::Error::InvalidRaw("short".into()).into();
        assert_eq!(error.to_string(), "Invalid raw board: short");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let error: HardwareError = io_error.into();
        assert!(matches!(error, HardwareError::Io(_)));
    }
}
