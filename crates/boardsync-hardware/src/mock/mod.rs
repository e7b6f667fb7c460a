//! Mock transport for testing and development.
//!
//! Simulates the device end of a serial link so the board task can be driven
//! without hardware.

pub mod transport;

pub use transport::{MockTransport, MockTransportHandle};
