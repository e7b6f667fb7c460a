//! Scripted engine for testing and development.

pub mod engine;

pub use engine::{EngineRequest, MockEngine, MockEngineHandle};
