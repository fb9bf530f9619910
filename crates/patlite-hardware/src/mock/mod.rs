//! Mock device implementations for testing and development.
//!
//! This module provides a simulated signal tower that can be controlled
//! programmatically without requiring physical hardware.

pub mod transport;

pub use transport::{MockTransport, MockTransportHandle};
