//! Error taxonomy shared by every layer of the signal tower stack.
//!
//! All failures are returned as values. Nothing here is fatal to the process:
//! a failed connect or flush leaves the connection in a well-defined state
//! from which a later `connect()` can recover.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller supplied an out-of-domain value. Raised before any state is touched.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operation needed the device but no transport handle is open.
    #[error("Device is not connected")]
    NotConnected,

    /// No device with the configured identifiers is present.
    #[error("Device not found: vendor {vendor_id:#06x}, product {product_id:#06x}")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// The transport failed to initialize or open the device.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The transport rejected a command write.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Create a new device-not-found error.
    pub fn device_not_found(vendor_id: u16, product_id: u16) -> Self {
        Self::DeviceNotFound {
            vendor_id,
            product_id,
        }
    }

    /// Create a new transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportError(message.into())
    }

    /// Create a new write failure.
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed(message.into())
    }

    /// True for errors raised by input validation rather than the device.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
