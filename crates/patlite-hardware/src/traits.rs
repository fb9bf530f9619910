//! Transport trait definitions.
//!
//! The connection manager talks to the tower only through [`HidTransport`]:
//! open a handle, write whole command packets, close the handle. Real USB
//! access and the in-memory mock both implement it.
//!
//! All methods use native `async fn` (Rust 1.90 + Edition 2024 RPITIT), so
//! the trait is not object-safe. Dynamic selection goes through the
//! [`AnyTransport`](crate::devices::AnyTransport) enum instead of `Box<dyn _>`.

#![allow(async_fn_in_trait)]

use patlite_core::Result;
use patlite_protocol::CommandPacket;

/// Low-level access to a single HID signal tower.
///
/// # Examples
///
/// ```no_run
/// use patlite_core::DeviceState;
/// use patlite_hardware::traits::HidTransport;
/// use patlite_protocol::encode;
///
/// async fn all_off<T: HidTransport>(transport: &mut T) -> patlite_core::Result<()> {
///     transport.open().await?;
///     transport.write(&encode(&DeviceState::default())).await
/// }
/// ```
pub trait HidTransport: Send {
    /// Open the device handle. Opening an already open transport is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No device with the configured identifiers is present (`DeviceNotFound`)
    /// - The HID layer fails to initialize or open the device (`TransportError`)
    async fn open(&mut self) -> Result<()>;

    /// Write one complete packet in a single report.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` if the handle is closed and `WriteFailed` if
    /// the device rejects the report.
    async fn write(&mut self, packet: &CommandPacket) -> Result<()>;

    /// Release the handle. Never fails; closing a closed transport is a no-op.
    async fn close(&mut self);

    /// Whether a handle is currently held.
    fn is_open(&self) -> bool;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}
