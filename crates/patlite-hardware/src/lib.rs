//! Device access layer for the signal tower.
//!
//! This crate owns everything between a validated [`StateUpdate`] and the
//! bytes on the USB bus:
//!
//! - [`HidTransport`]: open, write and close a single HID device. Implemented
//!   by `UsbHidTransport` (feature `hardware-usb`) and [`MockTransport`].
//! - [`ConnectionManager`]: the only writer to the transport. Serializes
//!   flushes and publishes a [`ConnectionStatus`].
//! - [`DeviceController`]: holds the committed [`DeviceState`] and runs each
//!   request's merge, encode and flush under one lock.
//!
//! # Design Philosophy
//!
//! - **Async-first**: transports use native `async fn` in traits (Rust 1.90 +
//!   Edition 2024 RPITIT); blocking `hidapi` calls run on Tokio's blocking pool.
//! - **Enum dispatch**: [`AnyTransport`] selects the transport at runtime
//!   without trait objects.
//! - **Explicit recovery**: failed writes are reported, never retried. The
//!   caller decides when to [`reconnect`](DeviceController::reconnect).
//!
//! # Example
//!
//! ```
//! use patlite_core::{BuzzerUpdate, Channel, LedUpdate, Pattern};
//! use patlite_hardware::{DeviceController, MockTransport};
//!
//! #[tokio::main]
//! async fn main() -> patlite_core::Result<()> {
//!     let (transport, handle) = MockTransport::new();
//!     let controller = DeviceController::new(transport);
//!     controller.connect().await?;
//!
//!     let leds = LedUpdate::native(&[Channel::Red, Channel::Green], Pattern::On)?;
//!     controller.set_leds(leds).await?;
//!     controller.set_buzzer(BuzzerUpdate::from_raw(6, 3)?).await?;
//!
//!     let packet = handle.last_packet().expect("packet written");
//!     assert_eq!(packet.as_bytes()[3..8], [3, 6, 0x10, 0x10, 0x00]);
//!     Ok(())
//! }
//! ```
//!
//! [`StateUpdate`]: patlite_core::StateUpdate
//! [`DeviceState`]: patlite_core::DeviceState
//! [`HidTransport`]: traits::HidTransport

pub mod connection;
pub mod controller;
pub mod devices;
#[cfg(feature = "hardware-usb")]
pub mod hid;
pub mod mock;
pub mod traits;

pub use connection::{ConnectionManager, ConnectionStatus};
pub use controller::DeviceController;
pub use devices::AnyTransport;
#[cfg(feature = "hardware-usb")]
pub use hid::UsbHidTransport;
pub use mock::{MockTransport, MockTransportHandle};
pub use traits::HidTransport;
