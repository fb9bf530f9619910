//! Enum wrapper for transport dispatch.
//!
//! Native `async fn` in traits is not object-safe, so the connection manager
//! cannot hold a `Box<dyn HidTransport>`. [`AnyTransport`] gives it a single
//! concrete type with compile-time dispatch to each implementation.
//!
//! # Examples
//!
//! ```
//! use patlite_hardware::devices::AnyTransport;
//! use patlite_hardware::mock::MockTransport;
//! use patlite_hardware::traits::HidTransport;
//!
//! let (transport, _handle) = MockTransport::new();
//! let any = AnyTransport::Mock(transport);
//! assert!(!any.is_open());
//! ```

#[cfg(feature = "hardware-usb")]
use crate::hid::UsbHidTransport;
use crate::mock::MockTransport;
use crate::traits::HidTransport;
use patlite_core::Result;
use patlite_protocol::CommandPacket;

#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTransport {
    /// Real tower on the USB bus.
    #[cfg(feature = "hardware-usb")]
    Usb(UsbHidTransport),

    /// Simulated tower for development and testing.
    Mock(MockTransport),
}

impl HidTransport for AnyTransport {
    async fn open(&mut self) -> Result<()> {
        match self {
            #[cfg(feature = "hardware-usb")]
            Self::Usb(transport) => transport.open().await,
            Self::Mock(transport) => transport.open().await,
        }
    }

    async fn write(&mut self, packet: &CommandPacket) -> Result<()> {
        match self {
            #[cfg(feature = "hardware-usb")]
            Self::Usb(transport) => transport.write(packet).await,
            Self::Mock(transport) => transport.write(packet).await,
        }
    }

    async fn close(&mut self) {
        match self {
            #[cfg(feature = "hardware-usb")]
            Self::Usb(transport) => transport.close().await,
            Self::Mock(transport) => transport.close().await,
        }
    }

    fn is_open(&self) -> bool {
        match self {
            #[cfg(feature = "hardware-usb")]
            Self::Usb(transport) => transport.is_open(),
            Self::Mock(transport) => transport.is_open(),
        }
    }

    fn describe(&self) -> String {
        match self {
            #[cfg(feature = "hardware-usb")]
            Self::Usb(transport) => transport.describe(),
            Self::Mock(transport) => transport.describe(),
        }
    }
}

impl From<MockTransport> for AnyTransport {
    fn from(transport: MockTransport) -> Self {
        Self::Mock(transport)
    }
}

#[cfg(feature = "hardware-usb")]
impl From<UsbHidTransport> for AnyTransport {
    fn from(transport: UsbHidTransport) -> Self {
        Self::Usb(transport)
    }
}
