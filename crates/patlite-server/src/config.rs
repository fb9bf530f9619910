//! Command line and environment configuration.

use std::net::SocketAddr;

use clap::Parser;
use patlite_core::{
    Error, Result,
    constants::{DEFAULT_PRODUCT_ID, DEFAULT_VENDOR_ID},
};
use patlite_hardware::{AnyTransport, MockTransport};

/// HTTP control server for a USB signal tower
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address the HTTP API listens on
    #[arg(long, env = "PATLITE_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// USB vendor id of the tower (hex with 0x prefix, or decimal)
    #[arg(long, env = "PATLITE_VENDOR_ID", value_parser = parse_usb_id, default_value_t = DEFAULT_VENDOR_ID)]
    pub vendor_id: u16,

    /// USB product id of the tower (hex with 0x prefix, or decimal)
    #[arg(long, env = "PATLITE_PRODUCT_ID", value_parser = parse_usb_id, default_value_t = DEFAULT_PRODUCT_ID)]
    pub product_id: u16,

    /// Do not try to connect to the tower at startup
    #[arg(long, env = "PATLITE_NO_CONNECT")]
    pub no_connect: bool,

    /// Use an in-memory tower instead of USB
    #[arg(long, env = "PATLITE_SIMULATE")]
    pub simulate: bool,

    /// Log filter, e.g. "info" or "patlite_hardware=debug" (RUST_LOG wins if set)
    #[arg(long, env = "PATLITE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Transport selected by this configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a USB tower is requested but the binary
    /// was built without the `hardware-usb` feature.
    pub fn transport(&self) -> Result<AnyTransport> {
        if self.simulate {
            let (transport, _handle) =
                MockTransport::with_name("Simulated Signal Tower".to_string());
            return Ok(transport.into());
        }
        self.usb_transport()
    }

    #[cfg(feature = "hardware-usb")]
    fn usb_transport(&self) -> Result<AnyTransport> {
        Ok(patlite_hardware::UsbHidTransport::new(self.vendor_id, self.product_id).into())
    }

    #[cfg(not(feature = "hardware-usb"))]
    fn usb_transport(&self) -> Result<AnyTransport> {
        Err(Error::Config(format!(
            "USB support not compiled in, cannot open {:04x}:{:04x}; rebuild with --features hardware-usb or pass --simulate",
            self.vendor_id, self.product_id
        )))
    }
}

/// Parse a USB identifier given as hex with a `0x` prefix (`0x191A`) or decimal (`6426`).
pub fn parse_usb_id(value: &str) -> Result<u16> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse::<u16>(),
    };
    parsed.map_err(|e| Error::Config(format!("invalid USB id '{value}': {e}")))
}
