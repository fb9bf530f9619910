//! USB HID transport backed by `hidapi`.
//!
//! `hidapi` calls block, so enumeration, open and write each run on
//! Tokio's blocking pool. The device handle is moved into the blocking task
//! and handed back afterwards, which keeps the transport free of extra locks.

use std::fmt;

use hidapi::{HidApi, HidDevice};
use patlite_core::{
    Error, Result,
    constants::{DEFAULT_PRODUCT_ID, DEFAULT_VENDOR_ID},
};
use patlite_protocol::CommandPacket;
use tracing::debug;

use crate::traits::HidTransport;

/// Signal tower reached through the operating system's HID stack.
pub struct UsbHidTransport {
    vendor_id: u16,
    product_id: u16,
    device: Option<HidDevice>,
}

impl UsbHidTransport {
    /// Transport for the device with the given USB identifiers.
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            device: None,
        }
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }
}

impl Default for UsbHidTransport {
    fn default() -> Self {
        Self::new(DEFAULT_VENDOR_ID, DEFAULT_PRODUCT_ID)
    }
}

impl fmt::Debug for UsbHidTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsbHidTransport")
            .field("vendor_id", &format_args!("{:#06x}", self.vendor_id))
            .field("product_id", &format_args!("{:#06x}", self.product_id))
            .field("open", &self.device.is_some())
            .finish()
    }
}

fn open_blocking(vendor_id: u16, product_id: u16) -> Result<HidDevice> {
    let api = HidApi::new()
        .map_err(|e| Error::transport(format!("failed to initialize hidapi: {e}")))?;

    let present = api
        .device_list()
        .any(|info| info.vendor_id() == vendor_id && info.product_id() == product_id);
    if !present {
        return Err(Error::device_not_found(vendor_id, product_id));
    }

    // The handle keeps its own reference to the HID library, so `api` may drop here.
    api.open(vendor_id, product_id)
        .map_err(|e| Error::transport(format!("failed to open device: {e}")))
}

impl HidTransport for UsbHidTransport {
    async fn open(&mut self) -> Result<()> {
        if self.device.is_some() {
            return Ok(());
        }

        let (vendor_id, product_id) = (self.vendor_id, self.product_id);
        let device = tokio::task::spawn_blocking(move || open_blocking(vendor_id, product_id))
            .await
            .map_err(|e| Error::transport(format!("open task failed: {e}")))??;

        debug!("Opened HID device {:04x}:{:04x}", vendor_id, product_id);
        self.device = Some(device);
        Ok(())
    }

    async fn write(&mut self, packet: &CommandPacket) -> Result<()> {
        let device = self.device.take().ok_or(Error::NotConnected)?;
        let report = *packet.as_bytes();

        let (device, result) = tokio::task::spawn_blocking(move || {
            let result = device.write(&report);
            (device, result)
        })
        .await
        .map_err(|e| Error::write_failed(format!("write task failed: {e}")))?;

        self.device = Some(device);
        result
            .map(|_| ())
            .map_err(|e| Error::write_failed(e.to_string()))
    }

    async fn close(&mut self) {
        if self.device.take().is_some() {
            debug!(
                "Closed HID device {:04x}:{:04x}",
                self.vendor_id, self.product_id
            );
        }
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }

    fn describe(&self) -> String {
        format!("USB HID {:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}
