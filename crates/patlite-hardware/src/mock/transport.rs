//! Mock HID transport for testing and development.
//!
//! This module provides a simulated signal tower that records every packet
//! written to it. Tests drive it through a [`MockTransportHandle`]: unplug the
//! device, make writes fail, and inspect what the tower received.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use patlite_core::{DeviceState, Error, Result};
use patlite_protocol::{CommandPacket, decode};

use crate::traits::HidTransport;

#[derive(Debug)]
struct MockShared {
    present: bool,
    open: bool,
    write_failure: Option<String>,
    written: Vec<CommandPacket>,
    open_count: usize,
    close_count: usize,
}

impl Default for MockShared {
    fn default() -> Self {
        Self {
            present: true,
            open: false,
            write_failure: None,
            written: Vec::new(),
            open_count: 0,
            close_count: 0,
        }
    }
}

fn lock(shared: &Mutex<MockShared>) -> MutexGuard<'_, MockShared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock signal tower.
///
/// # Examples
///
/// ```
/// use patlite_core::DeviceState;
/// use patlite_hardware::mock::MockTransport;
/// use patlite_hardware::traits::HidTransport;
/// use patlite_protocol::encode;
///
/// #[tokio::main]
/// async fn main() -> patlite_core::Result<()> {
///     let (mut transport, handle) = MockTransport::new();
///
///     transport.open().await?;
///     transport.write(&encode(&DeviceState::default())).await?;
///
///     assert_eq!(handle.write_count(), 1);
///     assert_eq!(handle.last_state(), Some(DeviceState::default()));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    shared: Arc<Mutex<MockShared>>,
    name: String,
}

impl MockTransport {
    /// Create a new mock tower with the default name.
    ///
    /// Returns a tuple of (MockTransport, MockTransportHandle) where the handle
    /// controls and observes the simulated device.
    pub fn new() -> (Self, MockTransportHandle) {
        Self::with_name("Mock Signal Tower".to_string())
    }

    /// Create a new mock tower with a custom name.
    pub fn with_name(name: String) -> (Self, MockTransportHandle) {
        let shared = Arc::new(Mutex::new(MockShared::default()));

        let transport = Self {
            shared: Arc::clone(&shared),
            name,
        };

        (transport, MockTransportHandle { shared })
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new().0
    }
}

impl HidTransport for MockTransport {
    async fn open(&mut self) -> Result<()> {
        let mut shared = lock(&self.shared);
        if shared.open {
            return Ok(());
        }
        if !shared.present {
            return Err(Error::device_not_found(
                patlite_core::constants::DEFAULT_VENDOR_ID,
                patlite_core::constants::DEFAULT_PRODUCT_ID,
            ));
        }
        shared.open = true;
        shared.open_count += 1;
        Ok(())
    }

    async fn write(&mut self, packet: &CommandPacket) -> Result<()> {
        {
            let shared = lock(&self.shared);
            if !shared.open {
                return Err(Error::NotConnected);
            }
            if !shared.present {
                return Err(Error::write_failed("device unplugged"));
            }
            if let Some(reason) = &shared.write_failure {
                return Err(Error::write_failed(reason.clone()));
            }
        }

        // Give other tasks a chance to run mid-write, like real I/O would.
        tokio::task::yield_now().await;

        lock(&self.shared).written.push(*packet);
        Ok(())
    }

    async fn close(&mut self) {
        let mut shared = lock(&self.shared);
        if shared.open {
            shared.open = false;
            shared.close_count += 1;
        }
    }

    fn is_open(&self) -> bool {
        lock(&self.shared).open
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Handle for controlling and observing a mock tower.
///
/// Cloning the handle shares the same simulated device.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    shared: Arc<Mutex<MockShared>>,
}

impl MockTransportHandle {
    /// Plug the device in or pull it out.
    ///
    /// Pulling it out makes the next `open` fail with `DeviceNotFound` and
    /// makes writes on an already open handle fail.
    pub fn set_present(&self, present: bool) {
        lock(&self.shared).present = present;
    }

    /// Make every write fail with the given reason until cleared.
    ///
    /// Independent of [`set_present`](Self::set_present).
    pub fn fail_writes(&self, reason: impl Into<String>) {
        lock(&self.shared).write_failure = Some(reason.into());
    }

    /// Let writes succeed again.
    pub fn clear_write_failure(&self) {
        lock(&self.shared).write_failure = None;
    }

    /// Every packet the device accepted, oldest first.
    pub fn written(&self) -> Vec<CommandPacket> {
        lock(&self.shared).written.clone()
    }

    pub fn write_count(&self) -> usize {
        lock(&self.shared).written.len()
    }

    pub fn last_packet(&self) -> Option<CommandPacket> {
        lock(&self.shared).written.last().copied()
    }

    /// State shown by the tower after the last accepted packet.
    pub fn last_state(&self) -> Option<DeviceState> {
        self.last_packet()
            .and_then(|packet| decode(packet.as_bytes()).ok())
    }

    pub fn is_open(&self) -> bool {
        lock(&self.shared).open
    }

    pub fn open_count(&self) -> usize {
        lock(&self.shared).open_count
    }

    pub fn close_count(&self) -> usize {
        lock(&self.shared).close_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patlite_core::{Color, LedState, Pattern, StateUpdate};
    use patlite_protocol::encode;

    #[tokio::test]
    async fn test_mock_records_writes() {
        let (mut transport, handle) = MockTransport::new();
        transport.open().await.unwrap();

        let state = DeviceState::default()
            .apply(&StateUpdate::light(LedState::new(Color::Green, Pattern::On)));
        transport.write(&encode(&state)).await.unwrap();

        assert_eq!(handle.write_count(), 1);
        assert_eq!(handle.last_packet(), Some(encode(&state)));
        assert_eq!(handle.last_state(), Some(state.normalized()));
    }

    #[tokio::test]
    async fn test_mock_write_requires_open() {
        let (mut transport, handle) = MockTransport::new();
        let result = transport.write(&encode(&DeviceState::default())).await;
        assert_eq!(result, Err(Error::NotConnected));
        assert_eq!(handle.write_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_absent_device() {
        let (mut transport, handle) = MockTransport::new();
        handle.set_present(false);

        let result = transport.open().await;
        assert!(matches!(result, Err(Error::DeviceNotFound { .. })));
        assert!(!transport.is_open());

        handle.set_present(true);
        transport.open().await.unwrap();
        assert!(handle.is_open());
        assert_eq!(handle.open_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_write_failure() {
        let (mut transport, handle) = MockTransport::new();
        transport.open().await.unwrap();
        handle.fail_writes("pipe error");

        let result = transport.write(&encode(&DeviceState::default())).await;
        assert_eq!(result, Err(Error::write_failed("pipe error")));

        handle.clear_write_failure();
        transport.write(&encode(&DeviceState::default())).await.unwrap();
        assert_eq!(handle.write_count(), 1);
    }

    #[tokio::test]
    async fn test_replug_keeps_forced_write_failure() {
        let (mut transport, handle) = MockTransport::new();
        transport.open().await.unwrap();
        handle.fail_writes("stalled");

        handle.set_present(false);
        let result = transport.write(&encode(&DeviceState::default())).await;
        assert_eq!(result, Err(Error::write_failed("device unplugged")));

        handle.set_present(true);
        let result = transport.write(&encode(&DeviceState::default())).await;
        assert_eq!(result, Err(Error::write_failed("stalled")));

        handle.clear_write_failure();
        transport.write(&encode(&DeviceState::default())).await.unwrap();
        assert_eq!(handle.write_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_open_close_idempotent() {
        let (mut transport, handle) = MockTransport::with_name("Bench Tower".to_string());
        assert_eq!(transport.describe(), "Bench Tower");

        transport.open().await.unwrap();
        transport.open().await.unwrap();
        transport.close().await;
        transport.close().await;

        assert_eq!(handle.open_count(), 1);
        assert_eq!(handle.close_count(), 1);
        assert!(!transport.is_open());
    }
}
