//! Device controller: the authoritative desired state of the tower.
//!
//! Every mutating operation runs the whole merge, encode and flush sequence
//! under one state lock, so concurrent requests are strictly serialized and
//! each accepted request produces exactly one packet built from its own
//! merged snapshot.
//!
//! # Lock Order
//!
//! The state lock is always taken first. The connection manager's transport
//! lock nests inside it and is never held while waiting for the state lock.
//! [`DeviceController::status`] takes neither.
//!
//! # Failure Semantics
//!
//! Validation happens while building a [`StateUpdate`], before any lock is
//! taken. Once an update reaches the controller it is always committed to
//! memory, even if the flush then fails with `NotConnected` or
//! `WriteFailed`. A later [`reconnect`](DeviceController::reconnect) sends
//! the committed state to the device.

use patlite_core::{BuzzerUpdate, DeviceState, LedState, LedUpdate, Result, StateUpdate};
use patlite_protocol::encode;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::connection::{ConnectionManager, ConnectionStatus};
use crate::devices::AnyTransport;

/// Lock-holding state store in front of a single signal tower.
///
/// # Examples
///
/// ```
/// use patlite_core::{Color, LedState, Pattern};
/// use patlite_hardware::{DeviceController, MockTransport};
///
/// #[tokio::main]
/// async fn main() -> patlite_core::Result<()> {
///     let (transport, handle) = MockTransport::new();
///     let controller = DeviceController::new(transport);
///
///     controller.connect().await?;
///     controller.set_light(LedState::new(Color::Red, Pattern::Blink)).await?;
///
///     // One all-off packet from connect, one from set_light.
///     assert_eq!(handle.write_count(), 2);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct DeviceController {
    state: Mutex<DeviceState>,
    connection: ConnectionManager,
}

impl DeviceController {
    /// Controller for the given transport, starting all-off and disconnected.
    pub fn new(transport: impl Into<AnyTransport>) -> Self {
        Self {
            state: Mutex::new(DeviceState::default()),
            connection: ConnectionManager::new(transport),
        }
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Current connection status without waiting on any lock.
    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.connection.subscribe()
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> DeviceState {
        *self.state.lock().await
    }

    /// Open the device and bring it to the all-off state.
    ///
    /// Does nothing if already connected.
    ///
    /// # Errors
    ///
    /// `DeviceNotFound` or `TransportError` if the device cannot be opened,
    /// `WriteFailed` if the initial all-off packet is rejected.
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if self.connection.is_connected() {
            debug!("Connect requested while already connected");
            return Ok(());
        }

        self.connection.open().await?;
        *state = DeviceState::default();
        self.connection.flush(&encode(&state)).await?;
        info!("Signal tower ready, state reset to all off");
        Ok(())
    }

    /// Reopen the device and send it the committed state unchanged.
    ///
    /// Used to recover from a failed write or to deliver updates accepted
    /// while disconnected.
    ///
    /// # Errors
    ///
    /// `DeviceNotFound` or `TransportError` if the device cannot be opened,
    /// `WriteFailed` if the state packet is rejected.
    pub async fn reconnect(&self) -> Result<DeviceState> {
        let state = self.state.lock().await;
        self.connection.close().await;
        self.connection.open().await?;
        self.connection.flush(&encode(&state)).await?;
        info!("Signal tower reconnected, state restored");
        Ok(*state)
    }

    /// Turn everything off if possible, then release the device.
    ///
    /// Never fails: a rejected all-off packet is logged and the handle is
    /// closed regardless.
    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        *state = DeviceState::default();

        if self.connection.is_connected()
            && let Err(e) = self.connection.flush(&encode(&state)).await
        {
            warn!("Could not turn the tower off before disconnecting: {}", e);
        }

        self.connection.close().await;
        info!("Signal tower disconnected");
    }

    /// Set all five channels to the same color and pattern.
    ///
    /// # Errors
    ///
    /// `NotConnected` or `WriteFailed` from the flush; the state is committed
    /// either way.
    pub async fn set_light(&self, led: LedState) -> Result<DeviceState> {
        self.apply(&StateUpdate::light(led)).await
    }

    /// Update only the channels named in `leds`.
    ///
    /// # Errors
    ///
    /// Same as [`set_light`](Self::set_light).
    pub async fn set_leds(&self, leds: LedUpdate) -> Result<DeviceState> {
        self.apply(&StateUpdate::leds(leds)).await
    }

    /// Update only the buzzer.
    ///
    /// # Errors
    ///
    /// Same as [`set_light`](Self::set_light).
    pub async fn set_buzzer(&self, buzzer: BuzzerUpdate) -> Result<DeviceState> {
        self.apply(&StateUpdate::buzzer(buzzer)).await
    }

    /// # Errors
    ///
    /// Same as [`set_light`](Self::set_light).
    pub async fn stop_buzzer(&self) -> Result<DeviceState> {
        self.apply(&StateUpdate::stop_buzzer()).await
    }

    /// Lamps and buzzer in a single packet.
    ///
    /// # Errors
    ///
    /// Same as [`set_light`](Self::set_light).
    pub async fn set_all(&self, update: StateUpdate) -> Result<DeviceState> {
        self.apply(&update).await
    }

    /// Zero the whole state and flush it.
    ///
    /// # Errors
    ///
    /// Same as [`set_light`](Self::set_light).
    pub async fn reset(&self) -> Result<DeviceState> {
        let mut state = self.state.lock().await;
        *state = DeviceState::default();
        self.commit(&state).await
    }

    /// Merge an update into the committed state and flush the result.
    ///
    /// # Errors
    ///
    /// Same as [`set_light`](Self::set_light).
    pub async fn apply(&self, update: &StateUpdate) -> Result<DeviceState> {
        let mut state = self.state.lock().await;
        *state = state.apply(update);
        self.commit(&state).await
    }

    /// Flush a freshly committed state. Caller holds the state lock.
    async fn commit(&self, state: &DeviceState) -> Result<DeviceState> {
        let packet = encode(state);
        debug!("Committed state, packet {}", packet);
        self.connection.flush(&packet).await?;
        Ok(*state)
    }
}
