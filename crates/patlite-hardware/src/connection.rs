//! Connection lifecycle of the signal tower.
//!
//! [`ConnectionManager`] owns the transport handle and is the single point
//! through which bytes reach the device. Concurrent flushes are serialized
//! by the transport lock; the published [`ConnectionStatus`] lives in a
//! `watch` channel so reading it never waits behind a write in progress.
//!
//! # State Machine
//!
//! ```text
//!                 open ok
//! Disconnected ───────────► Connected
//!      ▲  ▲                  │     │
//!      │  └──── close ───────┘     │ write failure
//!      │                           ▼
//!      └─── close / open failure ── Error(reason) ── open ok ──► Connected
//! ```
//!
//! Failed writes are never retried here. Recovery is an explicit `open()`
//! by the caller.

use std::fmt;

use patlite_core::{Error, Result};
use patlite_protocol::CommandPacket;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::devices::AnyTransport;
use crate::traits::HidTransport;

/// Observable connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
    /// Last write failed; the handle has been released.
    Error(String),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
            Self::Error(reason) => write!(f, "error: {reason}"),
        }
    }
}

/// Owner of the transport handle.
#[derive(Debug)]
pub struct ConnectionManager {
    transport: Mutex<AnyTransport>,
    status: watch::Sender<ConnectionStatus>,
    description: String,
}

impl ConnectionManager {
    /// Wrap a transport. The manager starts `Disconnected` and does not open it.
    pub fn new(transport: impl Into<AnyTransport>) -> Self {
        let transport = transport.into();
        let description = transport.describe();
        debug!("Creating connection manager for {}", description);

        Self {
            transport: Mutex::new(transport),
            status: watch::Sender::new(ConnectionStatus::Disconnected),
            description,
        }
    }

    /// Current status. Pure read, never blocks on I/O.
    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status.borrow().is_connected()
    }

    /// Receiver notified on every status transition.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Description of the underlying transport.
    pub fn description(&self) -> &str {
        &self.description
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            debug!("Connection status {} -> {}", current, status);
            *current = status;
            true
        });
    }

    /// Open the transport.
    ///
    /// Succeeds immediately if a handle is already held. On failure the
    /// status becomes `Disconnected`.
    ///
    /// # Errors
    ///
    /// Returns `DeviceNotFound` or `TransportError` from the transport.
    pub async fn open(&self) -> Result<()> {
        let mut transport = self.transport.lock().await;
        if transport.is_open() {
            self.set_status(ConnectionStatus::Connected);
            return Ok(());
        }

        info!("Connecting to {}", self.description);
        match transport.open().await {
            Ok(()) => {
                info!("Connected to {}", self.description);
                self.set_status(ConnectionStatus::Connected);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to connect to {}: {}", self.description, e);
                self.set_status(ConnectionStatus::Disconnected);
                Err(e)
            }
        }
    }

    /// Write a packet to the device.
    ///
    /// Waits for any flush already in progress. A failed write releases the
    /// handle and moves the status to `Error(reason)`.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` without touching the device if no handle is
    /// held, or `WriteFailed` if the transport rejects the packet.
    pub async fn flush(&self, packet: &CommandPacket) -> Result<()> {
        let mut transport = self.transport.lock().await;
        if !transport.is_open() {
            debug!("Flush skipped, not connected: {}", packet);
            return Err(Error::NotConnected);
        }

        match transport.write(packet).await {
            Ok(()) => {
                debug!("Flushed packet {}", packet);
                Ok(())
            }
            Err(e) => {
                let reason = match e {
                    Error::WriteFailed(reason) => reason,
                    other => other.to_string(),
                };
                warn!("Write to {} failed: {}", self.description, reason);
                transport.close().await;
                self.set_status(ConnectionStatus::Error(reason.clone()));
                Err(Error::WriteFailed(reason))
            }
        }
    }

    /// Release the handle unconditionally and move to `Disconnected`.
    pub async fn close(&self) {
        let mut transport = self.transport.lock().await;
        if transport.is_open() {
            info!("Closing connection to {}", self.description);
        }
        transport.close().await;
        self.set_status(ConnectionStatus::Disconnected);
    }
}
