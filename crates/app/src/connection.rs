//! Connection: one live hub session.
//!
//! Owns the session's correlation table and device store behind a single
//! per-connection lock, independent of the registry lock. Outbound frames go
//! through an unbounded channel drained by the transport adapter, so sending
//! never blocks while the lock is held.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::{Mutex, mpsc, oneshot, watch};

use hubgate_domain::device::Device;
use hubgate_domain::device_store::{DeviceStore, SyncOutcome, ValueUpdate};
use hubgate_domain::error::{HubError, NotFoundError};
use hubgate_domain::hub::HubCommand;
use hubgate_domain::id::{ConnectionId, RequestId};
use hubgate_domain::time::{Timestamp, now};

use crate::correlation::{CorrelationTable, ReplySender};

/// Sending half of a hub session's outbound channel (serialized frames).
pub type Outbound = mpsc::UnboundedSender<String>;

pub struct Connection {
    id: ConnectionId,
    connected_at: Timestamp,
    outbound: Outbound,
    state: Mutex<ConnectionState>,
    closed_signal: watch::Sender<bool>,
}

#[derive(Default)]
struct ConnectionState {
    correlation: CorrelationTable,
    devices: DeviceStore,
    closed: bool,
}

impl ConnectionState {
    fn send(
        &mut self,
        outbound: &Outbound,
        command: &HubCommand,
        continuation: Option<ReplySender>,
    ) -> Result<RequestId, HubError> {
        if self.closed {
            return Err(HubError::Disconnected);
        }
        let mid = self.correlation.allocate(continuation);
        let frame = match command.encode(mid) {
            Ok(frame) => frame,
            Err(err) => {
                self.correlation.forget(mid);
                return Err(HubError::Encode(err.to_string()));
            }
        };
        if outbound.send(frame).is_err() {
            self.correlation.forget(mid);
            return Err(HubError::Disconnected);
        }
        tracing::debug!(%mid, command = command.name(), "hub command sent");
        Ok(mid)
    }
}

impl Connection {
    #[must_use]
    pub fn new(outbound: Outbound) -> Self {
        Self {
            id: ConnectionId::new(),
            connected_at: now(),
            outbound,
            state: Mutex::new(ConnectionState::default()),
            closed_signal: watch::Sender::new(false),
        }
    }

    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    #[must_use]
    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    /// Send a fire-and-forget command.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Disconnected`] once the connection is closed, or
    /// [`HubError::Encode`] if the command cannot be serialized.
    pub async fn submit(&self, command: &HubCommand) -> Result<RequestId, HubError> {
        self.state.lock().await.send(&self.outbound, command, None)
    }

    /// Send a command and wait for the hub's reply payload.
    ///
    /// # Errors
    ///
    /// - [`HubError::Timeout`] when no reply arrives within `timeout`; the
    ///   pending entry is removed.
    /// - [`HubError::Disconnected`] when the connection closes first.
    /// - [`HubError::Encode`] if the command cannot be serialized.
    pub async fn call(&self, command: &HubCommand, timeout: Duration) -> Result<Value, HubError> {
        let (tx, rx) = oneshot::channel();
        let mid = self
            .state
            .lock()
            .await
            .send(&self.outbound, command, Some(tx))?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(HubError::Disconnected),
            Err(_) => {
                self.state.lock().await.correlation.forget(mid);
                tracing::warn!(%mid, command = command.name(), ?timeout, "hub reply timed out");
                Err(HubError::Timeout(timeout))
            }
        }
    }

    /// Hand a reply to the command waiting on `mid`, if any.
    pub async fn resolve(&self, mid: RequestId, body: Value) -> bool {
        self.state.lock().await.correlation.resolve(mid, body)
    }

    /// Mark the connection closed and fail every pending command.
    ///
    /// Returns how many waiters were notified.
    pub async fn close(&self) -> usize {
        let mut state = self.state.lock().await;
        state.closed = true;
        self.closed_signal.send_replace(true);
        state.correlation.drain()
    }

    /// Resolves once [`Connection::close`] has been called.
    pub async fn closed(&self) {
        let mut rx = self.closed_signal.subscribe();
        // The sender lives as long as `self`, so this only returns on close.
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Reconcile the device store against a full snapshot and (un)subscribe
    /// the devices whose membership changed.
    pub async fn sync_devices(&self, snapshot: Vec<Device>) -> SyncOutcome {
        let mut state = self.state.lock().await;
        let outcome = state.devices.reconcile(snapshot);
        for uuid in &outcome.added {
            let command = HubCommand::RequestSubscribeDevice { uuid: uuid.clone() };
            if let Err(err) = state.send(&self.outbound, &command, None) {
                tracing::warn!(error = %err, device_id = %uuid, "failed to subscribe device");
            }
        }
        for uuid in &outcome.removed {
            let command = HubCommand::RequestUnsubscribeDevice { uuid: uuid.clone() };
            if let Err(err) = state.send(&self.outbound, &command, None) {
                tracing::warn!(error = %err, device_id = %uuid, "failed to unsubscribe device");
            }
        }
        outcome
    }

    /// Apply a pushed value change.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when the device or resource is unknown.
    pub async fn update_value(&self, update: ValueUpdate) -> Result<(), NotFoundError> {
        self.state.lock().await.devices.apply_value_update(update)
    }

    /// Run `f` against the device store while holding the connection lock.
    pub async fn with_devices<R>(&self, f: impl FnOnce(&DeviceStore) -> R) -> R {
        f(&self.state.lock().await.devices)
    }

    /// Number of commands currently waiting for a reply.
    pub async fn pending_requests(&self) -> usize {
        self.state.lock().await.correlation.pending()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}
