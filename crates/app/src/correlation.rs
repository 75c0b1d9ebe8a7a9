//! Correlation table: matches asynchronous hub replies to their commands.
//!
//! One table per connection. Ids start at 1, strictly increase, and are never
//! reused. Each pending continuation is removed exactly once: on its reply,
//! on timeout, or when the connection is drained.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::oneshot;

use hubgate_domain::error::HubError;
use hubgate_domain::id::RequestId;

/// Outcome delivered to whoever waits on a correlated command.
pub type Reply = Result<Value, HubError>;

/// Single-use continuation for one correlated command.
pub type ReplySender = oneshot::Sender<Reply>;

#[derive(Debug)]
pub struct CorrelationTable {
    next_id: RequestId,
    pending: HashMap<RequestId, ReplySender>,
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self {
            next_id: RequestId::FIRST,
            pending: HashMap::new(),
        }
    }
}

impl CorrelationTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next request id, remembering `continuation` under it.
    ///
    /// Without a continuation the command is fire-and-forget and any reply
    /// to it will be ignored.
    pub fn allocate(&mut self, continuation: Option<ReplySender>) -> RequestId {
        let id = self.next_id;
        self.next_id = id.next();
        if let Some(sender) = continuation {
            self.pending.insert(id, sender);
        }
        id
    }

    /// Deliver `body` to the continuation waiting on `id`.
    ///
    /// Returns `false` (and does nothing) for unknown or already resolved ids.
    pub fn resolve(&mut self, id: RequestId, body: Value) -> bool {
        let Some(sender) = self.pending.remove(&id) else {
            return false;
        };
        // The waiter may have given up already; the entry is gone either way.
        let _ = sender.send(Ok(body));
        true
    }

    /// Drop the continuation for `id` without invoking it.
    pub fn forget(&mut self, id: RequestId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Fail every pending continuation with [`HubError::Disconnected`].
    ///
    /// Returns how many waiters were notified.
    pub fn drain(&mut self) -> usize {
        let count = self.pending.len();
        for (_, sender) in self.pending.drain() {
            let _ = sender.send(Err(HubError::Disconnected));
        }
        count
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
