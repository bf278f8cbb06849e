//! Session registry for the legacy SSE binding.
//!
//! The registry is the only owner of the session id to handle mapping. It
//! performs no I/O; the SSE handler inserts on connect and removes on
//! disconnect, and `POST /message` looks sessions up.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use medusa_mcp_core::protocol::Message;
use tokio::sync::mpsc;

use crate::error::HttpError;

/// The inbound side of one live session.
///
/// Each queue slot holds everything from one POST, so a batch is either
/// queued whole or not at all.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inbound: mpsc::Sender<Vec<Message>>,
}

impl SessionHandle {
    /// Wrap the sender feeding the session's worker.
    #[must_use]
    pub const fn new(inbound: mpsc::Sender<Vec<Message>>) -> Self {
        Self { inbound }
    }

    /// Queue one POSTed payload for the session's worker.
    ///
    /// Waits while the queue is full. Fails only if the session has closed,
    /// in which case none of `messages` was queued.
    pub async fn deliver(&self, messages: Vec<Message>) -> Result<(), HttpError> {
        self.inbound
            .send(messages)
            .await
            .map_err(|_| HttpError::SessionNotFound)
    }
}

/// Live sessions keyed by session id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionHandle>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under a fresh random id and return the id.
    #[must_use]
    pub fn create(&self, handle: SessionHandle) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(id.clone(), handle);
        id
    }

    /// Look up a live session.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Forget a session. Removing an unknown id is a no-op.
    pub fn remove(&self, id: &str) {
        self.sessions.remove(id);
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Removes a session from the registry when dropped.
///
/// Held by the SSE response stream, so the session leaves the registry
/// however the stream ends.
pub(crate) struct SessionGuard {
    registry: Arc<SessionRegistry>,
    id: String,
    opened: Instant,
}

impl SessionGuard {
    pub(crate) fn new(registry: Arc<SessionRegistry>, id: String) -> Self {
        Self {
            registry,
            id,
            opened: Instant::now(),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
        tracing::info!(
            session_id = %self.id,
            duration_ms = self.opened.elapsed().as_millis(),
            "SSE session closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn handle() -> (SessionHandle, mpsc::Receiver<Vec<Message>>) {
        let (tx, rx) = mpsc::channel(4);
        (SessionHandle::new(tx), rx)
    }

    #[test]
    fn test_create_yields_distinct_ids() {
        let registry = SessionRegistry::new();
        let (a, _rx_a) = handle();
        let (b, _rx_b) = handle();
        let id_a = registry.create(a);
        let id_b = registry.create(b);
        assert_ne!(id_a, id_b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SessionRegistry::new();
        let (h, _rx) = handle();
        let id = registry.create(h);
        registry.remove(&id);
        registry.remove(&id);
        assert!(registry.get(&id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_guard_removes_on_drop() {
        let registry = Arc::new(SessionRegistry::new());
        let (h, _rx) = handle();
        let id = registry.create(h);
        {
            let _guard = SessionGuard::new(Arc::clone(&registry), id.clone());
            assert!(registry.get(&id).is_some());
        }
        assert!(registry.get(&id).is_none());
    }

    #[tokio::test]
    async fn test_deliver_reaches_worker_queue() {
        let registry = SessionRegistry::new();
        let (h, mut rx) = handle();
        let id = registry.create(h);

        let message: Message = medusa_mcp_core::Request::new("ping", 1u64).into();
        registry.get(&id).unwrap().deliver(vec![message]).await.unwrap();
        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].method(), Some("ping"));
    }

    #[tokio::test]
    async fn test_batch_takes_one_queue_slot() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = SessionHandle::new(tx);
        let batch: Vec<Message> = (1u64..=3)
            .map(|id| medusa_mcp_core::Request::new("ping", id).into())
            .collect();

        tokio::time::timeout(std::time::Duration::from_secs(1), handle.deliver(batch))
            .await
            .expect("a batch must not wait for a drained queue")
            .unwrap();

        let queued = rx.recv().await.unwrap();
        let ids: Vec<String> = queued.iter().map(|m| m.id().unwrap().to_string()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_closed_session_queues_nothing() {
        let (h, rx) = handle();
        drop(rx);
        let batch: Vec<Message> = vec![
            medusa_mcp_core::Request::new("ping", 1u64).into(),
            medusa_mcp_core::Request::new("ping", 2u64).into(),
        ];
        assert!(matches!(h.deliver(batch).await, Err(HttpError::SessionNotFound)));
    }
}
