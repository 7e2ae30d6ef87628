use std::collections::HashMap;

use tokio::sync::oneshot;

use crate::protocol::{Message, MessageId};

/// Tracks sent messages awaiting replies
///
/// Maps each message identifier to a oneshot channel. The sending half
/// is completed by the receive-dispatch loop when the matching reply
/// arrives; the receiving half is handed to the caller of
/// `await_response`.
pub(super) struct PendingRequests {
    // ---
    waiters: HashMap<MessageId, oneshot::Sender<Message>>,
    handles: HashMap<MessageId, oneshot::Receiver<Message>>,
}

impl PendingRequests {
    // ---

    /// Create a new empty pending table
    pub fn new() -> Self {
        // ---
        Self {
            waiters: HashMap::new(),
            handles: HashMap::new(),
        }
    }

    /// Register an identifier before its message is transmitted
    ///
    /// The receiving half stays in the table until `take()` claims it,
    /// so a reply that races ahead of `await_response` is buffered in
    /// the channel rather than lost.
    pub fn register(&mut self, id: MessageId) {
        // ---
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(id.clone(), tx);
        self.handles.insert(id, rx);
    }

    /// Claim the completion handle for an identifier
    ///
    /// Returns `None` if the identifier was never registered or was
    /// already claimed.
    pub fn take(&mut self, id: &MessageId) -> Option<oneshot::Receiver<Message>> {
        // ---
        self.handles.remove(id)
    }

    /// Complete a pending request with its reply
    ///
    /// Returns true if the identifier was found and the reply was delivered.
    pub fn complete(&mut self, id: &MessageId, reply: Message) -> bool {
        // ---
        if let Some(tx) = self.waiters.remove(id) {
            // Ignore failure; the receiver is dropped when the request
            // was abandoned after a timeout.
            let _ = tx.send(reply);
            true
        } else {
            false
        }
    }

    /// Remove a pending request without delivering a reply
    ///
    /// Used for timeout cleanup and failed sends.
    pub fn abandon(&mut self, id: &MessageId) -> bool {
        // ---
        self.handles.remove(id);
        self.waiters.remove(id).is_some()
    }

    /// Drop every pending entry, failing all outstanding waiters
    ///
    /// Used when the channel closes underneath the client.
    pub fn fail_all(&mut self) {
        // ---
        self.waiters.clear();
        self.handles.clear();
    }

    /// Number of requests still awaiting a reply
    pub fn len(&self) -> usize {
        // ---
        self.waiters.len()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::protocol::MessageKind;
    use serde_json::json;

    fn reply_for(id: &MessageId) -> Message {
        Message::reply(id.clone(), MessageKind::ToolResult, json!({"result": 1}))
    }

    #[test]
    fn test_register_and_complete() {
        // ---
        let mut pending = PendingRequests::new();
        let id = MessageId::generate();

        pending.register(id.clone());
        assert_eq!(pending.len(), 1);

        let rx = pending.take(&id).unwrap();
        assert!(pending.complete(&id, reply_for(&id)));
        assert_eq!(pending.len(), 0);

        let received = rx.blocking_recv().unwrap();
        assert_eq!(received.id, id);
    }

    #[test]
    fn test_reply_buffered_until_taken() {
        // ---
        let mut pending = PendingRequests::new();
        let id = MessageId::generate();

        pending.register(id.clone());

        // Reply lands before anyone awaits it.
        assert!(pending.complete(&id, reply_for(&id)));

        let rx = pending.take(&id).unwrap();
        assert_eq!(rx.blocking_recv().unwrap().id, id);
    }

    #[test]
    fn test_complete_unknown_id() {
        // ---
        let mut pending = PendingRequests::new();
        let id = MessageId::generate();

        assert!(!pending.complete(&id, reply_for(&id)));
    }

    #[test]
    fn test_abandon() {
        // ---
        let mut pending = PendingRequests::new();
        let id = MessageId::generate();

        pending.register(id.clone());
        assert!(pending.abandon(&id));
        assert_eq!(pending.len(), 0);

        // Second abandon should return false
        assert!(!pending.abandon(&id));
        assert!(pending.take(&id).is_none());
    }

    #[test]
    fn test_fail_all_drops_waiters() {
        // ---
        let mut pending = PendingRequests::new();
        let id = MessageId::generate();

        pending.register(id.clone());
        let rx = pending.take(&id).unwrap();

        pending.fail_all();
        assert_eq!(pending.len(), 0);
        assert!(rx.blocking_recv().is_err());
    }
}
