// src/transport/memory.rs

//! In-memory transport implementation.
//!
//! This file contains the concrete implementation of the domain-level
//! `Transport` trait using in-process channels only.
//!
//! The memory transport is the **reference implementation** of transport
//! semantics. It is intended for testing and for validating client
//! behavior without introducing network or timing-related variability:
//! a test double reads the frames the client sent from the
//! [`MemoryEndpoint`] and injects replies through it.
//!
//! ## Non-Goals
//!
//! - Network behavior or failure simulation
//! - Exact emulation of WebSocket framing

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{Error, Inbox, Result, Transport, TransportPtr};

struct MemoryTransport {
    // ---
    outbound: mpsc::Sender<String>,
    closed: AtomicBool,
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    // ---
    async fn send(&self, frame: String) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }

        self.outbound
            .send(frame)
            .await
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Close the transport.
    ///
    /// Sends stop being accepted; frames already delivered to the
    /// endpoint remain readable.
    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Peer-side handle for driving a memory transport from a test.
pub struct MemoryEndpoint {
    // ---
    /// Frames the client has sent, in order.
    pub sent: mpsc::Receiver<String>,

    /// Sender for injecting frames into the client's inbox.
    pub replies: mpsc::Sender<String>,
}

/// Create a new in-memory transport.
///
/// Returns the client-side transport and inbox plus the peer-side
/// endpoint. Dropping the endpoint ends the client's inbox stream, the
/// same way a peer disconnect would.
pub fn create_memory_transport() -> (TransportPtr, Inbox, MemoryEndpoint) {
    // ---
    let (sent_tx, sent_rx) = mpsc::channel(16);
    let (reply_tx, reply_rx) = mpsc::channel(16);

    let transport: TransportPtr = Arc::new(MemoryTransport {
        outbound: sent_tx,
        closed: AtomicBool::new(false),
    });

    (
        transport,
        Inbox { frames: reply_rx },
        MemoryEndpoint {
            sent: sent_rx,
            replies: reply_tx,
        },
    )
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[tokio::test]
    async fn test_frames_reach_endpoint_in_order() {
        // ---
        let (transport, _inbox, mut endpoint) = create_memory_transport();

        transport.send("first".to_owned()).await.unwrap();
        transport.send("second".to_owned()).await.unwrap();

        assert_eq!(endpoint.sent.recv().await.unwrap(), "first");
        assert_eq!(endpoint.sent.recv().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        // ---
        let (transport, _inbox, _endpoint) = create_memory_transport();

        transport.close().await.unwrap();
        assert!(transport.is_closed());

        let err = transport.send("late".to_owned()).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        // ---
        let (transport, _inbox, _endpoint) = create_memory_transport();

        transport.close().await.unwrap();
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_inbox_ends_when_endpoint_dropped() {
        // ---
        let (_transport, mut inbox, endpoint) = create_memory_transport();

        drop(endpoint);
        assert!(inbox.frames.recv().await.is_none());
    }
}
