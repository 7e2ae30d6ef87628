// src/domain/transport.rs

//! Transport domain abstraction.
//!
//! This module defines the domain-level duplex channel interface used by
//! the client layer. It intentionally avoids any reference to concrete
//! protocols or client libraries.
//!
//! The transport layer is responsible only for delivering opaque text
//! frames in both directions. Higher-level semantics such as message
//! correlation and timeouts are handled by the client.
//!
//! Concrete implementations of this interface live under `src/transport/`.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::Result;

/// One side of a duplex channel.
///
/// Implementations must ensure that:
/// - `send()` transmits one outbound text frame and is non-blocking with
///   respect to the peer.
/// - `close()` is idempotent; redundant calls are no-ops and must not fail.
/// - Frames are delivered in the order the underlying channel provides
///   them; no durability or redelivery is implied.
///
/// The in-memory transport serves as the reference implementation of
/// these semantics.
///
/// # Notes
///
/// This trait uses `async_trait`; the expanded documentation may show
/// explicit lifetimes and a boxed `Future`. This is an implementation
/// detail — consumers should treat methods as normal `async fn`s.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    // ---
    /// Transmit one outbound text frame.
    async fn send(&self, frame: String) -> Result<()>;

    /// Close the channel and release any associated resources.
    ///
    /// Safe to call when already closed.
    async fn close(&self) -> Result<()>;

    /// Whether `close()` has been called on this transport.
    fn is_closed(&self) -> bool;
}

/// Shared transport pointer.
///
/// This is an `Arc<dyn Transport>`, which means:
/// - `.clone()` is cheap (only increments a reference count)
/// - Multiple clones share the same underlying connection
/// - Used to erase concrete transport types behind a stable domain interface.
pub type TransportPtr = Arc<dyn Transport>;

/// Receiving half of a duplex channel.
///
/// The stream ends (yields `None`) when the peer closes the connection
/// or the transport is torn down.
pub struct Inbox {
    // ---
    /// Receiver channel for inbound text frames.
    pub frames: mpsc::Receiver<String>,
}
