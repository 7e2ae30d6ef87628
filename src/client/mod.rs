// src/client/mod.rs
//! Control client implementation.
//!
//! This module contains the core [`ControlClient`] type which sends
//! JSON command messages to the bridge server and correlates the
//! asynchronous replies back to the call that issued them.
//!
//! # Architecture
//!
//! The client owns its duplex channel exclusively and runs a single
//! background receive loop draining the transport [`Inbox`].
//!
//! Each outbound message gets a unique identifier and registers a
//! oneshot channel in the pending table *before* the frame is
//! transmitted, so a reply can never race the caller. When a reply
//! arrives, the receive loop looks up the channel by identifier and
//! delivers the message to the waiting call. Inbound messages with no
//! pending entry — server pushes, or replies to abandoned requests —
//! are dropped with a debug log.
//!
//! # Concurrency
//!
//! Multiple requests can be in flight simultaneously. The pending table
//! is protected by a mutex but lock contention is minimal since
//! operations are just HashMap insert/remove.

mod pending;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio::time;

use pending::PendingRequests;

use crate::{log_debug, log_warn};
use crate::{
    // ---
    ControlConfig,
    Error,
    Inbox,
    Message,
    MessageId,
    MessageKind,
    Result,
    TransportPtr,
};

/// Acquire a mutex guard, intentionally ignoring poisoning.
///
/// Mutex poisoning indicates that another task panicked while holding the
/// lock. The protected state here is a best-effort pending-reply table
/// (message id → oneshot channel).
///
/// Ignoring poisoning is acceptable because:
/// - There are no invariants spanning multiple entries.
/// - The worst outcome is a dropped or unmatched reply.
/// - Connection-level failures are handled by the receive loop.
///
/// This avoids propagating non-`Send` poison errors across async boundaries.
fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // ---
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Running control client instance.
///
/// Cheap to clone (internally `Arc`-backed).
#[derive(Clone)]
pub struct ControlClient {
    inner: Arc<Inner>,
}

struct Inner {
    // ---
    transport: TransportPtr,
    config: ControlConfig,
    pending: Mutex<PendingRequests>,
    closed: AtomicBool,

    /// Best-effort receive loop handle.
    ///
    /// We keep it so the task isn't immediately dropped, and so it can be
    /// extended later (join-on-close, etc.).
    _rx_task: JoinHandle<()>,
}

impl ControlClient {
    // ---
    /// Connect to the configured endpoint over WebSocket.
    ///
    /// Establishes the connection and immediately sends the `connect`
    /// handshake declaring client identity, version, and capabilities.
    /// The handshake is fire-and-forget; the server does not have to
    /// acknowledge it.
    ///
    /// # Errors
    ///
    /// Returns `Error::WebSocket` if the endpoint is unreachable. The
    /// failure is not retried; it propagates to the caller.
    pub async fn connect(config: ControlConfig) -> Result<Self> {
        // ---
        let (transport, inbox) = crate::transport::connect_websocket(&config).await?;
        Self::with_transport(transport, inbox, config).await
    }

    /// Create a client with an explicitly provided transport.
    ///
    /// This is the constructor you want for tests and for advanced users.
    pub async fn with_transport(
        transport: TransportPtr,
        inbox: Inbox,
        config: ControlConfig,
    ) -> Result<Self> {
        // ---
        let mut frames = inbox.frames;

        // We build the Arc cyclically so the receive loop holds only a
        // weak handle and exits once the client is dropped.
        let inner = Arc::new_cyclic(|weak| {
            // ---
            let weak = weak.clone();

            // Spawn receive-dispatch loop.
            let rx_task = tokio::spawn(async move {
                // ---
                while let Some(frame) = frames.recv().await {
                    let Some(inner) = weak.upgrade() else {
                        // Client was dropped, exit loop
                        break;
                    };

                    let client = ControlClient { inner };
                    if let Err(_err) = client.dispatch(&frame) {
                        log_warn!("inbound frame dropped: {_err}");
                    }
                }

                // Stream ended: peer closed or transport torn down.
                // Fail outstanding waiters so callers see the closure
                // instead of waiting out their full timeout.
                if let Some(inner) = weak.upgrade() {
                    inner.closed.store(true, Ordering::SeqCst);
                    lock_ignore_poison(&inner.pending).fail_all();
                    log_debug!("control channel closed");
                }
            });

            Inner {
                // ---
                transport,
                config,
                pending: Mutex::new(PendingRequests::new()),
                closed: AtomicBool::new(false),
                _rx_task: rx_task,
            }
        });

        let client = Self { inner };
        client.send_handshake().await?;

        Ok(client)
    }

    /// Send the initial `connect` declaration.
    async fn send_handshake(&self) -> Result<()> {
        // ---
        let client_id = match &self.inner.config.client_id {
            Some(id) => id.clone(),
            None => format!("rust-client-{}", crate::protocol::now_millis()),
        };

        let payload = json!({
            "clientId": client_id,
            "version": self.inner.config.version,
            "capabilities": self.inner.config.capabilities,
        });

        // No reply is awaited, so release the completion handle that
        // send() registered.
        let id = self.send(MessageKind::Connect, payload).await?;
        lock_ignore_poison(&self.inner.pending).abandon(&id);

        Ok(())
    }

    /// Build a message with a fresh identifier, transmit it, and return
    /// the identifier immediately.
    ///
    /// A completion handle is registered under the identifier before the
    /// frame leaves, so [`await_response`](Self::await_response) can be
    /// called afterwards without a window in which the reply could be
    /// missed.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConnectionClosed` if the client has disconnected,
    /// `Error::Serialization` if the payload cannot be encoded, or a
    /// transport error if the frame cannot be transmitted.
    pub async fn send(&self, kind: MessageKind, payload: Value) -> Result<MessageId> {
        // ---
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }

        let message = Message::new(kind, payload);
        let id = message.id.clone();
        let frame = serde_json::to_string(&message)?;

        {
            let mut pending = lock_ignore_poison(&self.inner.pending);
            pending.register(id.clone());
        }

        if let Err(err) = self.inner.transport.send(frame).await {
            lock_ignore_poison(&self.inner.pending).abandon(&id);
            return Err(err);
        }

        Ok(id)
    }

    /// Wait for the reply whose identifier equals `id`.
    ///
    /// `timeout` overrides the configured request timeout when set.
    /// On timeout the pending entry is abandoned and `Error::Timeout`
    /// is returned; no partial result is produced.
    ///
    /// # Errors
    ///
    /// - `Error::Timeout` - no matching reply within the window
    /// - `Error::ConnectionClosed` - channel closed while waiting
    /// - `Error::Transport` - `id` was never sent or already awaited
    pub async fn await_response(
        &self,
        id: &MessageId,
        timeout: Option<Duration>,
    ) -> Result<Message> {
        // ---
        let handle = {
            let mut pending = lock_ignore_poison(&self.inner.pending);
            pending.take(id)
        };

        let Some(rx) = handle else {
            return Err(Error::Transport(format!("no pending request for id {id}")));
        };

        let timeout = timeout.unwrap_or(self.inner.config.request_timeout);

        match time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => {
                // Sender dropped: the receive loop failed all waiters.
                Err(Error::ConnectionClosed)
            }
            Err(_) => {
                lock_ignore_poison(&self.inner.pending).abandon(id);
                Err(Error::Timeout)
            }
        }
    }

    /// Send a request and await its correlated reply.
    async fn request(&self, kind: MessageKind, payload: Value) -> Result<Message> {
        // ---
        let id = self.send(kind, payload).await?;
        self.await_response(&id, None).await
    }

    /// Invoke a named remote tool and return its result value.
    ///
    /// # Errors
    ///
    /// Returns `Error::Remote` carrying the server's message string if
    /// the reply is error-typed, in addition to the usual send/await
    /// failures.
    pub async fn call_tool(&self, tool: &str, args: Value) -> Result<Value> {
        // ---
        self.request(MessageKind::ToolCall, json!({ "tool": tool, "args": args }))
            .await?
            .into_result()
    }

    /// Create a pipeline from a node/edge spec.
    ///
    /// The spec is opaque to the client; it is serialized and forwarded
    /// as-is. The returned value carries the server-assigned
    /// `pipelineId`.
    pub async fn create_pipeline(&self, spec: Value) -> Result<Value> {
        // ---
        let payload = json!({
            "spec": spec,
            "options": {
                "validateFirst": true,
                "autoConnect": true,
            },
        });

        self.request(MessageKind::PipelineCreate, payload)
            .await?
            .into_result()
    }

    /// Run sample rows through an existing pipeline.
    pub async fn test_pipeline(&self, pipeline_id: &str, test_data: Value) -> Result<Value> {
        // ---
        let payload = json!({
            "pipelineId": pipeline_id,
            "testData": test_data,
            "options": {
                "timeout": 30_000,
                "captureIntermediateResults": true,
            },
        });

        self.request(MessageKind::PipelineTest, payload)
            .await?
            .into_result()
    }

    /// Capture a screenshot of the current visualization.
    pub async fn capture_visualization(&self, format: &str, quality: f64) -> Result<Value> {
        // ---
        self.call_tool(
            "captureVisualization",
            json!({ "format": format, "quality": quality }),
        )
        .await
    }

    /// Fetch the current project state (nodes and edges).
    pub async fn get_current_project(&self) -> Result<Value> {
        // ---
        self.call_tool("getCurrentProject", json!({})).await
    }

    /// Close the channel.
    ///
    /// Idempotent: a redundant call is a no-op, and close failures are
    /// logged rather than raised so cleanup paths can always run this.
    pub async fn disconnect(&self) {
        // ---
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Err(_err) = self.inner.transport.close().await {
            log_warn!("transport close failed: {_err}");
        }

        lock_ignore_poison(&self.inner.pending).fail_all();
    }

    /// Whether the client has disconnected or lost its channel.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Route one inbound frame to its pending waiter.
    fn dispatch(&self, frame: &str) -> Result<()> {
        // ---
        let message: Message = serde_json::from_str(frame)?;
        let id = message.id.clone();

        let mut pending = lock_ignore_poison(&self.inner.pending);
        if !pending.complete(&id, message) {
            // Unsolicited push, or a reply to an abandoned request.
            log_debug!("discarding unmatched message (id: {id})");
        }

        Ok(())
    }
}
