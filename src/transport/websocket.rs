// src/transport/websocket.rs

//! WebSocket transport over `tokio-tungstenite`.
//!
//! `connect_websocket()` establishes the connection, splits the stream,
//! and spawns two tasks:
//!
//! - a write loop draining an mpsc channel into the sink, so `send()`
//!   never contends on the socket
//! - a read loop pumping inbound text frames into the [`Inbox`]
//!
//! A connection failure propagates to the caller; there is no retry or
//! reconnection. Closing sends a Close frame once and shuts the sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;

use crate::{log_debug, log_warn};
use crate::{ControlConfig, Error, Inbox, Result, Transport, TransportPtr};

enum WriteCommand {
    Frame(String),
    Shutdown,
}

struct WebSocketTransport {
    // ---
    writer: mpsc::UnboundedSender<WriteCommand>,
    closed: AtomicBool,
}

#[async_trait::async_trait]
impl Transport for WebSocketTransport {
    // ---
    async fn send(&self, frame: String) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }

        self.writer
            .send(WriteCommand::Frame(frame))
            .map_err(|_| Error::ConnectionClosed)
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // Write loop may already be gone if the peer dropped first.
        let _ = self.writer.send(WriteCommand::Shutdown);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Connect to the configured endpoint and return the duplex channel halves.
///
/// # Errors
///
/// Returns `Error::WebSocket` if the endpoint is unreachable or the
/// handshake fails. The failure is terminal; the caller decides whether
/// to try again.
pub async fn connect_websocket(config: &ControlConfig) -> Result<(TransportPtr, Inbox)> {
    // ---
    let url = config.url();
    let (stream, _response) = connect_async(url.as_str()).await?;
    log_debug!("connected to {url}");

    let (mut sink, mut source) = stream.split();

    let (write_tx, mut write_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        // ---
        while let Some(command) = write_rx.recv().await {
            match command {
                WriteCommand::Frame(text) => {
                    if let Err(_err) = sink.send(WsMessage::text(text)).await {
                        log_warn!("websocket send failed: {_err}");
                        break;
                    }
                }
                WriteCommand::Shutdown => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    let _ = sink.close().await;
                    break;
                }
            }
        }
    });

    let (frame_tx, frame_rx) = mpsc::channel(16);
    tokio::spawn(async move {
        // ---
        while let Some(next) = source.next().await {
            match next {
                Ok(WsMessage::Text(text)) => {
                    if frame_tx.send(text.to_string()).await.is_err() {
                        // Inbox dropped; nobody is listening anymore.
                        break;
                    }
                }
                Ok(WsMessage::Close(_)) => {
                    log_debug!("peer closed the connection");
                    break;
                }
                // Ping/pong is handled by tungstenite; the control
                // protocol has no binary frames.
                Ok(_) => {}
                Err(_err) => {
                    log_warn!("websocket receive failed: {_err}");
                    break;
                }
            }
        }
        // Dropping frame_tx ends the inbox stream.
    });

    let transport: TransportPtr = Arc::new(WebSocketTransport {
        writer: write_tx,
        closed: AtomicBool::new(false),
    });

    Ok((transport, Inbox { frames: frame_rx }))
}
