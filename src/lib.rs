//! Remote-control client for a node-graph visualization tool.
//!
//! This library speaks the tool's external-control protocol: JSON
//! command messages over a WebSocket duplex channel, each tagged with a
//! unique identifier so the asynchronous reply can be matched back to
//! the call that issued it. It handles identifier generation,
//! request/response correlation, timeout handling, and concurrent
//! in-flight requests.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use viz_control::{ControlClient, ControlConfig};
//!
//! # async fn example() -> viz_control::Result<()> {
//! let client = ControlClient::connect(ControlConfig::default()).await?;
//!
//! let project = client.get_current_project().await?;
//! println!("{} nodes", project["nodes"].as_array().map_or(0, Vec::len));
//!
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```

// Import all sub modules once...
mod client;
mod config;
mod domain;
mod error;
mod macros;
mod protocol;
mod transport;

pub(crate) use macros::{log_debug, log_warn};

// Re-export main types
pub use client::ControlClient;

pub use config::ControlConfig;

pub use error::{Error, Result};

pub use protocol::{Message, MessageId, MessageKind};

// --- public re-exports
pub use domain::{
    //
    Inbox,
    Transport,
    TransportPtr,
};

pub use transport::{connect_websocket, create_memory_transport, MemoryEndpoint};
