// src/transport/mod.rs

//! Concrete transport implementations.
//!
//! - `websocket` — production transport over `tokio-tungstenite`
//! - `memory` — in-process reference implementation for tests

mod memory;
mod websocket;

pub use memory::{create_memory_transport, MemoryEndpoint};
pub use websocket::connect_websocket;
