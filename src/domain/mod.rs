// src/domain/mod.rs

//! Internal domain abstractions shared by the client and transport layers.

mod transport;

pub use transport::{Inbox, Transport, TransportPtr};
