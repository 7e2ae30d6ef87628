/// Wire format for control messages and correlation ID management
///
/// This module defines the JSON message envelope exchanged with the
/// bridge server and the client-side identifier scheme used to match
/// requests with their replies.
mod correlation;
mod message;

pub use correlation::MessageId;
pub use message::{Message, MessageKind};

pub(crate) use correlation::now_millis;
