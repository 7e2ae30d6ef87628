use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Process-wide message sequence counter.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Current wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Unique identifier used to match control requests and responses.
///
/// Generated client-side from a monotonically increasing counter plus
/// the current wall-clock timestamp, e.g. `rs-7-1724582400123`.
/// Uniqueness is best-effort: counter reset across restarts is covered
/// by the timestamp component, clock skew is not.
///
/// Identifiers are carried *in-band* inside message envelopes and are
/// opaque to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Generate the identifier for the next outbound message.
    pub fn generate() -> Self {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1;
        Self(format!("rs-{seq}-{}", now_millis()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_generate_unique() {
        // ---
        let id1 = MessageId::generate();
        let id2 = MessageId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_sequence_monotonic() {
        // ---
        let first = MessageId::generate();
        let second = MessageId::generate();

        let seq = |id: &MessageId| -> u64 {
            id.as_str()
                .split('-')
                .nth(1)
                .and_then(|s| s.parse().ok())
                .unwrap()
        };

        assert!(seq(&second) > seq(&first));
    }

    #[test]
    fn test_format() {
        // ---
        let id = MessageId::generate();
        assert!(id.to_string().starts_with("rs-"));
    }

    #[test]
    fn test_serde_transparent() {
        // ---
        let id = MessageId::from("rs-1-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"rs-1-42\"");
    }
}
