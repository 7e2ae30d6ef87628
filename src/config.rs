//! Public, transport-agnostic client configuration.
//!
//! This type intentionally contains no WebSocket-specific concepts.
//! The transport layer is responsible for interpreting this config
//! into concrete connection settings.

use std::time::Duration;

/// Endpoint and identity configuration for a control client.
#[derive(Debug, Clone)]
pub struct ControlConfig {
    // ---
    /// Hostname of the external-control bridge server.
    pub host: String,

    /// TCP port of the bridge server.
    pub port: u16,

    /// Client identity declared in the connect handshake.
    ///
    /// If `None`, an identity is generated at connect time from the
    /// current wall-clock timestamp.
    pub client_id: Option<String>,

    /// Protocol version declared in the connect handshake.
    pub version: String,

    /// Capabilities declared in the connect handshake.
    pub capabilities: Vec<String>,

    /// Timeout for waiting on the correlated reply to a request.
    ///
    /// Default: 30 seconds
    pub request_timeout: Duration,
}

impl Default for ControlConfig {
    /// Default endpoint (`ws://localhost:8765`) with the standard
    /// handshake declaration and a 30 second request timeout.
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 8765,
            client_id: None,
            version: "1.0.0".to_owned(),
            capabilities: vec![
                "pipeline".to_owned(),
                "tools".to_owned(),
                "state".to_owned(),
            ],
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ControlConfig {
    /// Create a config for an explicit host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Set an explicit client identity for the handshake.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Replace the declared capability list.
    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the timeout for awaiting a correlated reply.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use viz_control::ControlConfig;
    ///
    /// let config = ControlConfig::new("localhost", 8765)
    ///     .with_request_timeout(Duration::from_secs(10));
    /// ```
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// WebSocket URL for the configured endpoint.
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}
