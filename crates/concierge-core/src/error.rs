use thiserror::Error;

/// Top-level error type for Concierge.
#[derive(Debug, Error)]
pub enum ConciergeError {
    /// Error from a reasoning provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from a capability service that escaped the dispatcher.
    #[error("capability error: {0}")]
    Capability(#[from] CapabilityError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Memory/storage error.
    #[error("memory error: {0}")]
    Memory(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Typed failure returned by a capability service.
///
/// The dispatcher turns each variant into a reply for the user. None of
/// these are retried by the core.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapabilityError {
    /// The user never linked the account backing this capability.
    #[error("{service}: OAUTH_NOT_CONNECTED")]
    OAuthNotConnected { service: String },

    /// The linked account's token is no longer valid.
    #[error("{service}: OAUTH_EXPIRED")]
    OAuthExpired { service: String },

    /// The upstream lookup came back empty.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network or API failure.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// The call did not finish within the integration timeout.
    #[error("{service}: timed out")]
    Timeout { service: String },

    /// No capability is registered for the domain.
    #[error("{service}: not configured")]
    NotConfigured { service: String },
}

impl CapabilityError {
    /// Whether the user can fix this by reconnecting an account.
    pub fn needs_reconnect(&self) -> bool {
        matches!(
            self,
            Self::OAuthNotConnected { .. } | Self::OAuthExpired { .. }
        )
    }

    /// Map a wire error code (as sent by capability services) to a typed error.
    pub fn from_code(code: &str, service: &str, detail: &str) -> Self {
        match code {
            "OAUTH_NOT_CONNECTED" => Self::OAuthNotConnected {
                service: service.to_string(),
            },
            "OAUTH_EXPIRED" => Self::OAuthExpired {
                service: service.to_string(),
            },
            "NOT_FOUND" => Self::NotFound(detail.to_string()),
            "TIMEOUT" => Self::Timeout {
                service: service.to_string(),
            },
            _ => Self::Upstream(format!("{service}: {detail}")),
        }
    }
}
