//! Error types for connections and factory lookup.

use tether_oauth::OAuthError;

/// Error reported by a provider API binding.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Provider rejected the credentials.
    #[error("not authorized by provider")]
    NotAuthorized,

    /// Provider answered with an error payload.
    #[error("provider error: {message}")]
    Provider {
        /// Provider-supplied error description.
        message: String,
    },

    /// Request never produced a provider answer.
    #[error("API transport failed")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Error from connection operations and factory lookup.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// OAuth 2 access token expired; call `refresh()` and retry.
    #[error("authorization for provider '{provider_id}' has expired")]
    ExpiredAuthorization {
        /// Provider of the expired connection.
        provider_id: String,
    },

    /// Provider API call failed.
    #[error("API call failed")]
    Api(#[from] ApiError),

    /// Token exchange or signing failed.
    #[error("OAuth error")]
    OAuth(#[from] OAuthError),

    /// No factory for the requested provider id or API type.
    #[error("no connection factory registered for {0}")]
    NotRegistered(String),

    /// A factory for the provider id or API type already exists.
    #[error("connection factory already registered for {0}")]
    AlreadyRegistered(String),

    /// Provider is registered for a different API type.
    #[error("provider '{provider_id}' is not bound to API type {requested}")]
    ApiTypeMismatch {
        /// Requested provider id.
        provider_id: String,
        /// Requested API type name.
        requested: &'static str,
    },

    /// Persisted connection data is inconsistent.
    #[error("invalid connection data: {0}")]
    InvalidData(String),

    /// Refresh requested on a connection without a refresh token.
    #[error("connection to '{provider_id}' has no refresh token")]
    MissingRefreshToken {
        /// Provider of the connection.
        provider_id: String,
    },
}

impl ConnectionError {
    /// Whether this is the expired-authorization signal.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::ExpiredAuthorization { .. })
    }

    /// Whether this error stems from setup rather than a provider exchange.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::NotRegistered(_) | Self::AlreadyRegistered(_) | Self::ApiTypeMismatch { .. } => true,
            Self::OAuth(err) => err.is_configuration(),
            _ => false,
        }
    }
}
