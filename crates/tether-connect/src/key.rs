//! Connection identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a connection by provider and the user's id at that provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionKey {
    provider_id: String,
    provider_user_id: Option<String>,
}

impl ConnectionKey {
    /// Create a key.
    pub fn new(provider_id: impl Into<String>, provider_user_id: Option<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            provider_user_id,
        }
    }

    /// Provider id (e.g., `twitter`).
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// User id at the provider, if known.
    pub fn provider_user_id(&self) -> Option<&str> {
        self.provider_user_id.as_deref()
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider_user_id {
            Some(user_id) => write!(f, "{}:{user_id}", self.provider_id),
            None => f.write_str(&self.provider_id),
        }
    }
}
