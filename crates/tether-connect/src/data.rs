//! Persistable connection state and the unified token model.

use serde::{Deserialize, Serialize};
use tether_oauth::{AccessGrant, OAuthToken};

use crate::error::ConnectionError;
use crate::key::ConnectionKey;

/// Flat snapshot of a connection, as stored by a connection repository.
///
/// `secret` is set only for OAuth 1 connections; `refresh_token` and
/// `expire_time` only for OAuth 2 connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionData {
    pub provider_id: String,
    pub provider_user_id: Option<String>,
    pub display_name: Option<String>,
    pub profile_url: Option<String>,
    pub image_url: Option<String>,
    pub access_token: String,
    pub secret: Option<String>,
    pub refresh_token: Option<String>,
    /// Expiry in epoch milliseconds.
    pub expire_time: Option<u64>,
}

impl ConnectionData {
    /// Key of the connection this snapshot was taken from.
    pub fn key(&self) -> ConnectionKey {
        ConnectionKey::new(&self.provider_id, self.provider_user_id.clone())
    }

    /// Split the token fields into [`ApiTokens`].
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::InvalidData`] if both `secret` and
    /// OAuth 2 fields are populated.
    pub fn tokens(&self) -> Result<ApiTokens, ConnectionError> {
        match &self.secret {
            Some(secret) => {
                if self.refresh_token.is_some() || self.expire_time.is_some() {
                    return Err(ConnectionError::InvalidData(format!(
                        "connection to '{}' has both an OAuth 1 secret and OAuth 2 token fields",
                        self.provider_id
                    )));
                }
                Ok(ApiTokens::OAuth1 {
                    access_token: self.access_token.clone(),
                    secret: secret.clone(),
                })
            }
            None => Ok(ApiTokens::OAuth2 {
                access_token: self.access_token.clone(),
                refresh_token: self.refresh_token.clone(),
                expire_time: self.expire_time,
            }),
        }
    }
}

/// Credentials a connection authorizes its API binding with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiTokens {
    /// OAuth 1 access token and token secret.
    OAuth1 { access_token: String, secret: String },
    /// OAuth 2 bearer token with optional refresh token and expiry.
    OAuth2 {
        access_token: String,
        refresh_token: Option<String>,
        /// Expiry in epoch milliseconds.
        expire_time: Option<u64>,
    },
}

impl ApiTokens {
    pub fn access_token(&self) -> &str {
        match self {
            Self::OAuth1 { access_token, .. } | Self::OAuth2 { access_token, .. } => access_token,
        }
    }

    pub fn secret(&self) -> Option<&str> {
        match self {
            Self::OAuth1 { secret, .. } => Some(secret),
            Self::OAuth2 { .. } => None,
        }
    }

    pub fn refresh_token(&self) -> Option<&str> {
        match self {
            Self::OAuth1 { .. } => None,
            Self::OAuth2 { refresh_token, .. } => refresh_token.as_deref(),
        }
    }

    pub fn expire_time(&self) -> Option<u64> {
        match self {
            Self::OAuth1 { .. } => None,
            Self::OAuth2 { expire_time, .. } => *expire_time,
        }
    }
}

impl From<OAuthToken> for ApiTokens {
    fn from(token: OAuthToken) -> Self {
        Self::OAuth1 {
            access_token: token.value,
            secret: token.secret,
        }
    }
}

impl From<AccessGrant> for ApiTokens {
    fn from(grant: AccessGrant) -> Self {
        Self::OAuth2 {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expire_time: grant.expire_time,
        }
    }
}
