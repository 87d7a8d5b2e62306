//! OAuth 1.0 / 1.0a three-legged flow.
//!
//! The flow moves through three credential states:
//!
//! 1. [`OAuth1Operations::fetch_request_token`] obtains temporary credentials
//! 2. The user visits [`OAuth1Operations::build_authorize_url`] and the
//!    provider returns a verifier, producing an [`AuthorizedRequestToken`]
//! 3. [`OAuth1Operations::exchange_for_access_token`] trades it for token
//!    credentials
//!
//! Failures at any step are returned to the caller; nothing is retried here.

mod template;

pub use tether_config::OAuth1Version;
pub use template::OAuth1Template;

use crate::error::OAuthError;

/// Token value and secret, for both request and access tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthToken {
    /// `oauth_token` value.
    pub value: String,
    /// `oauth_token_secret` value.
    pub secret: String,
}

impl OAuthToken {
    /// Create a token pair.
    pub fn new(value: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secret: secret.into(),
        }
    }
}

/// Request token the user has authorized, with the 1.0a verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedRequestToken {
    /// The request token returned by step 1.
    pub token: OAuthToken,
    /// `oauth_verifier` from the callback (absent for OAuth 1.0).
    pub verifier: Option<String>,
}

impl AuthorizedRequestToken {
    /// Pair a request token with the verifier from the provider callback.
    pub fn new(token: OAuthToken, verifier: impl Into<String>) -> Self {
        Self {
            token,
            verifier: Some(verifier.into()),
        }
    }
}

/// Parameters for the authorize/authenticate redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuth1Parameters {
    /// Callback URL; placed on the redirect only for OAuth 1.0 providers.
    pub callback_url: Option<String>,
    /// Provider-specific query parameters.
    pub additional: Vec<(String, String)>,
}

/// OAuth 1 service provider flow operations.
pub trait OAuth1Operations: Send + Sync {
    /// Protocol revision spoken by the provider.
    fn version(&self) -> OAuth1Version;

    /// Step 1: obtain a request token.
    ///
    /// OAuth 1.0a sends `callback_url` (or `oob`) as `oauth_callback`;
    /// OAuth 1.0 omits it.
    fn fetch_request_token(
        &self,
        callback_url: Option<&str>,
        additional: &[(String, String)],
    ) -> Result<OAuthToken, OAuthError>;

    /// Step 2: URL the user visits to authorize the request token.
    fn build_authorize_url(&self, request_token: &str, params: &OAuth1Parameters) -> String;

    /// Step 2 for sign-in: the authenticate URL, or the authorize URL if
    /// the provider has no separate one.
    fn build_authenticate_url(&self, request_token: &str, params: &OAuth1Parameters) -> String;

    /// Step 3: exchange an authorized request token for an access token.
    fn exchange_for_access_token(
        &self,
        request_token: &AuthorizedRequestToken,
        additional: &[(String, String)],
    ) -> Result<OAuthToken, OAuthError>;
}
