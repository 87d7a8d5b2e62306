//! OAuth 2 authorization code flow.

mod grant;
mod template;

pub use grant::{AccessGrant, GrantType, OAuth2Parameters};
pub use template::OAuth2Template;
pub use tether_config::ClientAuthentication;

use crate::error::OAuthError;

/// OAuth 2 service provider flow operations.
pub trait OAuth2Operations: Send + Sync {
    /// URL that starts the authorization flow.
    fn build_authorize_url(&self, grant_type: GrantType, params: &OAuth2Parameters) -> String;

    /// Sign-in URL; the authorize URL if the provider has no separate one.
    fn build_authenticate_url(&self, grant_type: GrantType, params: &OAuth2Parameters) -> String;

    /// Exchange an authorization code for an access grant.
    fn exchange_for_access(
        &self,
        authorization_code: &str,
        redirect_uri: &str,
        additional: &[(String, String)],
    ) -> Result<AccessGrant, OAuthError>;

    /// Obtain a new access grant with a refresh token.
    fn refresh_access(
        &self,
        refresh_token: &str,
        additional: &[(String, String)],
    ) -> Result<AccessGrant, OAuthError>;
}
