//! Service providers: flow operations plus API binding construction.

use tether_oauth::{OAuth1Operations, OAuth2Operations};

use crate::data::ApiTokens;

/// OAuth 1 provider that binds API type `A`.
pub trait OAuth1ServiceProvider<A>: Send + Sync {
    /// Flow operations used to obtain access tokens.
    fn oauth_operations(&self) -> &dyn OAuth1Operations;

    /// Build an API binding that signs requests with these credentials.
    fn get_api(&self, access_token: &str, secret: &str) -> A;

    /// Provider user id known from the access tokens alone, if any.
    ///
    /// Returning `None` makes the factory ask the [`ApiAdapter`](crate::ApiAdapter).
    fn extract_provider_user_id(&self, _tokens: &ApiTokens) -> Option<String> {
        None
    }
}

/// OAuth 2 provider that binds API type `A`.
pub trait OAuth2ServiceProvider<A>: Send + Sync {
    /// Flow operations used to obtain and refresh grants.
    fn oauth_operations(&self) -> &dyn OAuth2Operations;

    /// Build an API binding that sends `access_token` as a bearer token.
    fn get_api(&self, access_token: &str) -> A;

    /// Provider user id known from the grant alone, if any.
    ///
    /// Returning `None` makes the factory ask the [`ApiAdapter`](crate::ApiAdapter).
    fn extract_provider_user_id(&self, _tokens: &ApiTokens) -> Option<String> {
        None
    }
}
