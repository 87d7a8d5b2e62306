//! The provider-neutral connection contract.
//!
//! A connection wraps one user's tokens for one provider together with an
//! API binding built from those tokens. Profile values (display name,
//! profile URL, image URL) are fetched lazily, once, under the connection's
//! lock. OAuth 2 connections additionally expire and refresh.
//!
//! Provider calls go through [`Api`], which checks expiry before handing out
//! the binding, so no call is ever made with a token known to be expired.

mod base;
mod oauth1;
mod oauth2;

use std::sync::Arc;

pub use oauth1::OAuth1Connection;
pub use oauth2::OAuth2Connection;

use crate::data::ConnectionData;
use crate::error::{ApiError, ConnectionError};
use crate::key::ConnectionKey;
use crate::profile::UserProfile;

/// Uniform handle to one authorized link between a user and a provider.
pub trait Connection<A>: Send + Sync {
    /// Identity of this connection; never changes.
    fn key(&self) -> &ConnectionKey;

    /// Display name at the provider (loads profile values on first use).
    fn display_name(&self) -> Result<Option<String>, ConnectionError>;

    /// Public profile URL (loads profile values on first use).
    fn profile_url(&self) -> Result<Option<String>, ConnectionError>;

    /// Profile image URL (loads profile values on first use).
    fn image_url(&self) -> Result<Option<String>, ConnectionError>;

    /// Whether the connection works. Never fails; problems yield `false`.
    fn test(&self) -> bool;

    /// Whether the access token has expired. Always `false` for OAuth 1.
    fn has_expired(&self) -> bool;

    /// Renew the access token. A no-op for OAuth 1.
    fn refresh(&self) -> Result<(), ConnectionError>;

    /// Fetch the user's profile from the provider.
    fn fetch_user_profile(&self) -> Result<UserProfile, ConnectionError>;

    /// Post a status update on the user's behalf.
    fn update_status(&self, message: &str) -> Result<(), ConnectionError>;

    /// Re-fetch the cached profile values.
    fn sync(&self) -> Result<(), ConnectionError>;

    /// Expiry-checked handle to the provider API binding.
    fn api(&self) -> Api<A>;

    /// Snapshot of the persistable state.
    fn create_data(&self) -> Result<ConnectionData, ConnectionError>;
}

/// Hands out the current API binding if the connection is usable.
pub(crate) trait ApiSource<A>: Send + Sync {
    fn checked_api(&self) -> Result<Arc<A>, ConnectionError>;
}

/// Expiry-checked handle to a connection's API binding.
///
/// Every access re-checks expiry and picks up the binding rebuilt by the
/// latest refresh, so a handle obtained before a refresh keeps working
/// after it.
pub struct Api<A> {
    source: Arc<dyn ApiSource<A>>,
}

impl<A> Clone for Api<A> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<A> Api<A> {
    pub(crate) fn new(source: Arc<dyn ApiSource<A>>) -> Self {
        Self { source }
    }

    /// Current binding, checked for expiry. Must not be held past the call.
    pub(crate) fn get(&self) -> Result<Arc<A>, ConnectionError> {
        self.source.checked_api()
    }

    /// Run `f` against the binding unless the connection has expired.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::ExpiredAuthorization`] if the access token
    /// has expired.
    pub fn call<R>(&self, f: impl FnOnce(&A) -> R) -> Result<R, ConnectionError> {
        let api = self.get()?;
        Ok(f(&api))
    }

    /// Like [`call`](Self::call) for fallible provider calls.
    pub fn try_call<R>(&self, f: impl FnOnce(&A) -> Result<R, ApiError>) -> Result<R, ConnectionError> {
        let api = self.get()?;
        Ok(f(&api)?)
    }
}
