//! OAuth 2 backed connection.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tether_oauth::AccessGrant;

use super::base::{ConnectionCore, TokenState};
use super::{Api, Connection};
use crate::adapter::ApiAdapter;
use crate::data::{ApiTokens, ConnectionData};
use crate::error::ConnectionError;
use crate::key::ConnectionKey;
use crate::profile::UserProfile;
use crate::provider::OAuth2ServiceProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OAuth2Tokens {
    access_token: String,
    refresh_token: Option<String>,
    expire_time: Option<u64>,
}

impl OAuth2Tokens {
    /// Tokens after a refresh.
    ///
    /// A missing refresh token keeps the current one. A missing expiry
    /// clears it; otherwise the later of the two expiries wins.
    fn refreshed(&self, grant: AccessGrant) -> Self {
        let expire_time = grant
            .expire_time
            .map(|new| self.expire_time.map_or(new, |old| old.max(new)));
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.or_else(|| self.refresh_token.clone()),
            expire_time,
        }
    }
}

impl From<AccessGrant> for OAuth2Tokens {
    fn from(grant: AccessGrant) -> Self {
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expire_time: grant.expire_time,
        }
    }
}

impl TokenState for OAuth2Tokens {
    fn has_expired(&self, now_millis: u64) -> bool {
        self.expire_time.is_some_and(|expire_time| now_millis >= expire_time)
    }

    fn api_tokens(&self) -> ApiTokens {
        ApiTokens::OAuth2 {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expire_time: self.expire_time,
        }
    }
}

/// Connection to an OAuth 2 provider.
///
/// Calls made through [`api`](Connection::api) fail with
/// [`ConnectionError::ExpiredAuthorization`] once the access token has
/// expired; [`refresh`](Connection::refresh) swaps in a new token and API
/// binding atomically.
///
/// Two connections are equal when their keys, tokens and expiry are equal.
pub struct OAuth2Connection<A> {
    core: Arc<ConnectionCore<A, OAuth2Tokens>>,
    service_provider: Arc<dyn OAuth2ServiceProvider<A>>,
}

impl<A: Send + Sync + 'static> OAuth2Connection<A> {
    /// Create a connection from a fresh access grant.
    ///
    /// Asks the adapter for the provider user id when `provider_user_id`
    /// is `None`.
    pub fn new(
        provider_id: &str,
        provider_user_id: Option<String>,
        grant: AccessGrant,
        service_provider: Arc<dyn OAuth2ServiceProvider<A>>,
        adapter: Arc<dyn ApiAdapter<A>>,
    ) -> Result<Self, ConnectionError> {
        let tokens = OAuth2Tokens::from(grant);
        let api = service_provider.get_api(&tokens.access_token);
        let core = ConnectionCore::fresh(provider_id, provider_user_id, tokens, api, adapter)?;
        Ok(Self {
            core: Arc::new(core),
            service_provider,
        })
    }

    /// Restore a connection from persisted data without calling the provider.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::InvalidData`] if `data` holds OAuth 1
    /// tokens.
    pub fn restore(
        data: &ConnectionData,
        service_provider: Arc<dyn OAuth2ServiceProvider<A>>,
        adapter: Arc<dyn ApiAdapter<A>>,
    ) -> Result<Self, ConnectionError> {
        let ApiTokens::OAuth2 {
            access_token,
            refresh_token,
            expire_time,
        } = data.tokens()?
        else {
            return Err(ConnectionError::InvalidData(format!(
                "connection to '{}' carries an OAuth 1 token secret",
                data.provider_id
            )));
        };
        let api = service_provider.get_api(&access_token);
        let tokens = OAuth2Tokens {
            access_token,
            refresh_token,
            expire_time,
        };
        let core = ConnectionCore::restored(data, tokens, api, adapter);
        Ok(Self {
            core: Arc::new(core),
            service_provider,
        })
    }
}

impl<A: Send + Sync + 'static> Connection<A> for OAuth2Connection<A> {
    fn key(&self) -> &ConnectionKey {
        self.core.key()
    }

    fn display_name(&self) -> Result<Option<String>, ConnectionError> {
        self.core.profile_value(|p| p.display_name.clone())
    }

    fn profile_url(&self) -> Result<Option<String>, ConnectionError> {
        self.core.profile_value(|p| p.profile_url.clone())
    }

    fn image_url(&self) -> Result<Option<String>, ConnectionError> {
        self.core.profile_value(|p| p.image_url.clone())
    }

    fn test(&self) -> bool {
        self.core.test()
    }

    fn has_expired(&self) -> bool {
        self.core.has_expired()
    }

    fn refresh(&self) -> Result<(), ConnectionError> {
        let mut state = self.core.lock();
        let Some(refresh_token) = state.tokens.refresh_token.clone() else {
            return Err(ConnectionError::MissingRefreshToken {
                provider_id: self.core.key().provider_id().to_owned(),
            });
        };

        let grant = self
            .service_provider
            .oauth_operations()
            .refresh_access(&refresh_token, &[])?;

        let tokens = state.tokens.refreshed(grant);
        state.api = Arc::new(self.service_provider.get_api(&tokens.access_token));
        state.tokens = tokens;
        tracing::info!(
            key = %self.core.key(),
            expire_time = ?state.tokens.expire_time,
            "Refreshed OAuth2 connection"
        );
        Ok(())
    }

    fn fetch_user_profile(&self) -> Result<UserProfile, ConnectionError> {
        self.core.fetch_user_profile()
    }

    fn update_status(&self, message: &str) -> Result<(), ConnectionError> {
        self.core.update_status(message)
    }

    fn sync(&self) -> Result<(), ConnectionError> {
        self.core.sync()
    }

    fn api(&self) -> Api<A> {
        let source = Arc::clone(&self.core);
        Api::new(source)
    }

    fn create_data(&self) -> Result<ConnectionData, ConnectionError> {
        self.core.create_data()
    }
}

impl<A: Send + Sync + 'static> PartialEq for OAuth2Connection<A> {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.core, &other.core) {
            return true;
        }
        // Locks are taken one at a time so concurrent a == b and b == a
        // cannot deadlock.
        self.core.key() == other.core.key() && self.core.tokens() == other.core.tokens()
    }
}

impl<A: Send + Sync + 'static> Eq for OAuth2Connection<A> {}

impl<A> Hash for OAuth2Connection<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.core.key().hash(state);
    }
}
