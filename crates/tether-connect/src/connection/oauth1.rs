//! OAuth 1 backed connection.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::base::{ConnectionCore, TokenState};
use super::{Api, Connection};
use crate::adapter::ApiAdapter;
use crate::data::{ApiTokens, ConnectionData};
use crate::error::ConnectionError;
use crate::key::ConnectionKey;
use crate::profile::UserProfile;
use crate::provider::OAuth1ServiceProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OAuth1Tokens {
    access_token: String,
    secret: String,
}

impl TokenState for OAuth1Tokens {
    fn has_expired(&self, _now_millis: u64) -> bool {
        false
    }

    fn api_tokens(&self) -> ApiTokens {
        ApiTokens::OAuth1 {
            access_token: self.access_token.clone(),
            secret: self.secret.clone(),
        }
    }
}

/// Connection to an OAuth 1 provider.
///
/// OAuth 1 tokens do not expire, so [`refresh`](Connection::refresh) does
/// nothing. Two connections are equal when their keys are equal.
pub struct OAuth1Connection<A> {
    core: Arc<ConnectionCore<A, OAuth1Tokens>>,
}

impl<A: Send + Sync + 'static> OAuth1Connection<A> {
    /// Create a connection from a freshly obtained access token.
    ///
    /// Asks the adapter for the provider user id when `provider_user_id`
    /// is `None`.
    pub fn new(
        provider_id: &str,
        provider_user_id: Option<String>,
        access_token: &str,
        secret: &str,
        service_provider: &dyn OAuth1ServiceProvider<A>,
        adapter: Arc<dyn ApiAdapter<A>>,
    ) -> Result<Self, ConnectionError> {
        let api = service_provider.get_api(access_token, secret);
        let tokens = OAuth1Tokens {
            access_token: access_token.to_owned(),
            secret: secret.to_owned(),
        };
        let core = ConnectionCore::fresh(provider_id, provider_user_id, tokens, api, adapter)?;
        Ok(Self { core: Arc::new(core) })
    }

    /// Restore a connection from persisted data without calling the provider.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::InvalidData`] unless `data` holds OAuth 1
    /// tokens.
    pub fn restore(
        data: &ConnectionData,
        service_provider: &dyn OAuth1ServiceProvider<A>,
        adapter: Arc<dyn ApiAdapter<A>>,
    ) -> Result<Self, ConnectionError> {
        let ApiTokens::OAuth1 { access_token, secret } = data.tokens()? else {
            return Err(ConnectionError::InvalidData(format!(
                "connection to '{}' has no OAuth 1 token secret",
                data.provider_id
            )));
        };
        let api = service_provider.get_api(&access_token, &secret);
        let tokens = OAuth1Tokens { access_token, secret };
        let core = ConnectionCore::restored(data, tokens, api, adapter);
        Ok(Self { core: Arc::new(core) })
    }
}

impl<A: Send + Sync + 'static> Connection<A> for OAuth1Connection<A> {
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
        false
    }

    fn refresh(&self) -> Result<(), ConnectionError> {
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

impl<A> PartialEq for OAuth1Connection<A> {
    fn eq(&self, other: &Self) -> bool {
        self.core.key() == other.core.key()
    }
}

impl<A> Eq for OAuth1Connection<A> {}

impl<A> Hash for OAuth1Connection<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.core.key().hash(state);
    }
}
