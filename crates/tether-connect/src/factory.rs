//! Connection factories.
//!
//! A factory knows one provider: it owns the provider's service provider
//! (flow operations and API binding construction) and adapter, and turns
//! either fresh tokens or persisted [`ConnectionData`] into connections.

use std::sync::Arc;

use tether_oauth::{AccessGrant, OAuth1Operations, OAuth2Operations, OAuthToken};

use crate::adapter::ApiAdapter;
use crate::connection::{Connection, OAuth1Connection, OAuth2Connection};
use crate::data::{ApiTokens, ConnectionData};
use crate::error::ConnectionError;
use crate::provider::{OAuth1ServiceProvider, OAuth2ServiceProvider};

/// Builds connections to one provider with API binding type `A`.
pub trait ConnectionFactory<A>: Send + Sync {
    /// Provider this factory connects to.
    fn provider_id(&self) -> &str;

    /// Connection from tokens a flow template just obtained.
    fn create_connection(&self, tokens: ApiTokens) -> Result<Box<dyn Connection<A>>, ConnectionError>;

    /// Connection from persisted data; makes no provider call.
    fn restore_connection(&self, data: &ConnectionData) -> Result<Box<dyn Connection<A>>, ConnectionError>;
}

fn check_provider(expected: &str, data: &ConnectionData) -> Result<(), ConnectionError> {
    if data.provider_id == expected {
        Ok(())
    } else {
        Err(ConnectionError::InvalidData(format!(
            "connection data for '{}' given to the '{expected}' factory",
            data.provider_id
        )))
    }
}

/// Factory for OAuth 1 providers.
pub struct OAuth1ConnectionFactory<A> {
    provider_id: String,
    service_provider: Arc<dyn OAuth1ServiceProvider<A>>,
    adapter: Arc<dyn ApiAdapter<A>>,
}

impl<A: Send + Sync + 'static> OAuth1ConnectionFactory<A> {
    pub fn new(
        provider_id: impl Into<String>,
        service_provider: Arc<dyn OAuth1ServiceProvider<A>>,
        adapter: Arc<dyn ApiAdapter<A>>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            service_provider,
            adapter,
        }
    }

    /// Flow operations for obtaining access tokens.
    pub fn oauth_operations(&self) -> &dyn OAuth1Operations {
        self.service_provider.oauth_operations()
    }

    /// Connection from a freshly exchanged access token.
    pub fn from_access_token(&self, token: OAuthToken) -> Result<OAuth1Connection<A>, ConnectionError> {
        let provider_user_id = self
            .service_provider
            .extract_provider_user_id(&ApiTokens::from(token.clone()));
        OAuth1Connection::new(
            &self.provider_id,
            provider_user_id,
            &token.value,
            &token.secret,
            self.service_provider.as_ref(),
            Arc::clone(&self.adapter),
        )
    }

    /// Connection restored from persisted data.
    pub fn from_data(&self, data: &ConnectionData) -> Result<OAuth1Connection<A>, ConnectionError> {
        check_provider(&self.provider_id, data)?;
        OAuth1Connection::restore(data, self.service_provider.as_ref(), Arc::clone(&self.adapter))
    }
}

impl<A: Send + Sync + 'static> ConnectionFactory<A> for OAuth1ConnectionFactory<A> {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn create_connection(&self, tokens: ApiTokens) -> Result<Box<dyn Connection<A>>, ConnectionError> {
        let ApiTokens::OAuth1 { access_token, secret } = tokens else {
            return Err(ConnectionError::InvalidData(format!(
                "provider '{}' expects OAuth 1 tokens",
                self.provider_id
            )));
        };
        let connection = self.from_access_token(OAuthToken::new(access_token, secret))?;
        Ok(Box::new(connection))
    }

    fn restore_connection(&self, data: &ConnectionData) -> Result<Box<dyn Connection<A>>, ConnectionError> {
        Ok(Box::new(self.from_data(data)?))
    }
}

/// Factory for OAuth 2 providers.
pub struct OAuth2ConnectionFactory<A> {
    provider_id: String,
    service_provider: Arc<dyn OAuth2ServiceProvider<A>>,
    adapter: Arc<dyn ApiAdapter<A>>,
}

impl<A: Send + Sync + 'static> OAuth2ConnectionFactory<A> {
    pub fn new(
        provider_id: impl Into<String>,
        service_provider: Arc<dyn OAuth2ServiceProvider<A>>,
        adapter: Arc<dyn ApiAdapter<A>>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            service_provider,
            adapter,
        }
    }

    /// Flow operations for obtaining and refreshing grants.
    pub fn oauth_operations(&self) -> &dyn OAuth2Operations {
        self.service_provider.oauth_operations()
    }

    /// Connection from a fresh access grant.
    pub fn from_access_grant(&self, grant: AccessGrant) -> Result<OAuth2Connection<A>, ConnectionError> {
        let provider_user_id = self
            .service_provider
            .extract_provider_user_id(&ApiTokens::from(grant.clone()));
        OAuth2Connection::new(
            &self.provider_id,
            provider_user_id,
            grant,
            Arc::clone(&self.service_provider),
            Arc::clone(&self.adapter),
        )
    }

    /// Connection restored from persisted data.
    pub fn from_data(&self, data: &ConnectionData) -> Result<OAuth2Connection<A>, ConnectionError> {
        check_provider(&self.provider_id, data)?;
        OAuth2Connection::restore(data, Arc::clone(&self.service_provider), Arc::clone(&self.adapter))
    }
}

impl<A: Send + Sync + 'static> ConnectionFactory<A> for OAuth2ConnectionFactory<A> {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn create_connection(&self, tokens: ApiTokens) -> Result<Box<dyn Connection<A>>, ConnectionError> {
        let ApiTokens::OAuth2 {
            access_token,
            refresh_token,
            expire_time,
        } = tokens
        else {
            return Err(ConnectionError::InvalidData(format!(
                "provider '{}' expects OAuth 2 tokens",
                self.provider_id
            )));
        };
        let grant = AccessGrant {
            access_token,
            scope: None,
            refresh_token,
            expire_time,
        };
        Ok(Box::new(self.from_access_grant(grant)?))
    }

    fn restore_connection(&self, data: &ConnectionData) -> Result<Box<dyn Connection<A>>, ConnectionError> {
        Ok(Box::new(self.from_data(data)?))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;
    use tether_oauth::{AuthorizedRequestToken, MockTransport};

    use super::*;
    use crate::key::ConnectionKey;
    use crate::testing::{CountingAdapter, StubApi, StubOAuth1Provider, StubOAuth2Provider};

    fn oauth1_factory(
        provider: StubOAuth1Provider,
        adapter: &Arc<CountingAdapter>,
    ) -> OAuth1ConnectionFactory<StubApi> {
        OAuth1ConnectionFactory::new(
            "twitter",
            Arc::new(provider),
            Arc::clone(adapter) as Arc<dyn ApiAdapter<StubApi>>,
        )
    }

    #[test]
    fn test_oauth1_flow_to_connection() {
        let transport = Arc::new(
            MockTransport::new()
                .with_form(200, "oauth_token=req&oauth_token_secret=req_secret")
                .with_form(200, "oauth_token=acc&oauth_token_secret=acc_secret"),
        );
        let adapter = Arc::new(CountingAdapter::new("1234", "habuma"));
        let factory = oauth1_factory(StubOAuth1Provider::new(&transport), &adapter);

        let ops = factory.oauth_operations();
        let request_token = ops.fetch_request_token(Some("https://app.example.com/cb"), &[]).unwrap();
        let access_token = ops
            .exchange_for_access_token(&AuthorizedRequestToken::new(request_token, "v"), &[])
            .unwrap();
        let connection = factory.create_connection(ApiTokens::from(access_token)).unwrap();

        assert_eq!(
            connection.key(),
            &ConnectionKey::new("twitter", Some("1234".to_owned()))
        );
        let data = connection.create_data().unwrap();
        assert_eq!(data.access_token, "acc");
        assert_eq!(data.secret.as_deref(), Some("acc_secret"));
        assert_eq!(transport.request_count(), 2);
    }

    #[test]
    fn test_extracted_user_id_skips_adapter() {
        let adapter = Arc::new(CountingAdapter::new("1234", "habuma"));
        let factory = oauth1_factory(StubOAuth1Provider::default().with_user_id("777"), &adapter);

        let connection = factory.from_access_token(OAuthToken::new("t", "s")).unwrap();

        assert_eq!(connection.key().provider_user_id(), Some("777"));
        assert_eq!(adapter.values_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_wrong_token_shape_is_rejected() {
        let adapter = Arc::new(CountingAdapter::new("1234", "habuma"));
        let factory = oauth1_factory(StubOAuth1Provider::default(), &adapter);

        let result = factory.create_connection(ApiTokens::from(AccessGrant::new("at")));

        assert!(matches!(result, Err(ConnectionError::InvalidData(_))));
    }

    #[test]
    fn test_oauth2_restore_round_trip() {
        let transport = Arc::new(MockTransport::new());
        let adapter = Arc::new(CountingAdapter::new("1001", "keith"));
        let factory = OAuth2ConnectionFactory::new(
            "facebook",
            Arc::new(StubOAuth2Provider::new(&transport)),
            Arc::clone(&adapter) as Arc<dyn ApiAdapter<StubApi>>,
        );

        let original = factory
            .create_connection(ApiTokens::from(AccessGrant::new("at").with_refresh_token("rt")))
            .unwrap();
        let data = original.create_data().unwrap();
        let restored = factory.restore_connection(&data).unwrap();

        assert_eq!(restored.key(), original.key());
        assert_eq!(restored.create_data().unwrap(), data);
        assert_eq!(adapter.values_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_restore_rejects_other_provider() {
        let transport = Arc::new(MockTransport::new());
        let adapter = Arc::new(CountingAdapter::new("1001", "keith"));
        let factory = OAuth2ConnectionFactory::new(
            "facebook",
            Arc::new(StubOAuth2Provider::new(&transport)),
            Arc::clone(&adapter) as Arc<dyn ApiAdapter<StubApi>>,
        );
        let data = ConnectionData {
            provider_id: "linkedin".to_owned(),
            provider_user_id: None,
            display_name: None,
            profile_url: None,
            image_url: None,
            access_token: "at".to_owned(),
            secret: None,
            refresh_token: None,
            expire_time: None,
        };

        assert!(matches!(
            factory.restore_connection(&data),
            Err(ConnectionError::InvalidData(_))
        ));
    }
}
