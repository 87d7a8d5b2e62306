//! Stub provider, API binding and adapter shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tether_oauth::{
    HttpTransport, MockTransport, OAuth1Operations, OAuth1Template, OAuth2Operations,
    OAuth2Template,
};

use crate::adapter::{ApiAdapter, ConnectionValues};
use crate::data::ApiTokens;
use crate::error::ApiError;
use crate::profile::UserProfile;
use crate::provider::{OAuth1ServiceProvider, OAuth2ServiceProvider};

/// API binding that only remembers its credentials.
#[derive(Debug)]
pub(crate) struct StubApi {
    pub(crate) access_token: String,
    pub(crate) secret: Option<String>,
}

/// Adapter that counts provider calls.
pub(crate) struct CountingAdapter {
    user_id: String,
    name: String,
    delay: Duration,
    pub(crate) fail: AtomicBool,
    pub(crate) values_calls: AtomicUsize,
    pub(crate) profile_calls: AtomicUsize,
    pub(crate) test_calls: AtomicUsize,
    statuses: Mutex<Vec<String>>,
}

impl CountingAdapter {
    pub(crate) fn new(user_id: &str, name: &str) -> Self {
        Self {
            user_id: user_id.to_owned(),
            name: name.to_owned(),
            delay: Duration::ZERO,
            fail: AtomicBool::new(false),
            values_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            test_calls: AtomicUsize::new(0),
            statuses: Mutex::new(Vec::new()),
        }
    }

    /// Sleep inside `set_connection_values` to widen race windows.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), ApiError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::Provider {
                message: "stub failure".to_owned(),
            });
        }
        Ok(())
    }
}

impl ApiAdapter<StubApi> for CountingAdapter {
    fn test(&self, _api: &StubApi) -> Result<(), ApiError> {
        self.test_calls.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    fn set_connection_values(&self, _api: &StubApi, values: &mut ConnectionValues) -> Result<(), ApiError> {
        self.values_calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        self.check()?;
        values.provider_user_id = Some(self.user_id.clone());
        values.display_name = Some(self.name.clone());
        values.profile_url = Some(format!("https://example.com/{}", self.name));
        values.image_url = Some(format!("https://example.com/{}.png", self.name));
        Ok(())
    }

    fn fetch_user_profile(&self, _api: &StubApi) -> Result<UserProfile, ApiError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(UserProfile::builder().username(Some(&self.name)).build())
    }

    fn update_status(&self, _api: &StubApi, message: &str) -> Result<(), ApiError> {
        self.check()?;
        self.statuses.lock().unwrap().push(message.to_owned());
        Ok(())
    }
}

pub(crate) struct StubOAuth1Provider {
    template: OAuth1Template,
    user_id: Option<String>,
}

impl StubOAuth1Provider {
    pub(crate) fn new(transport: &Arc<MockTransport>) -> Self {
        Self {
            template: OAuth1Template::new(
                "consumer_key",
                "consumer_secret",
                "https://api.example.com/oauth/request_token",
                "https://api.example.com/oauth/authorize",
                "https://api.example.com/oauth/access_token",
            )
            .with_transport(Arc::clone(transport) as Arc<dyn HttpTransport>),
            user_id: None,
        }
    }

    /// Report `user_id` as known from the access token response.
    pub(crate) fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_owned());
        self
    }
}

impl Default for StubOAuth1Provider {
    fn default() -> Self {
        Self::new(&Arc::new(MockTransport::new()))
    }
}

impl OAuth1ServiceProvider<StubApi> for StubOAuth1Provider {
    fn oauth_operations(&self) -> &dyn OAuth1Operations {
        &self.template
    }

    fn get_api(&self, access_token: &str, secret: &str) -> StubApi {
        StubApi {
            access_token: access_token.to_owned(),
            secret: Some(secret.to_owned()),
        }
    }

    fn extract_provider_user_id(&self, _tokens: &ApiTokens) -> Option<String> {
        self.user_id.clone()
    }
}

pub(crate) struct StubOAuth2Provider {
    template: OAuth2Template,
}

impl StubOAuth2Provider {
    pub(crate) fn new(transport: &Arc<MockTransport>) -> Self {
        Self {
            template: OAuth2Template::new(
                "client_id",
                "client_secret",
                "https://www.example.com/dialog/oauth",
                "https://graph.example.com/oauth/access_token",
            )
            .with_transport(Arc::clone(transport) as Arc<dyn HttpTransport>),
        }
    }
}

impl OAuth2ServiceProvider<StubApi> for StubOAuth2Provider {
    fn oauth_operations(&self) -> &dyn OAuth2Operations {
        &self.template
    }

    fn get_api(&self, access_token: &str) -> StubApi {
        StubApi {
            access_token: access_token.to_owned(),
            secret: None,
        }
    }
}
