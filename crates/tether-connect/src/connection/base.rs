//! State and behavior shared by OAuth 1 and OAuth 2 connections.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use super::ApiSource;
use crate::adapter::{ApiAdapter, ConnectionValues};
use crate::data::{ApiTokens, ConnectionData};
use crate::error::ConnectionError;
use crate::key::ConnectionKey;
use crate::profile::UserProfile;

/// Current time in epoch milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Token shape held by a connection.
pub(crate) trait TokenState: Clone + Send + 'static {
    fn has_expired(&self, now_millis: u64) -> bool;

    fn api_tokens(&self) -> ApiTokens;
}

/// Cached profile values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ProfileFields {
    pub(crate) display_name: Option<String>,
    pub(crate) profile_url: Option<String>,
    pub(crate) image_url: Option<String>,
}

impl From<ConnectionValues> for ProfileFields {
    fn from(values: ConnectionValues) -> Self {
        Self {
            display_name: values.display_name,
            profile_url: values.profile_url,
            image_url: values.image_url,
        }
    }
}

/// Everything the connection lock guards.
pub(crate) struct ConnectionState<A, T> {
    /// `None` until the first lazy load.
    pub(crate) profile: Option<ProfileFields>,
    pub(crate) tokens: T,
    pub(crate) api: Arc<A>,
}

/// Key, adapter and the lock-guarded state of one connection.
pub(crate) struct ConnectionCore<A, T> {
    key: ConnectionKey,
    adapter: Arc<dyn ApiAdapter<A>>,
    state: Mutex<ConnectionState<A, T>>,
}

impl<A, T> ConnectionCore<A, T> {
    pub(crate) fn key(&self) -> &ConnectionKey {
        &self.key
    }

    /// Lock the state, recovering it if a previous holder panicked.
    pub(crate) fn lock(&self) -> MutexGuard<'_, ConnectionState<A, T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: Send + Sync + 'static, T: TokenState> ConnectionCore<A, T> {
    /// Core for a freshly granted connection.
    ///
    /// Without a known provider user id the adapter is asked once, and the
    /// answer also primes the profile cache.
    pub(crate) fn fresh(
        provider_id: &str,
        provider_user_id: Option<String>,
        tokens: T,
        api: A,
        adapter: Arc<dyn ApiAdapter<A>>,
    ) -> Result<Self, ConnectionError> {
        let (provider_user_id, profile) = match provider_user_id {
            Some(user_id) => (Some(user_id), None),
            None => {
                let mut values = ConnectionValues::default();
                adapter.set_connection_values(&api, &mut values)?;
                let user_id = values.provider_user_id.take();
                (user_id, Some(ProfileFields::from(values)))
            }
        };

        let key = ConnectionKey::new(provider_id, provider_user_id);
        tracing::debug!(%key, "Created connection");

        Ok(Self {
            key,
            adapter,
            state: Mutex::new(ConnectionState {
                profile,
                tokens,
                api: Arc::new(api),
            }),
        })
    }

    /// Core restored from persisted data; makes no provider call.
    pub(crate) fn restored(data: &ConnectionData, tokens: T, api: A, adapter: Arc<dyn ApiAdapter<A>>) -> Self {
        Self {
            key: data.key(),
            adapter,
            state: Mutex::new(ConnectionState {
                profile: Some(ProfileFields {
                    display_name: data.display_name.clone(),
                    profile_url: data.profile_url.clone(),
                    image_url: data.image_url.clone(),
                }),
                tokens,
                api: Arc::new(api),
            }),
        }
    }

    fn ensure_usable(&self, state: &ConnectionState<A, T>) -> Result<(), ConnectionError> {
        if state.tokens.has_expired(now_millis()) {
            return Err(ConnectionError::ExpiredAuthorization {
                provider_id: self.key.provider_id().to_owned(),
            });
        }
        Ok(())
    }

    /// Fetch profile values into `state`. Failures leave the cache untouched.
    fn load_profile(&self, state: &mut ConnectionState<A, T>) -> Result<(), ConnectionError> {
        self.ensure_usable(state)?;
        let mut values = ConnectionValues::default();
        self.adapter.set_connection_values(&state.api, &mut values)?;
        tracing::debug!(key = %self.key, "Loaded connection profile values");
        state.profile = Some(ProfileFields::from(values));
        Ok(())
    }

    /// Read cached profile values, loading them first if needed.
    pub(crate) fn profile_value(
        &self,
        read: impl FnOnce(&ProfileFields) -> Option<String>,
    ) -> Result<Option<String>, ConnectionError> {
        let mut state = self.lock();
        if state.profile.is_none() {
            self.load_profile(&mut state)?;
        }
        Ok(state.profile.as_ref().and_then(read))
    }

    pub(crate) fn sync(&self) -> Result<(), ConnectionError> {
        let mut state = self.lock();
        self.load_profile(&mut state)
    }

    pub(crate) fn test(&self) -> bool {
        let result = self
            .checked_api()
            .and_then(|api| self.adapter.test(&api).map_err(ConnectionError::from));
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "Connection test failed");
                false
            }
        }
    }

    pub(crate) fn has_expired(&self) -> bool {
        self.lock().tokens.has_expired(now_millis())
    }

    pub(crate) fn fetch_user_profile(&self) -> Result<UserProfile, ConnectionError> {
        let api = self.checked_api()?;
        Ok(self.adapter.fetch_user_profile(&api)?)
    }

    pub(crate) fn update_status(&self, message: &str) -> Result<(), ConnectionError> {
        let api = self.checked_api()?;
        Ok(self.adapter.update_status(&api, message)?)
    }

    /// Current tokens.
    pub(crate) fn tokens(&self) -> T {
        self.lock().tokens.clone()
    }

    /// Persistable snapshot, profile values and tokens read under one lock.
    pub(crate) fn create_data(&self) -> Result<ConnectionData, ConnectionError> {
        let mut state = self.lock();
        if state.profile.is_none() {
            self.load_profile(&mut state)?;
        }
        let profile = state.profile.clone().unwrap_or_default();
        let tokens = state.tokens.api_tokens();
        drop(state);

        Ok(ConnectionData {
            provider_id: self.key.provider_id().to_owned(),
            provider_user_id: self.key.provider_user_id().map(str::to_owned),
            display_name: profile.display_name,
            profile_url: profile.profile_url,
            image_url: profile.image_url,
            access_token: tokens.access_token().to_owned(),
            secret: tokens.secret().map(str::to_owned),
            refresh_token: tokens.refresh_token().map(str::to_owned),
            expire_time: tokens.expire_time(),
        })
    }
}

impl<A: Send + Sync + 'static, T: TokenState> ApiSource<A> for ConnectionCore<A, T> {
    fn checked_api(&self) -> Result<Arc<A>, ConnectionError> {
        let state = self.lock();
        self.ensure_usable(&state)?;
        Ok(Arc::clone(&state.api))
    }
}
