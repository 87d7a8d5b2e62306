//! Factory lookup by provider id or API type.

use std::any::{Any, TypeId, type_name};
use std::collections::{BTreeMap, HashMap};

use crate::error::ConnectionError;
use crate::factory::ConnectionFactory;

/// Looks up connection factories.
///
/// Lookups never come back empty: a miss is
/// [`ConnectionError::NotRegistered`].
pub trait ConnectionFactoryLocator {
    /// Factory for `provider_id`, which must bind API type `A`.
    fn get_by_provider_id<A: 'static>(
        &self,
        provider_id: &str,
    ) -> Result<&dyn ConnectionFactory<A>, ConnectionError>;

    /// Factory whose API binding type is `A`.
    fn get_by_api<A: 'static>(&self) -> Result<&dyn ConnectionFactory<A>, ConnectionError>;

    /// Ids of every registered provider, sorted.
    fn registered_provider_ids(&self) -> Vec<&str>;
}

struct Registration {
    api_type: TypeId,
    api_type_name: &'static str,
    /// Holds a `Box<dyn ConnectionFactory<A>>` for the registered `A`.
    factory: Box<dyn Any + Send + Sync>,
}

/// In-memory [`ConnectionFactoryLocator`].
///
/// Each provider id and each API type may be registered once; the API type
/// is the type parameter given at registration.
#[derive(Default)]
pub struct ConnectionFactoryRegistry {
    by_provider_id: BTreeMap<String, Registration>,
    by_api_type: HashMap<TypeId, String>,
}

impl ConnectionFactoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for API type `A`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::AlreadyRegistered`] if the factory's
    /// provider id or API type is taken.
    pub fn add_connection_factory<A: 'static>(
        &mut self,
        factory: impl ConnectionFactory<A> + 'static,
    ) -> Result<(), ConnectionError> {
        let provider_id = factory.provider_id().to_owned();
        if self.by_provider_id.contains_key(&provider_id) {
            return Err(ConnectionError::AlreadyRegistered(format!(
                "provider '{provider_id}'"
            )));
        }
        let api_type = TypeId::of::<A>();
        if let Some(existing) = self.by_api_type.get(&api_type) {
            return Err(ConnectionError::AlreadyRegistered(format!(
                "API type {} (provider '{existing}')",
                type_name::<A>()
            )));
        }

        let boxed: Box<dyn ConnectionFactory<A>> = Box::new(factory);
        self.by_api_type.insert(api_type, provider_id.clone());
        self.by_provider_id.insert(
            provider_id.clone(),
            Registration {
                api_type,
                api_type_name: type_name::<A>(),
                factory: Box::new(boxed),
            },
        );
        tracing::info!(provider_id = %provider_id, api_type = type_name::<A>(), "Registered connection factory");
        Ok(())
    }

    /// Name of the API type `provider_id` is registered with.
    pub fn api_type_name(&self, provider_id: &str) -> Result<&'static str, ConnectionError> {
        self.by_provider_id
            .get(provider_id)
            .map(|registration| registration.api_type_name)
            .ok_or_else(|| ConnectionError::NotRegistered(format!("provider '{provider_id}'")))
    }
}

impl ConnectionFactoryLocator for ConnectionFactoryRegistry {
    fn get_by_provider_id<A: 'static>(
        &self,
        provider_id: &str,
    ) -> Result<&dyn ConnectionFactory<A>, ConnectionError> {
        let registration = self
            .by_provider_id
            .get(provider_id)
            .ok_or_else(|| ConnectionError::NotRegistered(format!("provider '{provider_id}'")))?;

        if registration.api_type != TypeId::of::<A>() {
            return Err(ConnectionError::ApiTypeMismatch {
                provider_id: provider_id.to_owned(),
                requested: type_name::<A>(),
            });
        }

        registration
            .factory
            .downcast_ref::<Box<dyn ConnectionFactory<A>>>()
            .map(|factory| &**factory)
            .ok_or_else(|| ConnectionError::ApiTypeMismatch {
                provider_id: provider_id.to_owned(),
                requested: type_name::<A>(),
            })
    }

    fn get_by_api<A: 'static>(&self) -> Result<&dyn ConnectionFactory<A>, ConnectionError> {
        let provider_id = self
            .by_api_type
            .get(&TypeId::of::<A>())
            .ok_or_else(|| ConnectionError::NotRegistered(format!("API type {}", type_name::<A>())))?;
        self.get_by_provider_id(provider_id)
    }

    fn registered_provider_ids(&self) -> Vec<&str> {
        self.by_provider_id.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use tether_oauth::MockTransport;

    use super::*;
    use crate::adapter::ApiAdapter;
    use crate::factory::{OAuth1ConnectionFactory, OAuth2ConnectionFactory};
    use crate::testing::{CountingAdapter, StubApi, StubOAuth1Provider, StubOAuth2Provider};

    struct OtherApi;

    fn twitter() -> OAuth1ConnectionFactory<StubApi> {
        let adapter: Arc<dyn ApiAdapter<StubApi>> = Arc::new(CountingAdapter::new("1", "a"));
        OAuth1ConnectionFactory::new("twitter", Arc::new(StubOAuth1Provider::default()), adapter)
    }

    fn facebook() -> OAuth2ConnectionFactory<StubApi> {
        let adapter: Arc<dyn ApiAdapter<StubApi>> = Arc::new(CountingAdapter::new("1", "a"));
        OAuth2ConnectionFactory::new(
            "facebook",
            Arc::new(StubOAuth2Provider::new(&Arc::new(MockTransport::new()))),
            adapter,
        )
    }

    #[test]
    fn test_lookup_by_provider_id_and_api_type() {
        let mut registry = ConnectionFactoryRegistry::new();
        registry.add_connection_factory(twitter()).unwrap();

        assert_eq!(
            registry.get_by_provider_id::<StubApi>("twitter").unwrap().provider_id(),
            "twitter"
        );
        assert_eq!(registry.get_by_api::<StubApi>().unwrap().provider_id(), "twitter");
        assert_eq!(registry.registered_provider_ids(), vec!["twitter"]);
        assert!(registry.api_type_name("twitter").unwrap().ends_with("StubApi"));
    }

    #[test]
    fn test_misses_are_not_registered_errors() {
        let registry = ConnectionFactoryRegistry::new();

        assert!(matches!(
            registry.get_by_provider_id::<StubApi>("twitter"),
            Err(ConnectionError::NotRegistered(_))
        ));
        assert!(matches!(
            registry.get_by_api::<StubApi>(),
            Err(ConnectionError::NotRegistered(_))
        ));
        assert!(matches!(
            registry.api_type_name("twitter"),
            Err(ConnectionError::NotRegistered(_))
        ));
    }

    #[test]
    fn test_duplicate_provider_id_fails_fast() {
        let mut registry = ConnectionFactoryRegistry::new();
        registry.add_connection_factory(twitter()).unwrap();

        let err = registry.add_connection_factory(twitter()).unwrap_err();

        assert!(matches!(err, ConnectionError::AlreadyRegistered(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_duplicate_api_type_fails_fast() {
        let mut registry = ConnectionFactoryRegistry::new();
        registry.add_connection_factory(twitter()).unwrap();

        let err = registry.add_connection_factory(facebook()).unwrap_err();

        assert!(matches!(err, ConnectionError::AlreadyRegistered(ref what) if what.contains("twitter")));
        assert_eq!(registry.registered_provider_ids(), vec!["twitter"]);
    }

    #[test]
    fn test_wrong_api_type_is_mismatch() {
        let mut registry = ConnectionFactoryRegistry::new();
        registry.add_connection_factory(twitter()).unwrap();

        assert!(matches!(
            registry.get_by_provider_id::<OtherApi>("twitter"),
            Err(ConnectionError::ApiTypeMismatch { ref provider_id, .. }) if provider_id == "twitter"
        ));
    }
}
