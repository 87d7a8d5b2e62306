//! Provider-neutral connections for Tether.
//!
//! A [`Connection`] is one user's authorized link to one provider. OAuth 1
//! and OAuth 2 connections share the same contract, so application code
//! does not care which protocol a provider speaks:
//!
//! - [`OAuth1Connection`]: token + secret, never expires
//! - [`OAuth2Connection`]: bearer token with optional refresh token and
//!   expiry; calls through [`Api`] fail fast once expired
//!
//! Connections are built by a [`ConnectionFactory`] from fresh tokens or
//! from persisted [`ConnectionData`], and factories are found through a
//! [`ConnectionFactoryLocator`] such as [`ConnectionFactoryRegistry`].
//!
//! Provider specifics live behind two seams: an [`ApiAdapter`] that maps the
//! provider API onto profile values, and a service provider
//! ([`OAuth1ServiceProvider`] / [`OAuth2ServiceProvider`]) that supplies the
//! flow operations and builds the API binding from tokens.

mod adapter;
mod connection;
mod data;
mod error;
mod factory;
mod key;
mod locator;
mod profile;
mod provider;
#[cfg(test)]
mod testing;

pub use adapter::{ApiAdapter, ConnectionValues};
pub use connection::{Api, Connection, OAuth1Connection, OAuth2Connection};
pub use data::{ApiTokens, ConnectionData};
pub use error::{ApiError, ConnectionError};
pub use factory::{ConnectionFactory, OAuth1ConnectionFactory, OAuth2ConnectionFactory};
pub use key::ConnectionKey;
pub use locator::{ConnectionFactoryLocator, ConnectionFactoryRegistry};
pub use profile::{UserProfile, UserProfileBuilder};
pub use provider::{OAuth1ServiceProvider, OAuth2ServiceProvider};
