//! OAuth protocol engine for Tether.
//!
//! This crate implements the protocol-level half of Tether:
//!
//! - [`oauth_encode`] / [`normalize_parameters`]: RFC 5849 percent-encoding
//!   and parameter normalization
//! - [`SignatureMethod`]: HMAC-SHA1 and RSA-SHA1 signature strategies
//! - [`SigningSupport`]: builds `Authorization: OAuth ...` header values
//! - [`OAuth1Template`]: the OAuth 1.0/1.0a three-legged flow
//! - [`OAuth2Template`]: OAuth 2 code exchange and refresh
//!
//! Token endpoints are reached through the [`HttpTransport`] trait;
//! [`UreqTransport`] is the production implementation and
//! [`MockTransport`] (behind the `mock` feature flag) replays canned
//! responses for tests.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use tether_oauth::SigningSupport;
//!
//! let signer = SigningSupport::default();
//! let oauth_params = signer.common_oauth_parameters("consumer-key");
//! let header = signer
//!     .build_authorization_header(
//!         "GET",
//!         "https://api.example.com/1/statuses?count=5",
//!         oauth_params,
//!         &[],
//!         "consumer-secret",
//!         None,
//!     )
//!     .unwrap();
//! assert!(header.starts_with("OAuth oauth_consumer_key=\"consumer-key\""));
//! ```

mod encoding;
mod error;
mod key;
#[cfg(any(test, feature = "mock"))]
mod mock;
pub mod oauth1;
pub mod oauth2;
mod signature;
mod signer;
mod transport;

pub use encoding::{normalize_parameters, oauth_decode, oauth_encode};
pub use error::{KeyError, OAuthError};
pub use key::{decode_private_key, decode_public_key, load_private_key_from_file};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;
pub use oauth1::{
    AuthorizedRequestToken, OAuth1Operations, OAuth1Parameters, OAuth1Template, OAuthToken,
};
pub use oauth2::{AccessGrant, GrantType, OAuth2Operations, OAuth2Parameters, OAuth2Template};
pub use signature::{HmacSha1, RsaSha1, SignatureMethod, signature_method, signature_method_by_name};
pub use signer::{
    FixedTimestampGenerator, OAuth1Credentials, SigningSupport, SystemTimestampGenerator,
    TimestampGenerator, base_string_uri, parse_form, signature_base_string,
};
pub use tether_config::{ClientAuthentication, OAuth1Version, SignatureAlgorithm};
pub use transport::{FormRequest, HttpResponse, HttpTransport, UreqTransport};
