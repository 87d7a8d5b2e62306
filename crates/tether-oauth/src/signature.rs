//! OAuth 1.0 signature methods (RFC 5849 Section 3.4).
//!
//! [`HmacSha1`] signs with the shared consumer and token secrets.
//! [`RsaSha1`] signs with the consumer's RSA private key and ignores the
//! token secret.

use std::borrow::Cow;
use std::sync::Arc;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use hmac::{Hmac, Mac};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::RsaPrivateKey;
use sha1::Sha1;
use tether_config::SignatureAlgorithm;

use crate::encoding::oauth_encode;
use crate::error::OAuthError;
use crate::key::{decode_private_key, decode_public_key};

type HmacSha1Mac = Hmac<Sha1>;

/// A pluggable OAuth 1.0 signature algorithm.
pub trait SignatureMethod: Send + Sync {
    /// Value of the `oauth_signature_method` parameter.
    fn name(&self) -> &'static str;

    /// Sign a base string and return the base64-encoded signature.
    ///
    /// # Arguments
    /// * `base_string` - Signature base string
    /// * `consumer_secret` - Consumer secret (key material for RSA-SHA1)
    /// * `token_secret` - Token secret, absent before a token is issued
    fn sign(
        &self,
        base_string: &str,
        consumer_secret: &str,
        token_secret: Option<&str>,
    ) -> Result<String, OAuthError>;

    /// Check a base64 signature over a base string.
    ///
    /// For HMAC-SHA1 `key` is the composite signing key
    /// (see [`HmacSha1::signing_key`]); for RSA-SHA1 it is the consumer's
    /// X.509 public key. A malformed signature verifies as `false`; only
    /// unusable key material is an error.
    fn verify(&self, base_string: &str, key: &str, signature: &str) -> Result<bool, OAuthError>;
}

/// HMAC-SHA1 signature method.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha1;

impl HmacSha1 {
    /// Build the HMAC key: `encode(consumer_secret)&encode(token_secret)`.
    pub fn signing_key(consumer_secret: &str, token_secret: Option<&str>) -> String {
        format!(
            "{}&{}",
            oauth_encode(consumer_secret),
            oauth_encode(token_secret.unwrap_or(""))
        )
    }

    fn mac(key: &str) -> Result<HmacSha1Mac, OAuthError> {
        HmacSha1Mac::new_from_slice(key.as_bytes())
            .map_err(|e| OAuthError::Signature(e.to_string()))
    }
}

impl SignatureMethod for HmacSha1 {
    fn name(&self) -> &'static str {
        "HMAC-SHA1"
    }

    fn sign(
        &self,
        base_string: &str,
        consumer_secret: &str,
        token_secret: Option<&str>,
    ) -> Result<String, OAuthError> {
        let mut mac = Self::mac(&Self::signing_key(consumer_secret, token_secret))?;
        mac.update(base_string.as_bytes());
        Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn verify(&self, base_string: &str, key: &str, signature: &str) -> Result<bool, OAuthError> {
        let Ok(expected) = BASE64_STANDARD.decode(signature) else {
            return Ok(false);
        };
        let mut mac = Self::mac(key)?;
        mac.update(base_string.as_bytes());
        Ok(mac.verify_slice(&expected).is_ok())
    }
}

/// RSA-SHA1 (`SHA1withRSA`, PKCS#1 v1.5) signature method.
///
/// Without a preloaded key, the consumer secret is decoded as a base64
/// PKCS#8 private key on every signature.
#[derive(Debug, Clone, Default)]
pub struct RsaSha1 {
    private_key: Option<RsaPrivateKey>,
}

impl RsaSha1 {
    /// RSA-SHA1 reading the private key from the consumer secret.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// RSA-SHA1 with a pre-loaded private key; the consumer secret is ignored.
    #[must_use]
    pub fn with_private_key(private_key: RsaPrivateKey) -> Self {
        Self {
            private_key: Some(private_key),
        }
    }
}

impl SignatureMethod for RsaSha1 {
    fn name(&self) -> &'static str {
        "RSA-SHA1"
    }

    fn sign(
        &self,
        base_string: &str,
        consumer_secret: &str,
        _token_secret: Option<&str>,
    ) -> Result<String, OAuthError> {
        let private_key = match &self.private_key {
            Some(key) => Cow::Borrowed(key),
            None => Cow::Owned(decode_private_key(consumer_secret)?),
        };
        let signing_key = SigningKey::<Sha1>::new(private_key.into_owned());
        let signature = signing_key
            .try_sign(base_string.as_bytes())
            .map_err(|e| OAuthError::Signature(e.to_string()))?;
        Ok(BASE64_STANDARD.encode(signature.to_bytes()))
    }

    fn verify(&self, base_string: &str, key: &str, signature: &str) -> Result<bool, OAuthError> {
        let public_key = decode_public_key(key)?;
        let Ok(bytes) = BASE64_STANDARD.decode(signature) else {
            return Ok(false);
        };
        let Ok(signature) = Signature::try_from(bytes.as_slice()) else {
            return Ok(false);
        };
        let verifying_key = VerifyingKey::<Sha1>::new(public_key);
        Ok(verifying_key
            .verify(base_string.as_bytes(), &signature)
            .is_ok())
    }
}

/// Signature method for a configured algorithm.
pub fn signature_method(algorithm: SignatureAlgorithm) -> Arc<dyn SignatureMethod> {
    match algorithm {
        SignatureAlgorithm::HmacSha1 => Arc::new(HmacSha1),
        SignatureAlgorithm::RsaSha1 => Arc::new(RsaSha1::new()),
    }
}

/// Signature method for an `oauth_signature_method` value.
///
/// # Errors
///
/// Returns [`OAuthError::UnsupportedSignatureMethod`] for any other name.
pub fn signature_method_by_name(name: &str) -> Result<Arc<dyn SignatureMethod>, OAuthError> {
    match name {
        "HMAC-SHA1" => Ok(signature_method(SignatureAlgorithm::HmacSha1)),
        "RSA-SHA1" => Ok(signature_method(SignatureAlgorithm::RsaSha1)),
        other => Err(OAuthError::UnsupportedSignatureMethod(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::key::test_keys::{PUBLIC_KEY_BASE64, private_key_base64};

    const GOLDEN_BASE: &str = "POST&https%3A%2F%2Fapi.example.com%2Ftoken&oauth_consumer_key%3Dkey\
        %26oauth_nonce%3Dabc123%26oauth_signature_method%3DHMAC-SHA1\
        %26oauth_timestamp%3D1391521873%26oauth_version%3D1.0";

    const RSA_BASE: &str = "POST&https%3A%2F%2Fapi.example.com%2Ftoken&oauth_consumer_key%3Dkey\
        %26oauth_nonce%3Dabc123%26oauth_signature_method%3DRSA-SHA1\
        %26oauth_timestamp%3D1391521873%26oauth_version%3D1.0";

    const RSA_SIGNATURE: &str = concat!(
        "ohb7YkTKqlndXlPkCIKHfiqYjkp6IZe6xS/oRB+VabfHP0TWA7te7IZC7aY4qwYD6qwDsRzGb92AR4t6i16v",
        "UoUczEdwC/jbLH0nOR6tZd+i55Kz+sA4EiY8f53qLEBmtMG9qJ+ypjbyqLnXs6SsQXYqwhDD4hgbSDnG8btt",
        "nGcce9x5dTlc63HBcfl4B/lb8/VaTC2tzMilqCaaDCYHkb9qzW8ePIb45bjofTuHKjjVoZ489fY/cWqapNQd",
        "IUEqCQzwFOijqfY+okEil0i5wMg4vJqe15YMnPyEZhkmvS4l7YJIVUr+unJTyPjdpHRgXEJvafixQ3tjjkl8",
        "iCakjQ==",
    );

    #[test]
    fn test_hmac_signing_key() {
        assert_eq!(HmacSha1::signing_key("secret", None), "secret&");
        assert_eq!(
            HmacSha1::signing_key("cs &", Some("ts/")),
            "cs%20%26&ts%2F"
        );
    }

    #[test]
    fn test_hmac_golden_signature() {
        let signature = HmacSha1.sign(GOLDEN_BASE, "secret", None).unwrap();
        assert_eq!(signature, "S46+lTd+UXyOlXcW3VuNXACX1Io=");
    }

    #[test]
    fn test_hmac_rfc5849_signature() {
        let base = "POST&http%3A%2F%2Fexample.com%2Frequest&a2%3Dr%2520b%26a3%3D2%2520q\
            %26a3%3Da%26b5%3D%253D%25253D%26c%2540%3D%26c2%3D%26oauth_consumer_key%3D9dj\
            dj82h48djs9d2%26oauth_nonce%3D7d8f3e4a%26oauth_signature_method%3DHMAC-SHA1\
            %26oauth_timestamp%3D137131201%26oauth_token%3Dkkk9d7dh3k39sjv7";

        let signature = HmacSha1
            .sign(base, "j49sk3j29djd", Some("dh893hdasih9"))
            .unwrap();

        assert_eq!(signature, "r6/TJjbCOr97/+UU0NsvSne7s5g=");
    }

    #[test]
    fn test_hmac_verify() {
        let key = HmacSha1::signing_key("secret", None);

        assert!(HmacSha1.verify(GOLDEN_BASE, &key, "S46+lTd+UXyOlXcW3VuNXACX1Io=").unwrap());
        assert!(!HmacSha1.verify(GOLDEN_BASE, &key, "AAAA").unwrap());
        assert!(!HmacSha1.verify(GOLDEN_BASE, &key, "not base64!").unwrap());
        assert!(
            !HmacSha1
                .verify(&format!("{GOLDEN_BASE}x"), &key, "S46+lTd+UXyOlXcW3VuNXACX1Io=")
                .unwrap()
        );
    }

    #[test]
    fn test_rsa_golden_signature_from_consumer_secret() {
        let signature = RsaSha1::new()
            .sign(RSA_BASE, &private_key_base64(), Some("ignored"))
            .unwrap();
        assert_eq!(signature, RSA_SIGNATURE);
    }

    #[test]
    fn test_rsa_preloaded_key_matches() {
        let key = decode_private_key(&private_key_base64()).unwrap();
        let signature = RsaSha1::with_private_key(key)
            .sign(RSA_BASE, "", None)
            .unwrap();
        assert_eq!(signature, RSA_SIGNATURE);
    }

    #[test]
    fn test_rsa_verify() {
        let rsa = RsaSha1::new();

        assert!(rsa.verify(RSA_BASE, PUBLIC_KEY_BASE64, RSA_SIGNATURE).unwrap());
        assert!(!rsa.verify(GOLDEN_BASE, PUBLIC_KEY_BASE64, RSA_SIGNATURE).unwrap());
        assert!(!rsa.verify(RSA_BASE, PUBLIC_KEY_BASE64, "AAAA").unwrap());
    }

    #[test]
    fn test_rsa_bad_key_is_configuration_error() {
        let err = RsaSha1::new().sign(RSA_BASE, "secret", None).unwrap_err();
        assert!(err.is_configuration(), "got {err:?}");

        let err = RsaSha1::new()
            .verify(RSA_BASE, "bm90IGEga2V5", RSA_SIGNATURE)
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_signature_method_by_name() {
        assert_eq!(signature_method_by_name("HMAC-SHA1").unwrap().name(), "HMAC-SHA1");
        assert_eq!(signature_method_by_name("RSA-SHA1").unwrap().name(), "RSA-SHA1");

        let err = signature_method_by_name("PLAINTEXT").err().unwrap();
        assert!(matches!(err, OAuthError::UnsupportedSignatureMethod(_)));
    }
}
