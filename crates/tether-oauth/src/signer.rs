//! OAuth 1.0 request signing (RFC 5849 Section 3).
//!
//! [`SigningSupport`] assembles the `oauth_*` protocol parameters, builds
//! the signature base string, signs it with a [`SignatureMethod`] and
//! renders the `Authorization: OAuth ...` header value.
//!
//! Signing is a pure function of its inputs apart from the timestamp and
//! nonce, which come from an injectable [`TimestampGenerator`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use url::Url;
use url::form_urlencoded;

use crate::encoding::{normalize_parameters, oauth_encode};
use crate::error::OAuthError;
use crate::signature::{HmacSha1, SignatureMethod};

/// `oauth_version` value sent with every request.
const OAUTH_VERSION: &str = "1.0";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Source of `oauth_timestamp` and `oauth_nonce` values.
pub trait TimestampGenerator: Send + Sync {
    /// Seconds since the Unix epoch.
    fn timestamp(&self) -> u64;

    /// A value unique among requests sharing `timestamp`.
    fn nonce(&self, timestamp: u64) -> String;
}

/// Wall-clock timestamps with random 128-bit hex nonces.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimestampGenerator;

impl TimestampGenerator for SystemTimestampGenerator {
    fn timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }

    fn nonce(&self, _timestamp: u64) -> String {
        let bytes: [u8; 16] = rand::random();
        hex::encode(bytes)
    }
}

/// Constant timestamp and nonce, for reproducible signatures.
#[derive(Debug, Clone)]
pub struct FixedTimestampGenerator {
    timestamp: u64,
    nonce: String,
}

impl FixedTimestampGenerator {
    /// Always produce `timestamp` and `nonce`.
    pub fn new(timestamp: u64, nonce: impl Into<String>) -> Self {
        Self {
            timestamp,
            nonce: nonce.into(),
        }
    }
}

impl TimestampGenerator for FixedTimestampGenerator {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn nonce(&self, _timestamp: u64) -> String {
        self.nonce.clone()
    }
}

/// Consumer and token credentials for signing API requests.
#[derive(Debug, Clone)]
pub struct OAuth1Credentials {
    /// Consumer key.
    pub consumer_key: String,
    /// Consumer secret (or RSA key material).
    pub consumer_secret: String,
    /// Access token value.
    pub access_token: String,
    /// Access token secret.
    pub access_token_secret: String,
}

/// Base string URI per RFC 5849 Section 3.4.1.2.
///
/// Scheme and host are lowercase, the port is kept only when it is not
/// the scheme default, and the query and fragment are dropped.
pub fn base_string_uri(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    match url.port() {
        Some(port) => format!("{}://{host}:{port}{}", url.scheme(), url.path()),
        None => format!("{}://{host}{}", url.scheme(), url.path()),
    }
}

/// Build the signature base string per RFC 5849 Section 3.4.1.
///
/// Format: `HTTP_METHOD&encoded_base_uri&encoded_parameters`. Query
/// parameters of `url` are merged with `params` before normalization.
pub fn signature_base_string(method: &str, url: &Url, params: &[(String, String)]) -> String {
    let mut all_params = params.to_vec();
    all_params.extend(
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned())),
    );

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        oauth_encode(&base_string_uri(url)),
        oauth_encode(&normalize_parameters(&all_params))
    )
}

/// Parse an `application/x-www-form-urlencoded` body into parameters.
pub fn parse_form(body: &[u8]) -> Vec<(String, String)> {
    form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// OAuth 1.0 signing engine.
#[derive(Clone)]
pub struct SigningSupport {
    signature_method: Arc<dyn SignatureMethod>,
    timestamps: Arc<dyn TimestampGenerator>,
}

impl Default for SigningSupport {
    fn default() -> Self {
        Self::new(Arc::new(HmacSha1))
    }
}

impl SigningSupport {
    /// Create a signer using wall-clock timestamps.
    pub fn new(signature_method: Arc<dyn SignatureMethod>) -> Self {
        Self {
            signature_method,
            timestamps: Arc::new(SystemTimestampGenerator),
        }
    }

    /// Replace the timestamp and nonce source.
    #[must_use]
    pub fn with_timestamp_generator(mut self, timestamps: Arc<dyn TimestampGenerator>) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// The signature method in use.
    pub fn signature_method(&self) -> &dyn SignatureMethod {
        self.signature_method.as_ref()
    }

    /// Protocol parameters shared by every signed request.
    ///
    /// Contains `oauth_consumer_key`, `oauth_signature_method`,
    /// `oauth_timestamp`, `oauth_nonce` and `oauth_version`.
    pub fn common_oauth_parameters(&self, consumer_key: &str) -> BTreeMap<String, String> {
        let timestamp = self.timestamps.timestamp();
        let mut params = BTreeMap::new();
        params.insert("oauth_consumer_key".to_owned(), consumer_key.to_owned());
        params.insert(
            "oauth_signature_method".to_owned(),
            self.signature_method.name().to_owned(),
        );
        params.insert("oauth_timestamp".to_owned(), timestamp.to_string());
        params.insert("oauth_nonce".to_owned(), self.timestamps.nonce(timestamp));
        params.insert("oauth_version".to_owned(), OAUTH_VERSION.to_owned());
        params
    }

    /// Create the `Authorization` header value for a request.
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, etc.)
    /// * `url` - Full request URL; its query parameters are signed
    /// * `oauth_params` - Protocol parameters, normally
    ///   [`common_oauth_parameters`](Self::common_oauth_parameters) plus
    ///   `oauth_token`, `oauth_callback` or `oauth_verifier`
    /// * `params` - Form body parameters to include in the signature
    /// * `consumer_secret` - Consumer secret
    /// * `token_secret` - Token secret, if a token is involved
    pub fn build_authorization_header(
        &self,
        method: &str,
        url: &str,
        oauth_params: BTreeMap<String, String>,
        params: &[(String, String)],
        consumer_secret: &str,
        token_secret: Option<&str>,
    ) -> Result<String, OAuthError> {
        let url = Url::parse(url)?;

        // Signature params: OAuth params + body params (+ query params, merged below)
        let mut signature_params: Vec<(String, String)> = oauth_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        signature_params.extend_from_slice(params);

        let base_string = signature_base_string(method, &url, &signature_params);
        let signature = self
            .signature_method
            .sign(&base_string, consumer_secret, token_secret)?;

        tracing::debug!(
            method,
            base_uri = %base_string_uri(&url),
            signature_method = self.signature_method.name(),
            "Signed OAuth request"
        );

        Ok(render_header(&oauth_params, &signature))
    }

    /// Sign an outgoing API request with access token credentials.
    ///
    /// Form-encoded bodies contribute their parameters to the signature;
    /// other bodies are not signed.
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `url` - Full request URL including any query string
    /// * `content_type` - Request `Content-Type`, if any
    /// * `body` - Raw request body
    /// * `credentials` - Consumer and access token credentials
    pub fn sign_request(
        &self,
        method: &str,
        url: &str,
        content_type: Option<&str>,
        body: &[u8],
        credentials: &OAuth1Credentials,
    ) -> Result<String, OAuthError> {
        let body_params = match content_type {
            Some(ct) if ct.starts_with(FORM_CONTENT_TYPE) => parse_form(body),
            _ => Vec::new(),
        };

        let mut oauth_params = self.common_oauth_parameters(&credentials.consumer_key);
        oauth_params.insert("oauth_token".to_owned(), credentials.access_token.clone());

        self.build_authorization_header(
            method,
            url,
            oauth_params,
            &body_params,
            &credentials.consumer_secret,
            Some(&credentials.access_token_secret),
        )
    }
}

/// Render `OAuth k="v", ...` with `oauth_signature` last.
fn render_header(oauth_params: &BTreeMap<String, String>, signature: &str) -> String {
    let header_parts: Vec<String> = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, oauth_encode(v)))
        .chain(std::iter::once(format!(
            "oauth_signature=\"{}\"",
            oauth_encode(signature)
        )))
        .collect();
    format!("OAuth {}", header_parts.join(", "))
}
