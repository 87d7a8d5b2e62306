//! OAuth 1.0 flow template.

use std::collections::BTreeMap;
use std::sync::Arc;

use tether_config::{HttpConfig, OAuth1ProviderConfig, SignatureAlgorithm};

use super::{AuthorizedRequestToken, OAuth1Operations, OAuth1Parameters, OAuth1Version, OAuthToken};
use crate::encoding::oauth_encode;
use crate::error::OAuthError;
use crate::key::decode_private_key;
use crate::signature::{RsaSha1, SignatureMethod, signature_method};
use crate::signer::{SigningSupport, parse_form};
use crate::transport::{FormRequest, HttpTransport, UreqTransport};

/// Callback value for out-of-band verification.
const OUT_OF_BAND: &str = "oob";

/// OAuth 1.0 token generator for one provider.
///
/// Each token call is a signed form POST; responses are
/// `application/x-www-form-urlencoded` and must carry `oauth_token` and
/// `oauth_token_secret`.
pub struct OAuth1Template {
    consumer_key: String,
    consumer_secret: String,
    request_token_url: String,
    authorize_url: String,
    authenticate_url: Option<String>,
    access_token_url: String,
    version: OAuth1Version,
    signer: SigningSupport,
    transport: Arc<dyn HttpTransport>,
}

impl OAuth1Template {
    /// Create an OAuth 1.0a template signing with HMAC-SHA1.
    ///
    /// # Arguments
    /// * `consumer_key` - OAuth consumer key
    /// * `consumer_secret` - OAuth consumer secret
    /// * `request_token_url` - Temporary credential endpoint
    /// * `authorize_url` - Resource owner authorization endpoint
    /// * `access_token_url` - Token credential endpoint
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        request_token_url: impl Into<String>,
        authorize_url: impl Into<String>,
        access_token_url: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            request_token_url: request_token_url.into(),
            authorize_url: authorize_url.into(),
            authenticate_url: None,
            access_token_url: access_token_url.into(),
            version: OAuth1Version::Core10a,
            signer: SigningSupport::default(),
            transport: Arc::new(UreqTransport::default()),
        }
    }

    /// Create a template from a provider config section.
    ///
    /// An RSA-SHA1 consumer secret is decoded here, so bad key material
    /// fails before the first request.
    pub fn from_config(config: &OAuth1ProviderConfig, http: &HttpConfig) -> Result<Self, OAuthError> {
        let method: Arc<dyn SignatureMethod> = match config.signature_method {
            SignatureAlgorithm::RsaSha1 => {
                Arc::new(RsaSha1::with_private_key(decode_private_key(&config.consumer_secret)?))
            }
            algorithm @ SignatureAlgorithm::HmacSha1 => signature_method(algorithm),
        };
        let template = Self::new(
            &config.consumer_key,
            &config.consumer_secret,
            &config.request_token_url,
            &config.authorize_url,
            &config.access_token_url,
        )
        .with_version(config.version)
        .with_signing_support(SigningSupport::new(method))
        .with_transport(Arc::new(UreqTransport::new(http.timeout())));

        Ok(match &config.authenticate_url {
            Some(url) => template.with_authenticate_url(url),
            None => template,
        })
    }

    /// Set a distinct sign-in URL.
    #[must_use]
    pub fn with_authenticate_url(mut self, url: impl Into<String>) -> Self {
        self.authenticate_url = Some(url.into());
        self
    }

    /// Set the protocol revision.
    #[must_use]
    pub fn with_version(mut self, version: OAuth1Version) -> Self {
        self.version = version;
        self
    }

    /// Replace the signing engine (signature method, timestamp source).
    #[must_use]
    pub fn with_signing_support(mut self, signer: SigningSupport) -> Self {
        self.signer = signer;
        self
    }

    /// Replace the HTTP transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Consumer key this template signs with.
    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    /// Signed POST to a token endpoint, parsing the token pair from the reply.
    fn post_for_token(
        &self,
        url: &str,
        oauth_params: BTreeMap<String, String>,
        additional: &[(String, String)],
        token_secret: Option<&str>,
    ) -> Result<OAuthToken, OAuthError> {
        let auth_header = self.signer.build_authorization_header(
            "POST",
            url,
            oauth_params,
            additional,
            &self.consumer_secret,
            token_secret,
        )?;

        let request = FormRequest {
            url: url.to_owned(),
            headers: vec![("Authorization".to_owned(), auth_header)],
            params: additional.to_vec(),
        };

        let response = self.transport.post_form(&request)?;
        if !response.is_success() {
            tracing::warn!(url, status = response.status, "OAuth token request failed");
        }
        let response = response.error_for_status()?;

        let params = parse_oauth_response(&response.body);
        let value = get_required_param(&params, "oauth_token")?;
        let secret = get_required_param(&params, "oauth_token_secret")?;
        Ok(OAuthToken { value, secret })
    }

    fn build_auth_url(&self, base_url: &str, request_token: &str, params: &OAuth1Parameters) -> String {
        let separator = if base_url.contains('?') { '&' } else { '?' };
        let mut url = format!("{base_url}{separator}oauth_token={}", oauth_encode(request_token));

        if self.version == OAuth1Version::Core10
            && let Some(callback) = &params.callback_url
        {
            url.push_str(&format!("&oauth_callback={}", oauth_encode(callback)));
        }
        for (key, value) in &params.additional {
            url.push_str(&format!("&{}={}", oauth_encode(key), oauth_encode(value)));
        }
        url
    }
}

impl OAuth1Operations for OAuth1Template {
    fn version(&self) -> OAuth1Version {
        self.version
    }

    fn fetch_request_token(
        &self,
        callback_url: Option<&str>,
        additional: &[(String, String)],
    ) -> Result<OAuthToken, OAuthError> {
        tracing::debug!(url = %self.request_token_url, "Fetching OAuth request token");

        let mut oauth_params = self.signer.common_oauth_parameters(&self.consumer_key);
        if self.version == OAuth1Version::Core10a {
            oauth_params.insert(
                "oauth_callback".to_owned(),
                callback_url.unwrap_or(OUT_OF_BAND).to_owned(),
            );
        }

        self.post_for_token(&self.request_token_url, oauth_params, additional, None)
    }

    fn build_authorize_url(&self, request_token: &str, params: &OAuth1Parameters) -> String {
        self.build_auth_url(&self.authorize_url, request_token, params)
    }

    fn build_authenticate_url(&self, request_token: &str, params: &OAuth1Parameters) -> String {
        let base_url = self
            .authenticate_url
            .as_deref()
            .unwrap_or(&self.authorize_url);
        self.build_auth_url(base_url, request_token, params)
    }

    fn exchange_for_access_token(
        &self,
        request_token: &AuthorizedRequestToken,
        additional: &[(String, String)],
    ) -> Result<OAuthToken, OAuthError> {
        tracing::debug!(url = %self.access_token_url, "Exchanging OAuth request token");

        let mut oauth_params = self.signer.common_oauth_parameters(&self.consumer_key);
        oauth_params.insert("oauth_token".to_owned(), request_token.token.value.clone());
        if self.version == OAuth1Version::Core10a
            && let Some(verifier) = &request_token.verifier
        {
            oauth_params.insert("oauth_verifier".to_owned(), verifier.clone());
        }

        self.post_for_token(
            &self.access_token_url,
            oauth_params,
            additional,
            Some(&request_token.token.secret),
        )
    }
}

/// Parse OAuth URL-encoded response body.
fn parse_oauth_response(body: &str) -> BTreeMap<String, String> {
    parse_form(body.trim().as_bytes()).into_iter().collect()
}

/// Extract required parameter from OAuth response.
fn get_required_param(params: &BTreeMap<String, String>, key: &str) -> Result<String, OAuthError> {
    params
        .get(key)
        .cloned()
        .ok_or_else(|| OAuthError::MissingParameter(key.to_owned()))
}
