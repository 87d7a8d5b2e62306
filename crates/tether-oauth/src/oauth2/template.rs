//! OAuth 2 flow template.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tether_config::{ClientAuthentication, HttpConfig, OAuth2ProviderConfig};
use url::form_urlencoded;

use super::grant::{now_millis, parse_access_grant};
use super::{AccessGrant, GrantType, OAuth2Operations, OAuth2Parameters};
use crate::error::OAuthError;
use crate::transport::{FormRequest, HttpTransport, UreqTransport};

/// Client credentials are form-encoded before Basic encoding (RFC 6749 §2.3.1).
fn form_encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// OAuth 2 token client for one provider.
///
/// The client secret is sent once per token call, either as HTTP Basic
/// credentials or as `client_id`/`client_secret` body parameters.
pub struct OAuth2Template {
    client_id: String,
    client_secret: String,
    authorize_url: String,
    authenticate_url: Option<String>,
    access_token_url: String,
    client_authentication: ClientAuthentication,
    transport: Arc<dyn HttpTransport>,
}

impl OAuth2Template {
    /// Create a template using HTTP Basic client authentication.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        authorize_url: impl Into<String>,
        access_token_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorize_url: authorize_url.into(),
            authenticate_url: None,
            access_token_url: access_token_url.into(),
            client_authentication: ClientAuthentication::default(),
            transport: Arc::new(UreqTransport::default()),
        }
    }

    /// Create a template from a provider config section.
    pub fn from_config(config: &OAuth2ProviderConfig, http: &HttpConfig) -> Self {
        let template = Self::new(
            &config.client_id,
            &config.client_secret,
            &config.authorize_url,
            &config.access_token_url,
        )
        .with_client_authentication(config.client_authentication)
        .with_transport(Arc::new(UreqTransport::new(http.timeout())));

        match &config.authenticate_url {
            Some(url) => template.with_authenticate_url(url),
            None => template,
        }
    }

    /// Set a distinct sign-in URL.
    #[must_use]
    pub fn with_authenticate_url(mut self, url: impl Into<String>) -> Self {
        self.authenticate_url = Some(url.into());
        self
    }

    /// Choose how client credentials are sent to the token endpoint.
    #[must_use]
    pub fn with_client_authentication(mut self, mode: ClientAuthentication) -> Self {
        self.client_authentication = mode;
        self
    }

    /// Replace the HTTP transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Client id this template authenticates as.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn post_for_access_grant(&self, mut params: Vec<(String, String)>) -> Result<AccessGrant, OAuthError> {
        let mut headers = Vec::new();
        match self.client_authentication {
            ClientAuthentication::Basic => {
                let credentials = STANDARD.encode(format!(
                    "{}:{}",
                    form_encode(&self.client_id),
                    form_encode(&self.client_secret)
                ));
                headers.push(("Authorization".to_owned(), format!("Basic {credentials}")));
            }
            ClientAuthentication::Parameters => {
                params.push(("client_id".to_owned(), self.client_id.clone()));
                params.push(("client_secret".to_owned(), self.client_secret.clone()));
            }
        }

        let request = FormRequest {
            url: self.access_token_url.clone(),
            headers,
            params,
        };

        let response = self.transport.post_form(&request)?;
        let received_at = now_millis();
        if !response.is_success() {
            tracing::warn!(
                url = %self.access_token_url,
                status = response.status,
                "OAuth2 token request failed"
            );
        }
        let response = response.error_for_status()?;

        parse_access_grant(&response, received_at)
    }

    fn build_auth_url(&self, base_url: &str, grant_type: GrantType, params: &OAuth2Parameters) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", grant_type.response_type());
        if let Some(redirect_uri) = &params.redirect_uri {
            query.append_pair("redirect_uri", redirect_uri);
        }
        if let Some(scope) = &params.scope {
            query.append_pair("scope", scope);
        }
        if let Some(state) = &params.state {
            query.append_pair("state", state);
        }
        query.extend_pairs(params.additional.iter());

        let separator = if base_url.contains('?') { '&' } else { '?' };
        format!("{base_url}{separator}{}", query.finish())
    }
}

impl OAuth2Operations for OAuth2Template {
    fn build_authorize_url(&self, grant_type: GrantType, params: &OAuth2Parameters) -> String {
        self.build_auth_url(&self.authorize_url, grant_type, params)
    }

    fn build_authenticate_url(&self, grant_type: GrantType, params: &OAuth2Parameters) -> String {
        let base_url = self
            .authenticate_url
            .as_deref()
            .unwrap_or(&self.authorize_url);
        self.build_auth_url(base_url, grant_type, params)
    }

    fn exchange_for_access(
        &self,
        authorization_code: &str,
        redirect_uri: &str,
        additional: &[(String, String)],
    ) -> Result<AccessGrant, OAuthError> {
        tracing::debug!(url = %self.access_token_url, "Exchanging OAuth2 authorization code");

        let mut params = vec![
            ("code".to_owned(), authorization_code.to_owned()),
            ("redirect_uri".to_owned(), redirect_uri.to_owned()),
            ("grant_type".to_owned(), "authorization_code".to_owned()),
        ];
        params.extend_from_slice(additional);
        self.post_for_access_grant(params)
    }

    fn refresh_access(
        &self,
        refresh_token: &str,
        additional: &[(String, String)],
    ) -> Result<AccessGrant, OAuthError> {
        tracing::debug!(url = %self.access_token_url, "Refreshing OAuth2 access token");

        let mut params = vec![
            ("refresh_token".to_owned(), refresh_token.to_owned()),
            ("grant_type".to_owned(), "refresh_token".to_owned()),
        ];
        params.extend_from_slice(additional);
        self.post_for_access_grant(params)
    }
}
