//! HTTP transport for token endpoints.
//!
//! Flow templates only ever POST form bodies, so the seam is a single
//! [`HttpTransport::post_form`] call. [`UreqTransport`] is the blocking
//! production implementation.

use std::time::Duration;

use ureq::Agent;
use url::form_urlencoded;

use crate::error::OAuthError;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// A form POST to a token endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormRequest {
    /// Target URL.
    pub url: String,
    /// Extra request headers (e.g., `Authorization`).
    pub headers: Vec<(String, String)>,
    /// Form body parameters.
    pub params: Vec<(String, String)>,
}

impl FormRequest {
    /// Create a request with no headers or parameters.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of the first form parameter named `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Serialize the form parameters as `application/x-www-form-urlencoded`.
    pub fn encoded_body(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }
}

/// Raw HTTP response from a token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, if present.
    pub content_type: Option<String>,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Return the response if 2xx, otherwise [`OAuthError::HttpResponse`].
    pub fn error_for_status(self) -> Result<Self, OAuthError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(OAuthError::HttpResponse {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Blocking transport used by the flow templates.
pub trait HttpTransport: Send + Sync {
    /// POST a form body and return the response, whatever its status.
    fn post_form(&self, request: &FormRequest) -> Result<HttpResponse, OAuthError>;
}

/// [`HttpTransport`] backed by a `ureq` agent.
pub struct UreqTransport {
    agent: Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT))
    }
}

impl UreqTransport {
    /// Create a transport with a global request timeout.
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl HttpTransport for UreqTransport {
    fn post_form(&self, request: &FormRequest) -> Result<HttpResponse, OAuthError> {
        let mut builder = self
            .agent
            .post(&request.url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json, application/x-www-form-urlencoded");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send(request.encoded_body().as_bytes())?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let mut body_reader = response.into_body();
        let body = body_reader.read_to_string()?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_body() {
        let request = FormRequest {
            params: vec![
                ("grant_type".to_owned(), "authorization_code".to_owned()),
                ("redirect_uri".to_owned(), "https://app.example.com/cb?a=1 b".to_owned()),
            ],
            ..FormRequest::new("https://example.com/token")
        };

        assert_eq!(
            request.encoded_body(),
            "grant_type=authorization_code&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb%3Fa%3D1+b"
        );
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let request = FormRequest {
            headers: vec![("Authorization".to_owned(), "OAuth x".to_owned())],
            ..FormRequest::new("https://example.com")
        };
        assert_eq!(request.header("authorization"), Some("OAuth x"));
        assert_eq!(request.param("missing"), None);
    }

    #[test]
    fn test_error_for_status() {
        let ok = HttpResponse {
            status: 204,
            content_type: None,
            body: String::new(),
        };
        assert!(ok.error_for_status().is_ok());

        let err = HttpResponse {
            status: 401,
            content_type: None,
            body: "denied".to_owned(),
        }
        .error_for_status()
        .unwrap_err();
        assert!(matches!(err, OAuthError::HttpResponse { status: 401, .. }));
    }
}
