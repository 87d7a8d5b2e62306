//! OAuth 2 grant types and token response parsing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use crate::error::OAuthError;
use crate::signer::parse_form;
use crate::transport::HttpResponse;

/// Result of an authorization code exchange or a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    /// Bearer access token.
    pub access_token: String,
    /// Granted scope, if the provider reported one.
    pub scope: Option<String>,
    /// Refresh token, if issued.
    pub refresh_token: Option<String>,
    /// Expiry in epoch milliseconds, if the provider sent `expires_in`.
    pub expire_time: Option<u64>,
}

impl AccessGrant {
    /// Grant carrying only an access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            scope: None,
            refresh_token: None,
            expire_time: None,
        }
    }

    /// Set the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Set the absolute expiry (epoch milliseconds).
    #[must_use]
    pub fn with_expire_time(mut self, expire_time: u64) -> Self {
        self.expire_time = Some(expire_time);
        self
    }
}

/// Which authorization flow the authorize URL starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrantType {
    /// `response_type=code`.
    #[default]
    AuthorizationCode,
    /// `response_type=token`.
    ImplicitGrant,
}

impl GrantType {
    /// Value of the `response_type` query parameter.
    pub fn response_type(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "code",
            Self::ImplicitGrant => "token",
        }
    }
}

/// Parameters for the authorize/authenticate redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuth2Parameters {
    /// Where the provider sends the user back.
    pub redirect_uri: Option<String>,
    /// Requested scope.
    pub scope: Option<String>,
    /// Opaque CSRF state echoed back by the provider.
    pub state: Option<String>,
    /// Provider-specific query parameters.
    pub additional: Vec<(String, String)>,
}

/// Current time in epoch milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    scope: Option<String>,
    expires_in: Option<ExpiresIn>,
}

/// `expires_in` as sent by providers: a JSON number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(u64),
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> Option<u64> {
        match self {
            Self::Seconds(secs) => Some(*secs),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

fn is_json(response: &HttpResponse) -> bool {
    match &response.content_type {
        Some(ct) if ct.contains("json") => true,
        Some(ct) if ct.contains("x-www-form-urlencoded") => false,
        _ => response.body.trim_start().starts_with('{'),
    }
}

/// Parse a 2xx token endpoint response into an [`AccessGrant`].
///
/// `received_at` (epoch millis) anchors the relative `expires_in`.
pub(crate) fn parse_access_grant(response: &HttpResponse, received_at: u64) -> Result<AccessGrant, OAuthError> {
    let parsed = if is_json(response) {
        serde_json::from_str::<TokenResponse>(&response.body)?
    } else {
        let mut parsed = TokenResponse::default();
        for (key, value) in parse_form(response.body.trim().as_bytes()) {
            match key.as_str() {
                "access_token" => parsed.access_token = Some(value),
                "refresh_token" => parsed.refresh_token = Some(value),
                "scope" => parsed.scope = Some(value),
                // Facebook's legacy form responses use `expires`
                "expires_in" | "expires" => parsed.expires_in = Some(ExpiresIn::Text(value)),
                _ => {}
            }
        }
        parsed
    };

    let access_token = parsed
        .access_token
        .ok_or_else(|| OAuthError::MissingParameter("access_token".to_owned()))?;

    let expire_time = match &parsed.expires_in {
        Some(expires_in) => match expires_in.seconds() {
            Some(secs) => Some(received_at.saturating_add(secs.saturating_mul(1000))),
            None => {
                tracing::warn!(?expires_in, "Ignoring unparseable expires_in");
                None
            }
        },
        None => None,
    };

    Ok(AccessGrant {
        access_token,
        scope: parsed.scope,
        refresh_token: parsed.refresh_token,
        expire_time,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const NOW: u64 = 1_700_000_000_000;

    fn response(content_type: Option<&str>, body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            content_type: content_type.map(str::to_owned),
            body: body.to_owned(),
        }
    }

    #[test]
    fn test_parse_json_grant() {
        let grant = parse_access_grant(
            &response(
                Some("application/json; charset=utf-8"),
                r#"{"access_token":"at","token_type":"bearer","refresh_token":"rt","expires_in":3600,"scope":"read write"}"#,
            ),
            NOW,
        )
        .unwrap();

        assert_eq!(
            grant,
            AccessGrant {
                access_token: "at".to_owned(),
                scope: Some("read write".to_owned()),
                refresh_token: Some("rt".to_owned()),
                expire_time: Some(NOW + 3_600_000),
            }
        );
    }

    #[test]
    fn test_parse_json_expires_in_as_string() {
        let grant = parse_access_grant(
            &response(Some("application/json"), r#"{"access_token":"at","expires_in":"60"}"#),
            NOW,
        )
        .unwrap();

        assert_eq!(grant.expire_time, Some(NOW + 60_000));
        assert_eq!(grant.refresh_token, None);
    }

    #[test]
    fn test_parse_form_grant() {
        let grant = parse_access_grant(
            &response(Some("text/plain"), "access_token=at%2B1&expires=5183999"),
            NOW,
        )
        .unwrap();

        assert_eq!(grant.access_token, "at+1");
        assert_eq!(grant.expire_time, Some(NOW + 5_183_999_000));
    }

    #[test]
    fn test_content_sniffing_without_content_type() {
        let grant = parse_access_grant(&response(None, r#"  {"access_token":"at"}"#), NOW).unwrap();

        assert_eq!(grant, AccessGrant::new("at"));
    }

    #[test]
    fn test_unparseable_expires_in_is_ignored() {
        let grant = parse_access_grant(
            &response(Some("application/json"), r#"{"access_token":"at","expires_in":"soon"}"#),
            NOW,
        )
        .unwrap();

        assert_eq!(grant.expire_time, None);
    }

    #[test]
    fn test_missing_access_token() {
        let err = parse_access_grant(
            &response(Some("application/json"), r#"{"error":"invalid_grant"}"#),
            NOW,
        )
        .unwrap_err();

        assert!(matches!(err, OAuthError::MissingParameter(ref p) if p == "access_token"));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_access_grant(&response(Some("application/json"), "{not json"), NOW).unwrap_err();

        assert!(matches!(err, OAuthError::Json(_)));
    }

    #[test]
    fn test_response_type() {
        assert_eq!(GrantType::AuthorizationCode.response_type(), "code");
        assert_eq!(GrantType::ImplicitGrant.response_type(), "token");
    }
}
