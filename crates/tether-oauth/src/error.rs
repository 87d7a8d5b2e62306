//! Error types for OAuth signing and token flows.

use std::str::Utf8Error;

/// Error from signing or token exchange operations.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    HttpRequest(#[from] ureq::Error),

    /// HTTP response error (provider returned a non-2xx status).
    #[error("HTTP error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// Token response did not carry a required field.
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// JSON token response could not be parsed.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// Request URL could not be parsed.
    #[error("invalid URL")]
    Url(#[from] url::ParseError),

    /// RSA key loading/parsing error.
    #[error("RSA key error")]
    Key(#[from] KeyError),

    /// Signature method name is not supported.
    #[error("unsupported signature method: {0}")]
    UnsupportedSignatureMethod(String),

    /// Signature primitive failed.
    #[error("signature error: {0}")]
    Signature(String),
}

impl OAuthError {
    /// Whether this error stems from bad configuration rather than the provider.
    ///
    /// Configuration errors are fatal: retrying the same call cannot succeed.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Key(_) | Self::UnsupportedSignatureMethod(_) | Self::Signature(_) | Self::Url(_)
        )
    }
}

/// RSA key loading/parsing error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum KeyError {
    /// Key material is not valid base64.
    #[error("invalid base64 in key")]
    Base64(#[from] base64::DecodeError),

    /// Invalid UTF-8 in key file.
    #[error("invalid UTF-8 in key")]
    InvalidUtf8(#[from] Utf8Error),

    /// PKCS#1 key parsing error.
    #[error("PKCS#1 key error")]
    Pkcs1(#[from] rsa::pkcs1::Error),

    /// PKCS#8 key parsing error (returned when both formats fail).
    #[error("PKCS#8 key error")]
    Pkcs8(#[from] rsa::pkcs8::Error),

    /// X.509 `SubjectPublicKeyInfo` parsing error.
    #[error("public key error")]
    Spki(#[from] rsa::pkcs8::spki::Error),

    /// RSA primitive error.
    #[error("RSA error")]
    Rsa(#[from] rsa::Error),

    /// I/O error reading a key file.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}
