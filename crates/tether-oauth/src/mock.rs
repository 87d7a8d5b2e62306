//! Mock transport implementation for testing.
//!
//! Provides [`MockTransport`] for exercising flow templates without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::OAuthError;
use crate::transport::{FormRequest, HttpResponse, HttpTransport};

/// Mock transport for testing.
///
/// Replays canned responses in order and records every request. Once the
/// queue is empty, requests get a 500 response.
///
/// # Example
///
/// ```ignore
/// use tether_oauth::MockTransport;
///
/// let transport = MockTransport::new()
///     .with_form(200, "oauth_token=t&oauth_token_secret=s");
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<FormRequest>>,
}

impl MockTransport {
    /// Create a mock transport with no canned responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_response(self, status: u16, content_type: Option<&str>, body: &str) -> Self {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            content_type: content_type.map(str::to_owned),
            body: body.to_owned(),
        });
        self
    }

    /// Queue a form-encoded response.
    #[must_use]
    pub fn with_form(self, status: u16, body: &str) -> Self {
        self.with_response(status, Some("application/x-www-form-urlencoded"), body)
    }

    /// Queue a JSON response.
    #[must_use]
    pub fn with_json(self, status: u16, body: &str) -> Self {
        self.with_response(status, Some("application/json;charset=UTF-8"), body)
    }

    /// All requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn requests(&self) -> Vec<FormRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpTransport for MockTransport {
    fn post_form(&self, request: &FormRequest) -> Result<HttpResponse, OAuthError> {
        self.requests.lock().unwrap().push(request.clone());
        let response = self.responses.lock().unwrap().pop_front();
        Ok(response.unwrap_or_else(|| HttpResponse {
            status: 500,
            content_type: None,
            body: "no canned response".to_owned(),
        }))
    }
}
