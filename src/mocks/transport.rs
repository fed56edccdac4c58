//! Mock HTTP transport for testing.

use crate::error::{NetworkError, S3Error};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Canned response handed out by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

impl MockResponse {
    /// A 200 response with an empty body.
    pub fn ok() -> Self {
        Self::status(200)
    }

    /// A response with the given status and an empty body.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// An error response carrying an S3 `<Error>` document.
    pub fn error(status: u16, code: &str, message: &str) -> Self {
        Self::status(status).with_body(super::TestFixtures::error_xml(code, message))
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

impl From<MockResponse> for HttpResponse {
    fn from(mock: MockResponse) -> Self {
        HttpResponse {
            status: mock.status,
            headers: mock.headers,
            body: mock.body,
        }
    }
}

/// Transport that replays queued responses and records every request.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
    default_response: Option<MockResponse>,
}

impl MockTransport {
    /// Create a transport with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with queued responses.
    pub fn with_responses(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    /// Create a transport that answers every request with `response`.
    pub fn with_default(response: MockResponse) -> Self {
        Self {
            default_response: Some(response),
            ..Self::default()
        }
    }

    /// Queue a response.
    pub fn queue_response(&self, response: MockResponse) {
        self.responses.lock().push_back(response);
    }

    /// All recorded requests, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests sent.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, S3Error> {
        self.requests.lock().push(request);

        let next = self
            .responses
            .lock()
            .pop_front()
            .or_else(|| self.default_response.clone());

        next.map(HttpResponse::from).ok_or_else(|| {
            S3Error::Network(NetworkError::ConnectionFailed {
                message: "No mock response available".to_string(),
            })
        })
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("queued_responses", &self.responses.lock().len())
            .field("recorded_requests", &self.requests.lock().len())
            .finish()
    }
}
