//! Helpers for tests, mainly a scripted [`Transport`].

use std::sync::Mutex;

use anyhow::Result;

use crate::transport::{Response, Transport};

/// A request recorded by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    /// Requested URL.
    pub url: String,

    /// `Authorization` header value, if any.
    pub authorization: Option<String>,

    /// Whether a request body was attached.
    pub has_body: bool,
}

/// Scripted transport: answers every request from a closure and
/// records what was sent, so tests can assert on probe order and
/// headers without sockets.
pub struct MockTransport<F>
where
    F: Fn(&str, Option<&str>) -> Result<Response> + Send + Sync,
{
    respond: F,
    requests: Mutex<Vec<SentRequest>>,
}

impl<F> MockTransport<F>
where
    F: Fn(&str, Option<&str>) -> Result<Response> + Send + Sync,
{
    /// Creates a transport answering with `respond`.
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of requests issued so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// All requests issued so far, in order.
    pub fn requests(&self) -> Vec<SentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl<F> std::fmt::Debug for MockTransport<F>
where
    F: Fn(&str, Option<&str>) -> Result<Response> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

impl<F> Transport for MockTransport<F>
where
    F: Fn(&str, Option<&str>) -> Result<Response> + Send + Sync,
{
    async fn get(
        &self,
        url: &str,
        authorization: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        self.requests.lock().unwrap().push(SentRequest {
            url: url.to_string(),
            authorization: authorization.map(|value| value.to_string()),
            has_body: body.is_some(),
        });
        (self.respond)(url, authorization)
    }
}

/// 200 response with the given body.
pub fn ok_response(body: &str) -> Response {
    Response {
        status: 200,
        location: None,
        body: body.as_bytes().to_vec(),
    }
}

/// Empty response with the given status.
pub fn status_response(status: u16) -> Response {
    Response {
        status,
        location: None,
        body: Vec::new(),
    }
}

/// 302 response pointing at `location`.
pub fn redirect_response(location: &str) -> Response {
    Response {
        status: 302,
        location: Some(location.to_string()),
        body: Vec::new(),
    }
}
