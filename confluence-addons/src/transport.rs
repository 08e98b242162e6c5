//! HTTP transport seam for upstream fetches.
//!
//! Wrappers go through the [`Transport`] trait so the aggregation logic
//! can be exercised against an instrumented mock without sockets. The
//! production implementation is a thin reqwest client applying the
//! per-request timeout.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Raw outcome of one upstream GET.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failures, attributed to an addon by the caller.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request did not complete within the given timeout.
    #[error("request timed out")]
    Timeout,

    /// The request failed below the HTTP layer.
    #[error("{reason}")]
    Request {
        /// The reason for the failure
        reason: String,
    },
}

/// Bounded-time HTTP GET used by every upstream wrapper.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Fetches `url` with the given headers, failing after `timeout`.
    ///
    /// Non-success statuses are returned as responses, not errors; the
    /// caller decides how to attribute them.
    ///
    /// # Errors
    /// - `TransportError::Timeout` - No response within `timeout`
    /// - `TransportError::Request` - Connection or protocol failure
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}

/// Production transport backed by a shared reqwest client.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates the transport with a connection-pooling client.
    ///
    /// Timeouts are applied per request, not on the client, because each
    /// wrapper instance resolves its own effective timeout.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::limited(3))
                .build()
                .expect("HTTP client creation should not fail"),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Request {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Request {
                    reason: format!("body read failed: {e}"),
                }
            }
        })?;

        Ok(RawResponse { status, body })
    }
}

/// One recorded mock fetch.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

#[cfg(test)]
impl RecordedCall {
    /// Value of a header by name, if the call carried it.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
#[derive(Debug, Clone)]
enum MockOutcome {
    Respond { status: u16, body: String },
    Timeout,
    Fail { reason: String },
}

/// Instrumented transport for tests: records every call and serves
/// scripted outcomes.
///
/// Outcome rules are keyed by a substring matched against the URL and
/// every header value, so tests can target one fan-out instance by its
/// (deterministic) config token. Unmatched calls get the default
/// outcome, initially `200` with an empty stream list.
#[cfg(test)]
#[derive(Debug)]
pub struct MockTransport {
    default_outcome: std::sync::Mutex<MockOutcome>,
    rules: std::sync::Mutex<Vec<(String, MockOutcome)>>,
    calls: std::sync::Mutex<Vec<RecordedCall>>,
}

#[cfg(test)]
impl MockTransport {
    /// Creates a mock answering every call with an empty stream list.
    pub fn new() -> Self {
        Self {
            default_outcome: std::sync::Mutex::new(MockOutcome::Respond {
                status: 200,
                body: r#"{"streams":[]}"#.to_string(),
            }),
            rules: std::sync::Mutex::new(Vec::new()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Sets the default response body (status 200).
    pub fn respond_ok(&self, body: &str) {
        *self.default_outcome.lock().unwrap() = MockOutcome::Respond {
            status: 200,
            body: body.to_string(),
        };
    }

    /// Sets the default response to a bare status with an empty body.
    pub fn respond_status(&self, status: u16) {
        *self.default_outcome.lock().unwrap() = MockOutcome::Respond {
            status,
            body: String::new(),
        };
    }

    /// Serves `body` for calls whose URL or any header value contains `key`.
    pub fn respond_when(&self, key: &str, status: u16, body: &str) {
        self.rules.lock().unwrap().push((
            key.to_string(),
            MockOutcome::Respond {
                status,
                body: body.to_string(),
            },
        ));
    }

    /// Fails matching calls with a transport error.
    pub fn fail_when(&self, key: &str, reason: &str) {
        self.rules.lock().unwrap().push((
            key.to_string(),
            MockOutcome::Fail {
                reason: reason.to_string(),
            },
        ));
    }

    /// Times out matching calls.
    pub fn timeout_when(&self, key: &str) {
        self.rules
            .lock()
            .unwrap()
            .push((key.to_string(), MockOutcome::Timeout));
    }

    /// Every call made so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn outcome_for(&self, call: &RecordedCall) -> MockOutcome {
        let rules = self.rules.lock().unwrap();
        for (key, outcome) in rules.iter() {
            let matches = call.url.contains(key)
                || call.headers.iter().any(|(_, value)| value.contains(key));
            if matches {
                return outcome.clone();
            }
        }
        self.default_outcome.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Transport for MockTransport {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let call = RecordedCall {
            url: url.to_string(),
            headers: headers.to_vec(),
            timeout,
        };
        self.calls.lock().unwrap().push(call.clone());

        match self.outcome_for(&call) {
            MockOutcome::Respond { status, body } => Ok(RawResponse { status, body }),
            MockOutcome::Timeout => Err(TransportError::Timeout),
            MockOutcome::Fail { reason } => Err(TransportError::Request { reason }),
        }
    }
}
