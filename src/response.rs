//! Stub responses and simulated failures.

use crate::error::Result;
use crate::request::insert_header;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Status code carried by responses that represent a failure.
pub const FAILURE_STATUS: i32 = -1;

/// Callback invoked each time a response is delivered by a successful lookup.
pub type DeliveryCallback = Arc<dyn Fn() + Send + Sync>;

/// Kind of transport failure to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    ConnectionRefused,
    ConnectionReset,
    NotConnected,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::ConnectionRefused => "connection refused",
            FailureKind::ConnectionReset => "connection reset",
            FailureKind::NotConnected => "not connected",
            FailureKind::Other => "failure",
        };
        f.write_str(s)
    }
}

/// Description of a simulated failure.
///
/// The networking-client shim translates this into its own error type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::new(FailureKind::Timeout, "The request timed out (simulated)")
    }

    pub fn connection_refused() -> Self {
        Self::new(FailureKind::ConnectionRefused, "Connection refused (simulated)")
    }

    pub fn not_connected() -> Self {
        Self::new(FailureKind::NotConnected, "Not connected to the internet (simulated)")
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Failure {}

/// The response returned for a matched stub.
///
/// A response is either a real HTTP response (status, headers, body) or a
/// simulated failure. Failures report [`FAILURE_STATUS`] as their status code
/// and always carry a [`Failure`]; real responses never do.
#[derive(Clone)]
pub struct StubResponse {
    status_code: i32,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
    failure: Option<Failure>,
    on_delivered: Option<DeliveryCallback>,
}

impl StubResponse {
    /// A 200 response with an empty body.
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// A response with the given status and an empty body.
    pub fn new(status: u16) -> Self {
        Self {
            status_code: i32::from(status),
            headers: HashMap::new(),
            body: Some(Vec::new()),
            failure: None,
            on_delivered: None,
        }
    }

    /// A response that represents a transport failure instead of an HTTP reply.
    pub fn failure(failure: Failure) -> Self {
        Self {
            status_code: FAILURE_STATUS,
            headers: HashMap::new(),
            body: None,
            failure: Some(failure),
            on_delivered: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the body and default the content type to JSON.
    pub fn with_json_body<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(value)?);
        if self.header("content-type").is_none() {
            self.headers
                .insert("Content-Type".to_string(), "application/json".to_string());
        }
        Ok(self)
    }

    /// Register a callback run every time this response is delivered.
    pub fn on_delivered<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_delivered = Some(Arc::new(callback));
        self
    }

    pub fn status_code(&self) -> i32 {
        self.status_code
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn should_fail(&self) -> bool {
        self.failure.is_some()
    }

    pub fn failure_reason(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub(crate) fn delivery_callback(&self) -> Option<DeliveryCallback> {
        self.on_delivered.clone()
    }
}

impl Default for StubResponse {
    fn default() -> Self {
        Self::ok()
    }
}

impl PartialEq for StubResponse {
    fn eq(&self, other: &Self) -> bool {
        self.status_code == other.status_code
            && self.headers == other.headers
            && self.body == other.body
            && self.failure == other.failure
    }
}

impl fmt::Debug for StubResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubResponse")
            .field("status_code", &self.status_code)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|b| String::from_utf8_lossy(b)))
            .field("failure", &self.failure)
            .field("on_delivered", &self.on_delivered.is_some())
            .finish()
    }
}
