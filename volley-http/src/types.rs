//! Request and response types for function invocation

use bytes::Bytes;
use std::time::Duration;

/// One POST of a JSON body to an inference function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub url: String,
    /// JSON-encoded body
    pub body: Bytes,
    /// Overrides the client-wide timeout
    pub timeout: Option<Duration>,
}

impl InvocationRequest {
    pub fn new(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A fully received response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// From sending the request to the end of the body
    pub elapsed: Duration,
}

impl InvocationResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
