//! Test doubles shared by the unit tests of this crate

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use volley_config::InvocationMode;
use volley_core::{Endpoint, ResponseContract};
use volley_http::{HttpError, InvocationClient, InvocationRequest, InvocationResponse};

pub(crate) const FAKE_LATENCY: Duration = Duration::from_millis(100);

/// Answers every request with the same status and body after a fixed latency
pub(crate) struct FakeClient {
    status: u16,
    body: Vec<u8>,
    error: Option<HttpError>,
    calls: AtomicU64,
}

impl FakeClient {
    pub(crate) fn ok(body: &str) -> Self {
        Self::with_status(200, body)
    }

    pub(crate) fn with_status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.as_bytes().to_vec(),
            error: None,
            calls: AtomicU64::new(0),
        }
    }

    pub(crate) fn failing(error: HttpError) -> Self {
        Self {
            error: Some(error),
            ..Self::with_status(0, "")
        }
    }

    pub(crate) fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl InvocationClient for FakeClient {
    async fn send(&self, _request: InvocationRequest) -> Result<InvocationResponse, HttpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(FAKE_LATENCY).await;
        match self.error {
            Some(ref error) => Err(error.clone()),
            None => Ok(InvocationResponse {
                status: self.status,
                body: self.body.clone(),
                elapsed: FAKE_LATENCY,
            }),
        }
    }
}

pub(crate) fn endpoint(contract: ResponseContract) -> Endpoint {
    Endpoint {
        name: "distilbert".to_string(),
        url: "http://127.0.0.1:8080/function/distilbert-finetuned-inference".to_string(),
        invocation: InvocationMode::Sync,
        contract,
        payload_file: PathBuf::from("payloads/distilbert_payloads.json"),
        request_timeout: None,
    }
}
