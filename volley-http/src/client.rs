//! HTTP client implementation

use crate::config::HttpConfig;
use crate::errors::HttpError;
use crate::types::{InvocationRequest, InvocationResponse};
use reqwest::{header::CONTENT_TYPE, Client, Url};
use std::time::Instant;
use tracing::{debug, trace};

/// Client trait for invoking functions
#[async_trait::async_trait]
pub trait InvocationClient: Send + Sync {
    /// Posts the request and reads the whole response body.
    /// Any received status is `Ok`; only transport failures are errors.
    async fn send(&self, request: InvocationRequest) -> Result<InvocationResponse, HttpError>;
}

/// HTTP Manager holding one pooled client shared by all virtual users
#[derive(Debug, Clone)]
pub struct HttpManager {
    client: Client,
    config: HttpConfig,
}

impl HttpManager {
    /// Create a new HttpManager with default configuration
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a new HttpManager with specific configuration
    pub fn with_config(config: HttpConfig) -> Result<Self, HttpError> {
        debug!(
            "Creating HttpManager with timeout: {}s, pool: {} idle per host",
            config.timeout.as_secs(),
            config.pool_max_idle_per_host
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .redirect(redirect_policy(config.max_redirects))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()
            .map_err(|e| HttpError::ClientBuild(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

fn redirect_policy(max_redirects: u32) -> reqwest::redirect::Policy {
    match max_redirects {
        0 => reqwest::redirect::Policy::none(),
        n => reqwest::redirect::Policy::limited(n as usize),
    }
}

#[async_trait::async_trait]
impl InvocationClient for HttpManager {
    async fn send(&self, request: InvocationRequest) -> Result<InvocationResponse, HttpError> {
        let url = Url::parse(&request.url)
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {}", request.url, e)))?;

        let mut builder = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(request.body);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let started = Instant::now();
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        let elapsed = started.elapsed();

        trace!(
            "POST {} -> {} ({} bytes, {}ms)",
            request.url,
            status,
            body.len(),
            elapsed.as_millis()
        );

        Ok(InvocationResponse {
            status,
            body: body.to_vec(),
            elapsed,
        })
    }
}
