use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::error::EngineError;

/// Bounded retry with a constant delay between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

/// A GET request to an external endpoint: target URL plus optional headers.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Capability for issuing a single HTTP GET and decoding the JSON body.
/// Non-2xx statuses are errors so the retry loop treats them as failures.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get_json(&self, request: &RequestDescriptor) -> Result<Value>;
}

/// Production fetcher backed by a shared reqwest client.
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get_json(&self, request: &RequestDescriptor) -> Result<Value> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder
            .send()
            .await
            .with_context(|| format!("GET {}", request.url))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {} returned status {}", request.url, status);
        }
        response
            .json::<Value>()
            .await
            .with_context(|| format!("invalid JSON body from {}", request.url))
    }
}

/// Run `attempt` up to `policy.max_attempts` times, sleeping `policy.delay`
/// between failures. The first success wins; once every attempt has failed
/// the last error is surfaced as `FetchExhausted` against `target`.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    target: &str,
    mut attempt: F,
) -> Result<T, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error: Option<anyhow::Error> = None;
    for n in 1..=policy.max_attempts {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(
                    target_url = target,
                    attempt = n,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "attempt failed"
                );
                last_error = Some(err);
                if n < policy.max_attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
    Err(EngineError::FetchExhausted {
        url: target.to_string(),
        attempts: policy.max_attempts,
        cause: last_error.unwrap_or_else(|| anyhow::anyhow!("retry budget was zero")),
    })
}

/// Retried HTTP GET, the shape every indexer and price call goes through.
pub async fn fetch_with_retry(
    http: &dyn HttpFetcher,
    request: &RequestDescriptor,
    policy: &RetryPolicy,
) -> Result<Value, EngineError> {
    with_retry(policy, &request.url, || http.get_json(request)).await
}
