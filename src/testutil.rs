//! Capability mocks shared by the module tests. Requests are routed by URL
//! substring to scripted outcomes; every call is recorded so tests can
//! assert on attempt counts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::U256;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::ethereum::LedgerReader;
use crate::retry::{HttpFetcher, RequestDescriptor, RetryPolicy};

/// Retry policy with a negligible delay so retry-heavy tests stay fast.
pub fn quick_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        delay: Duration::from_millis(1),
    }
}

type Outcome = Result<Value, String>;

pub struct MockFetcher {
    routes: Mutex<Vec<(String, VecDeque<Outcome>)>>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Script outcomes for every request whose URL contains `needle`.
    /// Outcomes are consumed in order; the last one repeats once the
    /// script runs out.
    pub fn route(self, needle: &str, outcomes: Vec<Outcome>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((needle.to_string(), outcomes.into()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.contains(needle))
            .count()
    }

    pub fn last_url(&self) -> Option<String> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HttpFetcher for MockFetcher {
    async fn get_json(&self, request: &RequestDescriptor) -> Result<Value> {
        self.calls.lock().unwrap().push(request.url.clone());
        let mut routes = self.routes.lock().unwrap();
        for (needle, outcomes) in routes.iter_mut() {
            if request.url.contains(needle.as_str()) {
                let outcome = if outcomes.len() > 1 {
                    outcomes.pop_front().unwrap()
                } else {
                    outcomes
                        .front()
                        .cloned()
                        .ok_or_else(|| anyhow::anyhow!("route {needle} has no outcomes"))?
                };
                return outcome.map_err(|message| anyhow::anyhow!(message));
            }
        }
        anyhow::bail!("unexpected request: {}", request.url)
    }
}

pub struct MockLedger {
    outcome: Result<U256, String>,
    calls: AtomicU32,
}

impl MockLedger {
    pub fn balance(wei: U256) -> Self {
        Self {
            outcome: Ok(wei),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerReader for MockLedger {
    async fn wei_balance(&self, _address: &str) -> Result<U256> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
            .clone()
            .map_err(|message| anyhow::anyhow!(message))
    }
}
