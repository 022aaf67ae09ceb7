use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Endpoint and retry configuration for the aggregation engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub evm: EvmConfig,
    pub tron: TronConfig,
    pub price: PriceConfig,
    pub retry: RetryConfig,
}

/// EVM chain endpoints: a JSON-RPC node for ledger reads and a
/// block-explorer API for token-transfer history.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmConfig {
    pub rpc_url: String,
    pub explorer_api: String,
    pub chain_id: u64,
    #[serde(default)]
    pub explorer_api_key: String,
}

/// Account-model chain endpoints: primary account indexer, fallback
/// account indexer, and the per-contract token metadata lookup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TronConfig {
    pub account_api: String,
    pub fallback_account_api: String,
    pub token_metadata_api: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceConfig {
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            delay: Duration::from_millis(self.delay_ms),
        }
    }
}

impl Config {
    /// Load configuration from embedded JSON
    pub fn load() -> Result<Self> {
        let config_str = include_str!("../config.json");
        let config: Config = serde_json::from_str(config_str)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config() {
        let config = Config::load().unwrap();
        assert_eq!(config.evm.chain_id, 1);
        assert!(config.evm.explorer_api.contains("etherscan"));
        assert!(config.tron.account_api.contains("trongrid"));
        assert!(config.tron.fallback_account_api.contains("tronscan"));
        assert!(config.price.endpoint.contains("coingecko"));
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = Config::load().unwrap();
        let policy = config.retry.policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_missing_api_keys_default_to_empty() {
        let json = r#"{
            "evm": {"rpcUrl": "http://r", "explorerApi": "http://e", "chainId": 1},
            "tron": {"accountApi": "http://a", "fallbackAccountApi": "http://f", "tokenMetadataApi": "http://m"},
            "price": {"endpoint": "http://p"},
            "retry": {"maxAttempts": 3, "delayMs": 1000}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.evm.explorer_api_key.is_empty());
        assert!(config.tron.api_key.is_empty());
    }
}
