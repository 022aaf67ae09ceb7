use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::chain::ChainSource;
use crate::config::TronConfig;
use crate::error::EngineError;
use crate::retry::{fetch_with_retry, HttpFetcher, RequestDescriptor, RetryPolicy};
use crate::types::{RawAmount, RawBalanceEntry};

const NATIVE_SYMBOL: &str = "TRX";
const NATIVE_DECIMALS: u32 = 6;
/// Tokens all share the chain's 6-decimal unit on the primary indexer.
const TOKEN_DECIMALS: u32 = 6;
/// Symbol used when a contract's metadata lookup fails or comes back empty.
const PLACEHOLDER_SYMBOL: &str = "TRC20";

const API_KEY_HEADER: &str = "TRON-PRO-API-KEY";

/// Primary indexer account envelope. An empty `data` array means the
/// account is unknown to the chain, which is a valid zero-holdings answer.
#[derive(Debug, Deserialize)]
struct AccountEnvelope {
    #[serde(default)]
    data: Vec<AccountRecord>,
}

#[derive(Debug, Deserialize)]
struct AccountRecord {
    balance: Option<u64>,
    /// One single-key map per held token: contract address to unit balance.
    trc20: Option<Vec<BTreeMap<String, String>>>,
}

#[derive(Debug, Deserialize)]
struct TokenMetadata {
    #[serde(default)]
    trc20_tokens: Vec<TokenDetail>,
}

#[derive(Debug, Deserialize)]
struct TokenDetail {
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FallbackAccount {
    balance: Option<u64>,
}

/// Data source for the account-model chain: a primary indexer for native
/// and token balances, with a fallback indexer for native balance only when
/// the primary endpoint is unreachable.
pub struct TronSource {
    config: TronConfig,
    retry: RetryPolicy,
    http: Arc<dyn HttpFetcher>,
}

impl TronSource {
    pub fn new(config: TronConfig, retry: RetryPolicy, http: Arc<dyn HttpFetcher>) -> Self {
        Self {
            config,
            retry,
            http,
        }
    }

    async fn fetch_primary(&self, address: &str) -> Result<Vec<RawBalanceEntry>, EngineError> {
        let mut request = RequestDescriptor::new(format!("{}/{}", self.config.account_api, address));
        if !self.config.api_key.is_empty() {
            request = request.with_header(API_KEY_HEADER, self.config.api_key.as_str());
        }
        let body = fetch_with_retry(self.http.as_ref(), &request, &self.retry).await?;
        let envelope: AccountEnvelope =
            serde_json::from_value(body).map_err(EngineError::chain_query)?;

        let mut entries = Vec::new();
        let Some(account) = envelope.data.into_iter().next() else {
            debug!(address, "account unknown to primary indexer");
            return Ok(entries);
        };

        if let Some(balance) = account.balance {
            let native =
                RawBalanceEntry::scaled(NATIVE_SYMBOL, balance.to_string(), NATIVE_DECIMALS);
            if native.amount.to_decimal() > 0.0 {
                entries.push(native);
            }
        }

        for token in account.trc20.unwrap_or_default() {
            for (contract, units) in token {
                let amount = RawAmount::Scaled {
                    units,
                    decimals: TOKEN_DECIMALS,
                };
                if amount.to_decimal() <= 0.0 {
                    continue;
                }
                // Lookups run one at a time; a failure only costs this
                // token its human-readable symbol.
                let symbol = self.resolve_symbol(&contract).await;
                entries.push(RawBalanceEntry { symbol, amount });
            }
        }

        Ok(entries)
    }

    async fn resolve_symbol(&self, contract: &str) -> String {
        let request = RequestDescriptor::new(format!(
            "{}?contract={}",
            self.config.token_metadata_api, contract
        ));
        match fetch_with_retry(self.http.as_ref(), &request, &self.retry).await {
            Ok(body) => serde_json::from_value::<TokenMetadata>(body)
                .ok()
                .and_then(|metadata| metadata.trc20_tokens.into_iter().next())
                .and_then(|token| token.symbol)
                .unwrap_or_else(|| {
                    debug!(contract, "no symbol in token metadata, using placeholder");
                    PLACEHOLDER_SYMBOL.to_string()
                }),
            Err(err) => {
                warn!(contract, error = %err, "token metadata lookup failed, using placeholder");
                PLACEHOLDER_SYMBOL.to_string()
            }
        }
    }

    /// Native balance only; the fallback indexer is never asked to
    /// enumerate tokens.
    async fn fetch_fallback(&self, address: &str) -> Result<Vec<RawBalanceEntry>, EngineError> {
        let request = RequestDescriptor::new(format!(
            "{}?address={}",
            self.config.fallback_account_api, address
        ));
        let body = fetch_with_retry(self.http.as_ref(), &request, &self.retry).await?;
        let account: FallbackAccount =
            serde_json::from_value(body).map_err(EngineError::chain_query)?;

        let mut entries = Vec::new();
        if let Some(balance) = account.balance {
            let native =
                RawBalanceEntry::scaled(NATIVE_SYMBOL, balance.to_string(), NATIVE_DECIMALS);
            if native.amount.to_decimal() > 0.0 {
                entries.push(native);
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl ChainSource for TronSource {
    async fn fetch_holdings(&self, address: &str) -> Result<Vec<RawBalanceEntry>, EngineError> {
        match self.fetch_primary(address).await {
            Ok(entries) => Ok(entries),
            Err(primary_err) => {
                warn!(address, error = %primary_err, "primary indexer failed, trying fallback");
                self.fetch_fallback(address).await.map_err(|fallback_err| {
                    EngineError::chain_query(
                        anyhow::Error::new(fallback_err)
                            .context(format!("primary indexer also failed: {primary_err}")),
                    )
                })
            }
        }
    }
}
