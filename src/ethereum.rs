use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::BlockNumberOrTag;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::chain::ChainSource;
use crate::config::EvmConfig;
use crate::error::EngineError;
use crate::retry::{fetch_with_retry, with_retry, HttpFetcher, RequestDescriptor, RetryPolicy};
use crate::types::{RawAmount, RawBalanceEntry};

const NATIVE_SYMBOL: &str = "ETH";
const NATIVE_DECIMALS: u32 = 18;

/// Capability for reading a native-coin balance from a ledger node, in the
/// chain's smallest integer unit.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn wei_balance(&self, address: &str) -> Result<U256>;
}

/// Ledger reader backed by an EVM JSON-RPC endpoint.
pub struct AlloyLedgerReader {
    rpc_url: String,
}

impl AlloyLedgerReader {
    pub fn new(rpc_url: String) -> Self {
        Self { rpc_url }
    }
}

#[async_trait]
impl LedgerReader for AlloyLedgerReader {
    async fn wei_balance(&self, address: &str) -> Result<U256> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);

        let addr: Address = address.parse()?;
        let balance = provider
            .get_balance(addr)
            .block_id(BlockNumberOrTag::Latest.into())
            .await?;

        Ok(balance)
    }
}

/// Transfer-history response from the block-explorer indexer. `status` is
/// "1" when records exist; "0" covers both "no transactions" and indexer
/// errors, which we treat alike.
#[derive(Debug, Deserialize)]
struct TransferHistory {
    status: String,
    result: Option<Vec<TransferRecord>>,
}

#[derive(Debug, Deserialize)]
struct TransferRecord {
    #[serde(rename = "tokenSymbol")]
    token_symbol: String,
    value: String,
    #[serde(rename = "tokenDecimal")]
    token_decimal: String,
}

/// Data source for the EVM chain: native balance via the ledger node plus a
/// net-flow approximation of token balances derived from transfer history.
pub struct EvmSource {
    config: EvmConfig,
    retry: RetryPolicy,
    http: Arc<dyn HttpFetcher>,
    ledger: Arc<dyn LedgerReader>,
}

impl EvmSource {
    pub fn new(
        config: EvmConfig,
        retry: RetryPolicy,
        http: Arc<dyn HttpFetcher>,
        ledger: Arc<dyn LedgerReader>,
    ) -> Self {
        Self {
            config,
            retry,
            http,
            ledger,
        }
    }

    fn history_url(&self, address: &str) -> String {
        format!(
            "{}?chainid={}&module=account&action=tokentx&address={}&sort=desc&apikey={}",
            self.config.explorer_api, self.config.chain_id, address, self.config.explorer_api_key
        )
    }

    /// Sum per-symbol transfer values, adjusted by each record's own
    /// decimals field. This is a directional net-flow approximation, not a
    /// balance snapshot: every value seen for a symbol is added, so the
    /// total can diverge from the true on-chain balance after outflows.
    fn accumulate_history(records: Vec<TransferRecord>, entries: &mut Vec<RawBalanceEntry>) {
        let mut totals: Vec<(String, f64)> = Vec::new();
        for record in records {
            let decimals: u32 = record.token_decimal.parse().unwrap_or(0);
            let delta = RawAmount::Scaled {
                units: record.value,
                decimals,
            }
            .to_decimal();
            match totals.iter_mut().find(|(symbol, _)| *symbol == record.token_symbol) {
                Some((_, total)) => *total += delta,
                None => totals.push((record.token_symbol, delta)),
            }
        }
        for (symbol, total) in totals {
            if total > 0.0 {
                entries.push(RawBalanceEntry::decimal(symbol, total));
            }
        }
    }
}

#[async_trait]
impl ChainSource for EvmSource {
    async fn fetch_holdings(&self, address: &str) -> Result<Vec<RawBalanceEntry>, EngineError> {
        // Native balance is required: exhausting its retries fails the run.
        let wei = with_retry(&self.retry, &self.config.rpc_url, || {
            self.ledger.wei_balance(address)
        })
        .await
        .map_err(EngineError::chain_query)?;

        let mut entries = Vec::new();
        let native = RawBalanceEntry::scaled(NATIVE_SYMBOL, wei.to_string(), NATIVE_DECIMALS);
        if native.amount.to_decimal() > 0.0 {
            entries.push(native);
        }

        // Token history is best-effort: an exhausted or malformed indexer
        // response degrades to native-only results.
        let request = RequestDescriptor::new(self.history_url(address));
        match fetch_with_retry(self.http.as_ref(), &request, &self.retry).await {
            Ok(body) => match serde_json::from_value::<TransferHistory>(body) {
                Ok(history) if history.status == "1" => {
                    if let Some(records) = history.result {
                        Self::accumulate_history(records, &mut entries);
                    }
                }
                Ok(history) => {
                    debug!(address, status = history.status, "no transfer history");
                }
                Err(err) => {
                    warn!(address, error = %err, "transfer history had unexpected shape");
                }
            },
            Err(err) => {
                warn!(address, error = %err, "token history lookup failed, returning native balance only");
            }
        }

        Ok(entries)
    }
}
