mod chain;
mod config;
mod error;
mod ethereum;
mod portfolio;
mod price;
mod retry;
#[cfg(test)]
mod testutil;
mod tron;
mod types;

pub use chain::{classify, ChainFamily, ChainSource};
pub use config::{Config, EvmConfig, PriceConfig, RetryConfig, TronConfig};
pub use error::EngineError;
pub use ethereum::{AlloyLedgerReader, EvmSource, LedgerReader};
pub use portfolio::{normalize, rank};
pub use price::enrich;
pub use retry::{
    fetch_with_retry, with_retry, HttpFetcher, RequestDescriptor, ReqwestFetcher, RetryPolicy,
};
pub use tron::TronSource;
pub use types::{EnrichedBalance, NormalizedBalance, RawAmount, RawBalanceEntry};

use std::sync::Arc;

use tracing::{debug, info};

/// The multi-chain balance aggregation engine.
///
/// One `fetch_holdings` call runs the whole pipeline sequentially:
/// classify the address, query the matching chain source, normalize and
/// merge the raw entries, attach fiat valuations, and rank the result by
/// fiat value. All state is local to the call.
pub struct Aggregator {
    retry: RetryPolicy,
    price: PriceConfig,
    http: Arc<dyn HttpFetcher>,
    evm: EvmSource,
    tron: TronSource,
}

impl Aggregator {
    /// Wire up the engine against real transports: reqwest for HTTP and an
    /// alloy JSON-RPC provider for ledger reads.
    pub fn new(config: Config) -> Self {
        let http: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new());
        let ledger: Arc<dyn LedgerReader> =
            Arc::new(AlloyLedgerReader::new(config.evm.rpc_url.clone()));
        Self::with_capabilities(config, http, ledger)
    }

    /// Wire up the engine with caller-supplied capabilities.
    pub fn with_capabilities(
        config: Config,
        http: Arc<dyn HttpFetcher>,
        ledger: Arc<dyn LedgerReader>,
    ) -> Self {
        let retry = config.retry.policy();
        Self {
            evm: EvmSource::new(config.evm, retry, http.clone(), ledger),
            tron: TronSource::new(config.tron, retry, http.clone()),
            price: config.price,
            retry,
            http,
        }
    }

    /// Aggregate all holdings for one address and return them ranked by
    /// fiat value, highest first. An empty result means the address was
    /// valid but holds nothing; errors mean the run could not complete.
    pub async fn fetch_holdings(&self, address: &str) -> Result<Vec<EnrichedBalance>, EngineError> {
        let source: &dyn ChainSource = match classify(address) {
            ChainFamily::Evm => &self.evm,
            ChainFamily::AccountModel => &self.tron,
            ChainFamily::Unrecognized => {
                return Err(EngineError::InvalidAddress(address.to_string()));
            }
        };

        let raw = source.fetch_holdings(address).await?;
        debug!(address, entries = raw.len(), "raw balance entries collected");

        let normalized = normalize(raw);
        let enriched = enrich(self.http.as_ref(), &self.price, &self.retry, normalized).await?;
        let ranked = rank(enriched);
        info!(address, holdings = ranked.len(), "aggregation complete");
        Ok(ranked)
    }
}

/// Aggregate holdings for an address using the embedded configuration.
pub async fn fetch_holdings(address: &str) -> anyhow::Result<Vec<EnrichedBalance>> {
    let config = Config::load()?;
    Ok(Aggregator::new(config).fetch_holdings(address).await?)
}
