use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::config::PriceConfig;
use crate::error::EngineError;
use crate::retry::{fetch_with_retry, HttpFetcher, RequestDescriptor, RetryPolicy};
use crate::types::{EnrichedBalance, NormalizedBalance};

/// Map a symbol to its price-feed identifier. Well-known symbols use the
/// feed's canonical ids; anything else falls back to the lowercased symbol,
/// which may simply not resolve.
fn feed_id(symbol: &str) -> String {
    let lower = symbol.to_lowercase();
    match lower.as_str() {
        "eth" => "ethereum".to_string(),
        "trx" => "tron".to_string(),
        "usdt" => "tether".to_string(),
        "usdc" => "usd-coin".to_string(),
        "bnb" => "binancecoin".to_string(),
        "busd" => "binance-usd".to_string(),
        "dai" => "dai".to_string(),
        _ => lower,
    }
}

#[derive(Debug, Deserialize)]
struct PriceQuote {
    usd: Option<f64>,
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Attach a USD valuation to each balance via one batched quote call.
///
/// A symbol whose identifier is absent from the response prices at 0; a
/// failed batch call fails the whole run, unlike the partial tolerance
/// inside the data sources.
pub async fn enrich(
    http: &dyn HttpFetcher,
    config: &PriceConfig,
    policy: &RetryPolicy,
    balances: Vec<NormalizedBalance>,
) -> Result<Vec<EnrichedBalance>, EngineError> {
    if balances.is_empty() {
        return Ok(Vec::new());
    }

    let mut ids: Vec<String> = Vec::new();
    for balance in &balances {
        let id = feed_id(&balance.symbol);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    let request = RequestDescriptor::new(format!(
        "{}?ids={}&vs_currencies=usd",
        config.endpoint,
        ids.join(",")
    ));
    let body = fetch_with_retry(http, &request, policy)
        .await
        .map_err(EngineError::price_query)?;
    let quotes: HashMap<String, PriceQuote> =
        serde_json::from_value(body).map_err(EngineError::price_query)?;
    debug!(requested = ids.len(), resolved = quotes.len(), "price quotes fetched");

    Ok(balances
        .into_iter()
        .map(|balance| {
            let unit_price = quotes
                .get(&feed_id(&balance.symbol))
                .and_then(|quote| quote.usd)
                .unwrap_or(0.0);
            EnrichedBalance {
                fiat_value: round_cents(balance.amount * unit_price),
                symbol: balance.symbol,
                amount: balance.amount,
            }
        })
        .collect())
}
