use std::collections::HashMap;

use crate::types::{EnrichedBalance, NormalizedBalance, RawBalanceEntry};

/// Merge raw entries into one balance per symbol.
///
/// Symbols are uppercased and act as the grouping key; amounts within a
/// group are summed. Groups whose total is not strictly positive are
/// dropped. Output preserves the first-seen order of each symbol; ranking
/// happens later, after fiat enrichment.
pub fn normalize(entries: Vec<RawBalanceEntry>) -> Vec<NormalizedBalance> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, f64> = HashMap::new();

    for entry in entries {
        let symbol = entry.symbol.to_uppercase();
        let amount = entry.amount.to_decimal();
        if !totals.contains_key(&symbol) {
            order.push(symbol.clone());
        }
        *totals.entry(symbol).or_insert(0.0) += amount;
    }

    order
        .into_iter()
        .filter_map(|symbol| {
            let amount = totals[&symbol];
            (amount > 0.0).then(|| NormalizedBalance { symbol, amount })
        })
        .collect()
}

/// Stable sort by fiat value, highest first. Entries with equal fiat value
/// keep their discovery order.
pub fn rank(mut balances: Vec<EnrichedBalance>) -> Vec<EnrichedBalance> {
    balances.sort_by(|a, b| b.fiat_value.total_cmp(&a.fiat_value));
    balances
}
