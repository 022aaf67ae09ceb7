use serde::Serialize;

/// Raw numeric encoding as produced by an external data source.
///
/// Sources either report integer units that still need scaling by a
/// decimal-places factor, or an amount they have already reduced to a
/// human-scale decimal.
#[derive(Debug, Clone)]
pub enum RawAmount {
    /// Already-decimal amount.
    Decimal(f64),
    /// Integer units plus the number of decimal places to shift by.
    Scaled { units: String, decimals: u32 },
}

impl RawAmount {
    /// Reduce to a human-scale decimal amount. Unparseable unit strings
    /// collapse to 0 rather than erroring, matching lenient numeric
    /// coercion at the source-API boundary.
    pub fn to_decimal(&self) -> f64 {
        match self {
            RawAmount::Decimal(value) => *value,
            RawAmount::Scaled { units, decimals } => {
                units.parse::<f64>().unwrap_or(0.0) / 10f64.powi(*decimals as i32)
            }
        }
    }
}

/// One balance entry as reported by a single data-source call, before
/// normalization. Symbols are kept exactly as the source spelled them.
#[derive(Debug, Clone)]
pub struct RawBalanceEntry {
    pub symbol: String,
    pub amount: RawAmount,
}

impl RawBalanceEntry {
    pub fn scaled(symbol: impl Into<String>, units: impl Into<String>, decimals: u32) -> Self {
        Self {
            symbol: symbol.into(),
            amount: RawAmount::Scaled {
                units: units.into(),
                decimals,
            },
        }
    }

    pub fn decimal(symbol: impl Into<String>, amount: f64) -> Self {
        Self {
            symbol: symbol.into(),
            amount: RawAmount::Decimal(amount),
        }
    }
}

/// A merged per-symbol balance: uppercase symbol, strictly positive amount,
/// at most one entry per symbol within an aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBalance {
    pub symbol: String,
    pub amount: f64,
}

/// A normalized balance with its fiat valuation attached. `fiat_value` is
/// rounded to cents; `amount` keeps full precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedBalance {
    pub symbol: String,
    pub amount: f64,
    pub fiat_value: f64,
}
