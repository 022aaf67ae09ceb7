use thiserror::Error;

/// Failures the aggregation engine can surface to its caller.
///
/// Per-record problems inside a data source (one token's metadata lookup,
/// a malformed history row) are absorbed where they occur and only degrade
/// output quality; these variants cover the failures that end a run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The address matched neither chain family. No network call was made.
    #[error("address not recognized: {0}")]
    InvalidAddress(String),

    /// A required chain read (native balance, account endpoint and its
    /// fallback) exhausted its retries.
    #[error("chain query failed: {cause}")]
    ChainQueryFailed { cause: anyhow::Error },

    /// A request failed on every attempt of its retry budget. Carries the
    /// target and the last underlying error for diagnostics.
    #[error("request to {url} failed after {attempts} attempts: {cause}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        cause: anyhow::Error,
    },

    /// The batched fiat price call failed; the whole run aborts.
    #[error("price lookup failed: {cause}")]
    PriceQueryFailed { cause: anyhow::Error },
}

impl EngineError {
    pub fn chain_query(cause: impl Into<anyhow::Error>) -> Self {
        EngineError::ChainQueryFailed {
            cause: cause.into(),
        }
    }

    pub fn price_query(cause: impl Into<anyhow::Error>) -> Self {
        EngineError::PriceQueryFailed {
            cause: cause.into(),
        }
    }
}
