use std::str::FromStr;

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::error::EngineError;
use crate::types::RawBalanceEntry;

/// Which ledger family an address string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFamily {
    Evm,
    AccountModel,
    Unrecognized,
}

/// Classify an address by its lexical shape. Pure; performs no I/O.
///
/// EVM addresses must carry the `0x` prefix and parse as a valid 20-byte
/// hex address (format validation delegated to alloy). Account-model
/// addresses are recognized by their `T` prefix. Anything else is
/// `Unrecognized`, which is a terminal classification rather than an error.
pub fn classify(address: &str) -> ChainFamily {
    if address.starts_with("0x") && Address::from_str(address).is_ok() {
        ChainFamily::Evm
    } else if address.starts_with('T') {
        ChainFamily::AccountModel
    } else {
        ChainFamily::Unrecognized
    }
}

/// Seam between the pipeline and a chain's data source: given an address,
/// produce the raw balance entries discovered for it.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn fetch_holdings(&self, address: &str) -> Result<Vec<RawBalanceEntry>, EngineError>;
}
