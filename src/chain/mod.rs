//! Remote chain-indexer access
//!
//! - Esplora API response types
//! - HTTP client
//! - `ChainIndexer` capability trait (sync and the accounts store are
//!   written against the trait so tests can substitute a canned indexer)

mod esplora;
mod types;

pub use esplora::EsploraClient;
pub use types::{AddressInfo, AddressStats, TxDetail, TxInput, TxOutput, TxStatus, UtxoRef};

use async_trait::async_trait;

use crate::error::WalletError;

/// Capability surface of the remote chain indexer.
#[async_trait]
pub trait ChainIndexer: Send + Sync {
    async fn transaction(&self, txid: &str) -> Result<TxDetail, WalletError>;
    async fn address_info(&self, address: &str) -> Result<AddressInfo, WalletError>;
    async fn address_utxos(&self, address: &str) -> Result<Vec<UtxoRef>, WalletError>;
    async fn address_txs(&self, address: &str) -> Result<Vec<TxDetail>, WalletError>;
    async fn tip_height(&self) -> Result<u64, WalletError>;
    /// Broadcast a raw transaction (hex) and return its txid.
    async fn broadcast(&self, tx_hex: &str) -> Result<String, WalletError>;
}
