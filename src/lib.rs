//! Bitcoin wallet account/transaction state core
//!
//! The pieces a wallet UI sits on top of:
//!
//! - `accounts` - durable accounts store (transactions, UTXOs, labels)
//! - `builder` - ephemeral transaction-builder selection state
//! - `sync` - descriptor wallet sync bridge
//! - `chain` - Esplora-style chain-indexer client
//! - `storage` - key-value persistence
//!
//! Screens receive read-only snapshots and call store operations; they
//! never hold live mutable references into the state.

pub mod accounts;
pub mod builder;
pub mod chain;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod sync;

pub use accounts::AccountsStore;
pub use builder::TxBuilderStore;
pub use config::BlockchainConfig;
pub use error::{StorageError, WalletError};
