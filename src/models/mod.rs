//! Wallet domain models
//!
//! - Accounts with their transaction/UTXO history
//! - Transaction records
//! - UTXOs and outpoint keys

mod account;
mod transaction;
mod utxo;

pub use account::{Account, ScriptVersion, SeedWordsCount, Summary};
pub use transaction::{Transaction, TxDirection, TxOut};
pub use utxo::{Keychain, OutPoint, Utxo};
