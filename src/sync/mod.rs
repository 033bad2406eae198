//! Wallet sync bridge
//!
//! Adapts between the account shape and the chain indexer:
//! descriptors -> derived addresses -> transaction/UTXO/summary snapshot.

mod addresses;
mod bridge;
mod keys;

pub use addresses::AddressDeriver;
pub use bridge::{load_wallet_from_descriptor, sync, DescriptorWallet, SyncSnapshot};
pub use keys::{descriptors_from_mnemonic, generate_mnemonic, WalletDescriptors};
