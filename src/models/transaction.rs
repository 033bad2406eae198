use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxDirection {
    Send,
    Receive,
}

/// One output of a transaction, as displayed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    /// Value in satoshis
    pub value: u64,
    pub address: Option<String>,
}

/// An on-chain transaction relevant to an account.
///
/// Unique per account by `id`. Once fetched from the indexer a record is
/// cached on the account and never re-fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id (hex txid)
    pub id: String,
    pub direction: TxDirection,
    /// Satoshis leaving the account's addresses
    pub sent: u64,
    /// Satoshis arriving at the account's addresses
    pub received: u64,
    pub timestamp: Option<DateTime<Utc>>,
    /// Serialized size in bytes
    pub size: usize,
    pub vout: Vec<TxOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}
