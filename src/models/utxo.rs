use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// Which descriptor chain an address/UTXO belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keychain {
    External,
    Internal,
}

/// Composite `(txid, vout)` key identifying a UTXO.
///
/// Displays (and parses) as `txid:vout`, the same shape BIP-329 label
/// records use for output references.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: String,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: impl Into<String>, vout: u32) -> Self {
        Self {
            txid: txid.into(),
            vout,
        }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

impl FromStr for OutPoint {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (txid, vout) = s
            .rsplit_once(':')
            .ok_or_else(|| WalletError::Internal(format!("invalid outpoint '{}'", s)))?;
        let vout = vout
            .parse()
            .map_err(|_| WalletError::Internal(format!("invalid outpoint '{}'", s)))?;
        if txid.is_empty() {
            return Err(WalletError::Internal(format!("invalid outpoint '{}'", s)));
        }
        Ok(Self::new(txid, vout))
    }
}

/// An unspent transaction output belonging to an account.
///
/// Unique per account by its `(txid, vout)` outpoint. The label is
/// user-editable metadata with no further validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    /// Value in satoshis
    pub value: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub address_to: Option<String>,
    pub keychain: Keychain,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid.clone(), self.vout)
    }
}
