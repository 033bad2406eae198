use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OutPoint, Transaction, Utxo};
use crate::sync::SyncSnapshot;

/// Script template the account's descriptors derive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptVersion {
    P2pkh,
    P2shP2wpkh,
    P2wpkh,
    P2tr,
}

/// Mnemonic length policy chosen at wallet setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedWordsCount {
    Words12,
    Words15,
    Words18,
    Words21,
    Words24,
}

impl SeedWordsCount {
    pub fn word_count(&self) -> usize {
        match self {
            SeedWordsCount::Words12 => 12,
            SeedWordsCount::Words15 => 15,
            SeedWordsCount::Words18 => 18,
            SeedWordsCount::Words21 => 21,
            SeedWordsCount::Words24 => 24,
        }
    }

    /// BIP-39 entropy bytes for this word count.
    pub fn entropy_bytes(&self) -> usize {
        // 11 bits per word, 1 checksum bit per 32 entropy bits
        self.word_count() * 11 * 32 / 33 / 8
    }
}

/// Aggregate balance figures refreshed on every sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Confirmed balance in satoshis
    pub balance: u64,
    pub num_addresses: usize,
    pub num_transactions: usize,
    pub num_utxos: usize,
    /// Unconfirmed satoshis currently in the mempool
    pub sats_in_mempool: u64,
}

/// One wallet account: descriptors plus the synced transaction/UTXO history.
///
/// Identified by `name`. Mutated in place on every sync or label edit and
/// persisted after each mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub external_descriptor: String,
    pub internal_descriptor: String,
    /// Addresses discovered during the last sync
    pub addresses: Vec<String>,
    pub transactions: Vec<Transaction>,
    pub utxos: Vec<Utxo>,
    pub summary: Summary,
    pub script_version: ScriptVersion,
    pub seed_words: SeedWordsCount,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        name: impl Into<String>,
        external_descriptor: impl Into<String>,
        internal_descriptor: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            external_descriptor: external_descriptor.into(),
            internal_descriptor: internal_descriptor.into(),
            addresses: Vec::new(),
            transactions: Vec::new(),
            utxos: Vec::new(),
            summary: Summary::default(),
            script_version: ScriptVersion::P2wpkh,
            seed_words: SeedWordsCount::Words12,
            created_at: Utc::now(),
        }
    }

    pub fn transaction(&self, txid: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == txid)
    }

    pub fn utxo(&self, outpoint: &OutPoint) -> Option<&Utxo> {
        self.utxos
            .iter()
            .find(|u| u.txid == outpoint.txid && u.vout == outpoint.vout)
    }

    pub fn utxo_mut(&mut self, outpoint: &OutPoint) -> Option<&mut Utxo> {
        self.utxos
            .iter_mut()
            .find(|u| u.txid == outpoint.txid && u.vout == outpoint.vout)
    }

    /// Merge a sync snapshot into a copy of this account.
    ///
    /// Returns a new value rather than mutating in place; labels already
    /// attached to known UTXOs and transactions survive the refresh.
    pub fn with_snapshot(&self, snapshot: SyncSnapshot) -> Self {
        let mut next = self.clone();

        let mut utxos = snapshot.utxos;
        for utxo in &mut utxos {
            if utxo.label.is_none() {
                utxo.label = self
                    .utxo(&utxo.outpoint())
                    .and_then(|known| known.label.clone());
            }
        }

        let mut transactions = snapshot.transactions;
        for tx in &mut transactions {
            if tx.label.is_none() {
                tx.label = self.transaction(&tx.id).and_then(|known| known.label.clone());
            }
        }

        next.addresses = snapshot.addresses;
        next.transactions = transactions;
        next.utxos = utxos;
        next.summary = snapshot.summary;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Keychain, TxDirection};

    fn utxo(txid: &str, vout: u32, value: u64) -> Utxo {
        Utxo {
            txid: txid.to_string(),
            vout,
            value,
            timestamp: None,
            address_to: None,
            keychain: Keychain::External,
            label: None,
        }
    }

    #[test]
    fn test_seed_words_entropy() {
        assert_eq!(SeedWordsCount::Words12.entropy_bytes(), 16);
        assert_eq!(SeedWordsCount::Words24.entropy_bytes(), 32);
    }

    #[test]
    fn test_with_snapshot_preserves_labels() {
        let mut account = Account::new("w", "ext", "int");
        let mut labelled = utxo("aa", 0, 1_000);
        labelled.label = Some("coffee".to_string());
        account.utxos.push(labelled);

        let snapshot = SyncSnapshot {
            addresses: vec!["addr".to_string()],
            transactions: vec![Transaction {
                id: "aa".to_string(),
                direction: TxDirection::Receive,
                sent: 0,
                received: 1_000,
                timestamp: None,
                size: 110,
                vout: vec![],
                label: None,
            }],
            utxos: vec![utxo("aa", 0, 1_000), utxo("bb", 1, 2_000)],
            summary: Summary {
                balance: 3_000,
                num_addresses: 1,
                num_transactions: 1,
                num_utxos: 2,
                sats_in_mempool: 0,
            },
        };

        let next = account.with_snapshot(snapshot);
        assert_eq!(next.utxos.len(), 2);
        assert_eq!(next.utxos[0].label.as_deref(), Some("coffee"));
        assert_eq!(next.utxos[1].label, None);
        assert_eq!(next.summary.balance, 3_000);
        // the original is untouched
        assert_eq!(account.utxos.len(), 1);
    }
}
