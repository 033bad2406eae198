use std::sync::Arc;

use tokio::sync::Mutex;

use super::labels::{self, LabelKind};
use crate::chain::{ChainIndexer, TxDetail};
use crate::config::BlockchainConfig;
use crate::error::{StorageError, WalletError};
use crate::models::{Account, Keychain, OutPoint, Transaction, TxDirection, TxOut, Utxo};
use crate::storage::{keys, AccountsSnapshot, KvStore};
use crate::sync::{self, DescriptorWallet};

/// Single source of truth for wallet accounts, their transaction/UTXO
/// history and the shared label tags.
///
/// All state lives behind one async mutex, so every read-modify-write
/// sequence (including cache-or-fetch) is atomic with respect to other
/// operations on the store: two interleaved lookups for the same missing
/// key append exactly once. Every mutation is persisted to the key-value
/// store before the lock is released.
///
/// Cloning the handle shares the same state.
#[derive(Clone)]
pub struct AccountsStore {
    state: Arc<Mutex<AccountsSnapshot>>,
    store: Arc<dyn KvStore>,
    indexer: Arc<dyn ChainIndexer>,
    config: BlockchainConfig,
}

impl AccountsStore {
    /// Open the store, restoring the persisted snapshot if one exists.
    pub fn open(
        store: Arc<dyn KvStore>,
        indexer: Arc<dyn ChainIndexer>,
        config: BlockchainConfig,
    ) -> Result<Self, WalletError> {
        let snapshot = match store.get(keys::ACCOUNTS)? {
            Some(bytes) => {
                let snapshot: AccountsSnapshot =
                    serde_json::from_slice(&bytes).map_err(StorageError::from)?;
                log::info!(
                    "Restored {} account(s), {} tag(s)",
                    snapshot.accounts.len(),
                    snapshot.tags.len()
                );
                snapshot
            }
            None => AccountsSnapshot::default(),
        };

        Ok(Self {
            state: Arc::new(Mutex::new(snapshot)),
            store,
            indexer,
            config,
        })
    }

    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }

    fn persist(&self, snapshot: &AccountsSnapshot) -> Result<(), WalletError> {
        let bytes = serde_json::to_vec(snapshot).map_err(StorageError::from)?;
        self.store.set(keys::ACCOUNTS, &bytes)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Account collection
    // ------------------------------------------------------------------

    /// Read-only copy of an account, if present.
    pub async fn account(&self, name: &str) -> Option<Account> {
        let snapshot = self.state.lock().await;
        snapshot.accounts.iter().find(|a| a.name == name).cloned()
    }

    pub async fn account_names(&self) -> Vec<String> {
        let snapshot = self.state.lock().await;
        snapshot.accounts.iter().map(|a| a.name.clone()).collect()
    }

    pub async fn has_account_with_name(&self, name: &str) -> bool {
        let snapshot = self.state.lock().await;
        snapshot.accounts.iter().any(|a| a.name == name)
    }

    /// Append an account. Duplicate names are rejected so the collection
    /// keeps `name` as its identity key.
    pub async fn add_account(&self, account: Account) -> Result<(), WalletError> {
        let mut snapshot = self.state.lock().await;
        if snapshot.accounts.iter().any(|a| a.name == account.name) {
            return Err(WalletError::AccountExists(account.name));
        }
        log::info!("Adding account '{}'", account.name);
        snapshot.accounts.push(account);
        self.persist(&snapshot)
    }

    /// Replace the account with a matching name. No-op if absent.
    pub async fn update_account(&self, account: Account) -> Result<(), WalletError> {
        let mut snapshot = self.state.lock().await;
        match snapshot.accounts.iter_mut().find(|a| a.name == account.name) {
            Some(existing) => {
                *existing = account;
                self.persist(&snapshot)
            }
            None => {
                log::debug!("update_account: no account named '{}'", account.name);
                Ok(())
            }
        }
    }

    /// Clear every account and all tags.
    pub async fn delete_accounts(&self) -> Result<(), WalletError> {
        let mut snapshot = self.state.lock().await;
        log::warn!("Deleting all {} account(s)", snapshot.accounts.len());
        snapshot.accounts.clear();
        snapshot.tags.clear();
        self.persist(&snapshot)
    }

    // ------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------

    pub async fn tags(&self) -> Vec<String> {
        let snapshot = self.state.lock().await;
        snapshot.tags.clone()
    }

    pub async fn add_tag(&self, tag: impl Into<String>) -> Result<(), WalletError> {
        let tag = tag.into();
        let mut snapshot = self.state.lock().await;
        if snapshot.tags.contains(&tag) {
            return Ok(());
        }
        snapshot.tags.push(tag);
        self.persist(&snapshot)
    }

    // ------------------------------------------------------------------
    // Transactions (two-phase: lookup, then explicit fetch-and-store)
    // ------------------------------------------------------------------

    /// Pure cache read; never touches the indexer.
    pub async fn lookup_transaction(
        &self,
        account_name: &str,
        txid: &str,
    ) -> Result<Option<Transaction>, WalletError> {
        let snapshot = self.state.lock().await;
        let account = find_account(&snapshot, account_name)?;
        Ok(account.transaction(txid).cloned())
    }

    /// Fetch from the indexer and cache on the account. Appends at most
    /// once even if the record arrived concurrently.
    pub async fn fetch_and_store_transaction(
        &self,
        account_name: &str,
        txid: &str,
    ) -> Result<Transaction, WalletError> {
        let mut snapshot = self.state.lock().await;
        find_account(&snapshot, account_name)?;
        self.fetch_transaction_locked(&mut snapshot, account_name, txid)
            .await
    }

    /// Cached transaction, fetching and caching on a miss.
    pub async fn transaction(
        &self,
        account_name: &str,
        txid: &str,
    ) -> Result<Transaction, WalletError> {
        let mut snapshot = self.state.lock().await;
        let account = find_account(&snapshot, account_name)?;
        if let Some(tx) = account.transaction(txid) {
            return Ok(tx.clone());
        }
        self.fetch_transaction_locked(&mut snapshot, account_name, txid)
            .await
    }

    /// Fetch + append + persist, all under the state lock. Holding the
    /// lock across the fetch is what serializes concurrent misses for the
    /// same key down to a single append.
    async fn fetch_transaction_locked(
        &self,
        snapshot: &mut AccountsSnapshot,
        account_name: &str,
        txid: &str,
    ) -> Result<Transaction, WalletError> {
        log::debug!("Fetching transaction {} for '{}'", txid, account_name);
        let detail = self.indexer.transaction(txid).await?;

        let account = find_account_mut(snapshot, account_name)?;
        if let Some(existing) = account.transaction(txid) {
            return Ok(existing.clone());
        }

        let record = receive_record(detail);
        account.transactions.push(record.clone());
        self.persist(snapshot)?;
        Ok(record)
    }

    // ------------------------------------------------------------------
    // UTXOs
    // ------------------------------------------------------------------

    pub async fn lookup_utxo(
        &self,
        account_name: &str,
        txid: &str,
        vout: u32,
    ) -> Result<Option<Utxo>, WalletError> {
        let snapshot = self.state.lock().await;
        let account = find_account(&snapshot, account_name)?;
        Ok(account.utxo(&OutPoint::new(txid, vout)).cloned())
    }

    /// Cached UTXO by `(txid, vout)`, deriving and caching it from the
    /// owning transaction on a miss.
    pub async fn utxo(
        &self,
        account_name: &str,
        txid: &str,
        vout: u32,
    ) -> Result<Utxo, WalletError> {
        let mut snapshot = self.state.lock().await;
        let account = find_account(&snapshot, account_name)?;
        if let Some(utxo) = account.utxo(&OutPoint::new(txid, vout)) {
            return Ok(utxo.clone());
        }
        self.fetch_utxo_locked(&mut snapshot, account_name, txid, vout)
            .await
    }

    pub async fn fetch_and_store_utxo(
        &self,
        account_name: &str,
        txid: &str,
        vout: u32,
    ) -> Result<Utxo, WalletError> {
        let mut snapshot = self.state.lock().await;
        find_account(&snapshot, account_name)?;
        self.fetch_utxo_locked(&mut snapshot, account_name, txid, vout)
            .await
    }

    async fn fetch_utxo_locked(
        &self,
        snapshot: &mut AccountsSnapshot,
        account_name: &str,
        txid: &str,
        vout: u32,
    ) -> Result<Utxo, WalletError> {
        // Resolve the owning transaction first; its output list carries
        // the value and address.
        let cached = find_account(snapshot, account_name)?.transaction(txid).cloned();
        let tx = match cached {
            Some(tx) => tx,
            None => {
                self.fetch_transaction_locked(snapshot, account_name, txid)
                    .await?
            }
        };

        let outpoint = OutPoint::new(txid, vout);
        let output = tx.vout.get(vout as usize).ok_or_else(|| {
            WalletError::UtxoNotFound(format!("{} has no output {}", txid, vout))
        })?;

        let account = find_account_mut(snapshot, account_name)?;
        if let Some(existing) = account.utxo(&outpoint) {
            return Ok(existing.clone());
        }

        let utxo = Utxo {
            txid: txid.to_string(),
            vout,
            value: output.value,
            timestamp: tx.timestamp,
            address_to: output.address.clone(),
            // The owning keychain is unknown on this path; synced entries
            // carry the real one.
            keychain: Keychain::External,
            label: None,
        };
        account.utxos.push(utxo.clone());
        self.persist(snapshot)?;
        Ok(utxo)
    }

    /// Set the user label on a UTXO, resolving it first if needed.
    pub async fn set_utxo_label(
        &self,
        account_name: &str,
        txid: &str,
        vout: u32,
        label: impl Into<String>,
    ) -> Result<(), WalletError> {
        let mut snapshot = self.state.lock().await;
        let outpoint = OutPoint::new(txid, vout);

        if find_account(&snapshot, account_name)?.utxo(&outpoint).is_none() {
            self.fetch_utxo_locked(&mut snapshot, account_name, txid, vout)
                .await?;
        }

        let account = find_account_mut(&mut snapshot, account_name)?;
        let utxo = account
            .utxo_mut(&outpoint)
            .ok_or_else(|| WalletError::UtxoNotFound(outpoint.to_string()))?;
        utxo.label = Some(label.into());
        self.persist(&snapshot)
    }

    // ------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------

    /// Merge a BIP-329-style label import (JSON array, JSON-lines or CSV)
    /// into an account. Returns how many labels were applied; records that
    /// reference nothing the account knows about are skipped.
    pub async fn import_labels(
        &self,
        account_name: &str,
        input: &str,
    ) -> Result<usize, WalletError> {
        let records = labels::parse_labels(input)?;

        let mut snapshot = self.state.lock().await;
        let account = find_account_mut(&mut snapshot, account_name)?;

        let mut applied = 0;
        for record in records {
            match record.kind {
                LabelKind::Output => {
                    let Ok(outpoint) = record.reference.parse::<OutPoint>() else {
                        log::warn!("Skipping label with bad outpoint '{}'", record.reference);
                        continue;
                    };
                    if let Some(utxo) = account.utxo_mut(&outpoint) {
                        utxo.label = Some(record.label);
                        applied += 1;
                    }
                }
                LabelKind::Tx => {
                    if let Some(tx) = account
                        .transactions
                        .iter_mut()
                        .find(|tx| tx.id == record.reference)
                    {
                        tx.label = Some(record.label);
                        applied += 1;
                    }
                }
                other => {
                    log::debug!("Ignoring unsupported label type {:?}", other);
                }
            }
        }

        if applied > 0 {
            self.persist(&snapshot)?;
        }
        log::info!("Applied {} label(s) to '{}'", applied, account_name);
        Ok(applied)
    }

    /// Export an account's labels as a BIP-329 JSON array.
    pub async fn export_labels(&self, account_name: &str) -> Result<String, WalletError> {
        let snapshot = self.state.lock().await;
        let account = find_account(&snapshot, account_name)?;
        labels::export_labels(account)
    }

    // ------------------------------------------------------------------
    // Wallet loading & sync
    // ------------------------------------------------------------------

    /// Load a wallet handle from a descriptor pair on the configured
    /// network.
    pub fn load_wallet_from_descriptor(
        &self,
        external: &str,
        internal: &str,
    ) -> Result<DescriptorWallet, WalletError> {
        sync::load_wallet_from_descriptor(external, internal, self.config.network)
    }

    /// Synchronize an account against the configured backend and merge
    /// the snapshot into a new account value, which replaces the stored
    /// one. Returns the refreshed account.
    ///
    /// The scan itself runs without the state lock; only the merge takes
    /// it.
    pub async fn sync_wallet(&self, account_name: &str) -> Result<Account, WalletError> {
        let wallet = {
            let snapshot = self.state.lock().await;
            let account = find_account(&snapshot, account_name)?;
            sync::load_wallet_from_descriptor(
                &account.external_descriptor,
                &account.internal_descriptor,
                self.config.network,
            )?
        };

        let result = sync::sync(&wallet, &self.config, self.indexer.as_ref()).await?;

        let mut snapshot = self.state.lock().await;
        let account = find_account_mut(&mut snapshot, account_name)?;
        let refreshed = account.with_snapshot(result);
        *account = refreshed.clone();
        self.persist(&snapshot)?;
        Ok(refreshed)
    }
}

fn find_account<'a>(
    snapshot: &'a AccountsSnapshot,
    name: &str,
) -> Result<&'a Account, WalletError> {
    snapshot
        .accounts
        .iter()
        .find(|a| a.name == name)
        .ok_or_else(|| WalletError::AccountNotFound(name.to_string()))
}

fn find_account_mut<'a>(
    snapshot: &'a mut AccountsSnapshot,
    name: &str,
) -> Result<&'a mut Account, WalletError> {
    snapshot
        .accounts
        .iter_mut()
        .find(|a| a.name == name)
        .ok_or_else(|| WalletError::AccountNotFound(name.to_string()))
}

/// Normalize an indexer transaction into a cached record.
///
/// TODO: derive the direction from prevout ownership the way the sync
/// path does. This path has always recorded fetched transactions as
/// receives and the history views expect that.
fn receive_record(detail: TxDetail) -> Transaction {
    Transaction {
        id: detail.txid,
        direction: TxDirection::Receive,
        sent: 0,
        received: detail.vout.iter().map(|o| o.value).sum(),
        timestamp: detail
            .status
            .block_time
            .and_then(|t| chrono::DateTime::from_timestamp(t as i64, 0)),
        size: detail.size,
        vout: detail
            .vout
            .into_iter()
            .map(|o| TxOut {
                value: o.value,
                address: o.scriptpubkey_address,
            })
            .collect(),
        label: None,
    }
}
