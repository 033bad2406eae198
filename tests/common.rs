//! Common test utilities for the store integration tests
//!
//! - Temp-directory backed store setup with automatic cleanup
//! - A canned in-memory chain indexer with call counters
//! - Account/transaction fixtures

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use satstore::chain::{AddressInfo, AddressStats, ChainIndexer, TxDetail, TxOutput, TxStatus, UtxoRef};
use satstore::config::BlockchainConfig;
use satstore::error::WalletError;
use satstore::models::{Account, Keychain, Utxo};
use satstore::storage::FileStore;
use satstore::AccountsStore;

pub fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

/// Chain indexer serving canned data, instrumented for the tests.
#[derive(Default)]
pub struct MockIndexer {
    pub transactions: Mutex<HashMap<String, TxDetail>>,
    pub utxos_by_address: Mutex<HashMap<String, Vec<UtxoRef>>>,
    pub txs_by_address: Mutex<HashMap<String, Vec<TxDetail>>>,
    /// How many times `transaction` was hit
    pub tx_fetches: AtomicUsize,
    /// Fail this many requests before succeeding (for retry tests)
    pub failures_remaining: AtomicUsize,
    /// Artificial per-request latency in milliseconds
    pub delay_ms: AtomicUsize,
}

impl MockIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_transaction(&self, tx: TxDetail) {
        self.transactions
            .lock()
            .unwrap()
            .insert(tx.txid.clone(), tx);
    }

    pub fn put_address(&self, address: &str, utxos: Vec<UtxoRef>, txs: Vec<TxDetail>) {
        self.utxos_by_address
            .lock()
            .unwrap()
            .insert(address.to_string(), utxos);
        self.txs_by_address
            .lock()
            .unwrap()
            .insert(address.to_string(), txs);
    }

    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    async fn simulate_conditions(&self) -> Result<(), WalletError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        let mut remaining = self.failures_remaining.load(Ordering::SeqCst);
        while remaining > 0 {
            match self.failures_remaining.compare_exchange(
                remaining,
                remaining - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Err(WalletError::Indexer("backend unavailable".to_string())),
                Err(actual) => remaining = actual,
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChainIndexer for MockIndexer {
    async fn transaction(&self, txid: &str) -> Result<TxDetail, WalletError> {
        self.simulate_conditions().await?;
        self.tx_fetches.fetch_add(1, Ordering::SeqCst);
        self.transactions
            .lock()
            .unwrap()
            .get(txid)
            .cloned()
            .ok_or_else(|| WalletError::Indexer(format!("unknown txid {}", txid)))
    }

    async fn address_info(&self, address: &str) -> Result<AddressInfo, WalletError> {
        self.simulate_conditions().await?;
        let utxos = self
            .utxos_by_address
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default();
        let tx_count = self
            .txs_by_address
            .lock()
            .unwrap()
            .get(address)
            .map(|txs| txs.len() as u64)
            .unwrap_or(0);

        let confirmed: u64 = utxos
            .iter()
            .filter(|u| u.status.confirmed)
            .map(|u| u.value)
            .sum();
        let unconfirmed: u64 = utxos
            .iter()
            .filter(|u| !u.status.confirmed)
            .map(|u| u.value)
            .sum();

        Ok(AddressInfo {
            address: address.to_string(),
            chain_stats: AddressStats {
                funded_txo_sum: confirmed,
                spent_txo_sum: 0,
                tx_count,
            },
            mempool_stats: AddressStats {
                funded_txo_sum: unconfirmed,
                spent_txo_sum: 0,
                tx_count: 0,
            },
        })
    }

    async fn address_utxos(&self, address: &str) -> Result<Vec<UtxoRef>, WalletError> {
        self.simulate_conditions().await?;
        Ok(self
            .utxos_by_address
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn address_txs(&self, address: &str) -> Result<Vec<TxDetail>, WalletError> {
        self.simulate_conditions().await?;
        Ok(self
            .txs_by_address
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn tip_height(&self) -> Result<u64, WalletError> {
        self.simulate_conditions().await?;
        Ok(1_000)
    }

    async fn broadcast(&self, _tx_hex: &str) -> Result<String, WalletError> {
        self.simulate_conditions().await?;
        Ok("broadcast-txid".to_string())
    }
}

/// Test environment: temp-dir file store + mock indexer + accounts store.
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub file_store: FileStore,
    pub indexer: Arc<MockIndexer>,
    pub accounts: AccountsStore,
    pub config: BlockchainConfig,
}

impl TestEnvironment {
    pub fn new() -> anyhow::Result<Self> {
        init_logging();

        let temp_dir = TempDir::new()?;
        let file_store = FileStore::new_with_base_dir(temp_dir.path().to_path_buf());
        let indexer = Arc::new(MockIndexer::new());

        let config = BlockchainConfig {
            stop_gap: 3,
            retries: 2,
            timeout_secs: 10,
            ..Default::default()
        };

        let accounts = AccountsStore::open(
            Arc::new(file_store.clone()),
            indexer.clone() as Arc<dyn ChainIndexer>,
            config.clone(),
        )?;

        Ok(Self {
            temp_dir,
            file_store,
            indexer,
            accounts,
            config,
        })
    }

    /// Reopen the accounts store against the same backing files, as a
    /// fresh process would.
    pub fn reopen(&self) -> anyhow::Result<AccountsStore> {
        Ok(AccountsStore::open(
            Arc::new(self.file_store.clone()),
            self.indexer.clone() as Arc<dyn ChainIndexer>,
            self.config.clone(),
        )?)
    }
}

pub fn confirmed_status(block_time: u64) -> TxStatus {
    TxStatus {
        confirmed: true,
        block_height: Some(100),
        block_time: Some(block_time),
    }
}

pub fn tx_detail(txid: &str, outputs: &[(u64, &str)]) -> TxDetail {
    TxDetail {
        txid: txid.to_string(),
        size: 140 + 34 * outputs.len(),
        fee: 141,
        status: confirmed_status(1_700_000_000),
        vin: Vec::new(),
        vout: outputs
            .iter()
            .map(|(value, address)| TxOutput {
                value: *value,
                scriptpubkey_address: Some(address.to_string()),
            })
            .collect(),
    }
}

pub fn utxo_ref(txid: &str, vout: u32, value: u64) -> UtxoRef {
    UtxoRef {
        txid: txid.to_string(),
        vout,
        value,
        status: confirmed_status(1_700_000_000),
    }
}

pub fn test_utxo(txid: &str, vout: u32, value: u64) -> Utxo {
    Utxo {
        txid: txid.to_string(),
        vout,
        value,
        timestamp: None,
        address_to: Some("tb1qowned".to_string()),
        keychain: Keychain::External,
        label: None,
    }
}

pub fn test_account(name: &str) -> Account {
    Account::new(name, "wpkh(ext/0/*)", "wpkh(int/1/*)")
}
