use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use futures::future::join_all;

use super::AddressDeriver;
use crate::chain::{ChainIndexer, TxDetail, UtxoRef};
use crate::config::BlockchainConfig;
use crate::error::WalletError;
use crate::models::{Keychain, Summary, Transaction, TxDirection, TxOut, Utxo};

/// Handle over a loaded descriptor pair, ready to sync.
#[derive(Debug, Clone)]
pub struct DescriptorWallet {
    pub external_descriptor: String,
    pub internal_descriptor: String,
    pub network: bitcoin::Network,
}

/// Normalized result of one sync pass.
#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    /// Used addresses discovered during the scan
    pub addresses: Vec<String>,
    pub transactions: Vec<Transaction>,
    pub utxos: Vec<Utxo>,
    pub summary: Summary,
}

/// Validate a descriptor pair and produce a wallet handle.
pub fn load_wallet_from_descriptor(
    external: &str,
    internal: &str,
    network: bitcoin::Network,
) -> Result<DescriptorWallet, WalletError> {
    // Deriving index 0 proves both descriptors carry a usable xpub.
    AddressDeriver::derive_address(external, 0, network)?;
    AddressDeriver::derive_address(internal, 0, network)?;

    Ok(DescriptorWallet {
        external_descriptor: external.to_string(),
        internal_descriptor: internal.to_string(),
        network,
    })
}

/// Synchronize a wallet against the configured backend.
///
/// Retries the whole scan up to `config.retries` times on backend failure
/// and bounds every pass with `config.timeout_secs`. No caller-visible
/// partial state: a failed pass leaves nothing behind.
pub async fn sync(
    wallet: &DescriptorWallet,
    config: &BlockchainConfig,
    indexer: &dyn ChainIndexer,
) -> Result<SyncSnapshot, WalletError> {
    let mut attempt = 0u8;
    loop {
        let pass = tokio::time::timeout(
            Duration::from_secs(config.timeout_secs),
            scan_once(wallet, config, indexer),
        )
        .await;

        match pass {
            Ok(Ok(snapshot)) => {
                log::info!(
                    "Sync complete: {} addresses, {} transactions, {} utxos, {} sats",
                    snapshot.summary.num_addresses,
                    snapshot.summary.num_transactions,
                    snapshot.summary.num_utxos,
                    snapshot.summary.balance
                );
                return Ok(snapshot);
            }
            Ok(Err(e)) if e.is_recoverable() && attempt < config.retries => {
                attempt += 1;
                log::warn!("Sync attempt {} failed: {} (retrying)", attempt, e);
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(WalletError::Indexer(format!(
                    "sync timed out after {}s",
                    config.timeout_secs
                )))
            }
        }
    }
}

async fn scan_once(
    wallet: &DescriptorWallet,
    config: &BlockchainConfig,
    indexer: &dyn ChainIndexer,
) -> Result<SyncSnapshot, WalletError> {
    let mut addresses: Vec<String> = Vec::new();
    let mut own: HashSet<String> = HashSet::new();
    let mut utxo_refs: Vec<(UtxoRef, String, Keychain)> = Vec::new();
    let mut tx_details: BTreeMap<String, TxDetail> = BTreeMap::new();
    let mut balance = 0u64;
    let mut in_mempool = 0u64;

    let keychains = [
        (Keychain::External, wallet.external_descriptor.as_str()),
        (Keychain::Internal, wallet.internal_descriptor.as_str()),
    ];

    for (keychain, descriptor) in keychains {
        let mut start = 0u32;
        loop {
            // One stop-gap-sized window at a time; scanning halts once a
            // whole window comes back unused.
            let batch: Vec<String> =
                AddressDeriver::derive_addresses(descriptor, start, config.stop_gap, wallet.network)?
                    .into_iter()
                    .map(|(_, address)| address.to_string())
                    .collect();

            let infos = join_all(batch.iter().map(|address| indexer.address_info(address))).await;

            let mut any_used = false;
            for (address, info) in batch.iter().zip(infos) {
                let info = info?;
                if !info.is_used() {
                    continue;
                }
                any_used = true;
                addresses.push(address.clone());
                own.insert(address.clone());
                balance += info.confirmed_balance();
                in_mempool += info.mempool_balance();

                for utxo in indexer.address_utxos(address).await? {
                    utxo_refs.push((utxo, address.clone(), keychain));
                }
                for tx in indexer.address_txs(address).await? {
                    tx_details.entry(tx.txid.clone()).or_insert(tx);
                }
            }

            if !any_used {
                break;
            }
            start += config.stop_gap;
        }
    }

    let utxos: Vec<Utxo> = utxo_refs
        .into_iter()
        .map(|(r, address, keychain)| Utxo {
            txid: r.txid,
            vout: r.vout,
            value: r.value,
            timestamp: timestamp(r.status.block_time),
            address_to: Some(address),
            keychain,
            label: None,
        })
        .collect();

    let mut transactions: Vec<Transaction> = tx_details
        .into_values()
        .map(|detail| tx_record(detail, &own))
        .collect();
    transactions.sort_by_key(|tx| tx.timestamp);

    let summary = Summary {
        balance,
        num_addresses: addresses.len(),
        num_transactions: transactions.len(),
        num_utxos: utxos.len(),
        sats_in_mempool: in_mempool,
    };

    Ok(SyncSnapshot {
        addresses,
        transactions,
        utxos,
        summary,
    })
}

/// Build a transaction record, deriving the direction from prevout
/// ownership: a transaction that spends any of our outputs is a send.
fn tx_record(detail: TxDetail, own: &HashSet<String>) -> Transaction {
    let is_own = |address: &Option<String>| {
        address
            .as_deref()
            .map(|a| own.contains(a))
            .unwrap_or(false)
    };

    let received: u64 = detail
        .vout
        .iter()
        .filter(|o| is_own(&o.scriptpubkey_address))
        .map(|o| o.value)
        .sum();
    let sent: u64 = detail
        .vin
        .iter()
        .filter_map(|i| i.prevout.as_ref())
        .filter(|p| is_own(&p.scriptpubkey_address))
        .map(|p| p.value)
        .sum();

    let direction = if sent > 0 {
        TxDirection::Send
    } else {
        TxDirection::Receive
    };

    Transaction {
        id: detail.txid,
        direction,
        sent,
        received,
        timestamp: timestamp(detail.status.block_time),
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

fn timestamp(block_time: Option<u64>) -> Option<chrono::DateTime<chrono::Utc>> {
    block_time.and_then(|t| chrono::DateTime::from_timestamp(t as i64, 0))
}
