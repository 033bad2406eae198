/// Esplora API response types
///
/// These match the Esplora JSON format so any compatible backend
/// (mempool.space, a local electrs) can serve them.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxStatus {
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_time: Option<u64>,
}

/// UTXO reference from `/address/{address}/utxo`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoRef {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    #[serde(default)]
    pub status: TxStatus,
}

/// Transaction from `/tx/{txid}` and `/address/{address}/txs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxDetail {
    pub txid: String,
    pub size: usize,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub status: TxStatus,
    #[serde(default)]
    pub vin: Vec<TxInput>,
    pub vout: Vec<TxOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInput {
    pub txid: String,
    pub vout: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prevout: Option<TxOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scriptpubkey_address: Option<String>,
}

/// Address summary from `/address/{address}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressInfo {
    pub address: String,
    #[serde(default)]
    pub chain_stats: AddressStats,
    #[serde(default)]
    pub mempool_stats: AddressStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressStats {
    pub funded_txo_sum: u64,
    pub spent_txo_sum: u64,
    pub tx_count: u64,
}

impl AddressInfo {
    /// Whether the address has ever appeared on chain or in the mempool.
    pub fn is_used(&self) -> bool {
        self.chain_stats.tx_count > 0 || self.mempool_stats.tx_count > 0
    }

    pub fn confirmed_balance(&self) -> u64 {
        self.chain_stats
            .funded_txo_sum
            .saturating_sub(self.chain_stats.spent_txo_sum)
    }

    pub fn mempool_balance(&self) -> u64 {
        self.mempool_stats
            .funded_txo_sum
            .saturating_sub(self.mempool_stats.spent_txo_sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_detail_parses_esplora_json() {
        let raw = r#"{
            "txid": "abc",
            "size": 222,
            "fee": 141,
            "status": {"confirmed": true, "block_height": 10, "block_time": 1700000000},
            "vin": [{"txid": "dd", "vout": 1, "prevout": {"value": 5000, "scriptpubkey_address": "tb1qaaa"}}],
            "vout": [{"value": 4859, "scriptpubkey_address": "tb1qbbb"}]
        }"#;

        let tx: TxDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(tx.txid, "abc");
        assert_eq!(tx.vout[0].value, 4_859);
        assert_eq!(
            tx.vin[0].prevout.as_ref().unwrap().scriptpubkey_address.as_deref(),
            Some("tb1qaaa")
        );
        assert_eq!(tx.status.block_time, Some(1_700_000_000));
    }

    #[test]
    fn test_address_info_used_and_balance() {
        let info = AddressInfo {
            address: "tb1qaaa".to_string(),
            chain_stats: AddressStats {
                funded_txo_sum: 10_000,
                spent_txo_sum: 4_000,
                tx_count: 2,
            },
            mempool_stats: AddressStats::default(),
        };
        assert!(info.is_used());
        assert_eq!(info.confirmed_balance(), 6_000);
        assert_eq!(info.mempool_balance(), 0);

        let unused = AddressInfo::default();
        assert!(!unused.is_used());
    }
}
