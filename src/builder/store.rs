use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::accounts::AccountsStore;
use crate::error::WalletError;
use crate::models::{OutPoint, Transaction, Utxo};

/// A planned destination for the transaction under construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPlan {
    pub address: String,
    /// Value in satoshis
    pub value: u64,
}

/// A selected input together with its owning transaction, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDetail {
    pub utxo: Utxo,
    pub transaction: Transaction,
}

/// Aggregate view of the in-progress transaction, consumed by the flow
/// visualization.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFlow {
    pub inputs: Vec<Utxo>,
    pub outputs: Vec<OutputPlan>,
    /// Sum of the selected inputs' values, in satoshis
    pub total_value: u64,
    /// Estimated virtual size in vbytes, for fee-rate display
    pub vsize: u64,
}

/// Estimate a P2WPKH transaction's virtual size from its input and output
/// counts.
pub fn estimate_tx_vsize(num_inputs: usize, num_outputs: usize) -> u64 {
    let base_size = 10;
    let input_size = 68;
    let output_size = 34;

    (base_size + (num_inputs * input_size) + (num_outputs * output_size)) as u64
}

/// Tracks the transaction a user is assembling: UTXO selection, output
/// construction and the derived flow preview.
///
/// Entirely in-memory and per-session; cancelling or completing the flow
/// discards it via [`clear`](Self::clear). Inputs are keyed by outpoint,
/// so selection is a set with deterministic iteration order.
#[derive(Debug, Default)]
pub struct TxBuilderStore {
    inputs: BTreeMap<OutPoint, Utxo>,
    outputs: Vec<OutputPlan>,
}

impl TxBuilderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a UTXO as an input. Returns false if its outpoint was
    /// already selected (the selection is unchanged).
    pub fn add_input(&mut self, utxo: Utxo) -> bool {
        let outpoint = utxo.outpoint();
        if self.inputs.contains_key(&outpoint) {
            return false;
        }
        self.inputs.insert(outpoint, utxo);
        true
    }

    /// Deselect an input, returning it if it was selected.
    pub fn remove_input(&mut self, outpoint: &OutPoint) -> Option<Utxo> {
        self.inputs.remove(outpoint)
    }

    pub fn inputs(&self) -> Vec<Utxo> {
        self.inputs.values().cloned().collect()
    }

    pub fn contains_input(&self, outpoint: &OutPoint) -> bool {
        self.inputs.contains_key(outpoint)
    }

    /// Sum of the selected inputs' values, in satoshis.
    pub fn total_value(&self) -> u64 {
        self.inputs.values().map(|u| u.value).sum()
    }

    pub fn add_output(&mut self, address: impl Into<String>, value: u64) {
        self.outputs.push(OutputPlan {
            address: address.into(),
            value,
        });
    }

    pub fn outputs(&self) -> &[OutputPlan] {
        &self.outputs
    }

    /// Resolve each selected input's owning transaction through the
    /// accounts store (fetching uncached ones from the indexer).
    pub async fn input_details(
        &self,
        accounts: &AccountsStore,
        account_name: &str,
    ) -> Result<Vec<InputDetail>, WalletError> {
        let mut details = Vec::with_capacity(self.inputs.len());
        for utxo in self.inputs.values() {
            let transaction = accounts.transaction(account_name, &utxo.txid).await?;
            details.push(InputDetail {
                utxo: utxo.clone(),
                transaction,
            });
        }
        Ok(details)
    }

    /// The aggregate view consumed by the flow visualization.
    pub fn transaction_flow(&self) -> TransactionFlow {
        TransactionFlow {
            inputs: self.inputs(),
            outputs: self.outputs.clone(),
            total_value: self.total_value(),
            vsize: estimate_tx_vsize(self.inputs.len(), self.outputs.len()),
        }
    }

    /// Fee estimate at the given rate, in satoshis.
    pub fn fee(&self, rate_sat_vb: u64) -> u64 {
        estimate_tx_vsize(self.inputs.len(), self.outputs.len()) * rate_sat_vb
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }

    /// Discard the whole selection (flow completed or cancelled).
    pub fn clear(&mut self) {
        self.inputs.clear();
        self.outputs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Keychain;

    fn utxo(txid: &str, vout: u32, value: u64) -> Utxo {
        Utxo {
            txid: txid.to_string(),
            vout,
            value,
            timestamp: None,
            address_to: Some("tb1qdest".to_string()),
            keychain: Keychain::External,
            label: None,
        }
    }

    #[test]
    fn test_add_input_is_set_like() {
        let mut builder = TxBuilderStore::new();
        assert!(builder.add_input(utxo("aa", 0, 10_000)));
        assert!(!builder.add_input(utxo("aa", 0, 10_000)));
        assert!(builder.add_input(utxo("aa", 1, 5_000)));

        assert_eq!(builder.inputs().len(), 2);
        assert_eq!(builder.total_value(), 15_000);
    }

    #[test]
    fn test_remove_input() {
        let mut builder = TxBuilderStore::new();
        builder.add_input(utxo("aa", 0, 10_000));
        builder.add_input(utxo("bb", 0, 7_000));

        let removed = builder.remove_input(&OutPoint::new("aa", 0)).unwrap();
        assert_eq!(removed.value, 10_000);
        assert_eq!(builder.total_value(), 7_000);
        assert!(builder.remove_input(&OutPoint::new("aa", 0)).is_none());
    }

    #[test]
    fn test_transaction_flow_totals() {
        let mut builder = TxBuilderStore::new();
        builder.add_input(utxo("aa", 0, 60_000));
        builder.add_input(utxo("bb", 2, 40_000));
        builder.add_output("tb1qdest", 80_000);

        let flow = builder.transaction_flow();
        assert_eq!(flow.total_value, 100_000);
        assert_eq!(flow.inputs.len(), 2);
        assert_eq!(flow.outputs.len(), 1);
        assert_eq!(flow.vsize, estimate_tx_vsize(2, 1));
    }

    #[test]
    fn test_vsize_and_fee() {
        assert_eq!(estimate_tx_vsize(1, 1), 112);
        assert_eq!(estimate_tx_vsize(2, 2), 214);

        let mut builder = TxBuilderStore::new();
        builder.add_input(utxo("aa", 0, 60_000));
        builder.add_output("tb1qdest", 30_000);
        builder.add_output("tb1qchange", 29_000);
        assert_eq!(builder.fee(2), estimate_tx_vsize(1, 2) * 2);
    }

    #[test]
    fn test_clear_discards_everything() {
        let mut builder = TxBuilderStore::new();
        builder.add_input(utxo("aa", 0, 10_000));
        builder.add_output("tb1qdest", 5_000);
        assert!(!builder.is_empty());

        builder.clear();
        assert!(builder.is_empty());
        assert_eq!(builder.transaction_flow().total_value, 0);
    }
}
