//! Transaction builder store
//!
//! Ephemeral state for a transaction being assembled: selected inputs,
//! planned outputs and the derived flow view.

mod store;

pub use store::{
    estimate_tx_vsize, InputDetail, OutputPlan, TransactionFlow, TxBuilderStore,
};
