//! Persisted snapshot models

use serde::{Deserialize, Serialize};

use crate::models::Account;

/// The durable shape of the accounts store: every account plus the flat
/// set of label tags shared across accounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountsSnapshot {
    pub accounts: Vec<Account>,
    pub tags: Vec<String>,
}
