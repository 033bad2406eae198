//! Accounts store
//!
//! - Single source of truth for wallet accounts and their history
//! - BIP-329-style label import/export

mod labels;
mod store;

pub use labels::{parse_labels, LabelKind, LabelRecord};
pub use store::AccountsStore;
