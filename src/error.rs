use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Utxo not found: {0}")]
    UtxoNotFound(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Bitcoin error: {0}")]
    Bitcoin(String),

    #[error("Indexer error: {0}")]
    Indexer(String),

    #[error("Malformed labels: {0}")]
    MalformedLabels(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    /// Whether the failure is transient and the operation can be retried
    /// or surfaced to the user as recoverable.
    ///
    /// Indexer/backend unavailability and bad label files are recoverable;
    /// lookup misses are an internal fallback path and everything else is
    /// a programming or environment error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WalletError::Indexer(_) | WalletError::MalformedLabels(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Key not found: {0}")]
    KeyNotFound(String),
}
