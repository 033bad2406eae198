/// Blockchain backend configuration
///
/// Controls the Bitcoin network, the Esplora-style backend endpoint and the
/// sync policy (retries, timeout, stop-gap). Defaults to Signet.
use std::env;
use std::path::Path;

use serde::Deserialize;

use crate::error::WalletError;

/// Number of consecutive unused addresses scanned before address discovery
/// halts during a sync.
pub const DEFAULT_STOP_GAP: u32 = 20;

pub const DEFAULT_RETRIES: u8 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct BlockchainConfig {
    /// Bitcoin network type
    pub network: bitcoin::Network,
    /// Esplora API base URL
    pub backend_url: String,
    /// Full-scan retry attempts on backend failure
    pub retries: u8,
    /// Upper bound on one sync pass, in seconds
    pub timeout_secs: u64,
    /// Address-discovery gap limit
    pub stop_gap: u32,
}

impl BlockchainConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `BITCOIN_NETWORK`: "bitcoin", "testnet", "signet" (default) or "regtest"
    /// - `BACKEND_URL`: Esplora API endpoint (optional, network-dependent default)
    /// - `SYNC_RETRIES`, `SYNC_TIMEOUT_SECS`, `STOP_GAP`: sync policy overrides
    pub fn from_env() -> Self {
        let network_str = env::var("BITCOIN_NETWORK")
            .unwrap_or_else(|_| "signet".to_string())
            .to_lowercase();

        let network = match parse_network(&network_str) {
            Some(network) => network,
            None => {
                log::warn!("Unknown network '{}', defaulting to Signet", network_str);
                bitcoin::Network::Signet
            }
        };

        let backend_url =
            env::var("BACKEND_URL").unwrap_or_else(|_| default_backend_url(network).to_string());

        let retries = env::var("SYNC_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RETRIES);
        let timeout_secs = env::var("SYNC_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let stop_gap = env::var("STOP_GAP")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_STOP_GAP);

        log::info!(
            "Blockchain config: network={}, backend={}, stop_gap={}",
            network,
            backend_url,
            stop_gap
        );

        Self {
            network,
            backend_url,
            retries,
            timeout_secs,
            stop_gap,
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| WalletError::Config(e.to_string()))?;
        let raw: RawConfig =
            toml::from_str(&contents).map_err(|e| WalletError::Config(e.to_string()))?;

        let network = match raw.network {
            Some(ref s) => parse_network(s)
                .ok_or_else(|| WalletError::Config(format!("unknown network '{}'", s)))?,
            None => bitcoin::Network::Signet,
        };

        Ok(Self {
            network,
            backend_url: raw
                .backend_url
                .unwrap_or_else(|| default_backend_url(network).to_string()),
            retries: raw.retries.unwrap_or(DEFAULT_RETRIES),
            timeout_secs: raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            stop_gap: raw.stop_gap.unwrap_or(DEFAULT_STOP_GAP),
        })
    }

    /// Get the BIP44 coin type for this network
    pub fn coin_type(&self) -> u32 {
        match self.network {
            bitcoin::Network::Bitcoin => 0,
            _ => 1, // All test networks use coin type 1
        }
    }
}

impl Default for BlockchainConfig {
    /// Default configuration (Signet)
    fn default() -> Self {
        Self {
            network: bitcoin::Network::Signet,
            backend_url: default_backend_url(bitcoin::Network::Signet).to_string(),
            retries: DEFAULT_RETRIES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            stop_gap: DEFAULT_STOP_GAP,
        }
    }
}

fn parse_network(s: &str) -> Option<bitcoin::Network> {
    match s {
        "bitcoin" | "mainnet" => Some(bitcoin::Network::Bitcoin),
        "testnet" => Some(bitcoin::Network::Testnet),
        "signet" | "" => Some(bitcoin::Network::Signet),
        "regtest" => Some(bitcoin::Network::Regtest),
        _ => None,
    }
}

fn default_backend_url(network: bitcoin::Network) -> &'static str {
    match network {
        bitcoin::Network::Bitcoin => "https://mempool.space/api",
        bitcoin::Network::Testnet => "https://mempool.space/testnet/api",
        bitcoin::Network::Regtest => "http://localhost:3000",
        _ => "https://mempool.space/signet/api",
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    network: Option<String>,
    backend_url: Option<String>,
    retries: Option<u8>,
    timeout_secs: Option<u64>,
    stop_gap: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_signet() {
        let config = BlockchainConfig::default();
        assert!(matches!(config.network, bitcoin::Network::Signet));
        assert_eq!(config.stop_gap, DEFAULT_STOP_GAP);
        assert_eq!(config.backend_url, "https://mempool.space/signet/api");
    }

    #[test]
    fn test_coin_type() {
        let signet = BlockchainConfig::default();
        assert_eq!(signet.coin_type(), 1);

        let mainnet = BlockchainConfig {
            network: bitcoin::Network::Bitcoin,
            ..Default::default()
        };
        assert_eq!(mainnet.coin_type(), 0);
    }

    #[test]
    fn test_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "network = \"regtest\"\nbackend_url = \"http://localhost:9102\"\nstop_gap = 5\n",
        )
        .unwrap();

        let config = BlockchainConfig::from_file(&path).unwrap();
        assert!(matches!(config.network, bitcoin::Network::Regtest));
        assert_eq!(config.backend_url, "http://localhost:9102");
        assert_eq!(config.stop_gap, 5);
        assert_eq!(config.retries, DEFAULT_RETRIES);
    }

    #[test]
    fn test_from_toml_unknown_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "network = \"litecoin\"\n").unwrap();

        assert!(BlockchainConfig::from_file(&path).is_err());
    }
}
