use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;

use super::{AddressInfo, ChainIndexer, TxDetail, UtxoRef};
use crate::error::WalletError;

/// HTTP client for an Esplora-compatible chain indexer.
pub struct EsploraClient {
    client: reqwest::Client,
    base_url: String,
}

impl EsploraClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, WalletError> {
        let response = self.fetch(path).await?;
        response
            .json()
            .await
            .map_err(|e| WalletError::Indexer(e.to_string()))
    }

    async fn fetch(&self, path: &str) -> Result<Response, WalletError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WalletError::Indexer(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WalletError::Indexer(format!(
                "{} returned {}: {}",
                path, status, body
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl ChainIndexer for EsploraClient {
    async fn transaction(&self, txid: &str) -> Result<TxDetail, WalletError> {
        self.get_json(&format!("/tx/{}", txid)).await
    }

    async fn address_info(&self, address: &str) -> Result<AddressInfo, WalletError> {
        self.get_json(&format!("/address/{}", address)).await
    }

    async fn address_utxos(&self, address: &str) -> Result<Vec<UtxoRef>, WalletError> {
        self.get_json(&format!("/address/{}/utxo", address)).await
    }

    async fn address_txs(&self, address: &str) -> Result<Vec<TxDetail>, WalletError> {
        self.get_json(&format!("/address/{}/txs", address)).await
    }

    async fn tip_height(&self) -> Result<u64, WalletError> {
        let response = self.fetch("/blocks/tip/height").await?;
        response
            .text()
            .await
            .map_err(|e| WalletError::Indexer(e.to_string()))?
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| WalletError::Indexer(e.to_string()))
    }

    async fn broadcast(&self, tx_hex: &str) -> Result<String, WalletError> {
        let url = format!("{}/tx", self.base_url);
        log::debug!("Broadcasting transaction to {}", url);

        let response = self
            .client
            .post(&url)
            .body(tx_hex.to_string())
            .send()
            .await
            .map_err(|e| WalletError::Indexer(e.to_string()))?;

        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(WalletError::Indexer(format!("Broadcast failed: {}", body)));
        }

        response
            .text()
            .await
            .map_err(|e| WalletError::Indexer(e.to_string()))
    }
}
