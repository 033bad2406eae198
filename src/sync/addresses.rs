use bitcoin::bip32::{ChildNumber, Xpub};
use bitcoin::key::CompressedPublicKey;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Address, Network, PublicKey};
use std::str::FromStr;

use crate::error::WalletError;

pub struct AddressDeriver;

impl AddressDeriver {
    /// Derive a single P2WPKH address from a BIP84 descriptor at the
    /// specified index.
    ///
    /// The descriptor's own chain step (`/0/*` external, `/1/*` internal)
    /// selects the keychain.
    pub fn derive_address(
        descriptor: &str,
        index: u32,
        network: Network,
    ) -> Result<Address, WalletError> {
        let xpub = Self::extract_xpub(descriptor)?;
        let secp = Secp256k1::new();

        let chain_child = ChildNumber::from_normal_idx(Self::chain_index(descriptor))
            .map_err(|e| WalletError::Bitcoin(e.to_string()))?;
        let child_number = ChildNumber::from_normal_idx(index)
            .map_err(|e| WalletError::Bitcoin(e.to_string()))?;

        let derived_key = xpub
            .derive_pub(&secp, &[chain_child, child_number])
            .map_err(|e| WalletError::Bitcoin(e.to_string()))?;

        let pubkey = PublicKey::new(derived_key.public_key);
        let compressed = CompressedPublicKey::try_from(pubkey)
            .map_err(|e| WalletError::Bitcoin(e.to_string()))?;

        Ok(Address::p2wpkh(&compressed, network))
    }

    /// Derive a run of addresses, returning (index, address) pairs.
    pub fn derive_addresses(
        descriptor: &str,
        start: u32,
        count: u32,
        network: Network,
    ) -> Result<Vec<(u32, Address)>, WalletError> {
        let mut addresses = Vec::with_capacity(count as usize);

        for i in 0..count {
            let index = start + i;
            let address = Self::derive_address(descriptor, index, network)?;
            addresses.push((index, address));
        }

        Ok(addresses)
    }

    /// Chain step encoded in the descriptor: 1 for internal (`/1/*`),
    /// otherwise 0.
    fn chain_index(descriptor: &str) -> u32 {
        if descriptor.contains("/1/*") {
            1
        } else {
            0
        }
    }

    /// Extract the xpub/tpub from a descriptor string.
    fn extract_xpub(descriptor: &str) -> Result<Xpub, WalletError> {
        let start = descriptor
            .find("tpub")
            .or_else(|| descriptor.find("xpub"))
            .ok_or_else(|| WalletError::InvalidDescriptor("No xpub/tpub found".into()))?;

        let end = descriptor[start..]
            .find('/')
            .map(|i| start + i)
            .unwrap_or(descriptor.len());

        let xpub_str = &descriptor[start..end];

        Xpub::from_str(xpub_str).map_err(|e| WalletError::InvalidDescriptor(e.to_string()))
    }
}
