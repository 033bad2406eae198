use bip39::Mnemonic;
use bitcoin::bip32::{DerivationPath, Fingerprint, Xpriv, Xpub};
use bitcoin::key::rand;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::Network;
use std::str::FromStr;

use crate::error::WalletError;
use crate::models::SeedWordsCount;

/// The BIP84 descriptor pair derived from a seed at wallet setup.
pub struct WalletDescriptors {
    pub external: String,
    pub internal: String,
    pub fingerprint: String,
}

/// Generate a fresh mnemonic with the requested word count.
pub fn generate_mnemonic(words: SeedWordsCount) -> Result<Mnemonic, WalletError> {
    let entropy = rand::random::<[u8; 32]>();

    Mnemonic::from_entropy(&entropy[..words.entropy_bytes()])
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

/// Derive the external/internal BIP84 descriptor pair from a mnemonic.
pub fn descriptors_from_mnemonic(
    mnemonic: &Mnemonic,
    network: Network,
) -> Result<WalletDescriptors, WalletError> {
    let secp = Secp256k1::new();
    let seed = mnemonic.to_seed("");

    let master_key =
        Xpriv::new_master(network, &seed).map_err(|e| WalletError::Bitcoin(e.to_string()))?;
    let fingerprint = master_key.fingerprint(&secp);

    let coin_type = match network {
        Network::Bitcoin => 0,
        _ => 1, // All test networks use coin type 1
    };
    let derivation_path = DerivationPath::from_str(&format!("m/84'/{}'/0'", coin_type))
        .map_err(|e| WalletError::Bitcoin(e.to_string()))?;

    let account_key = master_key
        .derive_priv(&secp, &derivation_path)
        .map_err(|e| WalletError::Bitcoin(e.to_string()))?;
    let xpub = Xpub::from_priv(&secp, &account_key);

    Ok(WalletDescriptors {
        external: descriptor(&xpub, fingerprint, coin_type, 0),
        internal: descriptor(&xpub, fingerprint, coin_type, 1),
        fingerprint: format!("{:08x}", fingerprint),
    })
}

fn descriptor(xpub: &Xpub, fingerprint: Fingerprint, coin_type: u32, chain: u32) -> String {
    format!(
        "wpkh([{:08x}/84'/{}'/0']{}/{}/*)",
        fingerprint, coin_type, xpub, chain
    )
}
