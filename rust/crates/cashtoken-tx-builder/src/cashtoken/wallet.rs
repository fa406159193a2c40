//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{
    Address, Hash, LockingBytecode, NetworkId, SigningKey, Unlocker, VerificationKey, address,
    crypto,
};
use anyhow::{Context, anyhow, ensure};
use base58::{FromBase58, ToBase58};
use std::{fmt, str::FromStr};

const WIF_MAINNET: u8 = 0x80;
const WIF_TESTNET: u8 = 0xef;
const WIF_COMPRESSED: u8 = 0x01;
const CHECKSUM_SIZE: usize = 4;

/// A signing key and the pay-to-public-key-hash locking condition it controls.
///
/// Wallets live in memory only; see [`Wallet::to_wif`] for exporting the key.
#[derive(Clone)]
pub struct Wallet {
    network: NetworkId,
    signing_key: SigningKey,
    verification_key: VerificationKey,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("network", &self.network)
            .field("verification_key", &self.verification_key.to_string())
            .finish_non_exhaustive()
    }
}

// -------------------------------------------------------------------- Building

impl Wallet {
    pub fn new(network: NetworkId, signing_key: SigningKey) -> Self {
        let verification_key = signing_key.to_verification_key();
        Self {
            network,
            signing_key,
            verification_key,
        }
    }

    /// A wallet with a fresh key.
    pub fn generate(network: NetworkId) -> Self {
        Self::new(network, SigningKey::new())
    }

    /// Decode a secret given either as 64 hex digits or as a WIF string.
    pub fn from_secret(network: NetworkId, secret: &str) -> anyhow::Result<Self> {
        let secret = secret.trim();

        let signing_key = if secret.len() == 2 * SigningKey::SIZE
            && secret.chars().all(|c| c.is_ascii_hexdigit())
        {
            SigningKey::from_str(secret)?
        } else {
            decode_wif(secret).context("invalid WIF secret")?
        };

        Ok(Self::new(network, signing_key))
    }
}

// ------------------------------------------------------------------ Inspecting

impl Wallet {
    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn verification_key(&self) -> &VerificationKey {
        &self.verification_key
    }

    pub fn public_key_hash(&self) -> Hash<20> {
        self.verification_key.to_public_key_hash()
    }

    pub fn locking_bytecode(&self) -> LockingBytecode {
        LockingBytecode::pay_to_public_key_hash(self.public_key_hash())
    }

    /// The token-aware address of this wallet.
    pub fn address(&self) -> Address {
        Address::new(
            self.network,
            address::Payload::PublicKeyHash(self.public_key_hash()),
        )
        .with_token_support(true)
    }

    /// Sign for one of this wallet's outputs.
    pub fn unlock_p2pkh(&self) -> Unlocker {
        Unlocker::signature(self.signing_key.clone())
    }

    /// Export the signing key as a WIF string.
    pub fn to_wif(&self) -> String {
        let version = if self.network.is_mainnet() {
            WIF_MAINNET
        } else {
            WIF_TESTNET
        };

        // SAFETY: the key bytes are only copied into the returned string.
        let key = unsafe { SigningKey::leak(self.signing_key.clone()) };

        let mut payload = Vec::with_capacity(1 + SigningKey::SIZE + 1 + CHECKSUM_SIZE);
        payload.push(version);
        payload.extend_from_slice(&key);
        payload.push(WIF_COMPRESSED);
        let checksum = crypto::hash256(&payload);
        payload.extend_from_slice(&checksum.as_ref()[..CHECKSUM_SIZE]);

        payload.to_base58()
    }
}

// -------------------------------------------------------------------- Internal

fn decode_wif(text: &str) -> anyhow::Result<SigningKey> {
    let bytes = text
        .from_base58()
        .map_err(|e| anyhow!("invalid base58 encoding: {e:?}"))?;

    ensure!(bytes.len() > CHECKSUM_SIZE, "too short");
    let (payload, checksum) = bytes.split_at(bytes.len() - CHECKSUM_SIZE);

    ensure!(
        &crypto::hash256(payload).as_ref()[..CHECKSUM_SIZE] == checksum,
        "checksum mismatch"
    );

    let (version, key) = payload
        .split_first()
        .ok_or_else(|| anyhow!("empty payload"))?;

    ensure!(
        *version == WIF_MAINNET || *version == WIF_TESTNET,
        "unknown version byte {version:#04x}"
    );

    let key = match key {
        [key @ .., WIF_COMPRESSED] if key.len() == SigningKey::SIZE => key,
        _ => key,
    };

    SigningKey::try_from(key)
}

#[cfg(test)]
mod tests {
    use super::Wallet;
    use crate::{Address, LockingBytecode, NetworkId};

    #[test]
    fn wif_roundtrip() {
        let wallet = Wallet::from_secret(NetworkId::Testnet, &"11".repeat(32)).unwrap();
        let wif = wallet.to_wif();
        let restored = Wallet::from_secret(NetworkId::Testnet, &wif).unwrap();
        assert_eq!(restored.verification_key(), wallet.verification_key());
    }

    #[test]
    fn reject_corrupted_wif() {
        let wif = Wallet::from_secret(NetworkId::Mainnet, &"22".repeat(32))
            .unwrap()
            .to_wif();
        let mut corrupted = wif.into_bytes();
        let last = corrupted.len() - 1;
        corrupted[last] = if corrupted[last] == b'2' { b'3' } else { b'2' };
        let corrupted = String::from_utf8(corrupted).unwrap();

        assert!(Wallet::from_secret(NetworkId::Mainnet, &corrupted).is_err());
        assert!(Wallet::from_secret(NetworkId::Mainnet, "not a key").is_err());
    }

    #[test]
    fn address_matches_locking_bytecode() {
        let wallet = Wallet::generate(NetworkId::Simulated);
        let address = Address::try_from(wallet.address().to_string().as_str()).unwrap();
        assert!(address.is_token_aware());
        assert_eq!(LockingBytecode::from(&address), wallet.locking_bytecode());
    }
}
