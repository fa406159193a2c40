//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Hash, LockingBytecode, NetworkId};
use anyhow::{Context, anyhow, bail};
use bech32::{FromBase32, ToBase32, Variant};
use std::{fmt, str::FromStr};

const KIND_P2PKH: u8 = 0x00;
const KIND_P2SH32: u8 = 0x0b;
const KIND_TOKEN_AWARE: u8 = 0x10;

/// A human-readable, network-specific rendering of a standard locking condition.
///
/// The text form is `<prefix>1<data>`, where the data is bech32-encoded and holds a one-byte kind
/// followed by the hash. Token-aware addresses signal that the recipient can handle tokens; they
/// lock funds exactly as their plain counterpart does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    network: NetworkId,
    payload: Payload,
    token_aware: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Payload {
    PublicKeyHash(Hash<20>),
    ScriptHash(Hash<32>),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = vec![self.kind()];
        match &self.payload {
            Payload::PublicKeyHash(hash) => data.extend_from_slice(hash.as_ref()),
            Payload::ScriptHash(hash) => data.extend_from_slice(hash.as_ref()),
        }

        let text = bech32::encode(
            self.network.address_prefix(),
            data.to_base32(),
            Variant::Bech32,
        )
        .map_err(|_| fmt::Error)?;

        f.write_str(&text)
    }
}

// ------------------------------------------------------------------ Inspecting

impl Address {
    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn is_token_aware(&self) -> bool {
        self.token_aware
    }

    fn kind(&self) -> u8 {
        let kind = match self.payload {
            Payload::PublicKeyHash(..) => KIND_P2PKH,
            Payload::ScriptHash(..) => KIND_P2SH32,
        };

        if self.token_aware {
            kind | KIND_TOKEN_AWARE
        } else {
            kind
        }
    }
}

// -------------------------------------------------------------------- Building

impl Address {
    pub fn new(network: NetworkId, payload: Payload) -> Self {
        Self {
            network,
            payload,
            token_aware: false,
        }
    }

    pub fn with_token_support(mut self, token_aware: bool) -> Self {
        self.token_aware = token_aware;
        self
    }

    /// The address of a standard locking condition; `None` for any non-standard bytecode.
    pub fn from_locking_bytecode(network: NetworkId, bytecode: &LockingBytecode) -> Option<Self> {
        bytecode
            .public_key_hash()
            .map(Payload::PublicKeyHash)
            .or_else(|| bytecode.script_hash().map(Payload::ScriptHash))
            .map(|payload| Self::new(network, payload))
    }
}

// ----------------------------------------------------------- Converting (from)

impl TryFrom<&str> for Address {
    type Error = anyhow::Error;

    fn try_from(text: &str) -> anyhow::Result<Self> {
        let (prefix, data, variant) =
            bech32::decode(text).map_err(|e| anyhow!(e)).context("invalid address encoding")?;

        if variant != Variant::Bech32 {
            bail!("unexpected checksum variant");
        }

        let network = NetworkId::from_address_prefix(&prefix)?;

        let bytes = Vec::<u8>::from_base32(&data).map_err(|e| anyhow!(e))?;

        let (kind, hash) = bytes
            .split_first()
            .ok_or_else(|| anyhow!("empty address payload"))?;

        let payload = match kind & !KIND_TOKEN_AWARE {
            KIND_P2PKH => Payload::PublicKeyHash(
                Hash::try_from(hash).context("invalid public key hash address")?,
            ),
            KIND_P2SH32 => Payload::ScriptHash(
                Hash::try_from(hash).context("invalid script hash address")?,
            ),
            _ => bail!("unknown address kind {kind:#04x}"),
        };

        Ok(Self::new(network, payload).with_token_support(kind & KIND_TOKEN_AWARE != 0))
    }
}

impl FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::try_from(s)
    }
}

#[cfg(test)]
mod tests {
    use super::{Address, Payload};
    use crate::{LockingBytecode, NetworkId, any, hash};
    use proptest::prelude::*;

    #[test]
    fn display_carries_network_prefix() {
        let payload = Payload::PublicKeyHash(hash!("00112233445566778899aabbccddeeff00112233"));
        assert!(
            Address::new(NetworkId::Mainnet, payload)
                .to_string()
                .starts_with("bitcoincash1")
        );
        assert!(
            Address::new(NetworkId::Testnet, payload)
                .to_string()
                .starts_with("bchtest1")
        );
    }

    #[test]
    fn token_awareness_changes_text_not_locking() {
        let plain = Address::new(
            NetworkId::Simulated,
            Payload::ScriptHash(hash!(
                "702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce"
            )),
        );
        let token_aware = plain.clone().with_token_support(true);

        assert_ne!(plain.to_string(), token_aware.to_string());
        assert_eq!(
            LockingBytecode::from(&plain),
            LockingBytecode::from(&token_aware)
        );
    }

    #[test]
    fn reject_garbage() {
        assert!(Address::try_from("bitcoincash1qqqqqq").is_err());
        assert!(Address::try_from("unknown1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq").is_err());
    }

    proptest! {
        #[test]
        fn text_roundtrip(hash in any::hash32(), token_aware in any::<bool>()) {
            let address = Address::new(NetworkId::Testnet, Payload::ScriptHash(hash))
                .with_token_support(token_aware);
            prop_assert_eq!(Address::try_from(address.to_string().as_str()).ok(), Some(address));
        }
    }
}
