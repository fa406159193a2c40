//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Address, Hash, address};
use std::{fmt, str::FromStr};

pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_HASH256: u8 = 0xaa;
pub const OP_CHECKSIG: u8 = 0xac;

/// The condition an output's spender must satisfy.
///
/// Two standard shapes are recognised: pay-to-public-key-hash, satisfied by a signature, and
/// 32-byte pay-to-script-hash, satisfied by a contract whose redeem bytecode hashes to the
/// committed digest. Any other bytecode is carried verbatim but cannot be unlocked.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct LockingBytecode(Vec<u8>);

impl fmt::Display for LockingBytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

// -------------------------------------------------------------------- Building

impl LockingBytecode {
    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn pay_to_public_key_hash(hash: Hash<20>) -> Self {
        let mut bytes = Vec::with_capacity(25);
        bytes.extend([OP_DUP, OP_HASH160, 20]);
        bytes.extend_from_slice(hash.as_ref());
        bytes.extend([OP_EQUALVERIFY, OP_CHECKSIG]);
        Self(bytes)
    }

    /// `OP_HASH256 <hash> OP_EQUAL`
    pub fn pay_to_script_hash32(hash: Hash<32>) -> Self {
        let mut bytes = Vec::with_capacity(35);
        bytes.extend([OP_HASH256, 32]);
        bytes.extend_from_slice(hash.as_ref());
        bytes.push(OP_EQUAL);
        Self(bytes)
    }
}

// ------------------------------------------------------------------ Inspecting

impl LockingBytecode {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The public key hash, when this is a pay-to-public-key-hash condition.
    pub fn public_key_hash(&self) -> Option<Hash<20>> {
        match self.0.as_slice() {
            [OP_DUP, OP_HASH160, 20, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG] => {
                Hash::try_from(hash).ok()
            }
            _ => None,
        }
    }

    /// The redeem bytecode hash, when this is a pay-to-script-hash condition.
    pub fn script_hash(&self) -> Option<Hash<32>> {
        match self.0.as_slice() {
            [OP_HASH256, 32, hash @ .., OP_EQUAL] => Hash::try_from(hash).ok(),
            _ => None,
        }
    }
}

// ----------------------------------------------------------- Converting (from)

impl From<Vec<u8>> for LockingBytecode {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&Address> for LockingBytecode {
    fn from(address: &Address) -> Self {
        match address.payload() {
            address::Payload::PublicKeyHash(hash) => Self::pay_to_public_key_hash(*hash),
            address::Payload::ScriptHash(hash) => Self::pay_to_script_hash32(*hash),
        }
    }
}

impl From<Address> for LockingBytecode {
    fn from(address: Address) -> Self {
        Self::from(&address)
    }
}

impl TryFrom<&str> for LockingBytecode {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> anyhow::Result<Self> {
        Ok(Self(hex::decode(s)?))
    }
}

impl FromStr for LockingBytecode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::try_from(s)
    }
}

// ------------------------------------------------------------- Converting (to)

impl AsRef<[u8]> for LockingBytecode {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use crate::{LockingBytecode, any, hash};
    use proptest::prelude::*;

    // -------------------------------------------------------------- Unit tests

    #[test]
    fn p2pkh_template() {
        let bytecode =
            LockingBytecode::pay_to_public_key_hash(hash!("00112233445566778899aabbccddeeff00112233"));
        assert_eq!(
            bytecode.to_string(),
            "76a91400112233445566778899aabbccddeeff0011223388ac",
        );
    }

    #[test]
    fn p2sh32_template() {
        let bytecode = LockingBytecode::pay_to_script_hash32(hash!(
            "702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce"
        ));
        assert_eq!(
            bytecode.to_string(),
            "aa20702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce87",
        );
    }

    #[test]
    fn unrecognised_bytecode() {
        let bytecode = LockingBytecode::try_from("6a").unwrap();
        assert_eq!(bytecode.public_key_hash(), None);
        assert_eq!(bytecode.script_hash(), None);
    }

    // -------------------------------------------------------------- Properties

    proptest! {
        #[test]
        fn recover_public_key_hash(hash in any::hash20()) {
            let bytecode = LockingBytecode::pay_to_public_key_hash(hash);
            prop_assert_eq!(bytecode.public_key_hash(), Some(hash));
            prop_assert_eq!(bytecode.script_hash(), None);
        }
    }

    proptest! {
        #[test]
        fn recover_script_hash(hash in any::hash32()) {
            let bytecode = LockingBytecode::pay_to_script_hash32(hash);
            prop_assert_eq!(bytecode.script_hash(), Some(hash));
            prop_assert_eq!(bytecode.public_key_hash(), None);
        }
    }

    // -------------------------------------------------------------- Generators

    pub mod generators {
        use super::*;

        pub fn locking_bytecode() -> impl Strategy<Value = LockingBytecode> {
            prop_oneof![
                any::hash20().prop_map(LockingBytecode::pay_to_public_key_hash),
                any::hash32().prop_map(LockingBytecode::pay_to_script_hash32),
            ]
        }
    }
}
