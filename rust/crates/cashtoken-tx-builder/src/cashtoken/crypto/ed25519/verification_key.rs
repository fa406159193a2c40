//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{Signature, primitives};
use crate::{Hash, LockingBytecode, crypto};
use std::fmt;

/// An ed25519 verification key, pushed by unlocking bytecode and committed to by P2PKH outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct VerificationKey(primitives::PublicKey);

impl fmt::Display for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(&hex::encode(self.as_ref()))
    }
}

impl VerificationKey {
    /// Returns `true` when the signature was made over `message` by the matching signing key.
    pub fn verify<T>(&self, message: T, signature: &Signature) -> bool
    where
        T: AsRef<[u8]>,
    {
        self.0.verify(message, <&primitives::Signature>::from(signature))
    }

    /// The HASH160 digest committed to by pay-to-public-key-hash locking bytecodes.
    pub fn to_public_key_hash(&self) -> Hash<20> {
        crypto::hash160(self)
    }

    pub fn to_locking_bytecode(&self) -> LockingBytecode {
        LockingBytecode::pay_to_public_key_hash(self.to_public_key_hash())
    }
}

impl From<primitives::PublicKey> for VerificationKey {
    fn from(key: primitives::PublicKey) -> Self {
        Self(key)
    }
}

impl AsRef<[u8]> for VerificationKey {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}
