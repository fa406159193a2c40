//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{Signature, VerificationKey, primitives};
use anyhow::anyhow;
use rand::RngCore;
use std::str::FromStr;

/// An ed25519 signing key (non-extended). Never persisted by the engine.
#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct SigningKey(primitives::SecretKey);

// ----------------------------------------------------------------------- Using

impl SigningKey {
    pub const SIZE: usize = primitives::SecretKey::SIZE;

    /// Generate a new signing key using available system entropy.
    pub fn new() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::from(bytes)
    }

    /// Convert the key into its raw bytes. Only use for storing the key securely or for testing.
    ///
    /// # Safety
    ///
    /// The returned bytes escape the zeroisation and opaque [`Debug`] of the wrapped secret; the
    /// caller is responsible for clearing them.
    #[inline]
    pub unsafe fn leak(key: Self) -> [u8; 32] {
        unsafe { primitives::SecretKey::leak_into_bytes(key.0) }
    }

    pub fn sign<T>(&self, msg: T) -> Signature
    where
        T: AsRef<[u8]>,
    {
        Signature::from(self.0.sign(msg))
    }
}

impl Default for SigningKey {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------- Converting (from)

impl From<[u8; 32]> for SigningKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(primitives::SecretKey::from(bytes))
    }
}

impl TryFrom<&[u8]> for SigningKey {
    type Error = anyhow::Error;

    fn try_from(bytes: &[u8]) -> anyhow::Result<Self> {
        let array = <[u8; 32]>::try_from(bytes).map_err(|_| {
            anyhow!("invalid signing key").context(format!("expected 32 bytes, got {}", bytes.len()))
        })?;

        Ok(Self::from(array))
    }
}

impl FromStr for SigningKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let bytes =
            hex::decode(s).map_err(|e| anyhow!(e).context("malformed base16 signing key"))?;

        Self::try_from(bytes.as_slice())
    }
}

// ------------------------------------------------------------- Converting (to)

impl SigningKey {
    pub fn to_verification_key(&self) -> VerificationKey {
        VerificationKey::from(self)
    }
}

impl From<&SigningKey> for VerificationKey {
    fn from(key: &SigningKey) -> Self {
        VerificationKey::from(key.0.public_key())
    }
}
