//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use anyhow::anyhow;
use std::{fmt, str::FromStr};

/// A fixed-size hash digest; typically 20 (HASH160) or 32 (HASH256) bytes long.
///
/// There are several ways to construct [`Self`], but fundamentally:
///
/// - Conversions from static byte arrays of known sizes are infaillible:
///
///   ```rust
///   # use cashtoken_tx_builder::Hash;
///   assert_eq!(
///     <Hash<20>>::from([0; 20]).to_string(),
///     "0000000000000000000000000000000000000000",
///   );
///   ```
///
/// - Conversions from vectors or slices are possible but faillible:
///
///   ```rust
///   # use cashtoken_tx_builder::Hash;
///   assert!(<Hash<20>>::try_from(vec![0; 20]).is_ok());
///   assert!(<Hash<32>>::try_from(vec![0; 20]).is_err());
///   ```
///
/// - Conversions from base16-encoded text strings are also possible, see also the
///   [`hash!`](crate::hash) macro.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
#[repr(transparent)]
pub struct Hash<const SIZE: usize>([u8; SIZE]);

impl<const SIZE: usize> fmt::Debug for Hash<SIZE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash<{SIZE}>({self})")
    }
}

impl<const SIZE: usize> fmt::Display for Hash<SIZE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(&hex::encode(self.0))
    }
}

// ------------------------------------------------------------------ Inspecting

impl<const SIZE: usize> Hash<SIZE> {
    pub const SIZE: usize = SIZE;

    /// The same digest, with its bytes in reverse order. Transaction ids and token categories are
    /// displayed in one order, but serialized in the other.
    pub fn reversed(&self) -> Self {
        let mut bytes = self.0;
        bytes.reverse();
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIZE] {
        &self.0
    }
}

// ----------------------------------------------------------- Converting (from)

impl<const SIZE: usize> TryFrom<&str> for Hash<SIZE> {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> anyhow::Result<Self> {
        let bytes = hex::decode(s).map_err(|e| anyhow!(e))?;
        let fixed_sized_bytes = <[u8; SIZE]>::try_from(bytes).map_err(|_| {
            anyhow!(
                "invalid hex string length; expected {}, got {}",
                2 * SIZE,
                s.len()
            )
        })?;

        Ok(Hash(fixed_sized_bytes))
    }
}

impl<const SIZE: usize> FromStr for Hash<SIZE> {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::try_from(s)
    }
}

impl<const SIZE: usize> TryFrom<&[u8]> for Hash<SIZE> {
    type Error = anyhow::Error;

    fn try_from(bytes: &[u8]) -> anyhow::Result<Self> {
        let fixed_sized_bytes = <[u8; SIZE]>::try_from(bytes).map_err(|_| {
            anyhow!(
                "invalid bytes sequence length; expected {} bytes, got {} bytes",
                SIZE,
                bytes.len(),
            )
        })?;

        Ok(Hash(fixed_sized_bytes))
    }
}

impl<const SIZE: usize> TryFrom<Vec<u8>> for Hash<SIZE> {
    type Error = anyhow::Error;

    fn try_from(bytes: Vec<u8>) -> anyhow::Result<Self> {
        Self::try_from(bytes.as_slice())
    }
}

impl<const SIZE: usize> From<[u8; SIZE]> for Hash<SIZE> {
    fn from(hash: [u8; SIZE]) -> Self {
        Self(hash)
    }
}

// ------------------------------------------------------------- Converting (to)

impl<const SIZE: usize> From<Hash<SIZE>> for [u8; SIZE] {
    fn from(hash: Hash<SIZE>) -> Self {
        hash.0
    }
}

impl<const SIZE: usize> AsRef<[u8]> for Hash<SIZE> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use crate::{Hash, any, hash};
    use proptest::prelude::*;

    // -------------------------------------------------------------- Unit tests

    #[test]
    fn display_hash() {
        let hash: Hash<32> =
            hash!("702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce");
        assert_eq!(
            hash.to_string(),
            "702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce",
        );
    }

    #[test]
    fn reject_wrong_length() {
        assert!(<Hash<32>>::try_from("00ff").is_err());
        assert!(<Hash<20>>::try_from(&[0u8; 32][..]).is_err());
    }

    // -------------------------------------------------------------- Properties

    proptest! {
        #[test]
        fn reversed_is_an_involution(hash in any::hash32()) {
            prop_assert_eq!(hash.reversed().reversed(), hash);
        }
    }

    proptest! {
        #[test]
        fn text_roundtrip(hash in any::hash20()) {
            prop_assert_eq!(<Hash<20>>::try_from(hash.to_string().as_str()).ok(), Some(hash));
        }
    }

    // -------------------------------------------------------------- Generators

    pub mod generators {
        use super::*;

        pub fn hash20() -> impl Strategy<Value = Hash<20>> {
            any::<[u8; 20]>().prop_map(Hash::from)
        }

        pub fn hash32() -> impl Strategy<Value = Hash<32>> {
            any::<[u8; 32]>().prop_map(Hash::from)
        }
    }
}
