//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Hash primitives consumed by the engine. Both are opaque to the rest of the crate: only their
//! output sizes matter.

use crate::Hash;
use cryptoxide::hashing::{ripemd160, sha256};

pub mod ed25519;

/// `RIPEMD160(SHA256(bytes))`, used for public-key hashes.
pub fn hash160(bytes: impl AsRef<[u8]>) -> Hash<20> {
    Hash::from(ripemd160(&sha256(bytes.as_ref())))
}

/// `SHA256(SHA256(bytes))`, used for transaction ids, script hashes and signature digests.
pub fn hash256(bytes: impl AsRef<[u8]>) -> Hash<32> {
    Hash::from(sha256(&sha256(bytes.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash;

    #[test]
    fn hash256_of_empty_input() {
        let expected: Hash<32> =
            hash!("5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456");
        assert_eq!(hash256([]), expected);
    }

    #[test]
    fn hash160_of_empty_input() {
        let expected: Hash<20> = hash!("b472a266d0bd89c13706a4132ccfb16f7c3b9fcb");
        assert_eq!(hash160([]), expected);
    }
}
