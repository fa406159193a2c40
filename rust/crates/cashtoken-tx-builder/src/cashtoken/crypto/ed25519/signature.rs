//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::primitives;
use std::fmt;

/// An EdDSA signature on Curve25519, as produced by [`SigningKey::sign`](super::SigningKey::sign).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(transparent)]
pub struct Signature(primitives::Signature);

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(&hex::encode(self.as_ref()))
    }
}

impl From<primitives::Signature> for Signature {
    fn from(sig: primitives::Signature) -> Self {
        Self(sig)
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<'a> From<&'a Signature> for &'a primitives::Signature {
    fn from(sig: &'a Signature) -> Self {
        &sig.0
    }
}
