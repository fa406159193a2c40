//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

mod signature;
mod signing_key;
mod verification_key;

pub use signature::Signature;
pub use signing_key::SigningKey;
pub use verification_key::VerificationKey;

use pallas_crypto::key::ed25519 as primitives;
