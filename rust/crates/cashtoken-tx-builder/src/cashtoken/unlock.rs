//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{
    Call, Contract, Hash, Signature, SigningKey, VerificationKey,
    encoding::{self, Encode},
};
use std::sync::Arc;

/// Supplies the unlocking proof of an input, once the transaction spending it is known.
#[derive(Debug, Clone)]
pub enum Unlocker {
    /// Sign for a pay-to-public-key-hash output.
    Signature(Arc<SigningKey>),
    /// Call a function of the contract locking a pay-to-script-hash output.
    Contract(Contract, Call),
}

/// The data satisfying an input's locking bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockingProof {
    Signature {
        verification_key: VerificationKey,
        signature: Signature,
    },
    Contract {
        contract: Contract,
        call: Call,
    },
}

impl Unlocker {
    pub fn signature(signing_key: SigningKey) -> Self {
        Self::Signature(Arc::new(signing_key))
    }

    /// Produce the proof for an input, given the hash the input commits to.
    pub fn unlock(&self, signature_hash: &Hash<32>) -> UnlockingProof {
        match self {
            Self::Signature(signing_key) => UnlockingProof::Signature {
                verification_key: signing_key.to_verification_key(),
                signature: signing_key.sign(signature_hash),
            },
            Self::Contract(contract, call) => UnlockingProof::Contract {
                contract: contract.clone(),
                call: call.clone(),
            },
        }
    }
}

// -------------------------------------------------------------------- Encoding

/// The unlocking bytecode: the pushes a spender places on the stack.
///
/// For contracts, these are the call arguments (last first), the function selector when the
/// contract has more than one function, and finally the redeem bytecode. A selector unknown to
/// the contract is pushed by name.
impl Encode for UnlockingProof {
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Signature {
                verification_key,
                signature,
            } => {
                encoding::push_data(buf, signature.as_ref());
                encoding::push_data(buf, verification_key.as_ref());
            }
            Self::Contract { contract, call } => {
                for argument in call.arguments().iter().rev() {
                    argument.push(buf);
                }

                let artifact = contract.artifact();
                if artifact.abi().len() > 1 {
                    match artifact.function(call.function()) {
                        Some((selector, _)) => encoding::push_int(buf, selector as i64),
                        None => encoding::push_data(buf, call.function().as_bytes()),
                    }
                }

                encoding::push_data(buf, contract.redeem_bytecode());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Unlocker, UnlockingProof};
    use crate::{Hash, SigningKey, encoding::ToBytes, hash};

    #[test]
    fn signature_proof_verifies_against_hash() {
        let key = SigningKey::from([42; 32]);
        let message: Hash<32> = hash!("702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce");
        match Unlocker::signature(key).unlock(&message) {
            UnlockingProof::Signature {
                verification_key,
                signature,
            } => assert!(verification_key.verify(message, &signature)),
            proof => panic!("unexpected proof: {proof:?}"),
        }
    }

    #[test]
    fn encode_signature_proof() {
        let key = SigningKey::from([42; 32]);
        let proof = Unlocker::signature(key).unlock(&hash!(
            "702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce"
        ));
        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), 1 + 64 + 1 + 32);
        assert_eq!(bytes[0], 64);
        assert_eq!(bytes[65], 32);
    }
}
