//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{
    Hash, Input, LedgerPolicy, Output, UnlockingProof, Utxo, crypto,
    encoding::{self, Encode, ToBytes},
};
use std::{fmt, str::FromStr};

mod builder;
pub use builder::TransactionBuilder;

pub const DEFAULT_VERSION: u32 = 2;

/// Sequence number of every input; relative time locks are not supported.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// A transaction identifier, kept in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TransactionId(Hash<32>);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TransactionId {
    pub fn to_wire_bytes(&self) -> [u8; 32] {
        <[u8; 32]>::from(self.0.reversed())
    }
}

impl From<Hash<32>> for TransactionId {
    fn from(hash: Hash<32>) -> Self {
        Self(hash)
    }
}

impl From<TransactionId> for Hash<32> {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

impl TryFrom<&str> for TransactionId {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> anyhow::Result<Self> {
        Ok(Self(Hash::try_from(s)?))
    }
}

impl FromStr for TransactionId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::try_from(s)
    }
}

/// A fully assembled transaction: ordered inputs with their unlocking proofs, and ordered
/// outputs.
///
/// Transactions are obtained from a [`TransactionBuilder`], which guarantees that every input
/// carries a proof. The ledger policy and the outputs the builder resolved its inputs to travel
/// with the transaction, but are not serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    version: u32,
    inputs: Vec<Input>,
    proofs: Vec<UnlockingProof>,
    outputs: Vec<Output>,
    locktime: u32,
    policy: LedgerPolicy,
    spent_outputs: Vec<Output>,
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transaction({})", self.id())?;
        for input in &self.inputs {
            writeln!(f, "  <- {input}")?;
        }
        for (ix, output) in self.outputs.iter().enumerate() {
            writeln!(f, "  -> #{ix} {output}")?;
        }
        Ok(())
    }
}

// -------------------------------------------------------------------- Building

impl Transaction {
    pub(crate) fn new(version: u32, inputs: Vec<Input>, outputs: Vec<Output>, locktime: u32) -> Self {
        Self {
            version,
            inputs,
            proofs: Vec::new(),
            outputs,
            locktime,
            policy: LedgerPolicy::default(),
            spent_outputs: Vec::new(),
        }
    }

    pub(crate) fn with_policy(mut self, policy: LedgerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub(crate) fn with_spent_outputs(mut self, spent_outputs: Vec<Output>) -> Self {
        self.spent_outputs = spent_outputs;
        self
    }

    pub(crate) fn with_proofs(mut self, proofs: Vec<UnlockingProof>) -> Self {
        debug_assert_eq!(proofs.len(), self.inputs.len());
        self.proofs = proofs;
        self
    }
}

// ------------------------------------------------------------------ Inspecting

impl Transaction {
    /// The double-SHA256 of the serialized transaction, in display order.
    pub fn id(&self) -> TransactionId {
        TransactionId(crypto::hash256(self.to_bytes()).reversed())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn locktime(&self) -> u32 {
        self.locktime
    }

    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    /// The outputs spent by this transaction, in order.
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// The outputs the inputs were resolved to when the transaction was built, in input order.
    pub fn spent_outputs(&self) -> &[Output] {
        &self.spent_outputs
    }

    /// The proof attached to each input, in input order.
    pub fn proofs(&self) -> &[UnlockingProof] {
        &self.proofs
    }

    /// The outputs created by this transaction, in order.
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// View this transaction as a set of new UTXOs, mapping each output to its reference.
    pub fn as_utxos(&self) -> Vec<Utxo> {
        let id = self.id();
        self.outputs
            .iter()
            .enumerate()
            .map(|(ix, output)| Utxo::new(Input::new(id, ix as u32), output.clone()))
            .collect()
    }

    /// The message signed by the proof of input `index`, which spends `spent_output`.
    ///
    /// It commits to the whole transaction but its proofs, to the position of the input and to
    /// the output it spends.
    pub fn signature_hash(&self, index: usize, spent_output: &Output) -> Hash<32> {
        let mut bytes = Vec::new();
        self.encode_with(&mut bytes, |_, _| ());
        encoding::write_u32(&mut bytes, index as u32);
        spent_output.encode(&mut bytes);
        crypto::hash256(bytes)
    }
}

// -------------------------------------------------------------------- Encoding

impl Transaction {
    fn encode_with(&self, buf: &mut Vec<u8>, encode_proof: impl Fn(usize, &mut Vec<u8>)) {
        encoding::write_u32(buf, self.version);

        encoding::write_compact_size(buf, self.inputs.len() as u64);
        for (ix, input) in self.inputs.iter().enumerate() {
            input.encode(buf);
            let mut proof = Vec::new();
            encode_proof(ix, &mut proof);
            encoding::write_var_bytes(buf, &proof);
            encoding::write_u32(buf, SEQUENCE_FINAL);
        }

        encoding::write_compact_size(buf, self.outputs.len() as u64);
        for output in &self.outputs {
            output.encode(buf);
        }

        encoding::write_u32(buf, self.locktime);
    }
}

impl Encode for Transaction {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.encode_with(buf, |ix, proof| {
            if let Some(unlocking_proof) = self.proofs.get(ix) {
                unlocking_proof.encode(proof);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Transaction, TransactionId};
    use crate::{LockingBytecode, Output, encoding::ToBytes, hash, input};

    fn transaction() -> Transaction {
        Transaction::new(
            2,
            vec![input!(
                "702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce",
                0,
            )],
            vec![
                Output::new(
                    LockingBytecode::pay_to_public_key_hash(hash!(
                        "00112233445566778899aabbccddeeff00112233"
                    )),
                    1000,
                ),
                Output::new(LockingBytecode::from(vec![0x51]), 2000),
            ],
            0,
        )
    }

    #[test]
    fn serialization_layout() {
        let bytes = transaction().to_bytes();
        // version
        assert_eq!(&bytes[..4], &[2, 0, 0, 0]);
        // one input, outpoint in wire order
        assert_eq!(bytes[4], 1);
        assert_eq!(bytes[5], 0xce);
        // empty proof, final sequence
        assert_eq!(bytes[41], 0);
        assert_eq!(&bytes[42..46], &[0xff; 4]);
        // two outputs
        assert_eq!(bytes[46], 2);
        // locktime
        assert_eq!(&bytes[bytes.len() - 4..], &[0; 4]);
    }

    #[test]
    fn as_utxos_references_own_id() {
        let tx = transaction();
        let utxos = tx.as_utxos();
        assert_eq!(utxos.len(), 2);
        for (ix, utxo) in utxos.iter().enumerate() {
            assert_eq!(utxo.input().transaction_id(), tx.id());
            assert_eq!(utxo.input().output_index(), ix as u32);
            assert_eq!(utxo.output(), &tx.outputs()[ix]);
        }
    }

    #[test]
    fn signature_hash_commits_to_input_position() {
        let tx = transaction();
        let spent = Output::new(LockingBytecode::from(vec![0x51]), 5000);
        assert_ne!(tx.signature_hash(0, &spent), tx.signature_hash(1, &spent));
        assert_eq!(tx.signature_hash(0, &spent), tx.signature_hash(0, &spent));
    }

    #[test]
    fn parse_transaction_id() {
        let id =
            TransactionId::try_from("702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce")
                .unwrap();
        assert_eq!(id.to_wire_bytes()[0], 0xce);
        assert!(TransactionId::try_from("zz").is_err());
    }
}
