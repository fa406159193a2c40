//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Authorization of inputs: every unlocking proof is checked against the locking bytecode of the
//! output it spends, with visibility over the whole spending transaction.

use crate::{
    Error, Hash, Input, LockingBytecode, Output, Result, Transaction, UnlockingProof,
};
use log::debug;

/// What a locking condition gets to see when one of its outputs is being spent.
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    transaction: &'a Transaction,
    spent_outputs: &'a [Output],
    input_index: usize,
}

impl<'a> ScriptContext<'a> {
    /// `spent_outputs` are the outputs referenced by the transaction inputs, in the same order.
    pub fn new(
        transaction: &'a Transaction,
        spent_outputs: &'a [Output],
        input_index: usize,
    ) -> Self {
        Self {
            transaction,
            spent_outputs,
            input_index,
        }
    }

    /// Position of the input being evaluated.
    pub fn input_index(&self) -> usize {
        self.input_index
    }

    pub fn version(&self) -> u32 {
        self.transaction.version()
    }

    pub fn locktime(&self) -> u32 {
        self.transaction.locktime()
    }

    pub fn inputs(&self) -> &'a [Input] {
        self.transaction.inputs()
    }

    pub fn spent_outputs(&self) -> &'a [Output] {
        self.spent_outputs
    }

    pub fn outputs(&self) -> &'a [Output] {
        self.transaction.outputs()
    }

    /// The output spent by the input being evaluated; `None` when the context was not given it.
    pub fn spent_output(&self) -> Option<&'a Output> {
        self.spent_outputs.get(self.input_index)
    }

    /// The output at the same position as the input being evaluated, if any.
    pub fn paired_output(&self) -> Option<&'a Output> {
        self.outputs().get(self.input_index)
    }

    pub fn signature_hash(&self) -> Option<Hash<32>> {
        self.spent_output()
            .map(|spent| self.transaction.signature_hash(self.input_index, spent))
    }

    /// The output spent by the input being evaluated, or why it cannot be found.
    fn resolve(&self) -> Result<&'a Output> {
        let input = self
            .inputs()
            .get(self.input_index)
            .copied()
            .ok_or_else(|| Error::auth(self.input_index, "no such input"))?;

        self.spent_output()
            .ok_or_else(|| Error::unknown_input(input, "no resolved output"))
    }
}

/// Evaluate one unlocking proof against the locking bytecode it claims to satisfy.
///
/// Evaluation is pure: the same proof, bytecode and context always yield the same outcome.
pub fn evaluate(
    proof: &UnlockingProof,
    locking_bytecode: &LockingBytecode,
    ctx: &ScriptContext<'_>,
) -> Result<()> {
    let index = ctx.input_index();
    let spent = ctx.resolve()?;

    match proof {
        UnlockingProof::Signature {
            verification_key,
            signature,
        } => {
            let expected = locking_bytecode.public_key_hash().ok_or_else(|| {
                Error::auth(index, "signature supplied for non pay-to-public-key-hash output")
            })?;

            if verification_key.to_public_key_hash() != expected {
                return Err(Error::auth(
                    index,
                    format!("public key {verification_key} does not hash to {expected}"),
                ));
            }

            let message = ctx.transaction.signature_hash(index, spent);
            if !verification_key.verify(message, signature) {
                return Err(Error::auth(index, "invalid signature"));
            }
        }

        UnlockingProof::Contract { contract, call } => {
            let expected = locking_bytecode.script_hash().ok_or_else(|| {
                Error::script(index, "contract call on non pay-to-script-hash output")
            })?;

            if contract.script_hash() != expected {
                return Err(Error::script(
                    index,
                    format!(
                        "redeem bytecode of '{}' hashes to {}, expected {expected}",
                        contract.name(),
                        contract.script_hash(),
                    ),
                ));
            }

            let (_, function) = contract.artifact().function(call.function()).ok_or_else(|| {
                Error::script(
                    index,
                    format!("'{}' has no function '{}'", contract.name(), call.function()),
                )
            })?;

            if function.inputs.len() != call.arguments().len() {
                return Err(Error::script(
                    index,
                    format!(
                        "'{}' expects {} arguments, got {}",
                        function.name,
                        function.inputs.len(),
                        call.arguments().len(),
                    ),
                ));
            }

            if let Some((parameter, argument)) = function
                .inputs
                .iter()
                .zip(call.arguments())
                .find(|(parameter, argument)| !argument.is_of_type(parameter.kind))
            {
                return Err(Error::script(
                    index,
                    format!(
                        "argument '{}' should be of type {}, got {argument}",
                        parameter.name, parameter.kind,
                    ),
                ));
            }

            contract
                .predicate()
                .check(contract, call, ctx)
                .map_err(|e| Error::script(index, format!("{}.{call}: {e:#}", contract.name())))?;
        }
    }

    Ok(())
}

/// Evaluate every input of a transaction, in input order, stopping at the first rejection.
pub fn evaluate_transaction(transaction: &Transaction, spent_outputs: &[Output]) -> Result<()> {
    for (index, input) in transaction.inputs().iter().enumerate() {
        let proof = transaction
            .proofs()
            .get(index)
            .ok_or_else(|| Error::auth(index, "missing unlocking proof"))?;

        let spent = spent_outputs
            .get(index)
            .ok_or_else(|| Error::unknown_input(*input, "no resolved output"))?;

        let ctx = ScriptContext::new(transaction, spent_outputs, index);
        evaluate(proof, spent.locking_bytecode(), &ctx)?;

        debug!("input #{index}: {input} authorized");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ScriptContext, evaluate, evaluate_transaction};
    use crate::{
        Argument, Artifact, ArgumentType, Call, Contract, Error, LockingBytecode, Output,
        SigningKey, Transaction, Unlocker,
        artifact::{Function, Parameter},
        input,
    };
    use anyhow::ensure;

    fn artifact() -> Artifact {
        Artifact::new(
            "Guard",
            vec![Parameter {
                name: "minimum".to_string(),
                kind: ArgumentType::Int,
            }],
            vec![
                Function {
                    name: "spend".to_string(),
                    inputs: vec![],
                },
                Function {
                    name: "prove".to_string(),
                    inputs: vec![Parameter {
                        name: "secret".to_string(),
                        kind: ArgumentType::Bytes,
                    }],
                },
            ],
            vec![0x51],
        )
    }

    /// Requires the first output to hold at least `minimum` satoshis.
    fn guard(contract: &Contract, _call: &Call, ctx: &ScriptContext<'_>) -> anyhow::Result<()> {
        let minimum = contract
            .argument("minimum")?
            .as_int()
            .unwrap_or_default();
        let first = ctx.outputs().first().map(Output::satoshis).unwrap_or_default();
        ensure!(first as i64 >= minimum, "first output holds {first} < {minimum}");
        Ok(())
    }

    fn anyone() -> LockingBytecode {
        LockingBytecode::from(vec![0x51])
    }

    /// Assemble and unlock a single-input transaction spending `spent` into `outputs`.
    fn spend(spent: &Output, unlocker: &Unlocker, outputs: Vec<Output>) -> Transaction {
        let tx = Transaction::new(
            2,
            vec![input!("702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce", 0)],
            outputs,
            0,
        );
        let proof = unlocker.unlock(&tx.signature_hash(0, spent));
        tx.with_proofs(vec![proof])
    }

    #[test]
    fn accept_valid_signature() {
        let key = SigningKey::from([1; 32]);
        let spent = Output::new(key.to_verification_key().to_locking_bytecode(), 10_000);
        let tx = spend(&spent, &Unlocker::signature(key), vec![Output::new(anyone(), 9_000)]);
        assert_eq!(evaluate_transaction(&tx, &[spent.clone()]), Ok(()));
        // idempotent
        assert_eq!(evaluate_transaction(&tx, &[spent]), Ok(()));
    }

    #[test]
    fn reject_foreign_key() {
        let owner = SigningKey::from([1; 32]);
        let thief = SigningKey::from([2; 32]);
        let spent = Output::new(owner.to_verification_key().to_locking_bytecode(), 10_000);
        let tx = spend(&spent, &Unlocker::signature(thief), vec![]);
        assert!(matches!(
            evaluate_transaction(&tx, &[spent]),
            Err(Error::Auth { index: 0, .. })
        ));
    }

    #[test]
    fn reject_signature_over_other_transaction() {
        let key = SigningKey::from([1; 32]);
        let spent = Output::new(key.to_verification_key().to_locking_bytecode(), 10_000);
        let unlocker = Unlocker::signature(key);

        let signed = spend(&spent, &unlocker, vec![Output::new(anyone(), 9_000)]);
        let tampered = Transaction::new(
            2,
            signed.inputs().to_vec(),
            vec![Output::new(anyone(), 1_000)],
            0,
        )
        .with_proofs(signed.proofs().to_vec());

        let result = evaluate(
            &tampered.proofs()[0],
            spent.locking_bytecode(),
            &ScriptContext::new(&tampered, std::slice::from_ref(&spent), 0),
        );
        assert!(matches!(result, Err(Error::Auth { .. })));
    }

    #[test]
    fn contract_predicate_sees_outputs() {
        let contract = Contract::new(artifact(), vec![Argument::Int(5_000)], guard).unwrap();
        let spent = Output::new(contract.locking_bytecode(), 10_000);
        let unlocker = contract.unlock("spend", vec![]);

        let ok = spend(&spent, &unlocker, vec![Output::new(anyone(), 6_000)]);
        assert_eq!(evaluate_transaction(&ok, std::slice::from_ref(&spent)), Ok(()));

        let ko = spend(&spent, &unlocker, vec![Output::new(anyone(), 4_000)]);
        assert!(matches!(
            evaluate_transaction(&ko, &[spent]),
            Err(Error::Script { index: 0, .. })
        ));
    }

    #[test]
    fn reject_unknown_function_and_bad_arguments() {
        let contract = Contract::new(artifact(), vec![Argument::Int(0)], guard).unwrap();
        let spent = Output::new(contract.locking_bytecode(), 10_000);

        let unknown = spend(&spent, &contract.unlock("mint", vec![]), vec![]);
        assert!(matches!(
            evaluate_transaction(&unknown, std::slice::from_ref(&spent)),
            Err(Error::Script { .. })
        ));

        let mistyped = spend(&spent, &contract.unlock("prove", vec![Argument::Int(1)]), vec![]);
        assert!(matches!(
            evaluate_transaction(&mistyped, &[spent]),
            Err(Error::Script { .. })
        ));
    }

    #[test]
    fn reject_contract_on_foreign_output() {
        let contract = Contract::new(artifact(), vec![Argument::Int(0)], guard).unwrap();
        let other = Contract::new(artifact(), vec![Argument::Int(1)], guard).unwrap();
        let spent = Output::new(other.locking_bytecode(), 10_000);
        let tx = spend(&spent, &contract.unlock("spend", vec![]), vec![]);
        assert!(matches!(
            evaluate_transaction(&tx, &[spent]),
            Err(Error::Script { .. })
        ));
    }

    #[test]
    fn reject_context_without_spent_output() {
        let key = SigningKey::from([1; 32]);
        let spent = Output::new(key.to_verification_key().to_locking_bytecode(), 10_000);
        let tx = spend(&spent, &Unlocker::signature(key), vec![]);
        let ctx = ScriptContext::new(&tx, &[], 0);

        assert_eq!(ctx.spent_output(), None);
        assert_eq!(ctx.signature_hash(), None);
        assert!(matches!(
            evaluate(&tx.proofs()[0], spent.locking_bytecode(), &ctx),
            Err(Error::UnknownInput { .. })
        ));
    }

    #[test]
    fn reject_unresolved_input() {
        let key = SigningKey::from([1; 32]);
        let spent = Output::new(key.to_verification_key().to_locking_bytecode(), 10_000);
        let tx = spend(&spent, &Unlocker::signature(key), vec![]);
        assert!(matches!(
            evaluate_transaction(&tx, &[]),
            Err(Error::UnknownInput { .. })
        ));
    }
}
