//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{
    Address, Argument, Artifact, Hash, LockingBytecode, NetworkId, ScriptContext, Unlocker,
    address, crypto,
};
use anyhow::{Context, bail};
use std::{fmt, sync::Arc};

/// The compiled logic of a contract template, evaluated whenever one of its outputs is spent.
///
/// Implementations see the contract instance (and thus its constructor arguments), the function
/// being called along with its arguments, and the full spending transaction. Any error rejects
/// the spend.
pub trait Predicate: Send + Sync {
    fn check(&self, contract: &Contract, call: &Call, ctx: &ScriptContext<'_>)
    -> anyhow::Result<()>;
}

impl<F> Predicate for F
where
    F: Fn(&Contract, &Call, &ScriptContext<'_>) -> anyhow::Result<()> + Send + Sync,
{
    fn check(
        &self,
        contract: &Contract,
        call: &Call,
        ctx: &ScriptContext<'_>,
    ) -> anyhow::Result<()> {
        self(contract, call, ctx)
    }
}

/// A contract template instantiated with concrete constructor arguments.
///
/// The instance is fully determined by its template and arguments: they define the redeem
/// bytecode, whose hash in turn defines the locking bytecode and addresses.
#[derive(Clone)]
pub struct Contract {
    artifact: Arc<Artifact>,
    arguments: Vec<Argument>,
    redeem_bytecode: Vec<u8>,
    predicate: Arc<dyn Predicate>,
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("name", &self.artifact.contract_name())
            .field("arguments", &self.arguments)
            .field("script_hash", &self.script_hash())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Contract {
    fn eq(&self, other: &Self) -> bool {
        self.redeem_bytecode == other.redeem_bytecode
    }
}

impl Eq for Contract {}

/// The invocation of one of a contract's functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    function: String,
    arguments: Vec<Argument>,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        for (ix, argument) in self.arguments.iter().enumerate() {
            if ix > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{argument}")?;
        }
        f.write_str(")")
    }
}

impl Call {
    pub fn new(function: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self {
            function: function.into(),
            arguments,
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }
}

// -------------------------------------------------------------------- Building

impl Contract {
    pub fn new(
        artifact: impl Into<Arc<Artifact>>,
        arguments: Vec<Argument>,
        predicate: impl Predicate + 'static,
    ) -> anyhow::Result<Self> {
        let artifact = artifact.into();

        let parameters = artifact.constructor_inputs();
        if parameters.len() != arguments.len() {
            bail!(
                "contract '{}' expects {} constructor arguments, got {}",
                artifact.contract_name(),
                parameters.len(),
                arguments.len(),
            );
        }

        for (parameter, argument) in parameters.iter().zip(&arguments) {
            if !argument.is_of_type(parameter.kind) {
                bail!(
                    "constructor argument '{}' should be of type {}, got {}",
                    parameter.name,
                    parameter.kind,
                    argument,
                );
            }
        }

        // Arguments are pushed last-first, so that the first one ends up on top of the stack.
        let mut redeem_bytecode = Vec::new();
        for argument in arguments.iter().rev() {
            argument.push(&mut redeem_bytecode);
        }
        redeem_bytecode.extend_from_slice(artifact.compiled_bytecode());

        Ok(Self {
            artifact,
            arguments,
            redeem_bytecode,
            predicate: Arc::new(predicate),
        })
    }

    /// Prepare the unlocking of one of this contract's outputs, through the given function.
    pub fn unlock(&self, function: impl Into<String>, arguments: Vec<Argument>) -> Unlocker {
        Unlocker::Contract(self.clone(), Call::new(function, arguments))
    }
}

// ------------------------------------------------------------------ Inspecting

impl Contract {
    pub fn name(&self) -> &str {
        self.artifact.contract_name()
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Look up a constructor argument by its declared name.
    pub fn argument(&self, name: &str) -> anyhow::Result<&Argument> {
        self.artifact
            .constructor_inputs()
            .iter()
            .position(|parameter| parameter.name == name)
            .and_then(|ix| self.arguments.get(ix))
            .with_context(|| format!("no constructor argument named '{name}'"))
    }

    pub fn redeem_bytecode(&self) -> &[u8] {
        &self.redeem_bytecode
    }

    pub fn script_hash(&self) -> Hash<32> {
        crypto::hash256(&self.redeem_bytecode)
    }

    pub fn locking_bytecode(&self) -> LockingBytecode {
        LockingBytecode::pay_to_script_hash32(self.script_hash())
    }

    pub fn address(&self, network: NetworkId) -> Address {
        Address::new(network, address::Payload::ScriptHash(self.script_hash()))
    }

    pub fn token_address(&self, network: NetworkId) -> Address {
        self.address(network).with_token_support(true)
    }

    pub(crate) fn predicate(&self) -> &dyn Predicate {
        self.predicate.as_ref()
    }
}
