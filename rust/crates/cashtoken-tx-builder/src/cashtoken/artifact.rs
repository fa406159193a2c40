//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::ArgumentType;
use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

/// A compiled contract template: its parameters, its callable functions and its bytecode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    contract_name: String,
    constructor_inputs: Vec<Parameter>,
    abi: Vec<Function>,
    /// Human-readable rendition of the bytecode; informative only.
    #[serde(default)]
    bytecode: String,
    debug: DebugInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ArgumentType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<Parameter>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct DebugInfo {
    #[serde_as(as = "Hex")]
    bytecode: Vec<u8>,
}

// -------------------------------------------------------------------- Building

impl Artifact {
    pub fn new(
        contract_name: impl Into<String>,
        constructor_inputs: Vec<Parameter>,
        abi: Vec<Function>,
        compiled_bytecode: Vec<u8>,
    ) -> Self {
        Self {
            contract_name: contract_name.into(),
            constructor_inputs,
            abi,
            bytecode: String::new(),
            debug: DebugInfo {
                bytecode: compiled_bytecode,
            },
        }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let artifact: Self = serde_json::from_str(json).context("malformed contract artifact")?;

        if artifact.abi.is_empty() {
            return Err(anyhow!("contract '{}' declares no function", artifact.contract_name));
        }

        Ok(artifact)
    }
}

// ------------------------------------------------------------------ Inspecting

impl Artifact {
    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    pub fn constructor_inputs(&self) -> &[Parameter] {
        &self.constructor_inputs
    }

    pub fn abi(&self) -> &[Function] {
        &self.abi
    }

    /// Look up a function by name, alongside its selector (its position in the ABI).
    pub fn function(&self, name: &str) -> Option<(usize, &Function)> {
        self.abi.iter().enumerate().find(|(_, function)| function.name == name)
    }

    pub fn compiled_bytecode(&self) -> &[u8] {
        &self.debug.bytecode
    }
}

#[cfg(test)]
mod tests {
    use super::Artifact;
    use crate::ArgumentType;

    const ARTIFACT: &str = r#"{
        "contractName": "Holdings",
        "constructorInputs": [
            { "name": "outflowCategory", "type": "bytes32" },
            { "name": "assetCategory", "type": "bytes32" },
            { "name": "assetAmount", "type": "int" }
        ],
        "abi": [
            { "name": "release", "inputs": [] },
            { "name": "prove", "inputs": [{ "name": "index", "type": "int" }] }
        ],
        "bytecode": "OP_3 OP_PICK OP_EQUAL",
        "debug": { "bytecode": "53798777" }
    }"#;

    #[test]
    fn parse_artifact() {
        let artifact = Artifact::from_json(ARTIFACT).unwrap();
        assert_eq!(artifact.contract_name(), "Holdings");
        assert_eq!(artifact.constructor_inputs().len(), 3);
        assert_eq!(artifact.constructor_inputs()[0].kind, ArgumentType::BytesN(32));
        assert_eq!(artifact.compiled_bytecode(), &[0x53, 0x79, 0x87, 0x77]);
        assert_eq!(artifact.function("prove").map(|(ix, _)| ix), Some(1));
        assert!(artifact.function("mint").is_none());
    }

    #[test]
    fn reject_malformed_artifacts() {
        assert!(Artifact::from_json("{}").is_err());
        assert!(
            Artifact::from_json(
                r#"{"contractName":"X","constructorInputs":[],"abi":[],"debug":{"bytecode":""}}"#
            )
            .is_err()
        );
        assert!(
            Artifact::from_json(
                r#"{"contractName":"X","constructorInputs":[{"name":"a","type":"float"}],"abi":[{"name":"f"}],"debug":{"bytecode":""}}"#
            )
            .is_err()
        );
    }
}
