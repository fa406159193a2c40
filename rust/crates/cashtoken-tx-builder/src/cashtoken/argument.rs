//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Category, Hash, LockingBytecode, Signature, VerificationKey, encoding};
use anyhow::anyhow;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::{fmt, str::FromStr};

/// The declared type of a contract parameter, as found in template artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub enum ArgumentType {
    Int,
    Bool,
    Bytes,
    BytesN(usize),
    PubKey,
    Sig,
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("int"),
            Self::Bool => f.write_str("bool"),
            Self::Bytes => f.write_str("bytes"),
            Self::BytesN(n) => write!(f, "bytes{n}"),
            Self::PubKey => f.write_str("pubkey"),
            Self::Sig => f.write_str("sig"),
        }
    }
}

impl FromStr for ArgumentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "int" => Ok(Self::Int),
            "bool" => Ok(Self::Bool),
            "bytes" => Ok(Self::Bytes),
            "pubkey" => Ok(Self::PubKey),
            "sig" => Ok(Self::Sig),
            _ => s
                .strip_prefix("bytes")
                .and_then(|n| n.parse().ok())
                .filter(|n| (1..=64).contains(n))
                .map(Self::BytesN)
                .ok_or_else(|| anyhow!("unknown argument type '{s}'")),
        }
    }
}

/// A concrete value passed to a contract, either at instantiation or when calling one of its
/// functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Int(i64),
    Bool(bool),
    Bytes(Vec<u8>),
    PubKey(VerificationKey),
    Sig(Signature),
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Self::PubKey(key) => write!(f, "0x{key}"),
            Self::Sig(signature) => write!(f, "0x{signature}"),
        }
    }
}

// ------------------------------------------------------------------ Inspecting

impl Argument {
    /// Whether this argument is acceptable where the given type is expected.
    pub fn is_of_type(&self, expected: ArgumentType) -> bool {
        match (self, expected) {
            (Self::Int(..), ArgumentType::Int)
            | (Self::Bool(..), ArgumentType::Bool)
            | (Self::Bytes(..), ArgumentType::Bytes)
            | (Self::PubKey(..), ArgumentType::PubKey)
            | (Self::Sig(..), ArgumentType::Sig) => true,
            (Self::Bytes(bytes), ArgumentType::BytesN(n)) => bytes.len() == n,
            _ => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::PubKey(key) => Some(key.as_ref()),
            Self::Sig(signature) => Some(signature.as_ref()),
            _ => None,
        }
    }

    /// Interpret a 32-byte argument as a category, given in wire order like any bytecode value.
    pub fn as_category(&self) -> Option<Category> {
        self.as_bytes()
            .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
            .map(Category::from_wire_bytes)
    }

    pub fn as_locking_bytecode(&self) -> Option<LockingBytecode> {
        match self {
            Self::Bytes(bytes) => Some(LockingBytecode::from(bytes.clone())),
            _ => None,
        }
    }
}

// -------------------------------------------------------------------- Encoding

impl Argument {
    /// Append the push operation placing this argument on the stack.
    pub fn push(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Int(n) => encoding::push_int(buf, *n),
            Self::Bool(b) => encoding::push_int(buf, i64::from(*b)),
            Self::Bytes(bytes) => encoding::push_data(buf, bytes),
            Self::PubKey(key) => encoding::push_data(buf, key.as_ref()),
            Self::Sig(signature) => encoding::push_data(buf, signature.as_ref()),
        }
    }
}

// ----------------------------------------------------------- Converting (from)

impl From<i64> for Argument {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Argument {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<u8>> for Argument {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Argument {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

/// Categories are passed in wire order, the way scripts compare them against token data.
impl From<Category> for Argument {
    fn from(category: Category) -> Self {
        Self::Bytes(category.to_wire_bytes().to_vec())
    }
}

impl<const SIZE: usize> From<Hash<SIZE>> for Argument {
    fn from(hash: Hash<SIZE>) -> Self {
        Self::Bytes(hash.as_ref().to_vec())
    }
}

impl From<&LockingBytecode> for Argument {
    fn from(bytecode: &LockingBytecode) -> Self {
        Self::Bytes(bytecode.as_bytes().to_vec())
    }
}

impl From<VerificationKey> for Argument {
    fn from(key: VerificationKey) -> Self {
        Self::PubKey(key)
    }
}

impl From<Signature> for Argument {
    fn from(signature: Signature) -> Self {
        Self::Sig(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::{Argument, ArgumentType};
    use crate::category;

    #[test]
    fn parse_argument_types() {
        assert_eq!("int".parse::<ArgumentType>().ok(), Some(ArgumentType::Int));
        assert_eq!("bytes32".parse::<ArgumentType>().ok(), Some(ArgumentType::BytesN(32)));
        assert!("bytes0".parse::<ArgumentType>().is_err());
        assert!("string".parse::<ArgumentType>().is_err());
    }

    #[test]
    fn type_checking() {
        assert!(Argument::Int(42).is_of_type(ArgumentType::Int));
        assert!(!Argument::Int(42).is_of_type(ArgumentType::Bytes));
        assert!(Argument::Bytes(vec![0; 32]).is_of_type(ArgumentType::BytesN(32)));
        assert!(!Argument::Bytes(vec![0; 20]).is_of_type(ArgumentType::BytesN(32)));
    }

    #[test]
    fn category_arguments_use_wire_order() {
        let category =
            category!("702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce");
        let argument = Argument::from(category);
        assert_eq!(argument.as_bytes().map(|b| b[0]), Some(0xce));
        assert_eq!(argument.as_category(), Some(category));
    }

    #[test]
    fn push_arguments() {
        let mut buf = Vec::new();
        Argument::Bool(true).push(&mut buf);
        Argument::Int(100).push(&mut buf);
        Argument::Bytes(vec![0xab, 0xcd]).push(&mut buf);
        assert_eq!(hex::encode(buf), "51016402abcd");
    }
}
