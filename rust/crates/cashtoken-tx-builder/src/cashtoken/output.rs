//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{
    LockingBytecode, Token,
    encoding::{self, Encode, ToBytes},
};
use std::fmt;

/// A locking condition holding satoshis and, optionally, one token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Output {
    locking_bytecode: LockingBytecode,
    satoshis: u64,
    token: Option<Token>,
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Output({}, {} sats", self.locking_bytecode, self.satoshis)?;
        if let Some(token) = &self.token {
            write!(f, ", {token}")?;
        }
        f.write_str(")")
    }
}

// -------------------------------------------------------------------- Building

impl Output {
    /// See also [`output!`](crate::output).
    pub fn new(to: impl Into<LockingBytecode>, satoshis: u64) -> Self {
        Self {
            locking_bytecode: to.into(),
            satoshis,
            token: None,
        }
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

}

// ------------------------------------------------------------------ Inspecting

impl Output {
    pub fn locking_bytecode(&self) -> &LockingBytecode {
        &self.locking_bytecode
    }

    pub fn satoshis(&self) -> u64 {
        self.satoshis
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Shape constraints enforced on every output, regardless of the transaction it belongs to.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(token) = &self.token {
            token.validate()?;
        }

        Ok(())
    }
}

// -------------------------------------------------------------------- Encoding

/// Satoshis, then the length-prefixed concatenation of the token prefix and locking bytecode.
impl Encode for Output {
    fn encode(&self, buf: &mut Vec<u8>) {
        encoding::write_u64(buf, self.satoshis);

        let mut script = self.token.as_ref().map(Token::to_bytes).unwrap_or_default();
        script.extend_from_slice(self.locking_bytecode.as_bytes());
        encoding::write_var_bytes(buf, &script);
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use crate::{Capability, LockingBytecode, Output, any, category, encoding::ToBytes, hash, token};
    use proptest::prelude::*;

    // -------------------------------------------------------------- Unit tests

    #[test]
    fn encode_plain_output() {
        let output = Output::new(
            LockingBytecode::pay_to_public_key_hash(hash!("00112233445566778899aabbccddeeff00112233")),
            1000,
        );
        assert_eq!(
            hex::encode(output.to_bytes()),
            "e803000000000000\
             19\
             76a91400112233445566778899aabbccddeeff0011223388ac",
        );
    }

    #[test]
    fn encode_token_output() {
        let category =
            category!("00000000000000000000000000000000000000000000000000000000000000ff");
        let output = Output::new(
            LockingBytecode::pay_to_public_key_hash(hash!("00112233445566778899aabbccddeeff00112233")),
            1000,
        )
        .with_token(token!(category, 0, Capability::Minting, ""));

        let bytes = output.to_bytes();
        // 1 prefix + 32 category + 1 bitfield + 25 bytecode
        assert_eq!(bytes[8], 59);
        assert_eq!(bytes[9], 0xef);
    }

    #[test]
    fn reject_empty_token() {
        let category =
            category!("702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce");
        let output = Output::new(LockingBytecode::from(vec![]), 1000).with_token(token!(category, 0));
        assert!(output.validate().is_err());
    }

    // -------------------------------------------------------------- Generators

    pub mod generators {
        use super::*;
        use crate::locking_bytecode::tests::generators::locking_bytecode;

        prop_compose! {
            pub fn output()(
                locking_bytecode in locking_bytecode(),
                satoshis in 546..100_000_000u64,
                token in proptest::option::of(any::token()),
            ) -> Output {
                let output = Output::new(locking_bytecode, satoshis);
                match token {
                    Some(token) => output.with_token(token),
                    None => output,
                }
            }
        }
    }
}
