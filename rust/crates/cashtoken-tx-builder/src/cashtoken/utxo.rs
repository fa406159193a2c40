//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Input, LockingBytecode, Output, Token};
use std::fmt;

/// An unspent output, together with the reference under which it can be spent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Utxo {
    input: Input,
    output: Output,
}

impl fmt::Display for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Utxo({} => {})", self.input, self.output)
    }
}

impl Utxo {
    pub fn new(input: Input, output: Output) -> Self {
        Self { input, output }
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn satoshis(&self) -> u64 {
        self.output.satoshis()
    }

    pub fn token(&self) -> Option<&Token> {
        self.output.token()
    }

    pub fn locking_bytecode(&self) -> &LockingBytecode {
        self.output.locking_bytecode()
    }
}

impl From<Utxo> for (Input, Output) {
    fn from(utxo: Utxo) -> Self {
        (utxo.input, utxo.output)
    }
}
