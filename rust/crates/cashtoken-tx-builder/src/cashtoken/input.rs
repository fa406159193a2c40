//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{
    TransactionId,
    encoding::{self, Encode},
};
use std::fmt;

/// A reference to a past transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Input {
    transaction_id: TransactionId,
    output_index: u32,
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input({}#{})", self.transaction_id, self.output_index)
    }
}

// -------------------------------------------------------------------- Building

impl Input {
    /// See also [`input!`](crate::input).
    pub fn new(transaction_id: TransactionId, output_index: u32) -> Self {
        Self {
            transaction_id,
            output_index,
        }
    }
}

// ------------------------------------------------------------------ Inspecting

impl Input {
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn output_index(&self) -> u32 {
        self.output_index
    }
}

// -------------------------------------------------------------------- Encoding

/// The outpoint: transaction id in wire order, followed by the output index.
impl Encode for Input {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.transaction_id.to_wire_bytes());
        encoding::write_u32(buf, self.output_index);
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use crate::{Input, TransactionId, any, encoding::ToBytes, input};
    use proptest::prelude::*;

    // -------------------------------------------------------------- Unit tests

    #[test]
    fn display_input() {
        assert_eq!(
            input!(
                "702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce",
                42,
            )
            .to_string(),
            "Input(702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce#42)",
        );
    }

    #[test]
    fn encode_outpoint() {
        let bytes = input!(
            "00000000000000000000000000000000000000000000000000000000000000ff",
            1,
        )
        .to_bytes();
        assert_eq!(bytes.len(), 36);
        assert_eq!(bytes[0], 0xff);
        assert_eq!(&bytes[32..], &[1, 0, 0, 0]);
    }

    // -------------------------------------------------------------- Generators

    pub mod generators {
        use super::*;

        prop_compose! {
            pub fn input()(id in any::hash32(), ix in 0..16u32) -> Input {
                Input::new(TransactionId::from(id), ix)
            }
        }
    }
}
