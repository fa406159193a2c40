//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Hash, TransactionId};
use std::{fmt, str::FromStr};

/// The identifier grouping every token of one logical type.
///
/// A category is the id of the transaction whose output 0 was spent to create it. Internally, and
/// in every textual representation, it is kept in transaction-id (display) order. Within
/// serialized outputs and bytecode it appears byte-reversed; see [`Self::to_wire_bytes`] and
/// [`Self::from_wire_bytes`], which are the only places where this conversion happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Category(Hash<32>);

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ------------------------------------------------------------------ Inspecting

impl Category {
    pub fn to_wire_bytes(&self) -> [u8; 32] {
        <[u8; 32]>::from(self.0.reversed())
    }

    /// Whether spending the given outpoint creates this category.
    pub fn is_created_by(&self, transaction_id: &TransactionId, output_index: u32) -> bool {
        output_index == 0 && transaction_id == &TransactionId::from(*self)
    }
}

// ----------------------------------------------------------- Converting (from)

impl Category {
    pub fn from_wire_bytes(bytes: [u8; 32]) -> Self {
        Self(Hash::from(bytes).reversed())
    }
}

impl From<Hash<32>> for Category {
    fn from(hash: Hash<32>) -> Self {
        Self(hash)
    }
}

impl From<TransactionId> for Category {
    fn from(id: TransactionId) -> Self {
        Self(Hash::from(id))
    }
}

impl TryFrom<&str> for Category {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> anyhow::Result<Self> {
        Ok(Self(Hash::try_from(s)?))
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::try_from(s)
    }
}

// ------------------------------------------------------------- Converting (to)

impl From<Category> for Hash<32> {
    fn from(category: Category) -> Self {
        category.0
    }
}

impl From<Category> for TransactionId {
    fn from(category: Category) -> Self {
        TransactionId::from(category.0)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use crate::{Category, TransactionId, any, category};
    use proptest::prelude::*;

    // -------------------------------------------------------------- Unit tests

    #[test]
    fn wire_order_is_reversed() {
        let category =
            category!("00000000000000000000000000000000000000000000000000000000000000ff");
        assert_eq!(category.to_wire_bytes()[0], 0xff);
        assert_eq!(category.to_wire_bytes()[31], 0x00);
    }

    #[test]
    fn created_by_output_zero_only() {
        let category =
            category!("702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce");
        let id = TransactionId::from(category);
        assert!(category.is_created_by(&id, 0));
        assert!(!category.is_created_by(&id, 1));
    }

    // -------------------------------------------------------------- Properties

    proptest! {
        #[test]
        fn wire_roundtrip(category in any::category()) {
            prop_assert_eq!(Category::from_wire_bytes(category.to_wire_bytes()), category);
        }
    }

    // -------------------------------------------------------------- Generators

    pub mod generators {
        use super::*;

        pub fn category() -> impl Strategy<Value = Category> {
            any::hash32().prop_map(Category::from)
        }
    }
}
