//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

pub mod encoding;

mod error;
pub use error::{Error, Result};

mod cashtoken;
pub use cashtoken::{
    // Re-export types for easier consumption.
    //
    // NOTE: This main function of this comment is to force the formatter to put one import per
    // line in the following import list; making diffs and extensions easier.
    address::{self, Address},
    argument::{Argument, ArgumentType},
    artifact::{self, Artifact},
    category::Category,
    contract::{Call, Contract, Predicate},
    crypto::{
        self,
        ed25519::{Signature, SigningKey, VerificationKey},
    },
    hash::Hash,
    input::Input,
    ledger::{self, LedgerPolicy},
    locking_bytecode::{self, LockingBytecode},
    network_id::NetworkId,
    output::Output,
    provider::{self, MockProvider, Provider, ProviderDyn},
    script::{self, ScriptContext},
    token::{Capability, Commitment, Nft, Token},
    transaction::{self, Transaction, TransactionBuilder, TransactionId},
    unlock::{Unlocker, UnlockingProof},
    utxo::Utxo,
    value::Value,
    wallet::Wallet,
};

mod pretty;

#[cfg(any(test, feature = "test-utils"))]
pub mod any {
    pub use crate::cashtoken::{
        category::tests::generators::*, hash::tests::generators::*, input::tests::generators::*,
        locking_bytecode::tests::generators::*, output::tests::generators::*,
        token::tests::generators::*,
    };
    pub use proptest::prelude::any;
}
