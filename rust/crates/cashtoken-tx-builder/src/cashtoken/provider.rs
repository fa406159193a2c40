//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{LockingBytecode, NetworkId, Result, Transaction, TransactionId, Utxo};
use trait_variant::make;

mod mock;
pub use mock::{MockProvider, random_nft, random_token, random_transaction_id};

/// The source of truth for spendable outputs.
///
/// A provider is the final authority on acceptance: it must reject any transaction spending an
/// output that is unknown or already consumed, whatever the order in which competing
/// transactions reach it.
#[make(ProviderDyn: Send)]
pub trait Provider {
    fn network(&self) -> NetworkId;

    /// The unspent outputs locked by the given bytecode, as currently known to the provider.
    ///
    /// This is a snapshot: outputs created by recently submitted transactions may only show up
    /// once the provider has applied them.
    async fn utxos_at(&self, locking_bytecode: &LockingBytecode) -> Result<Vec<Utxo>>;

    /// Hand over a transaction for validation and broadcast. A rejection is final.
    async fn submit(&self, transaction: &Transaction) -> Result<TransactionId>;
}
