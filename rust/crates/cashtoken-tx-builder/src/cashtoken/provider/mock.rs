//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{
    Capability, Category, Commitment, Error, Hash, Input, LockingBytecode, NetworkId, Nft,
    Output, ProviderDyn, Result, Token, Transaction, TransactionId, Utxo, ledger, script,
};
use anyhow::bail;
use log::{info, warn};
use rand::RngCore;
use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, MutexGuard},
};

/// An in-memory provider, standing in for a chain.
///
/// Submitted transactions are fully re-validated (authorization and ledger rules) before being
/// applied. Depending on [`Self::with_update_utxo_set`], their outputs become spendable either
/// immediately, or only once [`Self::confirm`] is called. Their inputs are consumed immediately
/// in both cases.
#[derive(Debug, Clone)]
pub struct MockProvider {
    network: NetworkId,
    update_utxo_set: bool,
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    /// Unspent and visible, in insertion order.
    utxos: Vec<Utxo>,
    /// Created by accepted transactions, not visible yet.
    pending: Vec<Utxo>,
    spent: BTreeSet<Input>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(NetworkId::default())
    }
}

// -------------------------------------------------------------------- Building

impl MockProvider {
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            update_utxo_set: true,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn with_update_utxo_set(mut self, update_utxo_set: bool) -> Self {
        self.update_utxo_set = update_utxo_set;
        self
    }

    /// Seed an output under a fresh, random transaction id, at index 0.
    pub fn add_utxo(&self, output: Output) -> Result<Utxo> {
        let utxo = random_utxo(output);
        self.state()?.utxos.push(utxo.clone());
        Ok(utxo)
    }

    /// Seed an output at a chosen outpoint.
    pub fn add_utxo_at(&self, input: Input, output: Output) -> anyhow::Result<Utxo> {
        let mut state = self.state()?;

        if state.spent.contains(&input) || state.find(&input).is_some() {
            bail!("{input} already exists");
        }

        let utxo = Utxo::new(input, output);
        state.utxos.push(utxo.clone());
        Ok(utxo)
    }

    /// Make the outputs of every accepted transaction spendable. Returns how many outputs were
    /// applied.
    pub fn confirm(&self) -> Result<usize> {
        let mut state = self.state()?;
        let pending = std::mem::take(&mut state.pending);
        let confirmed = pending.len();
        state.utxos.extend(pending);
        Ok(confirmed)
    }
}

// ------------------------------------------------------------------ Inspecting

impl MockProvider {
    pub fn is_spent(&self, input: &Input) -> Result<bool> {
        Ok(self.state()?.spent.contains(input))
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Provider("mock provider state poisoned".to_string()))
    }
}

impl State {
    fn find(&self, input: &Input) -> Option<&Utxo> {
        self.utxos
            .iter()
            .chain(self.pending.iter())
            .find(|utxo| utxo.input() == input)
    }

    /// Check and apply a transaction atomically; nothing changes on rejection.
    fn apply(&mut self, transaction: &Transaction, update_utxo_set: bool) -> Result<u64> {
        let mut seen = BTreeSet::new();
        let mut spent_outputs = Vec::with_capacity(transaction.inputs().len());

        for (index, input) in transaction.inputs().iter().enumerate() {
            if self.spent.contains(input) || !seen.insert(*input) {
                return Err(Error::DoubleSpend { input: *input });
            }

            let utxo = self
                .utxos
                .iter()
                .find(|utxo| utxo.input() == input)
                .ok_or_else(|| Error::unknown_input(*input, "no such unspent output"))?;

            if transaction.spent_outputs().get(index) != Some(utxo.output()) {
                return Err(Error::unknown_input(
                    *input,
                    "spent output differs from record",
                ));
            }

            spent_outputs.push(utxo.output().clone());
        }

        script::evaluate_transaction(transaction, &spent_outputs)?;
        let fee = ledger::validate(transaction, &spent_outputs)?;

        self.utxos.retain(|utxo| !seen.contains(utxo.input()));
        self.spent.extend(seen);

        let created = transaction.as_utxos();
        if update_utxo_set {
            self.utxos.extend(created);
        } else {
            self.pending.extend(created);
        }

        Ok(fee)
    }
}

impl ProviderDyn for MockProvider {
    fn network(&self) -> NetworkId {
        self.network
    }

    async fn utxos_at(&self, locking_bytecode: &LockingBytecode) -> Result<Vec<Utxo>> {
        Ok(self
            .state()?
            .utxos
            .iter()
            .filter(|utxo| utxo.locking_bytecode() == locking_bytecode)
            .cloned()
            .collect())
    }

    async fn submit(&self, transaction: &Transaction) -> Result<TransactionId> {
        let id = transaction.id();

        let outcome = self.state()?.apply(transaction, self.update_utxo_set);

        match outcome {
            Ok(fee) => {
                info!("accepted transaction {id} (fee = {fee} sats)");
                Ok(id)
            }
            Err(e) => {
                warn!("rejected transaction {id}: {e}");
                Err(e)
            }
        }
    }
}

// -------------------------------------------------------------------- Fixtures

pub fn random_transaction_id() -> TransactionId {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    TransactionId::from(Hash::from(bytes))
}

/// An output under a fresh, random transaction id, at index 0.
pub fn random_utxo(output: Output) -> Utxo {
    Utxo::new(Input::new(random_transaction_id(), 0), output)
}

/// A fungible token of a fresh, random category.
pub fn random_token(amount: u64) -> Token {
    Token::new(Category::from(random_transaction_id()), amount)
}

/// A pure NFT of a fresh, random category.
pub fn random_nft(capability: Capability, commitment: Commitment) -> Token {
    random_token(0).with_nft(Nft::new(capability, commitment))
}
