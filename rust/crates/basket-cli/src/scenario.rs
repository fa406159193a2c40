//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use cashtoken_tx_builder::{
    MockProvider, NetworkId, Output, Provider, Transaction, TransactionBuilder, Utxo, Wallet,
};
use log::debug;

pub mod auth;
pub mod compose;
pub mod minting;

/// Satoshis of the output funding a scenario.
pub const FUNDING: u64 = 10_000_000;

/// A simulated chain, and the wallet driving a scenario on it.
#[derive(Debug, Clone)]
pub struct Session {
    provider: MockProvider,
    wallet: Wallet,
    allow_implicit_burn: bool,
}

impl Session {
    pub fn new(provider: MockProvider, wallet: Wallet) -> Self {
        Self {
            provider,
            wallet,
            allow_implicit_burn: false,
        }
    }

    pub fn with_implicit_burn(mut self, allow: bool) -> Self {
        self.allow_implicit_burn = allow;
        self
    }

    pub fn provider(&self) -> &MockProvider {
        &self.provider
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn network(&self) -> NetworkId {
        self.wallet.network()
    }

    /// Seed the wallet with a fresh output, at index 0 of its transaction.
    pub fn fund(&self, satoshis: u64) -> anyhow::Result<Utxo> {
        Ok(self
            .provider
            .add_utxo(Output::new(self.wallet.address(), satoshis))?)
    }

    /// A transaction builder, carrying the session's burn permission.
    pub fn builder(&self) -> TransactionBuilder<'_, MockProvider> {
        let mut builder = TransactionBuilder::new(&self.provider);
        builder.with_implicit_burn(self.allow_implicit_burn);
        builder
    }

    /// Build and submit a transaction, then wait until its outputs can be spent.
    pub async fn commit(
        &self,
        builder: &TransactionBuilder<'_, MockProvider>,
    ) -> anyhow::Result<Transaction> {
        let transaction = builder.build()?;
        self.provider.submit(&transaction).await?;

        let confirmed = self.provider.confirm()?;
        debug!("{confirmed} outputs confirmed");

        Ok(transaction)
    }

    /// The outputs currently spendable by the wallet.
    pub async fn wallet_utxos(&self) -> anyhow::Result<Vec<Utxo>> {
        Ok(self
            .provider
            .utxos_at(&self.wallet.locking_bytecode())
            .await?)
    }
}
