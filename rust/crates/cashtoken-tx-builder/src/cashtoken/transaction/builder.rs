//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{
    Error, LedgerPolicy, Output, Provider, Result, Transaction, TransactionId, Unlocker, Utxo,
    ledger, script, transaction::DEFAULT_VERSION,
};
use log::{debug, info, warn};
use std::collections::BTreeSet;

/// Assembles a transaction from UTXOs and outputs, in the exact order they are added.
///
/// Outputs are checked as soon as they are added. Authorization and ledger rules are checked when
/// the transaction is built; nothing reaches the provider unless they all pass.
pub struct TransactionBuilder<'p, P> {
    provider: &'p P,
    version: u32,
    locktime: u32,
    policy: LedgerPolicy,
    inputs: Vec<(Utxo, Unlocker)>,
    outputs: Vec<Output>,
}

// -------------------------------------------------------------------- Building

impl<'p, P: Provider> TransactionBuilder<'p, P> {
    pub fn new(provider: &'p P) -> Self {
        Self {
            provider,
            version: DEFAULT_VERSION,
            locktime: 0,
            policy: LedgerPolicy::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn add_input(&mut self, utxo: Utxo, unlocker: Unlocker) -> &mut Self {
        self.inputs.push((utxo, unlocker));
        self
    }

    pub fn add_inputs(&mut self, inputs: impl IntoIterator<Item = (Utxo, Unlocker)>) -> &mut Self {
        self.inputs.extend(inputs);
        self
    }

    /// Append an output, rejecting it right away when malformed.
    pub fn add_output(&mut self, output: Output) -> Result<&mut Self> {
        output
            .validate()
            .map_err(|e| Error::malformed(self.outputs.len(), format!("{e:#}")))?;
        self.outputs.push(output);
        Ok(self)
    }

    pub fn add_outputs(&mut self, outputs: impl IntoIterator<Item = Output>) -> Result<&mut Self> {
        for output in outputs {
            self.add_output(output)?;
        }
        Ok(self)
    }

    pub fn with_locktime(&mut self, locktime: u32) -> &mut Self {
        self.locktime = locktime;
        self
    }

    pub fn with_version(&mut self, version: u32) -> &mut Self {
        self.version = version;
        self
    }

    pub fn with_max_fee(&mut self, limit: u64) -> &mut Self {
        self.policy.max_fee = Some(limit);
        self
    }

    /// Allow tokens found in inputs to be destroyed by leaving them out of the outputs.
    pub fn with_implicit_burn(&mut self, allow: bool) -> &mut Self {
        self.policy.allow_implicit_burn = allow;
        self
    }
}

// ------------------------------------------------------------------ Finalizing

impl<'p, P: Provider> TransactionBuilder<'p, P> {
    /// Serialize, unlock and validate the transaction, without submitting it.
    pub fn build(&self) -> Result<Transaction> {
        if self.inputs.is_empty() {
            return Err(Error::insufficient_funds("transaction has no inputs"));
        }

        let mut seen = BTreeSet::new();
        for (utxo, _) in &self.inputs {
            if !seen.insert(*utxo.input()) {
                return Err(Error::DoubleSpend {
                    input: *utxo.input(),
                });
            }
        }

        let spent_outputs: Vec<Output> = self
            .inputs
            .iter()
            .map(|(utxo, _)| utxo.output().clone())
            .collect();

        let unsigned = Transaction::new(
            self.version,
            self.inputs.iter().map(|(utxo, _)| *utxo.input()).collect(),
            self.outputs.clone(),
            self.locktime,
        )
        .with_policy(self.policy);

        let proofs = self
            .inputs
            .iter()
            .enumerate()
            .map(|(index, (utxo, unlocker))| {
                unlocker.unlock(&unsigned.signature_hash(index, utxo.output()))
            })
            .collect();

        let transaction = unsigned
            .with_proofs(proofs)
            .with_spent_outputs(spent_outputs);

        script::evaluate_transaction(&transaction, transaction.spent_outputs())?;
        let fee = ledger::validate(&transaction, transaction.spent_outputs())?;

        debug!("built transaction {} (fee = {fee} sats)", transaction.id());

        Ok(transaction)
    }

    /// Build the transaction and hand it over to the provider.
    pub async fn send(&self) -> Result<TransactionId> {
        let transaction = self.build()?;

        match self.provider.submit(&transaction).await {
            Ok(id) => {
                info!("sent transaction {id}");
                Ok(id)
            }
            Err(e) => {
                warn!("provider rejected transaction {}: {e}", transaction.id());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Capability, Category, Commitment, Error, LockingBytecode, MockProvider, NetworkId, Nft,
        Output, Provider, SigningKey, Token, TransactionBuilder, Unlocker, Utxo, Value, any,
        provider::random_token,
    };
    use proptest::prelude::*;

    fn owner() -> SigningKey {
        SigningKey::from([9; 32])
    }

    fn wallet() -> LockingBytecode {
        owner().to_verification_key().to_locking_bytecode()
    }

    fn sign() -> Unlocker {
        Unlocker::signature(owner())
    }

    #[test]
    fn reject_malformed_output_when_added() {
        let provider = MockProvider::default();
        let mut builder = TransactionBuilder::new(&provider);
        let result = builder.add_output(Output::new(wallet(), 1_000).with_token(random_token(0)));
        assert!(matches!(result, Err(Error::MalformedOutput { index: 0, .. })));
    }

    #[test]
    fn reject_negative_fee() {
        let provider = MockProvider::default();
        let funding = provider.add_utxo(Output::new(wallet(), 1_000)).unwrap();
        let result = TransactionBuilder::new(&provider)
            .add_input(funding, sign())
            .add_output(Output::new(wallet(), 1_001))
            .unwrap()
            .build();
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
    }

    #[test]
    fn reject_empty_and_duplicate_inputs() {
        let provider = MockProvider::default();
        assert!(matches!(
            TransactionBuilder::new(&provider).build(),
            Err(Error::InsufficientFunds { .. })
        ));

        let funding = provider.add_utxo(Output::new(wallet(), 1_000)).unwrap();
        let result = TransactionBuilder::new(&provider)
            .add_input(funding.clone(), sign())
            .add_input(funding, sign())
            .build();
        assert!(matches!(result, Err(Error::DoubleSpend { .. })));
    }

    #[test]
    fn preserve_ordering() {
        let provider = MockProvider::default();
        let a = provider.add_utxo(Output::new(wallet(), 1_000)).unwrap();
        let b = provider.add_utxo(Output::new(wallet(), 2_000)).unwrap();
        let tx = TransactionBuilder::new(&provider)
            .add_input(b.clone(), sign())
            .add_input(a.clone(), sign())
            .add_outputs([Output::new(wallet(), 500), Output::new(wallet(), 2_000)])
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(tx.inputs(), &[*b.input(), *a.input()]);
        assert_eq!(tx.outputs()[0].satoshis(), 500);
        assert_eq!(tx.outputs()[1].satoshis(), 2_000);
    }

    #[tokio::test]
    async fn rejected_transactions_leave_no_trace() {
        let provider = MockProvider::default();
        let funding = provider
            .add_utxo(Output::new(wallet(), 10_000).with_token(random_token(10)))
            .unwrap();

        let result = TransactionBuilder::new(&provider)
            .add_input(funding.clone(), sign())
            .add_output(Output::new(wallet(), 9_000))
            .unwrap()
            .send()
            .await;

        assert!(matches!(result, Err(Error::TokenConservation { .. })));
        assert_eq!(provider.utxos_at(&wallet()).await, Ok(vec![funding]));
    }

    /// Mint an authentication token, then spend it into itself, an immutable child and change.
    #[tokio::test]
    async fn minting_flow() {
        const FEE: u64 = 23_000;

        let provider = MockProvider::new(NetworkId::Simulated);
        let funding = provider.add_utxo(Output::new(wallet(), 10_000_000)).unwrap();
        let category = Category::from(funding.input().transaction_id());
        let auth = Token::new(category, 0).with_nft(Nft::new(Capability::Minting, Commitment::empty()));

        let genesis = TransactionBuilder::new(&provider)
            .add_input(funding.clone(), sign())
            .add_output(Output::new(wallet(), 10_000_000 - 1_000).with_token(auth.clone()))
            .unwrap()
            .send()
            .await
            .unwrap();

        let minted = provider.utxos_at(&wallet()).await.unwrap();
        assert_eq!(minted.len(), 1);
        assert_eq!(minted[0].input().transaction_id(), genesis);
        assert_eq!(minted[0].token(), Some(&auth));

        let before = minted[0].satoshis();
        let child = Token::new(category, 0).with_nft(Nft::new(Capability::None, Commitment::empty()));
        TransactionBuilder::new(&provider)
            .add_input(minted[0].clone(), sign())
            .add_outputs([
                Output::new(wallet(), before - FEE - 20_000),
                Output::new(wallet(), 10_000).with_token(auth.clone()),
                Output::new(wallet(), 10_000).with_token(child.clone()),
            ])
            .unwrap()
            .send()
            .await
            .unwrap();

        let utxos = provider.utxos_at(&wallet()).await.unwrap();
        assert_eq!(utxos.len(), 3);
        assert_eq!(utxos[0].token(), None);

        let tokens: Vec<_> = utxos.iter().filter_map(Utxo::token).cloned().collect();
        assert_eq!(tokens, vec![auth, child.clone()]);

        let total: u64 = utxos.iter().map(Utxo::satoshis).sum();
        assert_eq!(total, before - FEE);

        // An immutable token cannot be multiplied.
        let result = TransactionBuilder::new(&provider)
            .add_input(utxos[2].clone(), sign())
            .add_outputs([
                Output::new(wallet(), 1_000).with_token(child.clone()),
                Output::new(wallet(), 1_000).with_token(child.clone()),
                Output::new(wallet(), 1_000).with_token(child),
            ])
            .unwrap()
            .send()
            .await;
        assert!(matches!(result, Err(Error::Capability { .. })));
    }

    #[tokio::test]
    async fn outputs_round_trip_into_inputs() {
        let provider = MockProvider::default();
        let funding = provider
            .add_utxo(Output::new(wallet(), 50_000).with_token(random_token(7)))
            .unwrap();
        let output = Output::new(wallet(), 49_000).with_token(funding.token().cloned().unwrap());

        let mut builder = TransactionBuilder::new(&provider);
        builder.add_input(funding, sign()).add_output(output.clone()).unwrap();
        let tx = builder.build().unwrap();
        provider.submit(&tx).await.unwrap();

        let created = tx.as_utxos();
        let visible = provider.utxos_at(&wallet()).await.unwrap();
        assert_eq!(visible, created);
        assert_eq!(visible[0].output(), &output);
    }

    proptest! {
        #[test]
        fn accepted_transactions_never_create_satoshis(
            amounts in proptest::collection::vec(1_000..1_000_000u64, 1..4),
            spend in 0..4_000_000u64,
        ) {
            let provider = MockProvider::default();
            let utxos: Vec<_> = amounts
                .iter()
                .map(|sats| provider.add_utxo(Output::new(wallet(), *sats)).unwrap())
                .collect();

            let mut builder = TransactionBuilder::new(&provider);
            builder.add_inputs(utxos.iter().cloned().map(|utxo| (utxo, sign())));
            builder.add_output(Output::new(wallet(), spend)).unwrap();

            let total_in: u64 = amounts.iter().sum();
            match builder.build() {
                Ok(tx) => {
                    let total_out = Value::total(tx.outputs()).unwrap().satoshis();
                    prop_assert!(total_out <= total_in);
                }
                Err(e) => {
                    prop_assert!(spend > total_in);
                    prop_assert!(matches!(e, Error::InsufficientFunds { .. }), "{e}");
                }
            }
        }
    }

    proptest! {
        #[test]
        fn well_formed_token_outputs_are_accepted_by_builder(output in any::output()) {
            let provider = MockProvider::default();
            prop_assert!(TransactionBuilder::new(&provider).add_output(output).is_ok());
        }
    }
}
