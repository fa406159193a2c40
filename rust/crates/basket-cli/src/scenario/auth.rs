//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::scenario::{FUNDING, Session};
use anyhow::Context;
use cashtoken_tx_builder::{
    Address, Capability, Category, Commitment, Nft, Output, Token, TransactionId, Utxo,
};
use log::info;
use serde::Serialize;
use serde_with::{DisplayFromStr, serde_as};

/// Satoshis left as fee by the genesis transaction.
pub const GENESIS_FEE: u64 = 1_000;

#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde_as(as = "DisplayFromStr")]
    pub address: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub category: Category,
    #[serde_as(as = "DisplayFromStr")]
    pub transaction_id: TransactionId,
    #[serde_as(as = "DisplayFromStr")]
    pub auth_token: Utxo,
}

pub async fn run(session: &Session) -> anyhow::Result<Report> {
    let (transaction_id, auth_token) = mint(session).await?;
    let category = auth_token
        .token()
        .map(Token::category)
        .context("authentication output carries no token")?;

    Ok(Report {
        address: session.wallet().address(),
        category,
        transaction_id,
        auth_token,
    })
}

/// Spend a fresh funding output into a minting token of the category it creates.
pub async fn mint(session: &Session) -> anyhow::Result<(TransactionId, Utxo)> {
    let wallet = session.wallet();

    let funding = session.fund(FUNDING)?;
    let category = Category::from(funding.input().transaction_id());
    let token =
        Token::new(category, 0).with_nft(Nft::new(Capability::Minting, Commitment::empty()));

    let mut builder = session.builder();
    builder
        .add_input(funding.clone(), wallet.unlock_p2pkh())
        .add_output(
            Output::new(wallet.address(), funding.satoshis() - GENESIS_FEE).with_token(token),
        )?;

    let transaction = session.commit(&builder).await?;
    let auth_token = transaction
        .as_utxos()
        .into_iter()
        .next()
        .context("genesis transaction has no output")?;

    info!("minted authentication token of category {category}");

    Ok((transaction.id(), auth_token))
}
