//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::scenario::{Session, auth};
use anyhow::{Context, anyhow, bail, ensure};
use cashtoken_tx_builder::{Capability, Category, Commitment, Error, Nft, Output, Utxo};
use log::info;
use serde::Serialize;
use serde_with::{DisplayFromStr, serde_as};
use std::iter;

/// Satoshis spent in fees when deriving tokens from the authentication token.
pub const FEE: u64 = 23_000;

/// Satoshis carried by each token output.
pub const TOKEN_SATOSHIS: u64 = 10_000;

#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde_as(as = "DisplayFromStr")]
    pub category: Category,
    pub fee: u64,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub utxos: Vec<Utxo>,
    /// Why multiplying the immutable token was refused.
    pub rejection: String,
}

pub async fn run(session: &Session) -> anyhow::Result<Report> {
    let wallet = session.wallet();

    let (_, auth) = auth::mint(session).await?;
    let authority = auth.token().cloned().context("authentication output carries no token")?;
    let category = authority.category();
    let child = authority
        .clone()
        .with_nft(Nft::new(Capability::None, Commitment::empty()));

    let before = auth.satoshis();
    let change = before
        .checked_sub(FEE + 2 * TOKEN_SATOSHIS)
        .ok_or_else(|| anyhow!("{before} sats cannot cover the fee and token outputs"))?;

    let mut builder = session.builder();
    builder.add_input(auth, wallet.unlock_p2pkh()).add_outputs([
        Output::new(wallet.address(), change),
        Output::new(wallet.address(), TOKEN_SATOSHIS).with_token(authority),
        Output::new(wallet.address(), TOKEN_SATOSHIS).with_token(child.clone()),
    ])?;
    session.commit(&builder).await?;

    let utxos = session.wallet_utxos().await?;
    let after: u64 = utxos.iter().map(Utxo::satoshis).sum();
    ensure!(utxos.len() == 3, "expected 3 outputs in wallet, found {}", utxos.len());
    ensure!(
        before - after == FEE,
        "wallet went from {before} to {after} sats, expected a fee of {FEE}"
    );

    info!("derived an immutable token of category {category}");

    let immutable = utxos
        .iter()
        .find(|utxo| utxo.token() == Some(&child))
        .cloned()
        .context("immutable token not found in wallet")?;

    let mut builder = session.builder();
    builder
        .add_input(immutable, wallet.unlock_p2pkh())
        .add_outputs(iter::repeat_n(
            Output::new(wallet.address(), 1_000).with_token(child),
            3,
        ))?;

    let rejection = match builder.send().await {
        Err(e @ Error::Capability { .. }) => e,
        Err(e) => bail!("multiplying an immutable token failed for the wrong reason: {e}"),
        Ok(id) => bail!("transaction {id} multiplied an immutable token"),
    };

    info!("refused to multiply an immutable token: {rejection}");

    Ok(Report {
        category,
        fee: FEE,
        utxos,
        rejection: rejection.to_string(),
    })
}
