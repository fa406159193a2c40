//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{
    covenant::{
        Asset, Burn, Collection, Covenant, Distribute, Holdings, Inflow, Mint, Operation, Outflow,
        Templates,
    },
    scenario::{FUNDING, Session},
};
use anyhow::{Context, anyhow, ensure};
use cashtoken_tx_builder::{
    Capability, Category, Commitment, Contract, LockingBytecode, Nft, Output, Token, Transaction,
    TransactionId, Unlocker, Utxo, provider::random_token,
};
use log::info;
use serde::Serialize;
use serde_with::{DisplayFromStr, serde_as};
use std::collections::BTreeMap;

/// Satoshis carried by thread tokens, deposits and basket tokens.
pub const DUST: u64 = 1_000;

/// Satoshis left as fee by every transaction of the scenario.
pub const FEE: u64 = 1_000;

/// Amounts of the two assets backing one basket token.
pub const ASSET_AMOUNTS: [u64; 2] = [100, 200];

#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde_as(as = "BTreeMap<_, DisplayFromStr>")]
    pub threads: BTreeMap<&'static str, Category>,
    #[serde_as(as = "DisplayFromStr")]
    pub mint_transaction: TransactionId,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub deposits: Vec<Utxo>,
    #[serde_as(as = "DisplayFromStr")]
    pub redeem_transaction: TransactionId,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub released: Vec<Utxo>,
}

/// A basket contract, and the output holding its thread token.
#[derive(Debug, Clone)]
pub struct Thread<Op> {
    pub covenant: Covenant<Op>,
    pub utxo: Utxo,
}

impl<Op: Operation> Thread<Op> {
    pub fn category(&self) -> anyhow::Result<Category> {
        category_of(&self.utxo)
    }

    /// Spend the thread through one of its contract's operations.
    pub fn unlock(&self, operation: Op) -> (Utxo, Unlocker) {
        (self.utxo.clone(), self.covenant.unlock(operation))
    }

    /// The thread output, sent back to its contract.
    pub fn returned(&self, session: &Session) -> anyhow::Result<Output> {
        relock(&self.utxo, self.covenant.token_address(session.network()))
    }
}

/// Every basket contract, with its thread output.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub inflow: Thread<Inflow>,
    pub mint: Thread<Mint>,
    pub collection: Thread<Collection>,
    pub outflow: Thread<Outflow>,
    pub burn: Thread<Burn>,
    pub distribute: Thread<Distribute>,
    pub assets: [Asset; 2],
    pub holdings: [Covenant<Holdings>; 2],
}

/// The outputs created by minting a basket token.
#[derive(Debug, Clone)]
pub struct Minted {
    pub transaction: Transaction,
    pub basket: Utxo,
    pub deposits: [Utxo; 2],
    pub change: Utxo,
}

pub async fn run(session: &Session) -> anyhow::Result<Report> {
    let wallet = session.wallet();
    let templates = Templates::load()?;

    let funding = session.fund(FUNDING)?;
    let (deployment, funding) = deploy(session, &templates, funding).await?;

    let [first, second] = deployment.assets.map(|asset| {
        session
            .provider()
            .add_utxo(Output::new(wallet.address(), DUST).with_token(asset.to_token()))
    });
    let assets = [first?, second?];

    let minted = mint(session, &deployment, assets, funding).await?;
    let (redeemed, released) = redeem(session, &deployment, &minted).await?;

    let held = session.wallet_utxos().await?;
    for asset in deployment.assets {
        ensure!(
            held.iter().any(|utxo| utxo.token() == Some(&asset.to_token())),
            "{} units of {} did not come back",
            asset.amount,
            asset.category,
        );
    }

    let threads = BTreeMap::from([
        ("inflow", deployment.inflow.category()?),
        ("mint", deployment.mint.category()?),
        ("collection", deployment.collection.category()?),
        ("outflow", deployment.outflow.category()?),
        ("burn", deployment.burn.category()?),
        ("distribute", deployment.distribute.category()?),
    ]);

    Ok(Report {
        threads,
        mint_transaction: minted.transaction.id(),
        deposits: minted.deposits.to_vec(),
        redeem_transaction: redeemed.id(),
        released,
    })
}

/// Create the thread tokens, instantiate the contracts around their categories, then hand every
/// thread over to its contract. Returns the deployment and the remaining funding.
pub async fn deploy(
    session: &Session,
    templates: &Templates,
    funding: Utxo,
) -> anyhow::Result<(Deployment, Utxo)> {
    let wallet = session.wallet();

    let (funding, inflow) = genesis(session, funding, fungible_thread).await?;
    let (funding, mint) = genesis(session, funding, minting_thread).await?;
    let (funding, collection) = genesis(session, funding, fungible_thread).await?;
    let (funding, outflow) = genesis(session, funding, fungible_thread).await?;
    let (funding, burn) = genesis(session, funding, fungible_thread).await?;
    let (funding, distribute) = genesis(session, funding, fungible_thread).await?;

    let inflow_category = category_of(&inflow)?;
    let mint_category = category_of(&mint)?;
    let collection_category = category_of(&collection)?;
    let outflow_category = category_of(&outflow)?;
    let burn_category = category_of(&burn)?;
    let distribute_category = category_of(&distribute)?;

    let assets = ASSET_AMOUNTS.map(|amount| Asset {
        category: random_token(amount).category(),
        amount,
    });

    let holdings = [
        templates.holdings(outflow_category, assets[0])?,
        templates.holdings(outflow_category, assets[1])?,
    ];

    let inflow_covenant = templates.inflow(inflow_category, mint_category, collection_category)?;
    let mint_covenant = templates.mint(inflow_category, mint_category)?;
    let collection_covenant = templates.collection(
        inflow_category,
        [(&holdings[0], assets[0]), (&holdings[1], assets[1])],
    )?;
    let outflow_covenant =
        templates.outflow(outflow_category, burn_category, distribute_category)?;
    let burn_covenant = templates.burn(burn_category, mint_category)?;
    let distribute_covenant = templates.distribute(outflow_category, assets)?;

    let handover: [(&Contract, &Utxo); 6] = [
        (inflow_covenant.contract(), &inflow),
        (mint_covenant.contract(), &mint),
        (collection_covenant.contract(), &collection),
        (outflow_covenant.contract(), &outflow),
        (burn_covenant.contract(), &burn),
        (distribute_covenant.contract(), &distribute),
    ];

    let mut builder = session.builder();
    for (contract, thread) in handover {
        builder.add_input(thread.clone(), wallet.unlock_p2pkh());
        builder.add_output(relock(thread, contract.token_address(session.network()))?)?;
    }
    builder
        .add_input(funding.clone(), wallet.unlock_p2pkh())
        .add_output(Output::new(wallet.address(), spare(&funding, FEE)?))?;

    let transaction = session.commit(&builder).await?;
    info!("deployed basket contracts in {}", transaction.id());

    let mut outputs = transaction.as_utxos().into_iter();
    let mut next = || outputs.next().context("deployment has too few outputs");

    let deployment = Deployment {
        inflow: Thread {
            covenant: inflow_covenant,
            utxo: next()?,
        },
        mint: Thread {
            covenant: mint_covenant,
            utxo: next()?,
        },
        collection: Thread {
            covenant: collection_covenant,
            utxo: next()?,
        },
        outflow: Thread {
            covenant: outflow_covenant,
            utxo: next()?,
        },
        burn: Thread {
            covenant: burn_covenant,
            utxo: next()?,
        },
        distribute: Thread {
            covenant: distribute_covenant,
            utxo: next()?,
        },
        assets,
        holdings,
    };
    let change = next()?;

    Ok((deployment, change))
}

/// Deposit one output of each asset into its holdings contract, in exchange for a basket token.
pub async fn mint(
    session: &Session,
    deployment: &Deployment,
    assets: [Utxo; 2],
    funding: Utxo,
) -> anyhow::Result<Minted> {
    let wallet = session.wallet();
    let network = session.network();

    let basket = Token::new(deployment.mint.category()?, 0)
        .with_nft(Nft::new(Capability::None, Commitment::empty()));

    let mut builder = session.builder();
    builder
        .add_inputs([
            deployment.inflow.unlock(Inflow::Main),
            deployment.mint.unlock(Mint::Mint),
            deployment.collection.unlock(Collection::Assert),
        ])
        .add_outputs([
            deployment.inflow.returned(session)?,
            deployment.mint.returned(session)?,
            Output::new(wallet.address(), DUST).with_token(basket),
            deployment.collection.returned(session)?,
        ])?;

    for (holdings, asset) in deployment.holdings.iter().zip(&assets) {
        builder
            .add_input(asset.clone(), wallet.unlock_p2pkh())
            .add_output(relock(asset, holdings.token_address(network))?)?;
    }

    builder
        .add_input(funding.clone(), wallet.unlock_p2pkh())
        .add_output(Output::new(wallet.address(), spare(&funding, DUST + FEE)?))?;

    let transaction = session.commit(&builder).await?;
    info!("minted basket token in {}", transaction.id());

    let utxos = transaction.as_utxos();
    match utxos.as_slice() {
        [_, _, basket, _, first, second, change] => Ok(Minted {
            basket: basket.clone(),
            deposits: [first.clone(), second.clone()],
            change: change.clone(),
            transaction,
        }),
        _ => Err(anyhow!("unexpected minting outputs: {}", utxos.len())),
    }
}

/// Destroy a basket token, releasing the deposited assets to the wallet. Returns the redeeming
/// transaction and the released outputs.
pub async fn redeem(
    session: &Session,
    deployment: &Deployment,
    minted: &Minted,
) -> anyhow::Result<(Transaction, Vec<Utxo>)> {
    let wallet = session.wallet();

    let mut builder = session.builder();
    builder.with_implicit_burn(true).add_inputs([
        deployment.outflow.unlock(Outflow::Main),
        deployment.burn.unlock(Burn::Burn),
        deployment.distribute.unlock(Distribute::Assert),
    ]);
    for (holdings, deposit) in deployment.holdings.iter().zip(&minted.deposits) {
        builder.add_input(deposit.clone(), holdings.unlock(Holdings::Release));
    }
    builder.add_inputs([
        (minted.basket.clone(), wallet.unlock_p2pkh()),
        (minted.change.clone(), wallet.unlock_p2pkh()),
    ]);

    builder.add_outputs([
        deployment.outflow.returned(session)?,
        deployment.burn.returned(session)?,
        deployment.distribute.returned(session)?,
    ])?;
    for deposit in &minted.deposits {
        builder.add_output(relock(deposit, wallet.address())?)?;
    }
    let change = (minted.change.satoshis() + minted.basket.satoshis())
        .checked_sub(FEE)
        .context("change cannot cover the fee")?;
    builder.add_output(Output::new(wallet.address(), change))?;

    let transaction = session.commit(&builder).await?;
    info!("redeemed basket token in {}", transaction.id());

    let released = transaction
        .as_utxos()
        .into_iter()
        .skip(3)
        .take(minted.deposits.len())
        .collect();

    Ok((transaction, released))
}

// --------------------------------------------------------------------- Helpers

/// Spend `funding`, found at index 0 of its transaction, into change and a token of the category
/// it creates. The change, again at index 0, can fund the next genesis.
async fn genesis(
    session: &Session,
    funding: Utxo,
    thread: fn(Category) -> Token,
) -> anyhow::Result<(Utxo, Utxo)> {
    let wallet = session.wallet();
    let token = thread(Category::from(funding.input().transaction_id()));

    let mut builder = session.builder();
    builder.add_input(funding.clone(), wallet.unlock_p2pkh()).add_outputs([
        Output::new(wallet.address(), spare(&funding, DUST + FEE)?),
        Output::new(wallet.address(), DUST).with_token(token),
    ])?;

    let transaction = session.commit(&builder).await?;

    match transaction.as_utxos().as_slice() {
        [change, thread] => Ok((change.clone(), thread.clone())),
        _ => Err(anyhow!("unexpected genesis outputs")),
    }
}

fn fungible_thread(category: Category) -> Token {
    Token::new(category, 1)
}

fn minting_thread(category: Category) -> Token {
    Token::new(category, 0).with_nft(Nft::new(Capability::Minting, Commitment::empty()))
}

fn category_of(utxo: &Utxo) -> anyhow::Result<Category> {
    utxo.token()
        .map(Token::category)
        .with_context(|| format!("{utxo} carries no token"))
}

/// Move the satoshis and token of a UTXO under another locking condition.
fn relock(utxo: &Utxo, to: impl Into<LockingBytecode>) -> anyhow::Result<Output> {
    let token = utxo
        .token()
        .cloned()
        .with_context(|| format!("{utxo} carries no token"))?;
    Ok(Output::new(to, utxo.satoshis()).with_token(token))
}

fn spare(funding: &Utxo, spent: u64) -> anyhow::Result<u64> {
    funding
        .satoshis()
        .checked_sub(spent)
        .with_context(|| format!("{funding} cannot cover {spent} sats"))
}
