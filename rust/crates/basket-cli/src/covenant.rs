//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The basket contracts.
//!
//! Minting a basket token involves three contracts (inflow, mint and collection), redeeming it
//! three others (outflow, burn and distribute). Each of them holds a thread token of its own
//! category, which must be sent back whenever the contract is spent; contracts recognise each
//! other by the categories of the threads spent alongside them. Deposited assets sit in one
//! holdings contract per asset, released only alongside the outflow thread.

use anyhow::{Context, ensure};
use cashtoken_tx_builder::{
    Argument, Artifact, Call, Capability, Category, Contract, LockingBytecode, Nft, Output,
    ScriptContext, Token, Unlocker, crypto,
};
use std::{fmt, marker::PhantomData, ops::Deref, sync::Arc};

const INFLOW: &str = include_str!("../art/inflow.json");
const MINT: &str = include_str!("../art/mint.json");
const COLLECTION: &str = include_str!("../art/collection.json");
const OUTFLOW: &str = include_str!("../art/outflow.json");
const BURN: &str = include_str!("../art/burn.json");
const DISTRIBUTE: &str = include_str!("../art/distribute.json");
const HOLDINGS: &str = include_str!("../art/holdings.json");

/// A fungible amount of some category, backing basket tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub category: Category,
    pub amount: u64,
}

impl Asset {
    pub fn to_token(self) -> Token {
        Token::new(self.category, self.amount)
    }
}

// ------------------------------------------------------------------ Operations

/// A function of a basket template, along with the arguments it is called with.
pub trait Operation: fmt::Debug + Copy + Send + Sync + 'static {
    /// Every function of the template.
    const ALL: &'static [Self];

    /// The name of the function in the template's ABI.
    fn function(self) -> &'static str;

    fn arguments(self) -> Vec<Argument> {
        Vec::new()
    }

    /// The operation invoked by a call, rejecting calls to other functions or with other
    /// arguments.
    fn of(call: &Call) -> anyhow::Result<Self> {
        let operation = Self::ALL
            .iter()
            .copied()
            .find(|operation| operation.function() == call.function())
            .with_context(|| format!("no such function: {call}"))?;
        ensure!(
            call.arguments() == operation.arguments(),
            "unexpected arguments: {call}"
        );
        Ok(operation)
    }
}

macro_rules! operations {
    ($($(#[$doc:meta])* $template:ident { $($operation:ident => $function:literal),+ $(,)? })*) => {$(
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $template {
            $($operation),+
        }

        impl Operation for $template {
            const ALL: &'static [Self] = &[$(Self::$operation),+];

            fn function(self) -> &'static str {
                match self {
                    $(Self::$operation => $function),+
                }
            }
        }
    )*};
}

operations! {
    /// Admit a basket mint, alongside the mint and collection threads.
    Inflow { Main => "main" }
    /// Create one basket token.
    Mint { Mint => "mint" }
    /// Check the assets are deposited into their holdings.
    Collection { Assert => "assert" }
    /// Admit a basket redemption, alongside the burn and distribute threads.
    Outflow { Main => "main" }
    /// Destroy one basket token.
    Burn { Burn => "burn" }
    /// Check the assets leave their holdings for the redeemer.
    Distribute { Assert => "assert" }
    /// Give up a deposit, alongside the outflow thread.
    Holdings { Release => "release" }
}

/// A contract instantiated from a basket template, unlocked through the operations of that
/// template only.
pub struct Covenant<Op> {
    contract: Contract,
    operation: PhantomData<fn() -> Op>,
}

impl<Op: Operation> Covenant<Op> {
    fn new(
        artifact: &Arc<Artifact>,
        arguments: Vec<Argument>,
        predicate: fn(&Contract, &Call, &ScriptContext<'_>) -> anyhow::Result<()>,
    ) -> anyhow::Result<Self> {
        for operation in Op::ALL {
            let declared = artifact
                .function(operation.function())
                .map(|(_, function)| function.inputs.len());
            ensure!(
                declared == Some(operation.arguments().len()),
                "contract '{}' does not declare {operation:?} as expected",
                artifact.contract_name(),
            );
        }

        Ok(Self {
            contract: Contract::new(artifact.clone(), arguments, predicate)?,
            operation: PhantomData,
        })
    }

    /// Prepare the unlocking of one of this contract's outputs.
    pub fn unlock(&self, operation: Op) -> Unlocker {
        self.contract
            .unlock(operation.function(), operation.arguments())
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }
}

impl<Op> Deref for Covenant<Op> {
    type Target = Contract;

    fn deref(&self) -> &Contract {
        &self.contract
    }
}

impl<Op> Clone for Covenant<Op> {
    fn clone(&self) -> Self {
        Self {
            contract: self.contract.clone(),
            operation: PhantomData,
        }
    }
}

impl<Op> fmt::Debug for Covenant<Op> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.contract, f)
    }
}

// ------------------------------------------------------------------- Templates

/// The compiled basket templates.
#[derive(Debug, Clone)]
pub struct Templates {
    inflow: Arc<Artifact>,
    mint: Arc<Artifact>,
    collection: Arc<Artifact>,
    outflow: Arc<Artifact>,
    burn: Arc<Artifact>,
    distribute: Arc<Artifact>,
    holdings: Arc<Artifact>,
}

impl Templates {
    pub fn load() -> anyhow::Result<Self> {
        let load = |name: &str, json: &str| {
            Artifact::from_json(json)
                .map(Arc::new)
                .with_context(|| format!("failed to load the {name} template"))
        };

        Ok(Self {
            inflow: load("inflow", INFLOW)?,
            mint: load("mint", MINT)?,
            collection: load("collection", COLLECTION)?,
            outflow: load("outflow", OUTFLOW)?,
            burn: load("burn", BURN)?,
            distribute: load("distribute", DISTRIBUTE)?,
            holdings: load("holdings", HOLDINGS)?,
        })
    }

    pub fn inflow(
        &self,
        inflow: Category,
        mint: Category,
        collection: Category,
    ) -> anyhow::Result<Covenant<Inflow>> {
        Covenant::new(
            &self.inflow,
            vec![inflow.into(), mint.into(), collection.into()],
            check_inflow,
        )
    }

    pub fn mint(&self, inflow: Category, mint: Category) -> anyhow::Result<Covenant<Mint>> {
        Covenant::new(&self.mint, vec![inflow.into(), mint.into()], check_mint)
    }

    /// `deposits` pairs each asset with the holdings contract it must be deposited into.
    pub fn collection(
        &self,
        inflow: Category,
        deposits: [(&Covenant<Holdings>, Asset); 2],
    ) -> anyhow::Result<Covenant<Collection>> {
        let mut arguments = vec![Argument::from(inflow)];
        for (holdings, asset) in deposits {
            arguments.push(Argument::from(&holdings.locking_bytecode()));
            arguments.push(asset.category.into());
            arguments.push(amount_argument(asset.amount)?);
        }

        Covenant::new(&self.collection, arguments, check_collection)
    }

    pub fn outflow(
        &self,
        outflow: Category,
        burn: Category,
        distribute: Category,
    ) -> anyhow::Result<Covenant<Outflow>> {
        Covenant::new(
            &self.outflow,
            vec![outflow.into(), burn.into(), distribute.into()],
            check_outflow,
        )
    }

    pub fn burn(&self, burn: Category, mint: Category) -> anyhow::Result<Covenant<Burn>> {
        Covenant::new(&self.burn, vec![burn.into(), mint.into()], check_burn)
    }

    pub fn distribute(
        &self,
        outflow: Category,
        assets: [Asset; 2],
    ) -> anyhow::Result<Covenant<Distribute>> {
        let mut arguments = vec![
            Argument::from(outflow),
            Argument::from(self.holdings.compiled_bytecode()),
        ];
        for asset in assets {
            arguments.push(asset.category.into());
            arguments.push(amount_argument(asset.amount)?);
        }

        Covenant::new(&self.distribute, arguments, check_distribute)
    }

    pub fn holdings(&self, outflow: Category, asset: Asset) -> anyhow::Result<Covenant<Holdings>> {
        Covenant::new(
            &self.holdings,
            vec![
                outflow.into(),
                asset.category.into(),
                amount_argument(asset.amount)?,
            ],
            check_holdings,
        )
    }
}

// ------------------------------------------------------------------ Predicates

fn check_inflow(contract: &Contract, call: &Call, ctx: &ScriptContext<'_>) -> anyhow::Result<()> {
    let Inflow::Main = Inflow::of(call)?;

    holds_thread(ctx, category_argument(contract, "inflowCategory")?)?;
    returns_thread(ctx)?;
    spends_category(ctx, category_argument(contract, "mintCategory")?)?;
    spends_category(ctx, category_argument(contract, "collectionCategory")?)
}

fn check_mint(contract: &Contract, call: &Call, ctx: &ScriptContext<'_>) -> anyhow::Result<()> {
    let Mint::Mint = Mint::of(call)?;

    let mint = category_argument(contract, "mintCategory")?;

    holds_thread(ctx, mint)?;
    returns_thread(ctx)?;
    spends_category(ctx, category_argument(contract, "inflowCategory")?)?;

    let minting = ctx
        .outputs()
        .iter()
        .filter_map(|output| nft_of(output, mint))
        .filter(|nft| nft.capability() == Capability::Minting)
        .count();
    ensure!(minting == 1, "{minting} minting tokens leave the transaction, expected 1");

    Ok(())
}

fn check_collection(contract: &Contract, call: &Call, ctx: &ScriptContext<'_>) -> anyhow::Result<()> {
    let Collection::Assert = Collection::of(call)?;

    returns_thread(ctx)?;
    spends_category(ctx, category_argument(contract, "inflowCategory")?)?;

    for position in ["first", "second"] {
        let holdings = contract
            .argument(&format!("{position}Holdings"))?
            .as_locking_bytecode()
            .with_context(|| format!("{position} holdings is not a locking bytecode"))?;
        let asset = asset_argument(contract, position)?;

        ensure!(
            ctx.outputs().iter().any(|output| output.locking_bytecode() == &holdings
                && output.token() == Some(&asset.to_token())),
            "{} units of {} are not deposited",
            asset.amount,
            asset.category,
        );
    }

    Ok(())
}

fn check_outflow(contract: &Contract, call: &Call, ctx: &ScriptContext<'_>) -> anyhow::Result<()> {
    let Outflow::Main = Outflow::of(call)?;

    holds_thread(ctx, category_argument(contract, "outflowCategory")?)?;
    returns_thread(ctx)?;
    spends_category(ctx, category_argument(contract, "burnCategory")?)?;
    spends_category(ctx, category_argument(contract, "distributeCategory")?)
}

fn check_burn(contract: &Contract, call: &Call, ctx: &ScriptContext<'_>) -> anyhow::Result<()> {
    let Burn::Burn = Burn::of(call)?;

    let mint = category_argument(contract, "mintCategory")?;

    holds_thread(ctx, category_argument(contract, "burnCategory")?)?;
    returns_thread(ctx)?;

    let is_basket = |output: &Output| {
        nft_of(output, mint).is_some_and(|nft| nft.capability() == Capability::None)
    };

    ensure!(
        ctx.spent_outputs().iter().any(is_basket),
        "no basket token is spent"
    );
    ensure!(
        !ctx.outputs().iter().any(is_basket),
        "basket tokens must be destroyed"
    );

    Ok(())
}

fn check_distribute(contract: &Contract, call: &Call, ctx: &ScriptContext<'_>) -> anyhow::Result<()> {
    let Distribute::Assert = Distribute::of(call)?;

    let outflow = category_argument(contract, "outflowCategory")?;
    let template = contract
        .argument("holdingsBytecode")?
        .as_bytes()
        .context("holdings bytecode is not a byte string")?;

    returns_thread(ctx)?;
    spends_category(ctx, outflow)?;

    for position in ["first", "second"] {
        let asset = asset_argument(contract, position)?;
        let holdings = holdings_locking_bytecode(template, outflow, asset)?;

        ensure!(
            ctx.spent_outputs().iter().any(|output| output.locking_bytecode() == &holdings
                && output.token() == Some(&asset.to_token())),
            "{} units of {} are not taken from holdings",
            asset.amount,
            asset.category,
        );

        ensure!(
            ctx.outputs().iter().any(|output| output.locking_bytecode().script_hash().is_none()
                && output.token() == Some(&asset.to_token())),
            "{} units of {} are not released",
            asset.amount,
            asset.category,
        );
    }

    Ok(())
}

fn check_holdings(contract: &Contract, call: &Call, ctx: &ScriptContext<'_>) -> anyhow::Result<()> {
    let Holdings::Release = Holdings::of(call)?;

    let asset = Asset {
        category: category_argument(contract, "assetCategory")?,
        amount: amount_of(contract, "assetAmount")?,
    };

    ensure!(
        spent_output(ctx)?.token() == Some(&asset.to_token()),
        "holdings do not hold {} units of {}",
        asset.amount,
        asset.category,
    );

    spends_category(ctx, category_argument(contract, "outflowCategory")?)
}

// --------------------------------------------------------------------- Helpers

/// The locking bytecode of the holdings contract of an asset, rebuilt from its template.
fn holdings_locking_bytecode(
    template: &[u8],
    outflow: Category,
    asset: Asset,
) -> anyhow::Result<LockingBytecode> {
    let mut redeem_bytecode = Vec::new();
    for argument in [
        amount_argument(asset.amount)?,
        Argument::from(asset.category),
        Argument::from(outflow),
    ] {
        argument.push(&mut redeem_bytecode);
    }
    redeem_bytecode.extend_from_slice(template);

    Ok(LockingBytecode::pay_to_script_hash32(crypto::hash256(
        &redeem_bytecode,
    )))
}

fn amount_argument(amount: u64) -> anyhow::Result<Argument> {
    Ok(Argument::Int(
        i64::try_from(amount).context("amount out of range")?,
    ))
}

fn category_argument(contract: &Contract, name: &str) -> anyhow::Result<Category> {
    contract
        .argument(name)?
        .as_category()
        .with_context(|| format!("'{name}' is not a category"))
}

fn amount_of(contract: &Contract, name: &str) -> anyhow::Result<u64> {
    let amount = contract
        .argument(name)?
        .as_int()
        .with_context(|| format!("'{name}' is not an integer"))?;
    u64::try_from(amount).with_context(|| format!("'{name}' is negative"))
}

fn asset_argument(contract: &Contract, position: &str) -> anyhow::Result<Asset> {
    Ok(Asset {
        category: category_argument(contract, &format!("{position}Category"))?,
        amount: amount_of(contract, &format!("{position}Amount"))?,
    })
}

fn nft_of(output: &Output, category: Category) -> Option<&Nft> {
    output
        .token()
        .filter(|token| token.category() == category)
        .and_then(Token::nft)
}

fn spent_output<'a>(ctx: &ScriptContext<'a>) -> anyhow::Result<&'a Output> {
    ctx.spent_output()
        .with_context(|| format!("input #{} spends no known output", ctx.input_index()))
}

fn holds_thread(ctx: &ScriptContext<'_>, category: Category) -> anyhow::Result<()> {
    let held = spent_output(ctx)?.token().map(Token::category);
    ensure!(
        held == Some(category),
        "input #{} does not hold the {category} thread",
        ctx.input_index(),
    );
    Ok(())
}

/// The token of the spent output goes back to the same contract, with the same amount and
/// capability.
fn returns_thread(ctx: &ScriptContext<'_>) -> anyhow::Result<()> {
    let spent = spent_output(ctx)?;

    let same_thread = |output: &Output| match (spent.token(), output.token()) {
        (Some(thread), Some(token)) => {
            thread.category() == token.category()
                && thread.amount() == token.amount()
                && thread.nft().map(Nft::capability) == token.nft().map(Nft::capability)
        }
        (None, None) => true,
        _ => false,
    };

    ensure!(
        ctx.outputs()
            .iter()
            .filter(|output| output.locking_bytecode() == spent.locking_bytecode())
            .any(same_thread),
        "thread of input #{} is not returned",
        ctx.input_index(),
    );

    Ok(())
}

fn spends_category(ctx: &ScriptContext<'_>, category: Category) -> anyhow::Result<()> {
    ensure!(
        ctx.spent_outputs()
            .iter()
            .any(|output| output.token().is_some_and(|token| token.category() == category)),
        "no input holds a {category} token",
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        Asset, Burn, Collection, Distribute, Holdings, Inflow, Mint, Operation, Outflow, Templates,
        holdings_locking_bytecode,
    };
    use cashtoken_tx_builder::{Argument, Artifact, Call, Unlocker, provider::random_token};

    fn declares<Op: Operation>(artifact: &Artifact) -> bool {
        Op::ALL.iter().all(|operation| {
            artifact
                .function(operation.function())
                .is_some_and(|(_, function)| function.inputs.len() == operation.arguments().len())
        })
    }

    #[test]
    fn operations_are_declared_by_their_templates() {
        let templates = Templates::load().unwrap();
        assert!(declares::<Inflow>(&templates.inflow));
        assert!(declares::<Mint>(&templates.mint));
        assert!(declares::<Collection>(&templates.collection));
        assert!(declares::<Outflow>(&templates.outflow));
        assert!(declares::<Burn>(&templates.burn));
        assert!(declares::<Distribute>(&templates.distribute));
        assert!(declares::<Holdings>(&templates.holdings));
        assert!(!declares::<Holdings>(&templates.inflow));
    }

    #[test]
    fn reject_calls_to_other_functions() {
        assert_eq!(
            Holdings::of(&Call::new("release", vec![])).unwrap(),
            Holdings::Release
        );
        assert!(Inflow::of(&Call::new("release", vec![])).is_err());
        assert!(Holdings::of(&Call::new("release", vec![Argument::Int(1)])).is_err());
    }

    #[test]
    fn unlock_through_the_template_function() {
        let templates = Templates::load().unwrap();
        let asset = Asset {
            category: random_token(1).category(),
            amount: 100,
        };
        let holdings = templates
            .holdings(random_token(1).category(), asset)
            .unwrap();

        match holdings.unlock(Holdings::Release) {
            Unlocker::Contract(contract, call) => {
                assert_eq!(&contract, holdings.contract());
                assert_eq!(call, Call::new("release", vec![]));
            }
            unlocker => panic!("unexpected unlocker: {unlocker:?}"),
        }
    }

    #[test]
    fn templates_load() {
        assert!(Templates::load().is_ok());
    }

    #[test]
    fn holdings_address_is_reproducible_from_template() {
        let templates = Templates::load().unwrap();
        let outflow = random_token(1).category();
        let asset = Asset {
            category: random_token(1).category(),
            amount: 100,
        };

        let holdings = templates.holdings(outflow, asset).unwrap();
        assert_eq!(
            holdings_locking_bytecode(holdings.artifact().compiled_bytecode(), outflow, asset)
                .unwrap(),
            holdings.locking_bytecode(),
        );
    }

    #[test]
    fn contracts_depend_on_their_categories() {
        let templates = Templates::load().unwrap();
        let [a, b, c] = [1, 2, 3].map(|n| random_token(n).category());
        assert_ne!(
            templates.inflow(a, b, c).unwrap().script_hash(),
            templates.inflow(a, c, b).unwrap().script_hash(),
        );
    }
}
