//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Token ledger rules: satoshi and per-category token conservation, and NFT capability
//! transitions, checked once per transaction after every input has been authorized.

use crate::{Capability, Category, Error, Nft, Output, Result, Transaction};
use itertools::Itertools;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Transaction-wide permissions, set by whoever assembles the transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Allow tokens present in inputs to be destroyed by omission from outputs.
    pub allow_implicit_burn: bool,
    /// Reject transactions leaving more than this many satoshis as fee.
    pub max_fee: Option<u64>,
}

/// The tokens of one category, on one side of a transaction.
#[derive(Debug, Default)]
struct Side<'a> {
    amount: u128,
    nfts: Vec<(usize, &'a Nft)>,
}

/// Validate a transaction against the outputs it spends (given in input order), returning the
/// implied fee.
pub fn validate(transaction: &Transaction, spent_outputs: &[Output]) -> Result<u64> {
    let policy = transaction.policy();

    for (index, output) in transaction.outputs().iter().enumerate() {
        output
            .validate()
            .map_err(|e| Error::malformed(index, format!("{e:#}")))?;
    }

    let fee = check_satoshis(transaction, spent_outputs, policy)?;

    let genesis: BTreeSet<Category> = transaction
        .inputs()
        .iter()
        .map(|input| (Category::from(input.transaction_id()), input))
        .filter(|(category, input)| {
            category.is_created_by(&input.transaction_id(), input.output_index())
        })
        .map(|(category, _)| category)
        .collect();

    let inputs = by_category(spent_outputs);
    let outputs = by_category(transaction.outputs());

    for category in inputs.keys().chain(outputs.keys()).unique() {
        let empty = Side::default();
        let spent = inputs.get(category).unwrap_or(&empty);
        let created = outputs.get(category).unwrap_or(&empty);
        check_category(*category, spent, created, genesis.contains(category), policy)?;
    }

    Ok(fee)
}

fn check_satoshis(
    transaction: &Transaction,
    spent_outputs: &[Output],
    policy: &LedgerPolicy,
) -> Result<u64> {
    let total_in = sum_satoshis(spent_outputs).map_err(|index| {
        match transaction.inputs().get(index) {
            Some(input) => Error::unknown_input(*input, "spent satoshis overflow"),
            None => Error::insufficient_funds("spent satoshis overflow"),
        }
    })?;
    let total_out = sum_satoshis(transaction.outputs())
        .map_err(|index| Error::malformed(index, "output satoshis overflow"))?;

    let fee = total_in.checked_sub(total_out).ok_or_else(|| {
        Error::insufficient_funds(format!(
            "outputs spend {total_out} sats but inputs only provide {total_in} sats",
        ))
    })?;

    if let Some(limit) = policy.max_fee
        && fee > limit
    {
        return Err(Error::FeeTooHigh { fee, limit });
    }

    Ok(fee)
}

/// The satoshis held by a sequence of outputs, or the index of the one overflowing the sum.
fn sum_satoshis(outputs: &[Output]) -> std::result::Result<u64, usize> {
    outputs
        .iter()
        .enumerate()
        .try_fold(0u64, |total, (index, output)| {
            total.checked_add(output.satoshis()).ok_or(index)
        })
}

fn by_category(outputs: &[Output]) -> BTreeMap<Category, Side<'_>> {
    let mut sides: BTreeMap<Category, Side<'_>> = BTreeMap::new();

    for (index, output) in outputs.iter().enumerate() {
        if let Some(token) = output.token() {
            let side = sides.entry(token.category()).or_default();
            side.amount += u128::from(token.amount());
            if let Some(nft) = token.nft() {
                side.nfts.push((index, nft));
            }
        }
    }

    sides
}

fn check_category(
    category: Category,
    spent: &Side<'_>,
    created: &Side<'_>,
    is_genesis: bool,
    policy: &LedgerPolicy,
) -> Result<()> {
    let has_provenance = spent.amount > 0 || !spent.nfts.is_empty();
    if !has_provenance && !is_genesis {
        return Err(Error::conservation(
            category,
            "no input holds this category, and no input creates it",
        ));
    }

    let has_minting = spent
        .nfts
        .iter()
        .any(|(_, nft)| nft.capability() == Capability::Minting);

    // Fungible amounts
    if created.amount > spent.amount && !(is_genesis || has_minting) {
        return Err(Error::conservation(
            category,
            format!(
                "outputs hold {} tokens but inputs only provide {}",
                created.amount, spent.amount,
            ),
        ));
    }

    if spent.amount > created.amount && !policy.allow_implicit_burn {
        return Err(Error::conservation(
            category,
            format!(
                "{} tokens would be burned without implicit burn permission",
                spent.amount - created.amount,
            ),
        ));
    }

    // Non-fungible tokens
    let destroyed = match_nfts(category, spent, created, is_genesis, has_minting)?;

    if !destroyed.is_empty() && !policy.allow_implicit_burn {
        return Err(Error::conservation(
            category,
            format!(
                "NFTs from inputs {destroyed:?} would be destroyed without implicit burn permission",
            ),
        ));
    }

    debug!(
        "category {category}: {} -> {} tokens, {} -> {} NFTs{}",
        spent.amount,
        created.amount,
        spent.nfts.len(),
        created.nfts.len(),
        if is_genesis { " (genesis)" } else { "" },
    );

    Ok(())
}

/// Pair every NFT created by the transaction with the NFT it derives from, returning the indexes
/// of the inputs whose NFT is not carried over.
///
/// Outputs are matched, in turn, against: an identical input NFT; then, for immutable or mutable
/// outputs, a mutable input; and finally any remaining minting input. Outputs left unmatched can
/// only be justified by a minting input or by the creation of the category.
fn match_nfts(
    category: Category,
    spent: &Side<'_>,
    created: &Side<'_>,
    is_genesis: bool,
    has_minting: bool,
) -> Result<Vec<usize>> {
    let mut available: Vec<Option<(usize, &Nft)>> = spent.nfts.iter().copied().map(Some).collect();
    let mut unmatched: Vec<(usize, &Nft)> = Vec::new();

    let mut take = |accept: &dyn Fn(&Nft) -> bool| -> bool {
        available
            .iter_mut()
            .find(|slot| slot.is_some_and(|(_, nft)| accept(nft)))
            .map(|slot| slot.take())
            .is_some()
    };

    for &(index, nft) in &created.nfts {
        if !take(&|source| source == nft) {
            unmatched.push((index, nft));
        }
    }

    let mut orphans = Vec::new();
    for (index, nft) in unmatched {
        let matched = match nft.capability() {
            Capability::None | Capability::Mutable => {
                take(&|source| source.capability() == Capability::Mutable)
                    || take(&|source| source.capability() == Capability::Minting)
            }
            Capability::Minting => take(&|source| source.capability() == Capability::Minting),
        };

        if !matched {
            orphans.push((index, nft));
        }
    }

    if let Some((index, nft)) = orphans.first()
        && !(has_minting || is_genesis)
    {
        return Err(Error::capability(
            category,
            format!("output #{index} creates {nft} without a minting input"),
        ));
    }

    Ok(available.into_iter().flatten().map(|(index, _)| index).collect())
}

#[cfg(test)]
mod tests {
    use super::{LedgerPolicy, validate};
    use crate::{
        Capability, Category, Error, Input, LockingBytecode, Output, Token, Transaction,
        TransactionId, any, category, token,
    };
    use proptest::prelude::*;

    const FUNDING: &str = "702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce";

    fn anywhere() -> LockingBytecode {
        LockingBytecode::from(vec![0x51])
    }

    fn utxo(satoshis: u64, token: Option<Token>) -> Output {
        let output = Output::new(anywhere(), satoshis);
        match token {
            Some(token) => output.with_token(token),
            None => output,
        }
    }

    /// A transaction spending `spent`, from non-genesis outpoints (index 1 onwards).
    fn transaction(spent: &[Output], outputs: Vec<Output>) -> Transaction {
        let id = TransactionId::try_from(FUNDING).unwrap();
        Transaction::new(
            2,
            (0..spent.len()).map(|ix| Input::new(id, ix as u32 + 1)).collect(),
            outputs,
            0,
        )
    }

    fn check(spent: &[Output], outputs: Vec<Output>) -> crate::Result<u64> {
        validate(&transaction(spent, outputs), spent)
    }

    fn check_burning(spent: &[Output], outputs: Vec<Output>) -> crate::Result<u64> {
        let policy = LedgerPolicy {
            allow_implicit_burn: true,
            ..LedgerPolicy::default()
        };
        validate(&transaction(spent, outputs).with_policy(policy), spent)
    }

    fn cat() -> Category {
        category!("00000000000000000000000000000000000000000000000000000000000000aa")
    }

    // -------------------------------------------------------------- Satoshis

    #[test]
    fn fee_is_the_difference() {
        assert_eq!(check(&[utxo(10_000, None)], vec![utxo(9_000, None)]), Ok(1_000));
    }

    #[test]
    fn reject_negative_fee() {
        assert!(matches!(
            check(&[utxo(10_000, None)], vec![utxo(10_001, None)]),
            Err(Error::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn reject_fee_above_limit() {
        let spent = [utxo(10_000, None)];
        let policy = LedgerPolicy {
            max_fee: Some(500),
            ..LedgerPolicy::default()
        };
        assert_eq!(
            validate(&transaction(&spent, vec![utxo(9_000, None)]).with_policy(policy), &spent),
            Err(Error::FeeTooHigh {
                fee: 1_000,
                limit: 500
            }),
        );
    }

    #[test]
    fn reject_malformed_output() {
        assert!(matches!(
            check(&[utxo(10_000, Some(token!(cat(), 5)))], vec![utxo(9_000, Some(token!(cat(), 0)))]),
            Err(Error::MalformedOutput { index: 0, .. })
        ));
    }

    #[test]
    fn reject_overflowing_output_satoshis() {
        assert!(matches!(
            check(&[utxo(10_000, None)], vec![utxo(u64::MAX, None), utxo(1, None)]),
            Err(Error::MalformedOutput { index: 1, .. })
        ));
    }

    #[test]
    fn reject_overflowing_spent_satoshis() {
        assert!(matches!(
            check(&[utxo(u64::MAX, None), utxo(1, None)], vec![utxo(1_000, None)]),
            Err(Error::UnknownInput { .. })
        ));
    }

    #[test]
    fn genesis_requires_the_first_output_of_the_funding_transaction() {
        let spent = [utxo(10_000, None)];
        let id = TransactionId::try_from(FUNDING).unwrap();
        let tx = Transaction::new(
            2,
            vec![Input::new(id, 1)],
            vec![utxo(1_000, Some(Token::new(Category::from(id), 1)))],
            0,
        );
        assert!(matches!(validate(&tx, &spent), Err(Error::TokenConservation { .. })));
    }

    // -------------------------------------------------------------- Fungible tokens

    #[test]
    fn move_and_split_fungible_tokens() {
        let spent = [utxo(10_000, Some(token!(cat(), 100)))];
        assert!(
            check(
                &spent,
                vec![utxo(1_000, Some(token!(cat(), 60))), utxo(1_000, Some(token!(cat(), 40)))],
            )
            .is_ok()
        );
    }

    #[test]
    fn reject_inflation() {
        let spent = [utxo(10_000, Some(token!(cat(), 100)))];
        assert!(matches!(
            check(&spent, vec![utxo(1_000, Some(token!(cat(), 101)))]),
            Err(Error::TokenConservation { .. })
        ));
    }

    #[test]
    fn burn_requires_permission() {
        let spent = [utxo(10_000, Some(token!(cat(), 100)))];
        assert!(matches!(
            check(&spent, vec![utxo(1_000, Some(token!(cat(), 99)))]),
            Err(Error::TokenConservation { .. })
        ));
        assert!(check_burning(&spent, vec![utxo(1_000, Some(token!(cat(), 99)))]).is_ok());
        assert!(check_burning(&spent, vec![utxo(1_000, None)]).is_ok());
    }

    #[test]
    fn reject_category_without_provenance() {
        assert!(matches!(
            check(&[utxo(10_000, None)], vec![utxo(1_000, Some(token!(cat(), 1)))]),
            Err(Error::TokenConservation { .. })
        ));
    }

    #[test]
    fn genesis_creates_category() {
        let spent = [utxo(10_000, None)];
        let id = TransactionId::try_from(FUNDING).unwrap();
        let tx = Transaction::new(
            2,
            vec![Input::new(id, 0)],
            vec![utxo(
                1_000,
                Some(Token::new(Category::from(id), 1_000_000)),
            )],
            0,
        );
        assert!(validate(&tx, &spent).is_ok());
    }

    // -------------------------------------------------------------- Non-fungible tokens

    #[test]
    fn minting_may_create_and_downgrade() {
        let spent = [utxo(10_000, Some(token!(cat(), 0, Capability::Minting, "")))];
        assert!(
            check(
                &spent,
                vec![
                    utxo(1_000, Some(token!(cat(), 0, Capability::Minting, ""))),
                    utxo(1_000, Some(token!(cat(), 0, Capability::None, "01"))),
                    utxo(1_000, Some(token!(cat(), 0, Capability::Mutable, "02"))),
                ],
            )
            .is_ok()
        );
        // Downgrading the minting token itself is not a burn.
        assert!(
            check(&spent, vec![utxo(1_000, Some(token!(cat(), 0, Capability::None, "")))]).is_ok()
        );
    }

    #[test]
    fn immutable_nft_cannot_multiply() {
        let spent = [utxo(10_000, Some(token!(cat(), 0, Capability::None, "00")))];
        assert!(matches!(
            check(
                &spent,
                vec![
                    utxo(1_000, Some(token!(cat(), 0, Capability::None, "00"))),
                    utxo(1_000, Some(token!(cat(), 0, Capability::None, "00"))),
                    utxo(1_000, Some(token!(cat(), 0, Capability::None, "00"))),
                ],
            ),
            Err(Error::Capability { .. })
        ));
    }

    #[test]
    fn immutable_nft_cannot_change() {
        let spent = [utxo(10_000, Some(token!(cat(), 0, Capability::None, "00")))];
        assert!(matches!(
            check(&spent, vec![utxo(1_000, Some(token!(cat(), 0, Capability::None, "01")))]),
            Err(Error::Capability { .. })
        ));
        assert!(matches!(
            check(&spent, vec![utxo(1_000, Some(token!(cat(), 0, Capability::Mutable, "00")))]),
            Err(Error::Capability { .. })
        ));
    }

    #[test]
    fn mutable_nft_may_change_or_downgrade() {
        let spent = [utxo(10_000, Some(token!(cat(), 0, Capability::Mutable, "00")))];
        assert!(
            check(&spent, vec![utxo(1_000, Some(token!(cat(), 0, Capability::Mutable, "ff")))])
                .is_ok()
        );
        assert!(
            check(&spent, vec![utxo(1_000, Some(token!(cat(), 0, Capability::None, "ff")))])
                .is_ok()
        );
        assert!(matches!(
            check(&spent, vec![utxo(1_000, Some(token!(cat(), 0, Capability::Minting, "00")))]),
            Err(Error::Capability { .. })
        ));
    }

    #[test]
    fn nft_destruction_requires_permission() {
        let spent = [utxo(10_000, Some(token!(cat(), 0, Capability::None, "00")))];
        assert!(matches!(
            check(&spent, vec![utxo(1_000, None)]),
            Err(Error::TokenConservation { .. })
        ));
        assert!(check_burning(&spent, vec![utxo(1_000, None)]).is_ok());
    }

    // -------------------------------------------------------------- Properties

    proptest! {
        #[test]
        fn accepted_transactions_conserve_value(
            token in any::token(),
            satoshis in 1_000..1_000_000u64,
            fee in 0..1_000u64,
            burn in any::<bool>(),
        ) {
            let spent = [utxo(satoshis, Some(token.clone()))];
            let kept = utxo(satoshis - fee, Some(token.clone()));
            let result = if burn {
                check_burning(&spent, vec![utxo(satoshis - fee, None)])
            } else {
                check(&spent, vec![kept])
            };
            prop_assert_eq!(result, Ok(fee));
        }
    }

    proptest! {
        #[test]
        fn fungible_outputs_never_exceed_inputs_without_minting(
            category in any::category(),
            amount in 1..1_000_000u64,
            extra in 1..1_000u64,
        ) {
            let spent = [utxo(10_000, Some(Token::new(category, amount)))];
            let result = check(&spent, vec![utxo(1_000, Some(Token::new(category, amount + extra)))]);
            prop_assert!(
                matches!(result, Err(Error::TokenConservation { .. })),
                "unexpected outcome: {:?}",
                result
            );
        }
    }
}
