//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Useful macros for testing and quickly constructing objects.

/// Construct variable-length [`Hash`](crate::Hash) from base16-encoded text strings.
///
/// # examples
///
/// ```rust
/// # use cashtoken_tx_builder::{Hash, hash};
/// let hash: Hash<20> = hash!("0000000000000000000000000000000000000000");
/// assert_eq!(<[u8; 20]>::from(hash), [0; 20]);
/// ```
#[macro_export]
macro_rules! hash {
    ($txt:literal $(,)?) => {
        <$crate::Hash<_>>::try_from($txt).unwrap()
    };
}

/// Construct a [`Category`](crate::Category) from its base16-encoded text representation, in
/// transaction-id order.
#[macro_export]
macro_rules! category {
    ($txt:literal $(,)?) => {
        $crate::Category::try_from($txt).unwrap()
    };
}

/// Construct an [`Input`](crate::Input) from a base16-encoded transaction id and an output index.
#[macro_export]
macro_rules! input {
    ($id:literal, $index:expr $(,)?) => {
        $crate::Input::new($crate::TransactionId::try_from($id).unwrap(), $index)
    };
}

/// Construct an [`Output`](crate::Output) locked by the given address or locking bytecode, with
/// an optional token.
#[macro_export]
macro_rules! output {
    ($to:expr, $satoshis:expr $(,)?) => {
        $crate::Output::new($to, $satoshis)
    };

    ($to:expr, $satoshis:expr, $token:expr $(,)?) => {
        $crate::Output::new($to, $satoshis).with_token($token)
    };
}

/// Construct a fungible-only [`Token`](crate::Token), or an NFT-carrying one when given a
/// capability and a base16-encoded commitment.
#[macro_export]
macro_rules! token {
    ($category:expr, $amount:expr $(,)?) => {
        $crate::Token::new($category, $amount)
    };

    ($category:expr, $amount:expr, $capability:expr, $commitment:literal $(,)?) => {
        $crate::Token::new($category, $amount).with_nft($crate::Nft::new(
            $capability,
            $crate::Commitment::try_from($commitment).unwrap(),
        ))
    };
}
