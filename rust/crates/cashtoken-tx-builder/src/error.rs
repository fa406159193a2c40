//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Category, Input};

pub type Result<T> = std::result::Result<T, Error>;

/// Reasons for rejecting a transaction. Every rejection is terminal for the transaction under
/// construction: nothing is retried, and nothing is applied to the UTXO set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("input #{index}: authorization failed: {reason}")]
    Auth { index: usize, reason: String },

    #[error("input #{index}: script failed: {reason}")]
    Script { index: usize, reason: String },

    #[error("category {category}: token conservation violated: {reason}")]
    TokenConservation { category: Category, reason: String },

    #[error("category {category}: illegal capability transition: {reason}")]
    Capability { category: Category, reason: String },

    #[error("output #{index}: malformed: {reason}")]
    MalformedOutput { index: usize, reason: String },

    #[error("{input} already spent")]
    DoubleSpend { input: Input },

    #[error("insufficient funds: {reason}")]
    InsufficientFunds { reason: String },

    #[error("{input} is unknown: {reason}")]
    UnknownInput { input: Input, reason: String },

    #[error("fee too high: {fee} > {limit}")]
    FeeTooHigh { fee: u64, limit: u64 },

    #[error("provider error: {0}")]
    Provider(String),
}

impl Error {
    pub(crate) fn auth(index: usize, reason: impl ToString) -> Self {
        Self::Auth {
            index,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn script(index: usize, reason: impl ToString) -> Self {
        Self::Script {
            index,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn conservation(category: Category, reason: impl ToString) -> Self {
        Self::TokenConservation {
            category,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn capability(category: Category, reason: impl ToString) -> Self {
        Self::Capability {
            category,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(index: usize, reason: impl ToString) -> Self {
        Self::MalformedOutput {
            index,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn unknown_input(input: Input, reason: impl ToString) -> Self {
        Self::UnknownInput {
            input,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn insufficient_funds(reason: impl ToString) -> Self {
        Self::InsufficientFunds {
            reason: reason.to_string(),
        }
    }
}

/// Backend failures surface as opaque provider errors.
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Provider(format!("{err:#}"))
    }
}
