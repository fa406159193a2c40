//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{
    Category,
    encoding::{self, Encode},
};
use anyhow::{anyhow, bail, ensure};
use std::{fmt, str::FromStr};

pub const PREFIX_TOKEN: u8 = 0xef;

const HAS_COMMITMENT: u8 = 0x40;
const HAS_NFT: u8 = 0x20;
const HAS_AMOUNT: u8 = 0x10;

/// Largest fungible amount an output may carry.
pub const MAX_AMOUNT: u64 = i64::MAX as u64;

/// The permission level of a non-fungible token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// Immutable: the token may move, but never change.
    None,
    /// The commitment may be altered, and the token downgraded to [`Self::None`].
    Mutable,
    /// May create any token of its category, including other minting tokens.
    Minting,
}

impl Capability {
    fn to_nibble(self) -> u8 {
        match self {
            Self::None => 0x00,
            Self::Mutable => 0x01,
            Self::Minting => 0x02,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Mutable => "mutable",
            Self::Minting => "minting",
        })
    }
}

impl FromStr for Capability {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "mutable" => Ok(Self::Mutable),
            "minting" => Ok(Self::Minting),
            _ => Err(anyhow!("unknown capability '{s}'")),
        }
    }
}

/// The payload of a non-fungible token; at most [`Commitment::MAX_SIZE`] bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Commitment(Vec<u8>);

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl Commitment {
    pub const MAX_SIZE: usize = 40;

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<u8>> for Commitment {
    type Error = anyhow::Error;

    fn try_from(bytes: Vec<u8>) -> anyhow::Result<Self> {
        ensure!(
            bytes.len() <= Self::MAX_SIZE,
            "commitment too long; expected at most {} bytes, got {} bytes",
            Self::MAX_SIZE,
            bytes.len(),
        );
        Ok(Self(bytes))
    }
}

impl TryFrom<&[u8]> for Commitment {
    type Error = anyhow::Error;

    fn try_from(bytes: &[u8]) -> anyhow::Result<Self> {
        Self::try_from(bytes.to_vec())
    }
}

impl TryFrom<&str> for Commitment {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> anyhow::Result<Self> {
        Self::try_from(hex::decode(s)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nft {
    capability: Capability,
    commitment: Commitment,
}

impl fmt::Display for Nft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nft({}, {:?})", self.capability, self.commitment.to_string())
    }
}

impl Nft {
    pub fn new(capability: Capability, commitment: Commitment) -> Self {
        Self {
            capability,
            commitment,
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }
}

/// The token data attached to an output: an amount of fungible tokens, an optional NFT, or both,
/// all of the same category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    category: Category,
    amount: u64,
    nft: Option<Nft>,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({}, amount={}", self.category, self.amount)?;
        if let Some(nft) = &self.nft {
            write!(f, ", {nft}")?;
        }
        f.write_str(")")
    }
}

// -------------------------------------------------------------------- Building

impl Token {
    /// See also [`token!`](crate::token).
    pub fn new(category: Category, amount: u64) -> Self {
        Self {
            category,
            amount,
            nft: None,
        }
    }

    pub fn with_nft(mut self, nft: Nft) -> Self {
        self.nft = Some(nft);
        self
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }
}

// ------------------------------------------------------------------ Inspecting

impl Token {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn nft(&self) -> Option<&Nft> {
        self.nft.as_ref()
    }

    /// Check the shape constraints that hold for any token found in an output.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.amount == 0 && self.nft.is_none() {
            bail!("token carries neither a fungible amount nor an NFT");
        }

        ensure!(
            self.amount <= MAX_AMOUNT,
            "fungible amount {} exceeds maximum {}",
            self.amount,
            MAX_AMOUNT,
        );

        Ok(())
    }
}

// -------------------------------------------------------------------- Encoding

impl Encode for Token {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(PREFIX_TOKEN);
        buf.extend_from_slice(&self.category.to_wire_bytes());

        let mut bitfield = 0;
        if let Some(nft) = &self.nft {
            bitfield |= HAS_NFT | nft.capability.to_nibble();
            if !nft.commitment.is_empty() {
                bitfield |= HAS_COMMITMENT;
            }
        }
        if self.amount > 0 {
            bitfield |= HAS_AMOUNT;
        }
        buf.push(bitfield);

        if let Some(nft) = &self.nft
            && !nft.commitment.is_empty()
        {
            encoding::write_var_bytes(buf, nft.commitment.as_bytes());
        }

        if self.amount > 0 {
            encoding::write_compact_size(buf, self.amount);
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use crate::{
        Capability, Commitment, Nft, Token, any, category, encoding::ToBytes, token,
    };
    use proptest::prelude::*;

    // -------------------------------------------------------------- Unit tests

    #[test]
    fn reject_oversized_commitment() {
        assert!(Commitment::try_from(vec![0; 40]).is_ok());
        assert!(Commitment::try_from(vec![0; 41]).is_err());
    }

    #[test]
    fn reject_empty_token() {
        let category =
            category!("702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce");
        assert!(Token::new(category, 0).validate().is_err());
        assert!(token!(category, 0, Capability::Minting, "").validate().is_ok());
        assert!(Token::new(category, 1).validate().is_ok());
    }

    #[test]
    fn encode_minting_nft_without_commitment() {
        let category =
            category!("00000000000000000000000000000000000000000000000000000000000000ff");
        let bytes = token!(category, 0, Capability::Minting, "").to_bytes();
        assert_eq!(bytes[0], 0xef);
        assert_eq!(bytes[1], 0xff);
        assert_eq!(hex::encode(&bytes[33..]), "22");
    }

    #[test]
    fn encode_nft_with_commitment_and_amount() {
        let category =
            category!("00000000000000000000000000000000000000000000000000000000000000ff");
        let bytes = token!(category, 1000, Capability::Mutable, "cafe").to_bytes();
        assert_eq!(hex::encode(&bytes[33..]), "7102cafefde803");
    }

    #[test]
    fn parse_capability() {
        assert_eq!("minting".parse::<Capability>().ok(), Some(Capability::Minting));
        assert!("burning".parse::<Capability>().is_err());
    }

    // -------------------------------------------------------------- Properties

    proptest! {
        #[test]
        fn generated_tokens_are_valid(token in any::token()) {
            prop_assert!(token.validate().is_ok());
        }
    }

    // -------------------------------------------------------------- Generators

    pub mod generators {
        use super::*;

        pub fn capability() -> impl Strategy<Value = Capability> {
            prop_oneof![
                Just(Capability::None),
                Just(Capability::Mutable),
                Just(Capability::Minting),
            ]
        }

        pub fn commitment() -> impl Strategy<Value = Commitment> {
            proptest::collection::vec(any::<u8>(), 0..=Commitment::MAX_SIZE)
                .prop_filter_map("commitment too long", |bytes| Commitment::try_from(bytes).ok())
        }

        prop_compose! {
            pub fn nft()(capability in capability(), commitment in commitment()) -> Nft {
                Nft::new(capability, commitment)
            }
        }

        prop_compose! {
            pub fn token()(
                category in any::category(),
                amount in 0..1_000_000_000u64,
                nft in proptest::option::of(nft()),
            ) -> Token {
                match nft {
                    Some(nft) => Token::new(category, amount).with_nft(nft),
                    None => Token::new(category, amount.max(1)),
                }
            }
        }
    }
}
