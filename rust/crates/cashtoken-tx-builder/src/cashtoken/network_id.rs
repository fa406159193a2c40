//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use anyhow::anyhow;
use std::{fmt, str::FromStr};

/// The network an address is meant for. It only affects address-prefix encoding (and the version
/// byte of WIF-encoded keys); validation rules are identical across networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum NetworkId {
    Mainnet,
    Testnet,
    #[default]
    Simulated,
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Simulated => "simulated",
        })
    }
}

// ------------------------------------------------------------------ Inspecting

impl NetworkId {
    pub const MAINNET_PREFIX: &'static str = "bitcoincash";
    pub const TESTNET_PREFIX: &'static str = "bchtest";
    pub const SIMULATED_PREFIX: &'static str = "bchreg";

    /// Human-readable part of addresses on this network.
    pub fn address_prefix(self) -> &'static str {
        match self {
            Self::Mainnet => Self::MAINNET_PREFIX,
            Self::Testnet => Self::TESTNET_PREFIX,
            Self::Simulated => Self::SIMULATED_PREFIX,
        }
    }

    pub fn is_mainnet(self) -> bool {
        self == Self::Mainnet
    }
}

// ----------------------------------------------------------- Converting (from)

impl NetworkId {
    pub fn from_address_prefix(prefix: &str) -> anyhow::Result<Self> {
        match prefix {
            Self::MAINNET_PREFIX => Ok(Self::Mainnet),
            Self::TESTNET_PREFIX => Ok(Self::Testnet),
            Self::SIMULATED_PREFIX => Ok(Self::Simulated),
            _ => Err(anyhow!("unknown address prefix: {prefix}")),
        }
    }
}

impl FromStr for NetworkId {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> anyhow::Result<Self> {
        match text {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" | "chipnet" => Ok(Self::Testnet),
            "simulated" | "mocknet" | "regtest" => Ok(Self::Simulated),
            _ => Err(anyhow!(
                "unsupported network: {text}; should be one of {}, {}, {}",
                Self::Mainnet,
                Self::Testnet,
                Self::Simulated,
            )),
        }
    }
}
