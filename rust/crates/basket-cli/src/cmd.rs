//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{
    env,
    scenario::{self, Session},
};
use cashtoken_tx_builder::{MockProvider, NetworkId, Wallet};

/// Replay token scenarios against a simulated chain
#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cmd {
    #[command(flatten)]
    pub options: Options,

    #[command(subcommand)]
    pub scenario: Scenario,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Options {
    /// Network used to render addresses and keys
    #[arg(long, env = env::NETWORK, default_value_t = NetworkId::Simulated)]
    pub network: NetworkId,

    /// Make outputs spendable as soon as their transaction is accepted; when false, they only
    /// become spendable once confirmed
    #[arg(
        long,
        env = env::UPDATE_UTXO_SET,
        default_value_t = true,
        action = clap::ArgAction::Set,
    )]
    pub update_utxo_set: bool,

    /// Wallet secret key; a fresh one is generated when absent
    #[arg(long, env = env::SECRET, hide_env_values = true)]
    pub secret: Option<String>,

    /// Allow tokens found in inputs to be destroyed by leaving them out of the outputs
    #[arg(long, env = env::ALLOW_IMPLICIT_BURN)]
    pub allow_implicit_burn: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::Subcommand)]
pub enum Scenario {
    /// Mint an authentication token out of a fresh funding output
    Auth,
    /// Derive an immutable token from an authentication token, then attempt to multiply it
    Minting,
    /// Deploy the basket contracts, then mint and redeem a basket token
    Compose,
}

impl Options {
    /// A fresh simulated chain, and the wallet driving the scenario.
    pub fn session(&self) -> anyhow::Result<Session> {
        let wallet = match &self.secret {
            Some(secret) => Wallet::from_secret(self.network, secret)?,
            None => Wallet::generate(self.network),
        };

        let provider = MockProvider::new(self.network).with_update_utxo_set(self.update_utxo_set);

        Ok(Session::new(provider, wallet).with_implicit_burn(self.allow_implicit_burn))
    }
}

impl Cmd {
    pub async fn execute(self) -> anyhow::Result<()> {
        let session = self.options.session()?;

        let report = match self.scenario {
            Scenario::Auth => serde_json::to_value(scenario::auth::run(&session).await?)?,
            Scenario::Minting => serde_json::to_value(scenario::minting::run(&session).await?)?,
            Scenario::Compose => serde_json::to_value(scenario::compose::run(&session).await?)?,
        };

        println!("{}", serde_json::to_string_pretty(&report)?);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Cmd, Scenario};
    use cashtoken_tx_builder::NetworkId;
    use clap::Parser;

    #[test]
    fn parse_defaults() {
        let cmd = Cmd::try_parse_from(["basket", "minting"]).unwrap();
        assert_eq!(cmd.scenario, Scenario::Minting);
        assert_eq!(cmd.options.network, NetworkId::Simulated);
        assert!(cmd.options.update_utxo_set);
        assert!(!cmd.options.allow_implicit_burn);
    }

    #[test]
    fn parse_options() {
        let cmd = Cmd::try_parse_from([
            "basket",
            "--network",
            "testnet",
            "--update-utxo-set",
            "false",
            "--allow-implicit-burn",
            "compose",
        ])
        .unwrap();
        assert_eq!(cmd.scenario, Scenario::Compose);
        assert_eq!(cmd.options.network, NetworkId::Testnet);
        assert!(!cmd.options.update_utxo_set);
        assert!(cmd.options.allow_implicit_burn);
    }

    #[test]
    fn reject_unknown_network() {
        assert!(Cmd::try_parse_from(["basket", "--network", "preprod", "auth"]).is_err());
    }
}
