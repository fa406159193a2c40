//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Allow tokens to be destroyed by omission
pub const ALLOW_IMPLICIT_BURN: &str = "BASKET_ALLOW_IMPLICIT_BURN";

/// One of 'mainnet', 'testnet' or 'simulated'
pub const NETWORK: &str = "BASKET_NETWORK";

/// Wallet secret key, as 64 hex digits or WIF
pub const SECRET: &str = "BASKET_SECRET";

pub const UPDATE_UTXO_SET: &str = "BASKET_UPDATE_UTXO_SET";

/// Load variables from `.env` when one exists (or from `path`, which must exist), then prepare
/// the logger from the resulting environment. Variables already set take precedence.
pub fn load(path: Option<&std::path::Path>) -> anyhow::Result<env_logger::Builder> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)?;
        }
        None => {
            if let Err(e) = dotenvy::dotenv()
                && !e.not_found()
            {
                return Err(anyhow::anyhow!(e).context("failed to load .env"));
            }
        }
    }

    Ok(env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    ))
}

#[cfg(test)]
mod tests {
    use super::load;
    use log::LevelFilter;

    #[test]
    fn logger_honours_dotenv_file() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }

        let path = std::env::temp_dir().join(format!("basket-cli-{}.env", std::process::id()));
        std::fs::write(&path, "RUST_LOG=trace\n").unwrap();
        let loaded = load(Some(&path));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.unwrap().build().filter(), LevelFilter::Trace);
    }

    #[test]
    fn reject_missing_dotenv_file() {
        assert!(load(Some(std::path::Path::new("/nonexistent/basket.env"))).is_err());
    }
}
