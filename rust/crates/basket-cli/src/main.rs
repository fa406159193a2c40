//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use basket_cli::{Cmd, env};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env::load(None)?.init();

    Cmd::parse().execute().await
}
