//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Token scenarios replayed against the in-memory provider: minting an authentication token,
//! deriving tokens from it, and minting then redeeming a basket token backed by deposited
//! assets.

mod cmd;
pub use cmd::{Cmd, Options, Scenario};

pub mod covenant;
pub mod env;
pub mod scenario;

pub use scenario::Session;
