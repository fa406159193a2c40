//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

pub mod address;
pub mod argument;
pub mod artifact;
pub mod category;
pub mod contract;
pub mod crypto;
pub mod hash;
pub mod input;
pub mod ledger;
pub mod locking_bytecode;
pub mod macros;
pub mod network_id;
pub mod output;
pub mod provider;
pub mod script;
pub mod token;
pub mod transaction;
pub mod unlock;
pub mod utxo;
pub mod value;
pub mod wallet;
