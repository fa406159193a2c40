//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Category, Output, pretty};
use anyhow::anyhow;
use std::{
    collections::{BTreeMap, btree_map},
    fmt,
};

/// An aggregate of satoshis and fungible token amounts, keyed by category. Non-fungible tokens are
/// not values: they are tracked individually by the ledger rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value(u64, BTreeMap<Category, u64>);

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug_struct = f.debug_struct("Value");

        debug_struct.field("satoshis", &self.0);

        if !self.fungibles().is_empty() {
            debug_struct.field(
                "fungibles",
                &pretty::Fmt(|f: &mut fmt::Formatter<'_>| {
                    let mut map = f.debug_map();
                    for (category, amount) in &self.1 {
                        map.entry(&pretty::ViaDisplayNoAlloc(category), amount);
                    }
                    map.finish()
                }),
            );
        }

        debug_struct.finish()
    }
}

// ------------------------------------------------------------------ Inspecting

impl Value {
    pub fn satoshis(&self) -> u64 {
        self.0
    }

    pub fn fungibles(&self) -> &BTreeMap<Category, u64> {
        &self.1
    }

    /// The fungible amount of a category; zero when absent.
    pub fn amount_of(&self, category: &Category) -> u64 {
        self.1.get(category).copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0 && self.1.is_empty()
    }
}

// -------------------------------------------------------------------- Building

impl Value {
    pub fn new(satoshis: u64) -> Self {
        Self(satoshis, BTreeMap::default())
    }

    /// The total value held by a sequence of outputs.
    pub fn total<'a>(outputs: impl IntoIterator<Item = &'a Output>) -> anyhow::Result<Self> {
        outputs
            .into_iter()
            .try_fold(Self::default(), |mut total, output| {
                total.add(&Self::from(output))?;
                Ok(total)
            })
    }

    pub fn with_fungible(mut self, category: Category, amount: u64) -> Self {
        if amount > 0 {
            *self.1.entry(category).or_default() += amount;
        }
        self
    }

    /// Sum two values, failing on overflow rather than wrapping.
    pub fn add(&mut self, rhs: &Self) -> anyhow::Result<&mut Self> {
        self.0 = self.0.checked_add(rhs.0).ok_or_else(|| {
            anyhow!("satoshis overflow").context(format!("lhs = {}, rhs = {}", self.0, rhs.0))
        })?;

        for (category, amount) in &rhs.1 {
            let lhs = self.1.entry(*category).or_default();
            *lhs = lhs.checked_add(*amount).ok_or_else(|| {
                anyhow!("category={category}").context("fungible amount overflow")
            })?;
        }

        Ok(self)
    }

    pub fn checked_sub(&mut self, rhs: &Self) -> anyhow::Result<&mut Self> {
        self.0 = self.0.checked_sub(rhs.0).ok_or_else(|| {
            anyhow!("insufficient lhs satoshis")
                .context(format!("lhs = {}, rhs = {}", self.0, rhs.0))
        })?;

        for (category, amount) in &rhs.1 {
            match self.1.entry(*category) {
                btree_map::Entry::Vacant(_) => {
                    return Err(anyhow!("category={category}")
                        .context("insufficient lhs amount: unknown category"));
                }
                btree_map::Entry::Occupied(mut lhs) => {
                    *lhs.get_mut() = lhs.get().checked_sub(*amount).ok_or_else(|| {
                        anyhow!("category={category}")
                            .context(format!("lhs amount={}, rhs amount={}", lhs.get(), amount))
                            .context("insufficient lhs amount")
                    })?;

                    if *lhs.get() == 0 {
                        lhs.remove();
                    }
                }
            }
        }

        Ok(self)
    }
}

// ----------------------------------------------------------- Converting (from)

impl From<&Output> for Value {
    fn from(output: &Output) -> Self {
        let value = Self::new(output.satoshis());
        match output.token() {
            Some(token) => value.with_fungible(token.category(), token.amount()),
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Value;
    use crate::category;

    #[test]
    fn display_only_satoshis() {
        assert_eq!(Value::new(42).to_string(), "Value { satoshis: 42 }")
    }

    #[test]
    fn display_value_with_fungibles() {
        let value = Value::new(1000).with_fungible(
            category!("702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce"),
            1376,
        );
        assert_eq!(
            value.to_string(),
            "Value { \
                satoshis: 1000, \
                fungibles: {702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce: 1376} \
            }",
        )
    }

    #[test]
    fn sub_removes_exhausted_categories() {
        let category =
            category!("702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce");
        let mut lhs = Value::new(10).with_fungible(category, 5);
        lhs.checked_sub(&Value::new(3).with_fungible(category, 5))
            .unwrap();
        assert_eq!(lhs, Value::new(7));
    }

    #[test]
    fn sub_rejects_shortfall() {
        let category =
            category!("702206530b2e1566e90b3aec753bd0abbf397842bd5421e0c3d23ed10167b3ce");
        let mut lhs = Value::new(10).with_fungible(category, 5);
        assert!(lhs.checked_sub(&Value::new(11)).is_err());
        assert!(lhs.checked_sub(&Value::new(0).with_fungible(category, 6)).is_err());
    }
}
