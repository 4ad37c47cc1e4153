#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Id;
use crate::money::Money;

/// A savings balance the user keeps up to date by hand.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SavingsAccount {
    pub id: Id,
    pub name: String,
    pub balance: Money,
}

impl SavingsAccount {
    pub fn new(id: Id, name: impl Into<String>, balance: Money) -> Self {
        Self {
            id,
            name: name.into(),
            balance,
        }
    }
}

impl fmt::Display for SavingsAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ${:.2}", self.name, self.balance)
    }
}

pub fn total_savings(accounts: &[SavingsAccount]) -> Money {
    accounts
        .iter()
        .fold(Money::ZERO, |sum, a| sum.saturating_add(a.balance))
}
