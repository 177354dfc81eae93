//! Account balance table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tinydex_common::{Address, LedgerError, Result, TokenAmount};

/// Mapping from account to balance in base units.
///
/// Accounts without an entry hold zero. Entries are created on first credit
/// and never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTable {
    balances: HashMap<Address, TokenAmount>,
}

impl BalanceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the balance of an account (zero when absent).
    pub fn balance_of(&self, account: &Address) -> TokenAmount {
        self.balances
            .get(account)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Credit a fresh account at genesis.
    pub(crate) fn seed(&mut self, account: Address, amount: TokenAmount) {
        self.balances.insert(account, amount);
    }

    /// Move `amount` from `from` to `to` as one step.
    ///
    /// Both new balances are computed before either is written, so an error
    /// leaves the table untouched. A self-move or a zero amount writes
    /// nothing.
    pub fn move_funds(&mut self, from: Address, to: Address, amount: TokenAmount) -> Result<()> {
        let available = self.balance_of(&from);
        let from_after = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                account: from,
                required: amount,
                available,
            })?;

        if from == to || amount.is_zero() {
            return Ok(());
        }

        let to_after = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow(to))?;

        self.balances.insert(from, from_after);
        self.balances.insert(to, to_after);
        Ok(())
    }

    /// Sum of all balances; `None` if the sum does not fit.
    pub fn total(&self) -> Option<TokenAmount> {
        self.balances
            .values()
            .try_fold(TokenAmount::ZERO, |acc, b| acc.checked_add(*b))
    }

    /// Number of accounts with a non-zero balance.
    pub fn holders(&self) -> usize {
        self.balances.values().filter(|b| !b.is_zero()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_operations() {
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        let mut table = BalanceTable::new();
        table.seed(alice, TokenAmount::from_whole(100));

        table.move_funds(alice, bob, TokenAmount::from_whole(40)).unwrap();

        assert_eq!(table.balance_of(&alice), TokenAmount::from_whole(60));
        assert_eq!(table.balance_of(&bob), TokenAmount::from_whole(40));
        assert_eq!(table.total(), Some(TokenAmount::from_whole(100)));
        assert_eq!(table.holders(), 2);
    }

    #[test]
    fn test_zero_move_creates_no_entries() {
        let alice = Address::derive("alice");
        let mut table = BalanceTable::new();
        let before = table.clone();

        table
            .move_funds(alice, Address::derive("bob"), TokenAmount::ZERO)
            .unwrap();
        assert_eq!(table, before);
    }

    #[test]
    fn test_insufficient_funds_leaves_table_untouched() {
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        let mut table = BalanceTable::new();
        table.seed(alice, TokenAmount::from_whole(5));
        let before = table.clone();

        let err = table
            .move_funds(alice, bob, TokenAmount::from_whole(6))
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                account: alice,
                required: TokenAmount::from_whole(6),
                available: TokenAmount::from_whole(5),
            }
        );
        assert_eq!(table, before);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        let mut table = BalanceTable::new();
        table.seed(alice, TokenAmount::from_base_units(1));
        table.seed(bob, TokenAmount::from_base_units(u128::MAX));
        let before = table.clone();

        let err = table
            .move_funds(alice, bob, TokenAmount::from_base_units(1))
            .unwrap_err();

        assert_eq!(err, LedgerError::ArithmeticOverflow(bob));
        assert_eq!(table, before);
    }

    #[test]
    fn test_self_move() {
        let alice = Address::derive("alice");
        let mut table = BalanceTable::new();
        table.seed(alice, TokenAmount::from_whole(7));

        table.move_funds(alice, alice, TokenAmount::from_whole(7)).unwrap();
        assert_eq!(table.balance_of(&alice), TokenAmount::from_whole(7));

        assert!(table.move_funds(alice, alice, TokenAmount::from_whole(8)).is_err());
    }
}
