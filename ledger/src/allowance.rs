//! Delegated spending allowances.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tinydex_common::{Address, LedgerError, Result, TokenAmount};

/// One (owner, spender) allowance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceEntry {
    /// Account whose funds may be moved.
    pub owner: Address,
    /// Account authorized to move them.
    pub spender: Address,
    /// Remaining amount.
    pub amount: TokenAmount,
}

/// Mapping from (owner, spender) to remaining allowance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowanceTable {
    allowances: HashMap<(Address, Address), TokenAmount>,
}

impl AllowanceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining allowance (zero when absent).
    pub fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Overwrite the allowance with `amount`.
    pub fn set(&mut self, owner: Address, spender: Address, amount: TokenAmount) {
        self.allowances.insert((owner, spender), amount);
    }

    /// Compute the allowance left after spending `amount`, without writing.
    pub fn remaining_after(
        &self,
        owner: Address,
        spender: Address,
        amount: TokenAmount,
    ) -> Result<TokenAmount> {
        let available = self.allowance(&owner, &spender);
        available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance {
                owner,
                spender,
                required: amount,
                available,
            })
    }

    /// All entries, ordered by owner then spender.
    pub fn entries(&self) -> Vec<AllowanceEntry> {
        let mut entries: Vec<_> = self
            .allowances
            .iter()
            .map(|(&(owner, spender), &amount)| AllowanceEntry {
                owner,
                spender,
                amount,
            })
            .collect();
        entries.sort_by(|a, b| (a.owner, a.spender).cmp(&(b.owner, b.spender)));
        entries
    }
}
