//! Serial ledger state machine.
//!
//! [`LedgerState`] owns the balance and allowance tables and applies one
//! operation at a time through `&mut self`. Every operation validates
//! completely before writing anything and returns a [`Receipt`] listing the
//! events it emitted, in order. Sharing across threads is the job of
//! [`crate::Ledger`].

use serde::{Deserialize, Serialize};
use tinydex_common::{Address, LedgerError, Result, TokenAmount};

use crate::allowance::{AllowanceEntry, AllowanceTable};
use crate::balance::BalanceTable;
use crate::journal::Event;
use crate::token::TokenMetadata;

/// Outcome of a successful mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Always `true` for a returned receipt; failures surface as errors.
    pub success: bool,
    /// Events emitted by the call, in emission order.
    pub events: Vec<Event>,
}

impl Receipt {
    fn emitted(event: Event) -> Self {
        Self {
            success: true,
            events: vec![event],
        }
    }
}

/// Point-in-time copy of the whole ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Token metadata.
    pub metadata: TokenMetadata,
    /// Genesis account.
    pub deployer: Address,
    /// All balances.
    pub balances: BalanceTable,
    /// All allowances, ordered by owner then spender.
    pub allowances: Vec<AllowanceEntry>,
}

/// Result of recomputing supply from balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Declared total supply.
    pub total_supply: TokenAmount,
    /// Sum of every balance; `None` if the sum overflowed.
    pub balance_sum: Option<TokenAmount>,
    /// Accounts holding a non-zero balance.
    pub holders: usize,
}

impl IntegrityReport {
    /// Check if balances add up to the total supply.
    pub fn is_consistent(&self) -> bool {
        self.balance_sum == Some(self.total_supply)
    }
}

/// The token ledger.
#[derive(Debug, Clone)]
pub struct LedgerState {
    metadata: TokenMetadata,
    deployer: Address,
    balances: BalanceTable,
    allowances: AllowanceTable,
}

impl LedgerState {
    /// Create the ledger, crediting the full supply to `deployer`.
    ///
    /// The genesis mint is described by [`LedgerState::genesis_event`].
    pub fn genesis(deployer: Address) -> Result<Self> {
        if deployer.is_zero() {
            return Err(LedgerError::InvalidRecipient(deployer));
        }

        let metadata = TokenMetadata::tinydex();
        let mut balances = BalanceTable::new();
        balances.seed(deployer, metadata.total_supply);

        Ok(Self {
            metadata,
            deployer,
            balances,
            allowances: AllowanceTable::new(),
        })
    }

    /// Conventional mint notification for genesis: null address → deployer.
    pub fn genesis_event(&self) -> Event {
        Event::Transfer {
            from: Address::ZERO,
            to: self.deployer,
            value: self.metadata.total_supply,
        }
    }

    /// Token name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Token ticker.
    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    /// Fractional digits of the display unit.
    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    /// Fixed supply in base units.
    pub fn total_supply(&self) -> TokenAmount {
        self.metadata.total_supply
    }

    /// All token metadata.
    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    /// Account that received the genesis supply.
    pub fn deployer(&self) -> Address {
        self.deployer
    }

    /// Get the balance of `account`; zero for accounts never credited.
    pub fn balance_of(&self, account: &Address) -> TokenAmount {
        self.balances.balance_of(account)
    }

    /// Get what `spender` may still move out of `owner`'s balance.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount {
        self.allowances.allowance(owner, spender)
    }

    /// Move `amount` from `sender` to `recipient`.
    ///
    /// A zero amount succeeds and still emits `Transfer`.
    pub fn transfer(
        &mut self,
        sender: Address,
        recipient: Address,
        amount: TokenAmount,
    ) -> Result<Receipt> {
        if recipient.is_zero() {
            return Err(LedgerError::InvalidRecipient(recipient));
        }

        self.balances.move_funds(sender, recipient, amount)?;

        Ok(Receipt::emitted(Event::Transfer {
            from: sender,
            to: recipient,
            value: amount,
        }))
    }

    /// Set the allowance of `spender` over `owner`'s funds to exactly `amount`.
    ///
    /// This overwrites; it never adds to the previous value. A spender may
    /// front-run a change from N to M and spend N + M. Callers that need a
    /// safe adjustment should read [`LedgerState::allowance`] and set to zero
    /// before setting a new non-zero value.
    ///
    /// The owner's balance is not checked.
    pub fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: TokenAmount,
    ) -> Result<Receipt> {
        if spender.is_zero() {
            return Err(LedgerError::InvalidSpender(spender));
        }

        self.allowances.set(owner, spender, amount);

        Ok(Receipt::emitted(Event::Approval {
            owner,
            spender,
            value: amount,
        }))
    }

    /// `spender` moves `amount` from `owner` to `recipient` against a prior
    /// approval.
    ///
    /// Checks run in a fixed order: recipient, allowance, balance. The
    /// allowance is decremented without emitting `Approval`. A zero amount
    /// leaves the allowance table as it was.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        owner: Address,
        recipient: Address,
        amount: TokenAmount,
    ) -> Result<Receipt> {
        if recipient.is_zero() {
            return Err(LedgerError::InvalidRecipient(recipient));
        }

        let remaining = self.allowances.remaining_after(owner, spender, amount)?;
        self.balances.move_funds(owner, recipient, amount)?;
        if !amount.is_zero() {
            self.allowances.set(owner, spender, remaining);
        }

        Ok(Receipt::emitted(Event::Transfer {
            from: owner,
            to: recipient,
            value: amount,
        }))
    }

    /// Consistent copy of all state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            metadata: self.metadata.clone(),
            deployer: self.deployer,
            balances: self.balances.clone(),
            allowances: self.allowances.entries(),
        }
    }

    /// Recompute the sum of balances against the total supply.
    pub fn verify_integrity(&self) -> IntegrityReport {
        IntegrityReport {
            total_supply: self.metadata.total_supply,
            balance_sum: self.balances.total(),
            holders: self.balances.holders(),
        }
    }
}
