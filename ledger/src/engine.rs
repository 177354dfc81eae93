//! Thread-safe ledger facade.

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use tinydex_common::{Address, Result, TokenAmount};

use crate::config::LedgerConfig;
use crate::journal::{EventRecord, Journal};
use crate::state::{IntegrityReport, LedgerSnapshot, LedgerState, Receipt};
use crate::token::TokenMetadata;

struct Inner {
    state: LedgerState,
    journal: Journal,
}

/// Shared handle to the token ledger.
///
/// Mutations hold a single write lock across validation, state update,
/// journaling and broadcast, so calls are applied one at a time and event
/// order on every channel matches journal order. Queries share a read lock
/// and never see a half-applied call.
pub struct Ledger {
    inner: RwLock<Inner>,
    events_tx: broadcast::Sender<EventRecord>,
}

impl Ledger {
    /// Deploy a ledger from configuration.
    pub fn deploy(config: &LedgerConfig) -> Result<Self> {
        let state = LedgerState::genesis(config.deployer)?;
        let mut journal = Journal::with_limit(config.journal_limit);
        let genesis = journal.append(state.genesis_event());
        let (events_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));

        info!(
            deployer = %config.deployer,
            total_supply = %state.total_supply(),
            sequence = genesis.sequence,
            "Ledger deployed"
        );

        Ok(Self {
            inner: RwLock::new(Inner { state, journal }),
            events_tx,
        })
    }

    /// Deploy with default settings and the given deployer.
    pub fn with_deployer(deployer: Address) -> Result<Self> {
        Self::deploy(&LedgerConfig {
            deployer,
            ..LedgerConfig::default()
        })
    }

    pub fn name(&self) -> String {
        self.inner.read().state.name().to_string()
    }

    pub fn symbol(&self) -> String {
        self.inner.read().state.symbol().to_string()
    }

    pub fn decimals(&self) -> u8 {
        self.inner.read().state.decimals()
    }

    pub fn total_supply(&self) -> TokenAmount {
        self.inner.read().state.total_supply()
    }

    pub fn metadata(&self) -> TokenMetadata {
        self.inner.read().state.metadata().clone()
    }

    pub fn deployer(&self) -> Address {
        self.inner.read().state.deployer()
    }

    /// Balance of `account`; zero for unknown accounts.
    pub fn balance_of(&self, account: &Address) -> TokenAmount {
        self.inner.read().state.balance_of(account)
    }

    /// Remaining allowance of `spender` over `owner`; zero when never set.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount {
        self.inner.read().state.allowance(owner, spender)
    }

    /// Transfer `amount` from `caller` to `recipient`.
    #[instrument(skip_all, fields(caller = %caller, recipient = %recipient, amount = %amount))]
    pub fn transfer(
        &self,
        caller: Address,
        recipient: Address,
        amount: TokenAmount,
    ) -> Result<Receipt> {
        self.apply("transfer", |state| state.transfer(caller, recipient, amount))
    }

    /// Set `spender`'s allowance over `caller`'s funds to exactly `amount`.
    ///
    /// Overwrites the previous value; see [`LedgerState::approve`].
    #[instrument(skip_all, fields(caller = %caller, spender = %spender, amount = %amount))]
    pub fn approve(&self, caller: Address, spender: Address, amount: TokenAmount) -> Result<Receipt> {
        self.apply("approve", |state| state.approve(caller, spender, amount))
    }

    /// Move `amount` from `owner` to `recipient` on `caller`'s allowance.
    #[instrument(
        skip_all,
        fields(caller = %caller, owner = %owner, recipient = %recipient, amount = %amount)
    )]
    pub fn transfer_from(
        &self,
        caller: Address,
        owner: Address,
        recipient: Address,
        amount: TokenAmount,
    ) -> Result<Receipt> {
        self.apply("transfer_from", |state| {
            state.transfer_from(caller, owner, recipient, amount)
        })
    }

    fn apply<F>(&self, operation: &'static str, op: F) -> Result<Receipt>
    where
        F: FnOnce(&mut LedgerState) -> Result<Receipt>,
    {
        let mut inner = self.inner.write();

        let receipt = match op(&mut inner.state) {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(
                    operation,
                    error_code = e.error_code(),
                    error = %e,
                    "Ledger call rejected"
                );
                return Err(e);
            }
        };

        for event in &receipt.events {
            let record = inner.journal.append(event.clone());
            info!(
                operation,
                sequence = record.sequence,
                event = record.event.name(),
                "Ledger event emitted"
            );
            // No subscribers is not an error
            let _ = self.events_tx.send(record);
        }

        Ok(receipt)
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.events_tx.subscribe()
    }

    /// Retained journal records with `sequence >= from`.
    pub fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.inner.read().journal.events_since(from)
    }

    /// Sequence number of the next event.
    pub fn next_sequence(&self) -> u64 {
        self.inner.read().journal.next_sequence()
    }

    /// Consistent copy of all state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.inner.read().state.snapshot()
    }

    /// Verify balances add up to the total supply.
    pub fn verify_integrity(&self) -> IntegrityReport {
        let report = self.inner.read().state.verify_integrity();
        if !report.is_consistent() {
            warn!(
                total_supply = %report.total_supply,
                balance_sum = ?report.balance_sum,
                "Ledger integrity check failed"
            );
        }
        report
    }
}
