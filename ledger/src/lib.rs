//! TinyDEX Token Ledger
//!
//! Fixed-supply fungible token (`TinyDEX` / `TDEX`, 18 decimals, 21,000,000
//! whole tokens) with direct transfers and allowance-based delegated
//! transfers. Every successful mutation emits `Transfer` or `Approval`
//! events that are returned to the caller, journaled and broadcast.

pub mod engine;
pub mod state;
pub mod balance;
pub mod allowance;
pub mod journal;
pub mod token;
pub mod config;

pub use engine::Ledger;
pub use state::{IntegrityReport, LedgerSnapshot, LedgerState, Receipt};
pub use journal::{Event, EventRecord, Journal};
pub use token::{TokenMetadata, TOTAL_SUPPLY};
pub use config::{ConfigError, LedgerConfig};
