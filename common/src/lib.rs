//! TinyDEX Common Types
//!
//! Shared types used across the TinyDEX token ledger: account addresses,
//! base-unit token amounts and the ledger error taxonomy.

pub mod identifiers;
pub mod monetary;
pub mod error;

pub use identifiers::*;
pub use monetary::*;
pub use error::*;
