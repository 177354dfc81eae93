//! Error types for TinyDEX ledger operations.

use crate::{Address, TokenAmount};
use thiserror::Error;

/// Reasons a ledger call is rejected.
///
/// Every variant is raised before any state is written, so a rejected call
/// has no effect on balances, allowances or the event journal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Transfer destination is the null address.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(Address),

    /// Approval or delegated-transfer spender is the null address.
    #[error("Invalid spender: {0}")]
    InvalidSpender(Address),

    /// Mover lacks funds.
    #[error("Insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: Address,
        required: TokenAmount,
        available: TokenAmount,
    },

    /// Delegated mover lacks authorization.
    #[error("Insufficient allowance for {spender} on {owner}: required {required}, available {available}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        required: TokenAmount,
        available: TokenAmount,
    },

    /// A checked balance update overflowed.
    #[error("Arithmetic overflow crediting {0}")]
    ArithmeticOverflow(Address),
}

impl LedgerError {
    /// Stable error code for logs and external callers.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::InvalidRecipient(_) => "INVALID_RECIPIENT",
            LedgerError::InvalidSpender(_) => "INVALID_SPENDER",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::InsufficientAllowance { .. } => "INSUFFICIENT_ALLOWANCE",
            LedgerError::ArithmeticOverflow(_) => "ARITHMETIC_OVERFLOW",
        }
    }
}

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = LedgerError::InsufficientBalance {
            account: Address::derive("alice"),
            required: TokenAmount::from_whole(100),
            available: TokenAmount::ZERO,
        };
        assert_eq!(err.error_code(), "INSUFFICIENT_BALANCE");
        assert_eq!(
            LedgerError::InvalidRecipient(Address::ZERO).error_code(),
            "INVALID_RECIPIENT"
        );
    }

    #[test]
    fn test_error_message() {
        let err = LedgerError::InsufficientAllowance {
            owner: Address::ZERO,
            spender: Address::ZERO,
            required: TokenAmount::from_whole(101),
            available: TokenAmount::from_whole(100),
        };
        let message = err.to_string();
        assert!(message.contains("required 101"));
        assert!(message.contains("available 100"));
    }
}
