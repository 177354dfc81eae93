//! Token metadata.

use serde::{Deserialize, Serialize};
use tinydex_common::{TokenAmount, TOKEN_DECIMALS};

/// Token name.
pub const TOKEN_NAME: &str = "TinyDEX";

/// Token ticker symbol.
pub const TOKEN_SYMBOL: &str = "TDEX";

/// Whole tokens minted at genesis.
pub const TOTAL_SUPPLY_WHOLE: u64 = 21_000_000;

/// Fixed total supply in base units (21,000,000 × 10^18).
pub const TOTAL_SUPPLY: TokenAmount = TokenAmount::from_whole(TOTAL_SUPPLY_WHOLE);

/// Immutable token metadata, fixed at genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Token name.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Decimal places.
    pub decimals: u8,
    /// Total supply in base units.
    pub total_supply: TokenAmount,
}

impl TokenMetadata {
    /// Metadata of the TDEX token.
    pub fn tinydex() -> Self {
        Self {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: TOKEN_DECIMALS as u8,
            total_supply: TOTAL_SUPPLY,
        }
    }
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self::tinydex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tinydex_metadata() {
        let meta = TokenMetadata::tinydex();
        assert_eq!(meta.name, "TinyDEX");
        assert_eq!(meta.symbol, "TDEX");
        assert_eq!(meta.decimals, 18);
        assert_eq!(
            meta.total_supply.base_units().to_string(),
            "21000000000000000000000000"
        );
    }
}
