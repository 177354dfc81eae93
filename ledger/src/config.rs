//! Ledger configuration.

use thiserror::Error;
use tinydex_common::{Address, AddressError};

/// Label the default deployer address is derived from.
pub const DEFAULT_DEPLOYER_LABEL: &str = "deployer";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `TINYDEX_DEPLOYER` is not a valid address.
    #[error("Invalid deployer address: {0}")]
    InvalidDeployer(#[from] AddressError),

    /// A numeric variable could not be parsed.
    #[error("Invalid value for {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Account credited with the full supply at genesis.
    pub deployer: Address,
    /// Buffer size of the event broadcast channel.
    pub event_channel_capacity: usize,
    /// Maximum journal records kept in memory (`None` = unbounded).
    pub journal_limit: Option<usize>,
    /// Log level.
    pub log_level: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            deployer: Address::derive(DEFAULT_DEPLOYER_LABEL),
            event_channel_capacity: 1024,
            journal_limit: None,
            log_level: "info".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(deployer) = std::env::var("TINYDEX_DEPLOYER") {
            config.deployer = deployer.parse()?;
        }

        if let Ok(capacity) = std::env::var("TINYDEX_EVENT_CAPACITY") {
            config.event_channel_capacity =
                capacity.parse().map_err(|_| ConfigError::InvalidNumber {
                    name: "TINYDEX_EVENT_CAPACITY",
                    value: capacity.clone(),
                })?;
        }

        if let Ok(limit) = std::env::var("TINYDEX_JOURNAL_LIMIT") {
            let limit: usize = limit.parse().map_err(|_| ConfigError::InvalidNumber {
                name: "TINYDEX_JOURNAL_LIMIT",
                value: limit.clone(),
            })?;
            config.journal_limit = Some(limit);
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deployer.is_zero() {
            return Err(ConfigError::Invalid(
                "Deployer cannot be the null address".to_string(),
            ));
        }

        if self.event_channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "Event channel capacity cannot be 0".to_string(),
            ));
        }

        if self.journal_limit == Some(0) {
            return Err(ConfigError::Invalid(
                "Journal limit cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}
