//! # Oracle Configuration
//!
//! Construction-time parameters: default liveness, default bond percentage,
//! the per-currency final fee table (which doubles as the currency
//! whitelist), the fee sink and the ancillary-data size limit.
//!
//! Loaded from YAML:
//!
//! ```yaml
//! default_liveness_secs: 7200
//! default_bond_percentage: "1"
//! fee_sink: "0x00000000000000000000000000000000000000fe"
//! final_fees:
//!   USDC: "1500000"
//!   WETH: 0
//! ```
//!
//! Every constructor path ends in [`OracleConfig::validate`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use optimist_core::{Address, Amount, Currency, FixedPoint, MAX_STAMPED_ANCILLARY_LEN};

use crate::liveness::{self, InvalidLiveness};

/// Liveness applied when a request sets none: two hours.
pub const DEFAULT_LIVENESS_SECS: u64 = 7200;

/// Oracle construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Liveness for requests without a custom one.
    #[serde(default = "default_liveness")]
    pub default_liveness_secs: u64,
    /// Default bond as a multiple of the currency's final fee.
    #[serde(default = "default_bond_percentage")]
    pub default_bond_percentage: FixedPoint,
    /// Final fee per supported currency. Currencies absent here are
    /// rejected at request time.
    pub final_fees: BTreeMap<Currency, Amount>,
    /// Recipient of burned bond halves and losers' final fees.
    pub fee_sink: Address,
    /// Upper bound on stamped ancillary data, in bytes.
    #[serde(default = "default_ancillary_limit")]
    pub max_ancillary_data_len: usize,
}

fn default_liveness() -> u64 {
    DEFAULT_LIVENESS_SECS
}

fn default_bond_percentage() -> FixedPoint {
    FixedPoint::ONE
}

fn default_ancillary_limit() -> usize {
    MAX_STAMPED_ANCILLARY_LEN
}

/// Configuration rejected at construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Default liveness outside the accepted band.
    #[error("invalid default liveness: {0}")]
    Liveness(#[from] InvalidLiveness),

    /// The fee sink is the zero address.
    #[error("fee sink must not be the zero address")]
    ZeroFeeSink,

    /// Ancillary-data limit is zero or above the hard cap.
    #[error("ancillary data limit {value} outside [1, {max}]")]
    AncillaryLimit {
        /// Configured limit.
        value: usize,
        /// Hard cap.
        max: usize,
    },

    /// YAML could not be parsed into a configuration.
    #[error("config parse error: {reason}")]
    Parse {
        /// Parser message.
        reason: String,
    },

    /// The config file could not be read.
    #[error("cannot read config {path}: {reason}")]
    Io {
        /// File path.
        path: String,
        /// OS error message.
        reason: String,
    },
}

impl OracleConfig {
    /// A validated configuration with default liveness, a 1.0 bond
    /// percentage and the hard-cap ancillary limit.
    pub fn new(
        fee_sink: Address,
        final_fees: BTreeMap<Currency, Amount>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            default_liveness_secs: DEFAULT_LIVENESS_SECS,
            default_bond_percentage: FixedPoint::ONE,
            final_fees,
            fee_sink,
            max_ancillary_data_len: MAX_STAMPED_ANCILLARY_LEN,
        };
        config.validate()?;
        Ok(config)
    }

    /// Override the default liveness.
    pub fn with_default_liveness(mut self, secs: u64) -> Result<Self, ConfigError> {
        self.default_liveness_secs = secs;
        self.validate()?;
        Ok(self)
    }

    /// Override the default bond percentage.
    pub fn with_default_bond_percentage(mut self, pct: FixedPoint) -> Self {
        self.default_bond_percentage = pct;
        self
    }

    /// Parse and validate YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Check every invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        liveness::validate(self.default_liveness_secs)?;
        if self.fee_sink.is_zero() {
            return Err(ConfigError::ZeroFeeSink);
        }
        if self.max_ancillary_data_len == 0
            || self.max_ancillary_data_len > MAX_STAMPED_ANCILLARY_LEN
        {
            return Err(ConfigError::AncillaryLimit {
                value: self.max_ancillary_data_len,
                max: MAX_STAMPED_ANCILLARY_LEN,
            });
        }
        Ok(())
    }

    /// Final fee for `currency`, or `None` if unsupported.
    pub fn final_fee(&self, currency: &Currency) -> Option<Amount> {
        self.final_fees.get(currency).copied()
    }
}
