//! # Engine Configuration
//!
//! Tax, bill numbering, stock-write mode, shop details and database location.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Defaults            EngineConfig::default()                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  2. TOML file           <config dir>/billbook.toml (if present)         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  3. Environment         BILLBOOK_TAX_RATE, BILLBOOK_DEVICE_CODE,        │
//! │         │               BILLBOOK_STOCK_WRITES, BILLBOOK_DB_PATH,        │
//! │         │               BILLBOOK_STORE_NAME                             │
//! │         ▼                                                               │
//! │  4. validate()                                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [billing]
//! tax_rate_bps = 1800     # 18%
//! tax_name = "GST"
//! bill_prefix = "BILL"
//! device_code = "01"      # unique per till
//!
//! [stock]
//! writes = "optimistic"   # optimistic | blind
//! max_write_attempts = 5
//!
//! [business]
//! name = "Sharma General Store"
//! address = "12 MG Road, Pune"
//! gstin = "27AAAAA0000A1Z5"
//!
//! [database]
//! path = "/var/lib/billbook/billbook.db"
//! ```

use billbook_core::validation::validate_tax_rate_bps;
use billbook_core::{TaxRate, DEFAULT_TAX_RATE_BPS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::receipt::BusinessProfile;
use crate::reconciler::ConcurrencyMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Billing
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSettings {
    /// Tax rate in basis points applied to every sale.
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,

    /// Name printed before the rate on receipts.
    #[serde(default = "default_tax_name")]
    pub tax_name: String,

    #[serde(default = "default_bill_prefix")]
    pub bill_prefix: String,

    /// Suffix that keeps bill ids from two tills apart.
    #[serde(default = "default_device_code")]
    pub device_code: String,
}

fn default_tax_rate_bps() -> u32 {
    DEFAULT_TAX_RATE_BPS
}

fn default_tax_name() -> String {
    "GST".to_string()
}

fn default_bill_prefix() -> String {
    billbook_core::bill_id::DEFAULT_BILL_PREFIX.to_string()
}

fn default_device_code() -> String {
    "01".to_string()
}

impl Default for BillingSettings {
    fn default() -> Self {
        BillingSettings {
            tax_rate_bps: default_tax_rate_bps(),
            tax_name: default_tax_name(),
            bill_prefix: default_bill_prefix(),
            device_code: default_device_code(),
        }
    }
}

impl BillingSettings {
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Stock
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSettings {
    #[serde(default)]
    pub writes: ConcurrencyMode,

    /// Compare-and-set attempts per adjustment in optimistic mode.
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u32,
}

fn default_max_write_attempts() -> u32 {
    5
}

impl Default for StockSettings {
    fn default() -> Self {
        StockSettings {
            writes: ConcurrencyMode::default(),
            max_write_attempts: default_max_write_attempts(),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Engine Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub billing: BillingSettings,

    #[serde(default)]
    pub stock: StockSettings,

    #[serde(default)]
    pub business: BusinessProfile,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (billbook.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        validate_tax_rate_bps(self.billing.tax_rate_bps)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.billing.bill_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("bill_prefix must not be empty".into()));
        }

        // Sale ids are `{prefix}-…` and must never read as a return id
        if format!("{}-", self.billing.bill_prefix).starts_with(billbook_core::returns::RETURN_PREFIX)
        {
            return Err(ConfigError::Invalid(format!(
                "bill_prefix must not start with '{}'",
                billbook_core::returns::RETURN_PREFIX
            )));
        }

        if self.billing.device_code.is_empty()
            || !self
                .billing
                .device_code
                .chars()
                .all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ConfigError::Invalid(
                "device_code must be non-empty and alphanumeric".into(),
            ));
        }

        if self.stock.max_write_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_write_attempts must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Percent, e.g. "18" or "12.5"
        if let Some(rate) = lookup("BILLBOOK_TAX_RATE") {
            match rate.trim().parse::<f64>() {
                Ok(pct) if (0.0..=100.0).contains(&pct) => {
                    debug!(rate = %rate, "Overriding tax rate from environment");
                    self.billing.tax_rate_bps = TaxRate::from_percentage(pct).bps();
                }
                _ => warn!(rate = %rate, "Ignoring invalid tax rate in environment"),
            }
        }

        if let Some(code) = lookup("BILLBOOK_DEVICE_CODE") {
            debug!(device_code = %code, "Overriding device code from environment");
            self.billing.device_code = code;
        }

        if let Some(mode) = lookup("BILLBOOK_STOCK_WRITES") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding stock write mode from environment");
                    self.stock.writes = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown stock write mode in environment"),
            }
        }

        if let Some(path) = lookup("BILLBOOK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(name) = lookup("BILLBOOK_STORE_NAME") {
            self.business.name = name;
        }
    }

    /// `<config dir>/billbook.toml`, if the platform has a config dir.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "billbook", "pos")
            .map(|dirs| dirs.config_dir().join("billbook.toml"))
    }

    /// Configured database file, else `<data dir>/billbook.db`.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.path.clone().or_else(|| {
            directories::ProjectDirs::from("com", "billbook", "pos")
                .map(|dirs| dirs.data_dir().join("billbook.db"))
        })
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.billing.tax_rate()
    }
}
