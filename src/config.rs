//! Configuration module
//!
//! Application settings are read from a TOML file
//! (default `~/.config/gaming-lounge/config.toml`). Every section and field
//! is optional; anything missing takes its default.
//!
//! ```toml
//! [server]
//! api_port = 8080
//!
//! [billing]
//! currency = "KWD"
//! hourly_rate = 500
//!
//! [[billing.tiers]]
//! minutes = 60
//! price = 500
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::pricing::{DurationTier, PricingTable};
use crate::infrastructure::DatabaseConfig;
use crate::shared::errors::InfraError;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub logging: LoggingSection,
    pub billing: BillingSection,
    pub monitor: MonitorSection,
    pub venue: VenueSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight work on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let db = DatabaseConfig::default();
        Self {
            url: db.url,
            max_connections: db.max_connections,
        }
    }
}

impl From<&DatabaseSection> for DatabaseConfig {
    fn from(s: &DatabaseSection) -> Self {
        DatabaseConfig {
            url: s.url.clone(),
            max_connections: s.max_connections,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// trace, debug, info, warn, error (or any EnvFilter directive)
    pub level: String,
    /// text or json
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierEntry {
    pub minutes: i32,
    /// Price in cents
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingSection {
    pub currency: String,
    /// Cents per hour for durations without a tier
    pub hourly_rate: i64,
    pub tiers: Vec<TierEntry>,
}

impl Default for BillingSection {
    fn default() -> Self {
        let table = PricingTable::default();
        Self {
            currency: table.currency,
            hourly_rate: table.hourly_rate,
            tiers: table
                .tiers
                .iter()
                .map(|t| TierEntry {
                    minutes: t.minutes,
                    price: t.price,
                })
                .collect(),
        }
    }
}

impl From<&BillingSection> for PricingTable {
    fn from(s: &BillingSection) -> Self {
        PricingTable {
            tiers: s
                .tiers
                .iter()
                .map(|t| DurationTier::new(t.minutes, t.price))
                .collect(),
            hourly_rate: s.hourly_rate,
            currency: s.currency.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    /// Expiry sweep cadence
    pub tick_interval_secs: u64,
    /// Remaining-time marks that raise a one-time warning
    pub warning_thresholds_secs: Vec<i64>,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            tick_interval_secs: 1,
            warning_thresholds_secs: vec![300, 60],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueSection {
    /// PCs created on first start when none exist
    pub pc_count: u32,
    pub pc_specs: String,
    /// Seed a starter menu on first start when the catalog is empty
    pub seed_sample_menu: bool,
}

impl Default for VenueSection {
    fn default() -> Self {
        Self {
            pc_count: 20,
            pc_specs: "Intel i7-10700K, RTX 3080, 32GB RAM, 1TB SSD".to_string(),
            seed_sample_menu: true,
        }
    }
}

/// `~/.config/gaming-lounge/config.toml`, or `./config.toml` when the
/// platform has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("gaming-lounge").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

impl AppConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, InfraError> {
        let config: AppConfig =
            toml::from_str(raw).map_err(|e| InfraError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InfraError> {
        if self.server.api_port == 0 {
            return Err(InfraError::Config("server.api_port must be non-zero".into()));
        }
        if self.database.url.trim().is_empty() {
            return Err(InfraError::Config("database.url must be set".into()));
        }
        if self.database.max_connections == 0 {
            return Err(InfraError::Config(
                "database.max_connections must be at least 1".into(),
            ));
        }
        match self.logging.format.to_lowercase().as_str() {
            "text" | "json" => {}
            other => {
                return Err(InfraError::Config(format!(
                    "logging.format must be 'text' or 'json', got '{}'",
                    other
                )))
            }
        }
        if self.monitor.tick_interval_secs == 0 {
            return Err(InfraError::Config(
                "monitor.tick_interval_secs must be at least 1".into(),
            ));
        }
        if self.monitor.warning_thresholds_secs.iter().any(|t| *t <= 0) {
            return Err(InfraError::Config(
                "monitor.warning_thresholds_secs must be positive".into(),
            ));
        }
        PricingTable::from(&self.billing)
            .validate()
            .map_err(|e| InfraError::Config(format!("billing: {}", e)))?;
        Ok(())
    }

    pub fn pricing_table(&self) -> PricingTable {
        PricingTable::from(&self.billing)
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::from(&self.database)
    }

    pub fn api_address(&self) -> String {
        format!("{}:{}", self.server.api_host, self.server.api_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.pricing_table(), PricingTable::default());
        assert_eq!(cfg.monitor.warning_thresholds_secs, vec![300, 60]);
        assert_eq!(cfg.venue.pc_count, 20);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            api_port = 9090

            [billing]
            currency = "KWD"
            hourly_rate = 400

            [[billing.tiers]]
            minutes = 60
            price = 400
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.api_port, 9090);
        assert_eq!(cfg.server.api_host, "0.0.0.0");
        assert_eq!(cfg.billing.tiers.len(), 1);
        assert_eq!(cfg.pricing_table().currency, "KWD");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn invalid_tiers_are_rejected() {
        let err = AppConfig::from_toml(
            r#"
            [[billing.tiers]]
            minutes = 60
            price = 500

            [[billing.tiers]]
            minutes = 60
            price = 450
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("billing"));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(AppConfig::from_toml("[logging]\nformat = \"xml\"").is_err());
    }

    #[test]
    fn zero_tick_is_rejected() {
        assert!(AppConfig::from_toml("[monitor]\ntick_interval_secs = 0").is_err());
    }

    #[test]
    fn default_path_points_at_config_toml() {
        let path = default_config_path();
        assert_eq!(path.file_name().unwrap(), "config.toml");
    }
}
