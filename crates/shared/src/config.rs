//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Costing engine policy.
    #[serde(default)]
    pub costing: CostingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Costing policy knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct CostingConfig {
    /// How far back a critical adjustment deletion resets its group.
    #[serde(default = "default_critical_reset_lookback_days")]
    pub critical_reset_lookback_days: u32,
    /// Upper bound on groups costed concurrently by a batch run.
    #[serde(default = "default_max_parallel_groups")]
    pub max_parallel_groups: usize,
    /// Decimal places kept on derived unit costs.
    #[serde(default = "default_unit_cost_scale")]
    pub unit_cost_scale: u32,
    /// Absolute quantity difference still reported as a match.
    #[serde(default)]
    pub reconciliation_tolerance: Decimal,
}

fn default_critical_reset_lookback_days() -> u32 {
    365
}

fn default_max_parallel_groups() -> usize {
    4
}

fn default_unit_cost_scale() -> u32 {
    6
}

impl Default for CostingConfig {
    fn default() -> Self {
        Self {
            critical_reset_lookback_days: default_critical_reset_lookback_days(),
            max_parallel_groups: default_max_parallel_groups(),
            unit_cost_scale: default_unit_cost_scale(),
            reconciliation_tolerance: Decimal::ZERO,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `KARDEX__*` environment variables (`__` separates sections).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("KARDEX")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}
