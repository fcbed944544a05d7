//! TOML file configuration structures.
//!
//! These structs directly map to the `usreg.toml` file format.

use serde::Deserialize;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Registry section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryConfig {
    /// Identifiers admitted directly before the event loop starts.
    #[serde(default)]
    pub seed_users: Vec<String>,
    /// Identifiers sent through the intake channel once the loop runs.
    #[serde(default)]
    pub intake_users: Vec<String>,
}

/// Logging section.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}
