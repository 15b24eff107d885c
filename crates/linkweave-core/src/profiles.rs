//! Pre-configured profiles for different deployment scenarios
//!
//! - Development: verbose logging, small worker pool
//! - Production: default tuning, info logging
//! - LargeVault: tuned for vaults with thousands of notes

use crate::config::EngineConfig;
use std::str::FromStr;

/// Profile selector for pre-configured deployments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigProfile {
    /// Development: debug logging, low concurrency for readable traces
    Development,
    /// Production: the defaults
    Production,
    /// LargeVault: wider read pool, fewer suggestions per broken link
    LargeVault,
}

impl ConfigProfile {
    /// Create an EngineConfig from this profile
    pub fn create_config(self) -> EngineConfig {
        let mut config = EngineConfig::new();

        match self {
            Self::Development => {
                config.log_level = "debug".to_string();
                config.scan_concurrency = 2;
                config.max_file_size = 50 * 1024 * 1024; // 50MB
            }

            Self::Production => {
                config.log_level = "info".to_string();
            }

            Self::LargeVault => {
                config.log_level = "warn".to_string();
                config.scan_concurrency = 32;
                config.max_suggestions = 1;
            }
        }

        config
    }
}

impl FromStr for ConfigProfile {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "large-vault" | "large_vault" | "large" => Ok(Self::LargeVault),
            other => Err(crate::Error::config_error(format!(
                "Unknown profile '{}'. Valid options: development, production, large-vault",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_are_valid() {
        for profile in [
            ConfigProfile::Development,
            ConfigProfile::Production,
            ConfigProfile::LargeVault,
        ] {
            assert!(profile.create_config().validate().is_ok(), "{:?}", profile);
        }
    }

    #[test]
    fn test_large_vault_profile() {
        let config = ConfigProfile::LargeVault.create_config();
        assert_eq!(config.scan_concurrency, 32);
        assert_eq!(config.max_suggestions, 1);
    }

    #[test]
    fn test_parse_profile() {
        assert_eq!(
            "dev".parse::<ConfigProfile>().unwrap(),
            ConfigProfile::Development
        );
        assert_eq!(
            "Large-Vault".parse::<ConfigProfile>().unwrap(),
            ConfigProfile::LargeVault
        );
        assert!("staging".parse::<ConfigProfile>().is_err());
    }
}
