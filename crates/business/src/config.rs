//! Runtime configuration with configurable thresholds and role names
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields the standard branch setup.

use crate::error::{BusinessError, BusinessResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tellerbank_core::{AppMetadata, DEFAULT_DISCLOSURE_THRESHOLD};

/// Configuration for the teller application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankConfig {
    // === Thresholds ===
    /// Lodgements/withdrawals at or above this amount ask for a justification
    #[serde(default = "default_disclosure_threshold")]
    pub disclosure_threshold: Decimal,

    // === Directory roles ===
    /// Group required to log in
    #[serde(default = "default_teller_role")]
    pub teller_role: String,

    /// Group required to approve an account closure
    #[serde(default = "default_admin_role")]
    pub admin_role: String,

    /// Login attempts before the session is refused
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: u32,

    // === Audit metadata ===
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_app_version")]
    pub app_version: String,

    /// Environment variable holding the hex key for justification encryption
    #[serde(default = "default_encryption_key_env")]
    pub encryption_key_env: String,
}

fn default_disclosure_threshold() -> Decimal {
    DEFAULT_DISCLOSURE_THRESHOLD
}

fn default_teller_role() -> String {
    "Bank Teller".to_string()
}

fn default_admin_role() -> String {
    "Bank Teller Administrator".to_string()
}

fn default_max_login_attempts() -> u32 {
    3
}

fn default_app_name() -> String {
    "Tellerbank".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_encryption_key_env() -> String {
    "TELLERBANK_AUDIT_KEY".to_string()
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            disclosure_threshold: default_disclosure_threshold(),
            teller_role: default_teller_role(),
            admin_role: default_admin_role(),
            max_login_attempts: default_max_login_attempts(),
            app_name: default_app_name(),
            app_version: default_app_version(),
            encryption_key_env: default_encryption_key_env(),
        }
    }
}

impl BankConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &Path) -> BusinessResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BusinessError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            BusinessError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file if given, defaults otherwise
    pub fn load(path: Option<&Path>) -> BusinessResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> BusinessResult<()> {
        if self.disclosure_threshold <= Decimal::ZERO {
            return Err(BusinessError::Config(
                "disclosure_threshold must be positive".to_string(),
            ));
        }
        if self.max_login_attempts == 0 {
            return Err(BusinessError::Config(
                "max_login_attempts must be at least 1".to_string(),
            ));
        }
        if self.teller_role.trim().is_empty() || self.admin_role.trim().is_empty() {
            return Err(BusinessError::Config("role names cannot be empty".to_string()));
        }
        Ok(())
    }

    /// App name/version stamped on every audit record
    pub fn app_metadata(&self) -> AppMetadata {
        AppMetadata::new(&self.app_name, &self.app_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = BankConfig::default();

        assert_eq!(config.disclosure_threshold, dec!(10000));
        assert_eq!(config.teller_role, "Bank Teller");
        assert_eq!(config.admin_role, "Bank Teller Administrator");
        assert_eq!(config.max_login_attempts, 3);
        assert_eq!(config.encryption_key_env, "TELLERBANK_AUDIT_KEY");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bank.json");
        std::fs::write(&path, r#"{ "disclosure_threshold": "5000", "max_login_attempts": 5 }"#)
            .unwrap();

        let config = BankConfig::load(Some(&path)).unwrap();
        assert_eq!(config.disclosure_threshold, dec!(5000));
        assert_eq!(config.max_login_attempts, 5);
        assert_eq!(config.teller_role, "Bank Teller");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bank.json");
        std::fs::write(&path, r#"{ "max_login_attempts": 0 }"#).unwrap();

        let err = BankConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("max_login_attempts"));

        assert!(BankConfig::load(Some(&dir.path().join("missing.json"))).is_err());
    }

    #[test]
    fn test_app_metadata() {
        let config = BankConfig::default();
        let app = config.app_metadata();
        assert_eq!(app.name, "Tellerbank");
        assert_eq!(app.version, env!("CARGO_PKG_VERSION"));
    }
}
