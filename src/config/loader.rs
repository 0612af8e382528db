//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::WalletConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `rpc.url`.
pub const RPC_URL_ENV_VAR: &str = "OCTRA_RPC_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values given on the command line. Applied after the environment and
/// before validation.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub rpc_url: Option<String>,
    pub history_limit: Option<usize>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut WalletConfig) {
        if let Some(url) = &self.rpc_url {
            config.rpc.url = url.trim().to_string();
        }
        if let Some(limit) = self.history_limit {
            config.history.limit = limit;
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<WalletConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text, then apply env overrides.
pub fn parse_config(content: &str) -> Result<WalletConfig, ConfigError> {
    finish(toml::from_str(content)?, &ConfigOverrides::default())
}

/// Load from `path` when given, otherwise start from defaults. Environment
/// and command-line overrides apply either way, then validation.
pub fn load_or_default(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<WalletConfig, ConfigError> {
    let config = match path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => WalletConfig::default(),
    };
    finish(config, overrides)
}

fn finish(mut config: WalletConfig, overrides: &ConfigOverrides) -> Result<WalletConfig, ConfigError> {
    apply_env_overrides(&mut config);
    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

pub fn apply_env_overrides(config: &mut WalletConfig) {
    if let Ok(url) = std::env::var(RPC_URL_ENV_VAR) {
        if !url.trim().is_empty() {
            config.rpc.url = url.trim().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let config = parse_config(
            r#"
            [history]
            limit = 5
            balance_refresh_secs = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.history.limit, 5);
        assert_eq!(config.history.balance_refresh_secs, 1);
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[rpc\nurl = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_message() {
        let err = parse_config("[history]\nlimit = 0\nhistory_refresh_secs = 0\n").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("history.limit"));
        assert!(message.contains("history.history_refresh_secs"));
    }

    #[test]
    fn test_cli_overrides_are_validated() {
        let overrides = ConfigOverrides {
            rpc_url: Some("ftp://node.example".to_string()),
            history_limit: Some(0),
        };
        let err = load_or_default(None, &overrides).unwrap_err();
        let errors = match err {
            ConfigError::Validation(errors) => errors,
            other => panic!("expected validation error, got {:?}", other),
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["rpc.url", "history.limit"]);

        let err = load_or_default(
            None,
            &ConfigOverrides {
                rpc_url: None,
                history_limit: Some(51),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("history.limit"));
    }

    #[test]
    fn test_cli_overrides_win() {
        let overrides = ConfigOverrides {
            rpc_url: Some("http://127.0.0.1:3000/".to_string()),
            history_limit: Some(7),
        };
        let config = load_or_default(None, &overrides).unwrap();
        assert_eq!(config.rpc.url, "http://127.0.0.1:3000/");
        assert_eq!(config.history.limit, 7);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
