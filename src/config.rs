//! Configuration management for the Circular client
//!
//! Loads configuration from TOML files with environment variable substitution.
//! Library users can skip the file entirely and build a [`GatewayConfig`] by hand;
//! every client instance owns its own copy, so differently configured clients
//! can live in one process.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Public gateway entry point; operation names are appended to it
pub const DEFAULT_GATEWAY_URL: &str = "https://nag.circularlabs.io/NAG.php?cep=";

/// Protocol version sent in the `Version` field of every request
pub const PROTOCOL_VERSION: &str = "1.0.7";

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub finality: FinalityConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub url: String,
    /// Application key issued for the gateway. Held for callers; requests do not carry it.
    pub app_key: Option<String>,
    pub version: String,
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_GATEWAY_URL.to_string(),
            app_key: None,
            version: PROTOCOL_VERSION.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Gateway config pointing at a different base URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_app_key(mut self, key: impl Into<String>) -> Self {
        self.app_key = Some(key.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FinalityConfig {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for FinalityConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub blockchain: Option<String>,
    pub address: Option<String>,
    /// Name of the environment variable holding the private key
    pub private_key_env: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            blockchain: None,
            address: None,
            private_key_env: "CIRCULAR_PRIVATE_KEY".to_string(),
        }
    }
}

impl WalletConfig {
    /// Read the wallet private key from the configured environment variable
    pub fn private_key(&self) -> Result<String> {
        env::var(&self.private_key_env).with_context(|| {
            format!(
                "No private key configured. Set {}",
                self.private_key_env
            )
        })
    }
}

impl Settings {
    /// Load settings from an explicit path, `CIRCULAR_CONFIG`, or `config/default.toml`
    ///
    /// A missing default file yields the built-in defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match env::var("CIRCULAR_CONFIG") {
                Ok(p) => (PathBuf::from(p), true),
                Err(_) => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
            },
        };

        if !explicit && !config_path.exists() {
            tracing::info!("No config file at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml_str(&config_str)
    }

    /// Parse settings from TOML text, substituting `${VAR}` references first
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config_str = substitute_env_vars(input)?;

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.gateway.url.is_empty() {
            anyhow::bail!("Gateway URL must not be empty");
        }

        if self.finality.interval_secs == 0 {
            anyhow::bail!("Finality interval must be at least one second");
        }

        if self.finality.timeout_secs < self.finality.interval_secs {
            anyhow::bail!(
                "Finality timeout ({}s) is shorter than the polling interval ({}s)",
                self.finality.timeout_secs,
                self.finality.interval_secs
            );
        }

        if !self.gateway.url.starts_with("https://") {
            tracing::warn!("Gateway URL {} is not using TLS", self.gateway.url);
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")?;

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("CIRCULAR_TEST_VAR", "test_value");
        let input = "url = \"https://api.example.com/${CIRCULAR_TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.gateway.url, DEFAULT_GATEWAY_URL);
        assert_eq!(settings.gateway.version, PROTOCOL_VERSION);
        assert_eq!(settings.gateway.request_timeout_secs, 30);
        assert_eq!(settings.finality.interval_secs, 5);
        assert_eq!(settings.wallet.private_key_env, "CIRCULAR_PRIVATE_KEY");
    }

    #[test]
    fn test_load_from_file() {
        env::set_var("CIRCULAR_TEST_APP_KEY", "secret-key");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[gateway]
url = "https://gateway.example.com/NAG.php?cep="
app_key = "${{CIRCULAR_TEST_APP_KEY}}"

[finality]
interval_secs = 2
timeout_secs = 30

[wallet]
blockchain = "0x8a20baa40c45dc5055aeb26197c203e576ef389d9acb171bd62da11dc5ad72b2"
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.gateway.url, "https://gateway.example.com/NAG.php?cep=");
        assert_eq!(settings.gateway.app_key.as_deref(), Some("secret-key"));
        assert_eq!(settings.finality.interval_secs, 2);
        assert_eq!(settings.finality.timeout_secs, 30);
        assert!(settings.wallet.blockchain.is_some());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/circular.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_finality() {
        let zero = "[finality]\ninterval_secs = 0\n";
        assert!(Settings::from_toml_str(zero).is_err());

        let short = "[finality]\ninterval_secs = 10\ntimeout_secs = 5\n";
        assert!(Settings::from_toml_str(short).is_err());
    }

    #[test]
    fn test_gateway_config_builders() {
        let config = GatewayConfig::default()
            .with_url("http://localhost:8080/?cep=")
            .with_app_key("k");
        assert_eq!(config.url, "http://localhost:8080/?cep=");
        assert_eq!(config.app_key.as_deref(), Some("k"));
    }
}
