//! Provider configuration for Tether.
//!
//! Parses `tether.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! Each `[providers.<id>]` section describes one OAuth provider. The
//! `protocol` key selects the section shape:
//!
//! ```toml
//! [providers.twitter]
//! protocol = "oauth1"
//! consumer_key = "${TWITTER_KEY}"
//! consumer_secret = "${TWITTER_SECRET}"
//! request_token_url = "https://api.twitter.com/oauth/request_token"
//! authorize_url = "https://api.twitter.com/oauth/authorize"
//! access_token_url = "https://api.twitter.com/oauth/access_token"
//!
//! [providers.facebook]
//! protocol = "oauth2"
//! client_id = "${FB_ID}"
//! client_secret = "${FB_SECRET}"
//! authorize_url = "https://www.facebook.com/dialog/oauth"
//! access_token_url = "https://graph.facebook.com/oauth/access_token"
//! ```
//!
//! ## Environment Variable Expansion
//!
//! Credential and URL values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "tether.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP client configuration.
    pub http: HttpConfig,
    /// Provider sections keyed by provider id.
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// HTTP client configuration shared by all flow templates.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Global request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// One provider section, tagged by `protocol`.
#[derive(Debug, Deserialize)]
#[serde(tag = "protocol")]
pub enum ProviderConfig {
    /// OAuth 1.0 / 1.0a provider.
    #[serde(rename = "oauth1")]
    OAuth1(OAuth1ProviderConfig),
    /// OAuth 2 provider.
    #[serde(rename = "oauth2")]
    OAuth2(OAuth2ProviderConfig),
}

/// OAuth 1 protocol revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum OAuth1Version {
    /// Original OAuth Core 1.0: callback goes on the authorize URL.
    #[serde(rename = "1.0")]
    Core10,
    /// OAuth Core 1.0 Revision A: callback and verifier in the token calls.
    #[default]
    #[serde(rename = "1.0a")]
    Core10a,
}

/// OAuth 1 signature algorithm name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SignatureAlgorithm {
    /// Shared-secret HMAC-SHA1.
    #[default]
    #[serde(rename = "HMAC-SHA1")]
    HmacSha1,
    /// Asymmetric RSA-SHA1; the consumer secret holds the private key.
    #[serde(rename = "RSA-SHA1")]
    RsaSha1,
}

/// How an OAuth 2 client authenticates at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientAuthentication {
    /// HTTP Basic `Authorization` header.
    #[default]
    Basic,
    /// `client_id` and `client_secret` form parameters.
    Parameters,
}

/// OAuth 1 provider section.
#[derive(Debug, Deserialize)]
pub struct OAuth1ProviderConfig {
    /// Consumer key issued by the provider.
    pub consumer_key: String,
    /// Consumer secret (or base64/PEM private key for RSA-SHA1).
    pub consumer_secret: String,
    /// Temporary credential (request token) endpoint.
    pub request_token_url: String,
    /// Resource owner authorization endpoint.
    pub authorize_url: String,
    /// Sign-in endpoint; falls back to `authorize_url` when absent.
    pub authenticate_url: Option<String>,
    /// Token credential (access token) endpoint.
    pub access_token_url: String,
    /// Protocol revision.
    #[serde(default)]
    pub version: OAuth1Version,
    /// Signature algorithm.
    #[serde(default)]
    pub signature_method: SignatureAlgorithm,
}

/// OAuth 2 provider section.
#[derive(Debug, Deserialize)]
pub struct OAuth2ProviderConfig {
    /// Client id issued by the provider.
    pub client_id: String,
    /// Client secret issued by the provider.
    pub client_secret: String,
    /// Authorization endpoint.
    pub authorize_url: String,
    /// Sign-in endpoint; falls back to `authorize_url` when absent.
    pub authenticate_url: Option<String>,
    /// Token endpoint.
    pub access_token_url: String,
    /// Client authentication mode at the token endpoint.
    #[serde(default)]
    pub client_authentication: ClientAuthentication,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`providers.twitter.consumer_key`").
        field: String,
        /// Error message (e.g., "${`TWITTER_KEY`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn require_url(url: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(url, field)?;
    require_http_url(url, field)
}

impl OAuth1ProviderConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Arguments
    /// * `prefix` - Field path prefix for error messages (e.g., "providers.twitter")
    pub fn validate(&self, prefix: &str) -> Result<(), ConfigError> {
        require_non_empty(&self.consumer_key, &format!("{prefix}.consumer_key"))?;
        require_non_empty(&self.consumer_secret, &format!("{prefix}.consumer_secret"))?;
        require_url(&self.request_token_url, &format!("{prefix}.request_token_url"))?;
        require_url(&self.authorize_url, &format!("{prefix}.authorize_url"))?;
        if let Some(url) = &self.authenticate_url {
            require_url(url, &format!("{prefix}.authenticate_url"))?;
        }
        require_url(&self.access_token_url, &format!("{prefix}.access_token_url"))?;
        Ok(())
    }

    fn expand_env_vars(&mut self, prefix: &str) -> Result<(), ConfigError> {
        self.consumer_key =
            expand::expand_env(&self.consumer_key, &format!("{prefix}.consumer_key"))?;
        self.consumer_secret =
            expand::expand_env(&self.consumer_secret, &format!("{prefix}.consumer_secret"))?;
        self.request_token_url = expand::expand_env(
            &self.request_token_url,
            &format!("{prefix}.request_token_url"),
        )?;
        self.authorize_url =
            expand::expand_env(&self.authorize_url, &format!("{prefix}.authorize_url"))?;
        expand::expand_optional(
            &mut self.authenticate_url,
            &format!("{prefix}.authenticate_url"),
        )?;
        self.access_token_url =
            expand::expand_env(&self.access_token_url, &format!("{prefix}.access_token_url"))?;
        Ok(())
    }
}

impl OAuth2ProviderConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Arguments
    /// * `prefix` - Field path prefix for error messages (e.g., "providers.facebook")
    pub fn validate(&self, prefix: &str) -> Result<(), ConfigError> {
        require_non_empty(&self.client_id, &format!("{prefix}.client_id"))?;
        require_non_empty(&self.client_secret, &format!("{prefix}.client_secret"))?;
        require_url(&self.authorize_url, &format!("{prefix}.authorize_url"))?;
        if let Some(url) = &self.authenticate_url {
            require_url(url, &format!("{prefix}.authenticate_url"))?;
        }
        require_url(&self.access_token_url, &format!("{prefix}.access_token_url"))?;
        Ok(())
    }

    fn expand_env_vars(&mut self, prefix: &str) -> Result<(), ConfigError> {
        self.client_id = expand::expand_env(&self.client_id, &format!("{prefix}.client_id"))?;
        self.client_secret =
            expand::expand_env(&self.client_secret, &format!("{prefix}.client_secret"))?;
        self.authorize_url =
            expand::expand_env(&self.authorize_url, &format!("{prefix}.authorize_url"))?;
        expand::expand_optional(
            &mut self.authenticate_url,
            &format!("{prefix}.authenticate_url"),
        )?;
        self.access_token_url =
            expand::expand_env(&self.access_token_url, &format!("{prefix}.access_token_url"))?;
        Ok(())
    }
}

impl Config {
    /// Load configuration from file.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `tether.toml` in current directory and parents,
    /// falling back to an empty configuration.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// an environment variable is unset, or validation fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }
        match Self::discover_config() {
            Some(discovered) => Self::load_from_file(&discovered),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string, expanding and validating it.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion, or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Get a provider section by id.
    #[must_use]
    pub fn provider(&self, provider_id: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider_id)
    }

    /// Get a validated OAuth 1 provider section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or is not OAuth 1.
    pub fn require_oauth1(&self, provider_id: &str) -> Result<&OAuth1ProviderConfig, ConfigError> {
        match self.provider(provider_id) {
            Some(ProviderConfig::OAuth1(config)) => Ok(config),
            Some(ProviderConfig::OAuth2(_)) => Err(ConfigError::Validation(format!(
                "[providers.{provider_id}] is not an oauth1 provider"
            ))),
            None => Err(ConfigError::Validation(format!(
                "[providers.{provider_id}] section required in config"
            ))),
        }
    }

    /// Get a validated OAuth 2 provider section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or is not OAuth 2.
    pub fn require_oauth2(&self, provider_id: &str) -> Result<&OAuth2ProviderConfig, ConfigError> {
        match self.provider(provider_id) {
            Some(ProviderConfig::OAuth2(config)) => Ok(config),
            Some(ProviderConfig::OAuth1(_)) => Err(ConfigError::Validation(format!(
                "[providers.{provider_id}] is not an oauth2 provider"
            ))),
            None => Err(ConfigError::Validation(format!(
                "[providers.{provider_id}] section required in config"
            ))),
        }
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "http.timeout_secs cannot be 0".to_owned(),
            ));
        }
        for (id, provider) in &self.providers {
            require_non_empty(id, "providers.<id>")?;
            let prefix = format!("providers.{id}");
            match provider {
                ProviderConfig::OAuth1(config) => config.validate(&prefix)?,
                ProviderConfig::OAuth2(config) => config.validate(&prefix)?,
            }
        }
        Ok(())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(&current)
    }

    /// Search for config file starting at `start` and walking up.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Expand environment variable references in provider sections.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        for (id, provider) in &mut self.providers {
            let prefix = format!("providers.{id}");
            match provider {
                ProviderConfig::OAuth1(config) => config.expand_env_vars(&prefix)?,
                ProviderConfig::OAuth2(config) => config.expand_env_vars(&prefix)?,
            }
        }
        Ok(())
    }
}
