use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Where documents live: unset or `memory:` keeps them in process,
    /// `file:<path>` adds a JSON snapshot
    #[serde(default)]
    pub database_url: Option<String>,
    /// Secret used to sign bearer tokens
    pub jwt_secret: String,
    /// Comma-separated list of frontend origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
    /// Comma-separated list of emails that receive the admin role on registration
    #[serde(default)]
    pub admin_emails: String,
    /// Email deliverability check
    #[serde(default)]
    pub email_check: EmailCheckConfig,
}

/// Configuration for the third-party email deliverability check
#[derive(Debug, Deserialize, Clone)]
pub struct EmailCheckConfig {
    /// apilayer key; the check is skipped when absent
    pub api_key: Option<String>,
    #[serde(default = "default_email_check_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_email_check_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmailCheckConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_email_check_base_url(),
            timeout_secs: default_email_check_timeout(),
        }
    }
}

impl EmailCheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_allowed_origins() -> String {
    "http://localhost:8080".to_string()
}

fn default_email_check_base_url() -> String {
    "https://api.apilayer.com".to_string()
}

fn default_email_check_timeout() -> u64 {
    5
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPES__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPES__EMAIL_CHECK__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("RECIPES")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(settings)
    }

    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        if settings.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt_secret must not be empty".to_string()));
        }
        Ok(settings)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn origins(&self) -> Vec<String> {
        split_list(&self.allowed_origins)
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        split_list(&self.admin_emails)
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(email))
    }

    /// Settings suitable for tests and local experiments
    pub fn for_secret(secret: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            jwt_secret: secret.into(),
            allowed_origins: default_allowed_origins(),
            admin_emails: String::new(),
            email_check: EmailCheckConfig::default(),
        }
    }
}
