//! CLI configuration.

use std::path::Path;

use anyhow::{bail, Context, Result};
use jam_cart::api::DEFAULT_BASE_URL;
use jam_cart::cart::DEFAULT_STORAGE_KEY;
use jam_cart::Currency;
use serde::{Deserialize, Serialize};

/// Environment variable overriding `api.base_url`.
pub const ENV_API_URL: &str = "JAMJAR_API_URL";
/// Environment variable overriding `api.token`.
pub const ENV_API_TOKEN: &str = "JAMJAR_API_TOKEN";

/// File names searched for, in order of preference.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["jamjar.toml", ".jamjar.toml", "jamjar.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JamConfig {
    /// Backend connection.
    #[serde(default)]
    pub api: ApiConfig,

    /// Local cart storage.
    #[serde(default)]
    pub cart: CartConfig,

    /// Logging.
    #[serde(default)]
    pub log: LogConfig,
}

impl JamConfig {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Apply `JAMJAR_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.api.token = Some(token);
        }
    }

    /// Parsed base currency.
    pub fn currency(&self) -> Result<Currency> {
        match Currency::from_code(&self.cart.currency) {
            Some(currency) => Ok(currency),
            None => bail!("Unknown currency in cart.currency: {}", self.cart.currency),
        }
    }

    /// Check the values a command would otherwise trip over later.
    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("api.base_url must be an http(s) URL, got '{}'", url);
        }
        if self.api.timeout_ms == 0 {
            bail!("api.timeout_ms must be greater than zero");
        }
        if self.cart.storage_key.trim().is_empty() {
            bail!("cart.storage_key must not be empty");
        }
        self.currency()?;
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API root, e.g. `https://proyect-mercado-backend.fly.dev/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Total request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    1
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            token: None,
        }
    }
}

/// Local cart storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartConfig {
    /// Key the cart is stored under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Directory holding the cart file (default: ~/.local/share/jamjar).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// ISO code of the currency the backend prices in.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_currency() -> String {
    Currency::default().code().to_string()
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            data_dir: None,
            currency: default_currency(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Level for the jamjar crates; `RUST_LOG` wins when set.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl LogConfig {
    /// `EnvFilter` directive covering the binary and the library crates.
    pub fn directive(&self, verbose: bool) -> String {
        let level = if verbose { "debug" } else { self.level.as_str() };
        ["jam", "jam_cart", "jam_data", "jam_storage"]
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Generate a default jamjar.toml config file.
pub fn generate_default_config() -> String {
    format!(
        r#"# jamjar cart configuration

[api]
base_url = "{base_url}"
timeout_ms = 10000
max_retries = 1
# token = "..."   # or set {token_env}

[cart]
storage_key = "{storage_key}"
# data_dir = "~/.local/share/jamjar"
currency = "USD"

[log]
level = "info"
format = "human"   # or "json"
"#,
        base_url = DEFAULT_BASE_URL,
        token_env = ENV_API_TOKEN,
        storage_key = DEFAULT_STORAGE_KEY,
    )
}
