//! CLI execution context.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result};
use jam_cart::api::HttpCartApi;
use jam_cart::cart::CartStore;
use jam_data::{FetchClient, RetryPolicy, TimeoutConfig};
use jam_storage::FileBackend;

use crate::config::{JamConfig, CONFIG_FILE_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// Effective configuration (file plus environment overrides).
    pub config: JamConfig,
    /// Where the configuration was loaded from, if anywhere.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (mut config, config_path) = if let Some(path) = config_path {
            let path = resolve_path(&cwd, path);
            (JamConfig::load(&path)?, Some(path))
        } else {
            // Try to find config in current directory or parent directories
            match find_config(&cwd) {
                Some(path) => (JamConfig::load(&path)?, Some(path)),
                None => (JamConfig::default(), None),
            }
        };

        config.apply_env(|key| std::env::var(key).ok());

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Directory holding the persisted cart.
    pub fn data_dir(&self) -> PathBuf {
        match &self.config.cart.data_dir {
            Some(dir) => expand_home(dir).unwrap_or_else(|| resolve_path(&self.cwd, dir)),
            None => dirs_path().join("jamjar"),
        }
    }

    /// Open the persisted cart.
    pub fn open_cart(&self) -> Result<CartStore<FileBackend>> {
        let dir = self.data_dir();
        let backend = FileBackend::open(&dir)
            .with_context(|| format!("Failed to open cart storage in {}", dir.display()))?;
        self.output.debug(&format!("Cart storage: {}", dir.display()));
        Ok(CartStore::load_with_key(
            backend,
            self.config.cart.storage_key.clone(),
        ))
    }

    /// Build a backend client from the configuration.
    pub fn api(&self) -> Result<HttpCartApi> {
        self.config.validate()?;
        let api = &self.config.api;

        let timeouts = TimeoutConfig::from_total(Duration::from_millis(api.timeout_ms));
        let mut client = FetchClient::with_timeouts(timeouts)
            .context("Failed to create HTTP client")?
            .with_base_url(api.base_url.trim())
            .with_default_header("Accept", "application/json")
            .with_retry_policy(RetryPolicy::new(api.max_retries));
        if let Some(token) = &api.token {
            client = client.with_bearer_token(token);
        }

        self.output.debug(&format!("API: {}", api.base_url));
        Ok(HttpCartApi::new(client).with_currency(self.config.currency()?))
    }
}

/// Find a config file in the directory tree.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in &CONFIG_FILE_NAMES {
            let config_path = current.join(name);
            if config_path.is_file() {
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Resolve a path relative to the working directory.
fn resolve_path(cwd: &Path, path: &str) -> PathBuf {
    if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        cwd.join(path)
    }
}

fn expand_home(path: &str) -> Option<PathBuf> {
    let rest = path.strip_prefix("~/")?;
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(rest))
}

/// Get the platform-specific data directory.
fn dirs_path() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local").join("share")
    } else {
        std::env::temp_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_config_walks_up() {
        let root = std::env::temp_dir().join(format!("jam-cli-ctx-{}", std::process::id()));
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(".jamjar.toml"), "").unwrap();

        assert_eq!(find_config(&nested), Some(root.join(".jamjar.toml")));

        std::fs::write(nested.join("jamjar.toml"), "").unwrap();
        assert_eq!(find_config(&nested), Some(nested.join("jamjar.toml")));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_resolve_path() {
        let cwd = Path::new("/work");
        assert_eq!(resolve_path(cwd, "data"), PathBuf::from("/work/data"));
        assert_eq!(resolve_path(cwd, "/abs"), PathBuf::from("/abs"));
    }
}
