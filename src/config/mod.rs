use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::domain::{normalize_address, PAGE_SIZE};

pub const DEFAULT_NODE_URL: &str = "https://fullnode.testnet.aptoslabs.com/v1";
pub const DEFAULT_MODULE: &str = "NFTMarketplace";
pub const DEFAULT_WALLET_URL: &str = "http://127.0.0.1:8790";
/// 0.01 APT
pub const DEFAULT_LIKE_FEE_OCTAS: u64 = 1_000_000;

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub node_url: String,
    pub marketplace_address: Option<String>,
    pub module_name: String,
    pub account: Option<String>,
    pub wallet_url: String,
    pub page_size: usize,
    pub like_fee_octas: u64,
    pub owned_fetch_limit: u64,
    pub confirm_timeout_secs: u64,
    pub confirm_poll_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            marketplace_address: None,
            module_name: DEFAULT_MODULE.to_string(),
            account: None,
            wallet_url: DEFAULT_WALLET_URL.to_string(),
            page_size: PAGE_SIZE,
            like_fee_octas: DEFAULT_LIKE_FEE_OCTAS,
            owned_fetch_limit: 100,
            confirm_timeout_secs: 60,
            confirm_poll_ms: 500,
            request_timeout_secs: 15,
        }
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub node_url: Option<String>,
    pub marketplace_address: Option<String>,
    pub module_name: Option<String>,
    pub account: Option<String>,
    pub wallet_url: Option<String>,
}

/// Resolved settings handed to the fetcher, dispatcher and app
#[derive(Debug, Clone, PartialEq)]
pub struct MarketConfig {
    pub node_url: String,
    pub marketplace: String,
    pub module: String,
    pub account: Option<String>,
    pub wallet_url: String,
    pub page_size: usize,
    pub like_fee_octas: u64,
    pub owned_fetch_limit: u64,
    pub confirm_timeout: Duration,
    pub confirm_poll: Duration,
    pub request_timeout: Duration,
}

impl MarketConfig {
    /// `<marketplace>::<module>::<name>`
    pub fn function(&self, name: &str) -> String {
        format!("{}::{}::{}", self.marketplace, self.module, name)
    }

    /// Type tag of the marketplace resource
    pub fn resource_type(&self) -> String {
        self.function("Marketplace")
    }
}

impl Config {
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(node_url) = overrides.node_url {
            self.node_url = node_url;
        }
        if let Some(address) = overrides.marketplace_address {
            self.marketplace_address = Some(address);
        }
        if let Some(module) = overrides.module_name {
            self.module_name = module;
        }
        if let Some(account) = overrides.account {
            self.account = Some(account);
        }
        if let Some(wallet_url) = overrides.wallet_url {
            self.wallet_url = wallet_url;
        }
        self
    }

    pub fn resolve(self) -> Result<MarketConfig> {
        let Some(raw_marketplace) = self.marketplace_address.filter(|s| !s.trim().is_empty())
        else {
            bail!("marketplace_address is not configured (set it in config.toml or pass --marketplace)");
        };
        let marketplace = normalize_address(&raw_marketplace)
            .with_context(|| format!("invalid marketplace address `{}`", raw_marketplace))?;

        let account = match self.account.filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(
                normalize_address(&raw)
                    .with_context(|| format!("invalid account address `{}`", raw))?,
            ),
            None => None,
        };

        let module = self.module_name.trim().to_string();
        if module.is_empty() {
            bail!("module_name must not be empty");
        }
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        if self.like_fee_octas == 0 {
            bail!("like_fee_octas must be greater than zero");
        }

        Ok(MarketConfig {
            node_url: self.node_url.trim().trim_end_matches('/').to_string(),
            marketplace,
            module,
            account,
            wallet_url: self.wallet_url.trim().trim_end_matches('/').to_string(),
            page_size: self.page_size,
            like_fee_octas: self.like_fee_octas,
            owned_fetch_limit: self.owned_fetch_limit.max(1),
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs.max(1)),
            confirm_poll: Duration::from_millis(self.confirm_poll_ms.max(50)),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        })
    }
}

/// Load the config file. A missing file yields defaults; an unreadable or
/// malformed one yields defaults plus a warning for the status line.
pub fn load(explicit: Option<&Path>) -> (Config, Option<String>) {
    let Some(path) = explicit.map(Path::to_path_buf).or_else(config_path) else {
        return (Config::default(), None);
    };
    if !path.exists() {
        if explicit.is_some() {
            let warning = format!("config file {} not found, using defaults", path.display());
            tracing::warn!("{}", warning);
            return (Config::default(), Some(warning));
        }
        return (Config::default(), None);
    }
    match read(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config");
            (config, None)
        }
        Err(err) => {
            let warning = format!("{:#}; using defaults", err);
            tracing::warn!("{}", warning);
            (Config::default(), Some(warning))
        }
    }
}

fn read(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse(&content).with_context(|| format!("invalid config {}", path.display()))
}

pub fn parse(content: &str) -> Result<Config> {
    Ok(toml::from_str::<Config>(content)?)
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("APTMART_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("aptmart").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("aptmart").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "aptmart", "aptmart")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("aptmart"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("aptmart"));
    }
    directories::ProjectDirs::from("io", "aptmart", "aptmart")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("aptmart.log"))
}
