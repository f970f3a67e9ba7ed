use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://cms.example-agency.com/wp-json/wp/v2";
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Root of the CMS REST API; collections are appended as path segments.
    pub base_url: String,
    pub timeout_secs: u64,
    pub per_page: u32,
    pub listen: SocketAddr,
    /// Unset: the relay waits for the upstream as long as the transport allows.
    pub relay_timeout_secs: Option<u64>,
    pub user_agent: String,
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            per_page: 100,
            listen: SocketAddr::from(([127, 0, 0, 1], 8787)),
            relay_timeout_secs: None,
            user_agent: concat!("agency-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Defaults, then the config file, then `AGENCY_*` environment overrides.
    ///
    /// An explicit `path` must exist. Without one, `config.toml` in the
    /// platform config directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(p) => Self::from_file(&p)?,
                None => Self::default(),
            },
        };
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.normalized()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing config file: {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(raw)?;
        cfg.normalized()
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(url) = value("AGENCY_CMS_URL") {
            self.base_url = url;
        }
        if let Some(secs) = value("AGENCY_TIMEOUT_SECS") {
            self.timeout_secs = secs.parse().with_context(|| format!("AGENCY_TIMEOUT_SECS: `{secs}`"))?;
        }
        if let Some(addr) = value("AGENCY_LISTEN") {
            self.listen = addr.parse().with_context(|| format!("AGENCY_LISTEN: `{addr}`"))?;
        }
        if let Some(secs) = value("AGENCY_RELAY_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().with_context(|| format!("AGENCY_RELAY_TIMEOUT_SECS: `{secs}`"))?;
            self.relay_timeout_secs = Some(secs);
        }
        Ok(())
    }

    /// Trims `base_url` and rejects values the CMS or the timers cannot work with.
    fn normalized(mut self) -> Result<Self> {
        let trimmed = self.base_url.trim().trim_end_matches('/').to_string();
        self.base_url = trimmed;
        ensure!(self.timeout_secs > 0, "timeout_secs must be at least 1");
        ensure!(self.relay_timeout_secs != Some(0), "relay_timeout_secs must be at least 1 when set");
        // WordPress answers 400 outside 1..=100.
        ensure!(
            (1..=MAX_PER_PAGE).contains(&self.per_page),
            "per_page must be between 1 and {MAX_PER_PAGE}, got {}",
            self.per_page
        );
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn relay_timeout(&self) -> Option<Duration> {
        self.relay_timeout_secs.map(Duration::from_secs)
    }

    /// Outbound HTTP client shared by the gateway and the relay. No cookie
    /// store, so upstream calls are always anonymous.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .build()
            .context("building HTTP client")
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "agency", "agency-gateway").map(|p| p.config_dir().join("config.toml"))
}
