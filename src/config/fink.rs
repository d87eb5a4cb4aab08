// src/config/fink.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const ENV_CONFIG_PATH: &str = "FINK_CONFIG_PATH";
pub const ENV_BASE_URL: &str = "FINK_URL";

pub const DEFAULT_BASE_URL: &str = "http://134.158.75.151:24000";

/// Columns requested from `/api/v1/objects`, `/api/v1/explorer` and `/api/v1/sso`.
pub const DEFAULT_COLUMNS: [&str; 8] = [
    "i:candid",
    "d:rfscore",
    "i:ra",
    "i:dec",
    "i:jd",
    "i:magpsf",
    "i:objectId",
    "d:cdsxmatch",
];

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_columns() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect()
}
fn default_user_agent() -> String {
    concat!("tom-fink/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinkConfig {
    /// Root of the Fink REST API; also the prefix of per-object portal URLs.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
    /// Whole-request timeout. `None` keeps the transport default (no limit).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Extra attempts after a connection-level failure. HTTP error statuses are never retried.
    #[serde(default)]
    pub max_retries: u8,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FinkConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            columns: default_columns(),
            timeout_secs: None,
            connect_timeout_secs: None,
            max_retries: 0,
            user_agent: default_user_agent(),
        }
    }
}

impl FinkConfig {
    /// Config pointing at another API root (mock servers, mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
        .sanitized()
    }

    /// Comma-joined column list as the API expects it.
    pub fn columns_param(&self) -> String {
        self.columns.join(",")
    }

    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading fink config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: FinkConfig = match ext.as_str() {
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?,
            _ => toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?,
        };
        Ok(cfg.with_env_overrides().sanitized())
    }

    /// Load using env var + fallbacks:
    /// 1) $FINK_CONFIG_PATH
    /// 2) config/fink.toml
    /// 3) config/fink.json
    /// 4) built-in defaults
    ///
    /// `$FINK_URL` overrides `base_url` in every case.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("FINK_CONFIG_PATH points to non-existent path"));
            }
        }
        for candidate in ["config/fink.toml", "config/fink.json"] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from(&p);
            }
        }
        Ok(Self::default().with_env_overrides().sanitized())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
        self
    }

    fn sanitized(mut self) -> Self {
        // Portal URLs are built as `{base_url}/{objectId}`.
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        self.columns = self
            .columns
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if self.columns.is_empty() {
            self.columns = default_columns();
        }
        self
    }
}
