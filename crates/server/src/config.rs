use std::path::{Path, PathBuf};

use anhl_search::SearchConfig;
use anyhow::Context;
use serde::Deserialize;
use tracing::warn;
type Result<T> = anyhow::Result<T>;

/// 服务端配置，对应 `anhl.toml`。
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// 允许访问的宿主目录；为空时不限制。
    #[serde(default)]
    pub allowed_roots: Vec<PathBuf>,
    #[serde(default)]
    pub search: SearchConfig,
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to deserialize server config")
    }

    /// 读取配置文件，文件不存在时使用默认值。
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_roots: Vec::new(),
            search: SearchConfig::default(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7878".to_string()
}
