use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
type Result<T> = anyhow::Result<T>;

/// 搜索引擎的默认限额与预览参数。
///
/// 每个字段都有默认值，空配置即合法配置。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchConfig {
    /// 单次搜索累计匹配上限。
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// 单个文件匹配上限。
    #[serde(default = "default_max_per_file")]
    pub max_per_file: usize,
    /// 每扫描多少个文件发送一次进度。
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
    #[serde(default = "default_preview_width")]
    pub preview_width: usize,
    /// 长行预览时匹配两侧至少保留的字符数。
    #[serde(default = "default_preview_context")]
    pub preview_context: usize,
    /// 二进制嗅探读取的字节数。
    #[serde(default = "default_binary_sample_bytes")]
    pub binary_sample_bytes: usize,
    /// 控制字符占比超过该值即视为二进制。
    #[serde(default = "default_control_ratio")]
    pub control_ratio: f64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// 追加到内置排除列表的 glob。
    #[serde(default)]
    pub extra_excludes: Vec<String>,
}

impl SearchConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read search config file: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("failed to parse search config file: {}", path.display()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to deserialize search config")
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            max_per_file: default_max_per_file(),
            progress_interval: default_progress_interval(),
            preview_width: default_preview_width(),
            preview_context: default_preview_context(),
            binary_sample_bytes: default_binary_sample_bytes(),
            control_ratio: default_control_ratio(),
            channel_capacity: default_channel_capacity(),
            extra_excludes: Vec::new(),
        }
    }
}

fn default_max_results() -> usize {
    1_200
}

fn default_max_per_file() -> usize {
    120
}

fn default_progress_interval() -> u64 {
    20
}

fn default_preview_width() -> usize {
    180
}

fn default_preview_context() -> usize {
    20
}

fn default_binary_sample_bytes() -> usize {
    2_048
}

fn default_control_ratio() -> f64 {
    0.25
}

fn default_channel_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::SearchConfig;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SearchConfig::from_str("").expect("empty config should parse");
        assert_eq!(config, SearchConfig::default());
        assert_eq!(config.max_results, 1200);
        assert_eq!(config.max_per_file, 120);
        assert_eq!(config.progress_interval, 20);
        assert!(config.extra_excludes.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let raw = r#"
max_results = 500
max_per_file = 10
preview_width = 80
extra_excludes = ["target/**", "**/target/**"]
"#;

        let config = SearchConfig::from_str(raw).expect("config should parse");
        assert_eq!(config.max_results, 500);
        assert_eq!(config.max_per_file, 10);
        assert_eq!(config.preview_width, 80);
        assert_eq!(config.preview_context, 20);
        assert_eq!(config.extra_excludes, vec!["target/**", "**/target/**"]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = SearchConfig::from_str("max_results = \"many\"").expect_err("wrong type");
        assert!(err.to_string().contains("search config"));
    }
}
