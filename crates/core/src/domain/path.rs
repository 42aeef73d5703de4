//! 路径规范化。
//!
//! 把各后端的原生标识（系统路径、浏览器句柄名、`content://` SAF URI、`file://` URI）
//! 转换为统一的正斜杠相对路径与可读显示名。纯函数，不做任何 I/O。

use serde::{Deserialize, Serialize};

const DEFAULT_VOLUME: &str = "primary";
const DEFAULT_DISPLAY_NAME: &str = "ExternalStorage";

/// 外部存储路径解析结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalPathInfo {
    /// 存储卷（如 `primary`）。
    pub volume: String,
    /// 卷内相对路径，无首尾斜杠。
    pub relative_path: String,
    /// 供界面展示的名称。
    pub display_name: String,
}

/// 将反斜杠统一为正斜杠，并去掉末尾斜杠。
///
/// 仅由斜杠组成的路径（文件系统根）保留为 `/`。
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let trimmed = unified.trim_end_matches('/');
    if trimmed.is_empty() && unified.starts_with('/') {
        return "/".to_string();
    }
    trimmed.to_string()
}

/// 拼接父路径与子名称，保证恰好一个分隔符。
pub fn join_path(base: &str, name: &str) -> String {
    let base = normalize_path(base);
    let name = name.trim_matches('/');
    if base.is_empty() {
        return name.to_string();
    }
    if name.is_empty() {
        return base;
    }
    if base == "/" {
        return format!("/{name}");
    }
    format!("{base}/{name}")
}

/// 规范化路径的最后一段。
pub fn file_name(path: &str) -> String {
    normalize_path(path)
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// 是否为设备完整 URI（`content://` 或 `file://`）。
pub fn is_full_device_path(path: &str) -> bool {
    path.starts_with("content://") || path.starts_with("file://")
}

/// 把外部存储标识转换为卷内相对路径与显示名。
///
/// 无法识别的形式不会报错，而是退化为去掉首尾斜杠、取最后一段作为显示名。
pub fn to_relative_external_path(path: &str) -> ExternalPathInfo {
    if path.is_empty() {
        return ExternalPathInfo {
            volume: DEFAULT_VOLUME.to_string(),
            relative_path: String::new(),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
        };
    }

    if path.starts_with("content://") {
        let document_id = extract_encoded_id(path, "document")
            .or_else(|| extract_encoded_id(path, "tree"))
            .unwrap_or_default();
        return parse_document_id(&document_id);
    }

    let raw = path.strip_prefix("file://").unwrap_or(path);
    let relative_path = strip_slashes(&raw.replace('\\', "/"));
    let display_name = last_segment(&relative_path)
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

    ExternalPathInfo {
        volume: DEFAULT_VOLUME.to_string(),
        relative_path,
        display_name,
    }
}

fn strip_slashes(segment: &str) -> String {
    segment.trim_matches('/').to_string()
}

fn last_segment(path: &str) -> Option<&str> {
    path.split('/').filter(|s| !s.is_empty()).next_back()
}

/// 取出 `/{key}/` 之后、下一个 `/` 之前的编码段并 URL 解码。
fn extract_encoded_id(uri: &str, key: &str) -> Option<String> {
    let marker = format!("/{key}/");
    let start = uri.find(&marker)? + marker.len();
    let rest = &uri[start..];
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let encoded = &rest[..end];
    if encoded.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(encoded)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| encoded.to_string());
    Some(decoded)
}

/// 解析 `volume:relative/path` 形式的 SAF document id。
fn parse_document_id(document_id: &str) -> ExternalPathInfo {
    let (volume, raw_path) = match document_id.split_once(':') {
        Some((volume, rest)) => (volume, rest),
        None => (document_id, ""),
    };
    let volume = if volume.is_empty() {
        DEFAULT_VOLUME
    } else {
        volume
    };
    let relative_path = strip_slashes(raw_path);
    let display_name = last_segment(&relative_path)
        .unwrap_or(volume)
        .to_string();

    ExternalPathInfo {
        volume: volume.to_string(),
        relative_path,
        display_name,
    }
}
