//! 平台适配器契约。
//!
//! 三个后端实现同一组操作；调用方只看到 [`Entry`]，不接触原生句柄或路径。

use anhl_core::{Backend, Entry, FsError, FsResult, SandboxScope, Stat, TreeEntry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::support::SupportReport;
use crate::tree;

/// `copy` 的可选参数。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyOptions {
    /// 目标名称，缺省沿用源名称。
    #[serde(default)]
    pub new_name: Option<String>,
}

/// `move` 的可选参数。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOptions {
    #[serde(default)]
    pub new_name: Option<String>,
    /// 源条目的父目录。浏览器后端退化为复制加删除时必需。
    #[serde(default)]
    pub source_parent: Option<Entry>,
}

/// 单个存储后端的全部操作。
///
/// 实现方必须拒绝属于其他后端的能力引用（[`FsError::InvalidHandle`]），
/// 且不得缓存条目或元数据。
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn backend(&self) -> Backend;

    /// 当前后端在本运行环境中的可用性。
    fn support_report(&self) -> SupportReport {
        SupportReport::supported()
    }

    /// 列出直接子项，目录优先、名称不区分大小写排序。
    async fn list(&self, dir: &Entry) -> FsResult<Vec<Entry>>;

    async fn stat(&self, entry: &Entry) -> FsResult<Stat>;

    /// 以 UTF-8 读取，非法字节替换为 U+FFFD。
    async fn read_text(&self, entry: &Entry) -> FsResult<String> {
        let bytes = self.get_blob(entry).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn get_blob(&self, entry: &Entry) -> FsResult<Vec<u8>>;

    /// 在 `target_dir` 下创建或覆盖 `name`。
    async fn write_text(&self, target_dir: &Entry, name: &str, content: &str) -> FsResult<Entry> {
        self.write_blob(target_dir, name, content.as_bytes()).await
    }

    async fn write_blob(&self, target_dir: &Entry, name: &str, data: &[u8]) -> FsResult<Entry>;

    /// 已存在时幂等返回。
    async fn mkdir(&self, target_dir: &Entry, name: &str) -> FsResult<Entry>;

    /// 目录递归删除。浏览器后端需要 `parent`。
    async fn remove(&self, entry: &Entry, parent: Option<&Entry>) -> FsResult<()>;

    async fn copy(&self, entry: &Entry, target_dir: &Entry, options: &CopyOptions)
    -> FsResult<Entry>;

    async fn move_entry(
        &self,
        entry: &Entry,
        target_dir: &Entry,
        options: &MoveOptions,
    ) -> FsResult<Entry>;

    /// 完整递归目录树，每层排序与 [`list`](Self::list) 一致。
    async fn build_tree(&self, dir: &Entry) -> FsResult<Vec<TreeEntry>> {
        tree::build_tree(self, dir).await
    }

    /// 交互式选择根目录。沙箱后端可直接指定作用域。
    async fn pick_directory(&self, _scope: Option<SandboxScope>) -> FsResult<Entry> {
        Err(FsError::unsupported("pick_directory", self.backend()))
    }

    /// 移动端启动时的权限引导，其他后端无事可做。
    async fn ensure_mobile_permissions(&self) -> FsResult<()> {
        Ok(())
    }

    /// 应用私有工作区根目录。
    async fn private_workspace_root(&self) -> FsResult<Entry> {
        Err(FsError::unsupported("private_workspace_root", self.backend()))
    }

    /// 由系统路径直接打开条目，只有宿主后端支持。
    async fn open_path(&self, _path: &str) -> FsResult<Entry> {
        Err(FsError::unsupported("open_path", self.backend()))
    }
}

/// 目标名称：显式给出的新名称，否则沿用源名称。
pub(crate) fn target_name<'a>(entry: &'a Entry, new_name: Option<&'a str>) -> FsResult<&'a str> {
    let name = new_name.unwrap_or(&entry.name);
    validate_name(name)?;
    Ok(name)
}

/// 子项名称必须是单个路径段。
pub(crate) fn validate_name(name: &str) -> FsResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(FsError::Io {
            context: format!("invalid entry name '{name}'"),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "names must be a single non-empty path segment",
            ),
        });
    }
    Ok(())
}

/// 按扩展名推断 MIME 类型，未知时为 `application/octet-stream`。
pub fn mime_from_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "ts" => "text/typescript",
        "csv" => "text/csv",
        "xml" => "application/xml",
        "yaml" | "yml" => "application/yaml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}
