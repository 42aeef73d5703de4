use std::fmt;

use serde::{Deserialize, Serialize};

/// 存储后端类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// 浏览器 File System Access API，基于句柄。
    Browser,
    /// 宿主机原生文件系统，基于路径。
    Host,
    /// 移动端沙箱存储，基于作用域 + 相对路径。
    Sandbox,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Browser => write!(f, "browser"),
            Backend::Host => write!(f, "host"),
            Backend::Sandbox => write!(f, "sandbox"),
        }
    }
}

/// 沙箱存储的根作用域。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SandboxScope {
    Documents,
    Data,
    Library,
    Cache,
    External,
    ExternalStorage,
}

impl SandboxScope {
    /// 是否位于应用私有目录之外（需要"所有文件访问"权限）。
    pub fn is_shared_storage(self) -> bool {
        matches!(self, SandboxScope::External | SandboxScope::ExternalStorage)
    }
}

impl fmt::Display for SandboxScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SandboxScope::Documents => "DOCUMENTS",
            SandboxScope::Data => "DATA",
            SandboxScope::Library => "LIBRARY",
            SandboxScope::Cache => "CACHE",
            SandboxScope::External => "EXTERNAL",
            SandboxScope::ExternalStorage => "EXTERNAL_STORAGE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_scope_orders_as_map_key() {
        let mut files = BTreeMap::new();
        files.insert((SandboxScope::External, "b".to_string()), 2);
        files.insert((SandboxScope::Documents, "a".to_string()), 1);

        let scopes: Vec<SandboxScope> = files.keys().map(|(scope, _)| *scope).collect();
        assert_eq!(scopes, vec![SandboxScope::Documents, SandboxScope::External]);
        assert!(SandboxScope::External.is_shared_storage());
        assert!(!SandboxScope::Documents.is_shared_storage());
    }
}
