//! 运行环境探测：决定使用哪一个后端。

use std::path::PathBuf;
use std::sync::Arc;

use anhl_core::Backend;

use crate::bridge::{BrowserBridge, SandboxBridge};

/// 启动时可观察到的能力标记。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformProbe {
    pub has_directory_picker: bool,
    pub has_native_bridge: bool,
}

/// 目录选择器优先，其次原生桥，否则退回宿主文件系统。
pub fn detect_backend(probe: &PlatformProbe) -> Backend {
    if probe.has_directory_picker {
        Backend::Browser
    } else if probe.has_native_bridge {
        Backend::Sandbox
    } else {
        Backend::Host
    }
}

/// 嵌入方提供的运行环境。
#[derive(Clone, Default)]
pub struct Environment {
    pub browser: Option<Arc<dyn BrowserBridge>>,
    pub sandbox: Option<Arc<dyn SandboxBridge>>,
    /// 宿主后端允许访问的根目录，空表示不限制。
    pub allowed_roots: Vec<PathBuf>,
}

impl Environment {
    /// 纯宿主环境（服务端进程、命令行）。
    pub fn host(allowed_roots: Vec<PathBuf>) -> Self {
        Self {
            allowed_roots,
            ..Self::default()
        }
    }

    pub fn probe(&self) -> PlatformProbe {
        PlatformProbe {
            has_directory_picker: self
                .browser
                .as_ref()
                .is_some_and(|bridge| bridge.picker_available()),
            has_native_bridge: self.sandbox.is_some(),
        }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("browser", &self.browser.is_some())
            .field("sandbox", &self.sandbox.is_some())
            .field("allowed_roots", &self.allowed_roots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picker_wins_over_native_bridge() {
        let probe = PlatformProbe {
            has_directory_picker: true,
            has_native_bridge: true,
        };
        assert_eq!(detect_backend(&probe), Backend::Browser);
    }

    #[test]
    fn native_bridge_selects_sandbox() {
        let probe = PlatformProbe {
            has_directory_picker: false,
            has_native_bridge: true,
        };
        assert_eq!(detect_backend(&probe), Backend::Sandbox);
    }

    #[test]
    fn nothing_detected_falls_back_to_host() {
        assert_eq!(detect_backend(&PlatformProbe::default()), Backend::Host);
        assert_eq!(
            detect_backend(&Environment::host(Vec::new()).probe()),
            Backend::Host
        );
    }
}
