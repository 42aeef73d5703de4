//! 权限协商。
//!
//! 写操作前统一走"查询 → 请求 → 复查"流程；沙箱的"所有文件访问"权限
//! 单独由 [`AllFilesGate`] 管理，每个会话最多跳转一次系统设置。

use std::sync::atomic::{AtomicBool, Ordering};

use anhl_core::{FsError, FsResult, HandleId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bridge::{BrowserBridge, NativeResult, SandboxBridge};

pub const ALL_FILES_REMEDY: &str = "open system settings and allow all files access for this app";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    ReadWrite,
}

/// 可查询、可请求的某项权限。
#[async_trait]
pub trait PermissionProbe: Send + Sync {
    /// 日志与错误信息中使用的名称。
    fn describe(&self) -> String;

    async fn query(&self, mode: AccessMode) -> NativeResult<PermissionState>;

    async fn request(&self, mode: AccessMode) -> NativeResult<PermissionState>;
}

/// 查询；未授权则请求；请求后以复查结果为准。
pub async fn negotiate<P>(probe: &P, mode: AccessMode) -> NativeResult<bool>
where
    P: PermissionProbe + ?Sized,
{
    if probe.query(mode).await? == PermissionState::Granted {
        return Ok(true);
    }

    debug!(target_name = %probe.describe(), ?mode, "requesting permission");
    let requested = probe.request(mode).await?;
    let rechecked = probe.query(mode).await?;
    debug!(
        target_name = %probe.describe(),
        ?requested,
        ?rechecked,
        "permission prompt finished"
    );
    Ok(rechecked == PermissionState::Granted)
}

/// 协商失败或被拒时返回 [`FsError::PermissionDenied`]。
pub async fn require<P>(probe: &P, mode: AccessMode) -> FsResult<()>
where
    P: PermissionProbe + ?Sized,
{
    let granted = negotiate(probe, mode)
        .await
        .map_err(|err| err.into_fs_error(format!("permission {}", probe.describe())))?;
    if granted {
        return Ok(());
    }
    Err(FsError::permission_denied_with_remedy(
        format!("{} access to {} was refused", mode_label(mode), probe.describe()),
        "allow access when the browser asks, then retry",
    ))
}

fn mode_label(mode: AccessMode) -> &'static str {
    match mode {
        AccessMode::Read => "read",
        AccessMode::ReadWrite => "write",
    }
}

/// 浏览器句柄上的读写权限。
pub struct HandlePermission<'a> {
    bridge: &'a dyn BrowserBridge,
    handle: HandleId,
    label: &'a str,
}

impl<'a> HandlePermission<'a> {
    pub fn new(bridge: &'a dyn BrowserBridge, handle: HandleId, label: &'a str) -> Self {
        Self {
            bridge,
            handle,
            label,
        }
    }
}

#[async_trait]
impl PermissionProbe for HandlePermission<'_> {
    fn describe(&self) -> String {
        format!("handle '{}'", self.label)
    }

    async fn query(&self, mode: AccessMode) -> NativeResult<PermissionState> {
        self.bridge.query_permission(self.handle, mode).await
    }

    async fn request(&self, mode: AccessMode) -> NativeResult<PermissionState> {
        self.bridge.request_permission(self.handle, mode).await
    }
}

/// 移动端的存储读写权限，不区分读写模式。
pub struct StoragePermission<'a> {
    bridge: &'a dyn SandboxBridge,
}

impl<'a> StoragePermission<'a> {
    pub fn new(bridge: &'a dyn SandboxBridge) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl PermissionProbe for StoragePermission<'_> {
    fn describe(&self) -> String {
        "device storage".to_string()
    }

    async fn query(&self, _mode: AccessMode) -> NativeResult<PermissionState> {
        self.bridge.check_storage_permission().await
    }

    async fn request(&self, _mode: AccessMode) -> NativeResult<PermissionState> {
        self.bridge.request_storage_permission().await
    }
}

/// "所有文件访问"权限闸门。
///
/// 授权结果一经确认即缓存；未授权时最多引导用户去系统设置一次，
/// 之后直接报告拒绝。
#[derive(Debug, Default)]
pub struct AllFilesGate {
    granted: AtomicBool,
    requested: AtomicBool,
}

impl AllFilesGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_granted(&self) -> bool {
        self.granted.load(Ordering::Acquire)
    }

    pub async fn ensure(&self, bridge: &dyn SandboxBridge) -> FsResult<()> {
        if self.is_granted() {
            return Ok(());
        }

        if check_all_files(bridge).await? {
            self.granted.store(true, Ordering::Release);
            return Ok(());
        }

        if !self.requested.swap(true, Ordering::AcqRel) {
            info!("all files access missing, opening system settings");
            bridge
                .request_all_files_access()
                .await
                .map_err(|err| err.into_fs_error("sandbox.request_all_files_access"))?;
            if check_all_files(bridge).await? {
                self.granted.store(true, Ordering::Release);
                return Ok(());
            }
        }

        warn!("all files access has not been granted");
        Err(FsError::permission_denied_with_remedy(
            "all files access has not been granted",
            ALL_FILES_REMEDY,
        ))
    }
}

async fn check_all_files(bridge: &dyn SandboxBridge) -> FsResult<bool> {
    bridge
        .check_all_files_access()
        .await
        .map_err(|err| err.into_fs_error("sandbox.check_all_files_access"))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct ScriptedProbe {
        answers: Mutex<Vec<PermissionState>>,
        requests: Mutex<usize>,
        grant_on_request: bool,
    }

    impl ScriptedProbe {
        fn new(initial: PermissionState, grant_on_request: bool) -> Self {
            Self {
                answers: Mutex::new(vec![initial]),
                requests: Mutex::new(0),
                grant_on_request,
            }
        }
    }

    #[async_trait]
    impl PermissionProbe for ScriptedProbe {
        fn describe(&self) -> String {
            "scripted".to_string()
        }

        async fn query(&self, _mode: AccessMode) -> NativeResult<PermissionState> {
            let answers = self.answers.lock().expect("answers lock");
            Ok(*answers.last().expect("at least one answer"))
        }

        async fn request(&self, _mode: AccessMode) -> NativeResult<PermissionState> {
            *self.requests.lock().expect("requests lock") += 1;
            let next = if self.grant_on_request {
                PermissionState::Granted
            } else {
                PermissionState::Denied
            };
            self.answers.lock().expect("answers lock").push(next);
            Ok(next)
        }
    }

    #[tokio::test]
    async fn granted_permission_skips_request() {
        let probe = ScriptedProbe::new(PermissionState::Granted, false);
        assert!(negotiate(&probe, AccessMode::ReadWrite).await.expect("negotiate"));
        assert_eq!(*probe.requests.lock().expect("requests lock"), 0);
    }

    #[tokio::test]
    async fn prompt_is_requested_then_rechecked() {
        let probe = ScriptedProbe::new(PermissionState::Prompt, true);
        assert!(negotiate(&probe, AccessMode::ReadWrite).await.expect("negotiate"));
        assert_eq!(*probe.requests.lock().expect("requests lock"), 1);
    }

    #[tokio::test]
    async fn refusal_becomes_permission_denied() {
        let probe = ScriptedProbe::new(PermissionState::Prompt, false);
        let err = require(&probe, AccessMode::ReadWrite)
            .await
            .expect_err("refused permission should fail");
        match err {
            FsError::PermissionDenied { message, remedy } => {
                assert!(message.contains("scripted"));
                assert!(remedy.is_some());
            }
            other => panic!("expected PermissionDenied, got: {other:?}"),
        }
    }

    #[test]
    fn access_mode_uses_browser_names() {
        let json = serde_json::to_string(&AccessMode::ReadWrite).expect("serialize mode");
        assert_eq!(json, "\"readwrite\"");
    }
}
