//! 浏览器 File System Access API 支持检测。

use serde::{Deserialize, Serialize};

const MIN_CHROMIUM_VERSION: u32 = 86;

/// 支持性检测结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportReport {
    pub supported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<SupportDebug>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportDebug {
    pub user_agent: String,
    pub details: Vec<String>,
}

impl SupportReport {
    pub fn supported() -> Self {
        Self {
            supported: true,
            browser: None,
            reason: None,
            suggestion: None,
            debug: None,
        }
    }

    fn unsupported(browser: String, reason: &str, suggestion: &str, debug: SupportDebug) -> Self {
        Self {
            supported: false,
            browser: Some(browser),
            reason: Some(reason.to_string()),
            suggestion: Some(suggestion.to_string()),
            debug: Some(debug),
        }
    }

    /// 拼成一句可直接展示的说明。
    pub fn summary(&self) -> Option<String> {
        match (&self.reason, &self.suggestion) {
            (Some(reason), Some(suggestion)) => Some(format!("{reason}. {suggestion}")),
            (Some(reason), None) => Some(reason.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct UserAgentFlags {
    edge_legacy: bool,
    edge_chromium: bool,
    chrome: bool,
    firefox: bool,
    safari: bool,
    mobile: bool,
    chrome_version: u32,
    edge_version: u32,
    edge_legacy_version: u32,
}

impl UserAgentFlags {
    fn parse(user_agent: &str) -> Self {
        let edge_legacy = user_agent.contains("Edge/");
        let edge_chromium = user_agent.contains("Edg/");
        let has_chrome = user_agent.contains("Chrome");
        let lower = user_agent.to_ascii_lowercase();
        let mobile = [
            "android",
            "iphone",
            "ipad",
            "ipod",
            "blackberry",
            "iemobile",
            "opera mini",
        ]
        .iter()
        .any(|marker| lower.contains(marker));

        let chrome = has_chrome && !edge_legacy && !edge_chromium;
        Self {
            edge_legacy,
            edge_chromium,
            chrome,
            firefox: user_agent.contains("Firefox"),
            safari: user_agent.contains("Safari") && !has_chrome,
            mobile,
            chrome_version: if chrome {
                version_after(user_agent, "Chrome/")
            } else {
                0
            },
            edge_version: if edge_chromium {
                version_after(user_agent, "Edg/")
            } else {
                0
            },
            edge_legacy_version: if edge_legacy {
                version_after(user_agent, "Edge/")
            } else {
                0
            },
        }
    }

    fn details(&self, user_agent: &str, has_api: bool) -> Vec<String> {
        vec![
            format!("User-Agent: {user_agent}"),
            format!("API present: {has_api}"),
            format!("Edge Legacy: {}", self.edge_legacy),
            format!("Edge Chromium: {}", self.edge_chromium),
            format!("Chrome: {}", self.chrome),
            format!("Firefox: {}", self.firefox),
            format!("Safari: {}", self.safari),
            format!("Mobile: {}", self.mobile),
            format!("Chrome Version: {}", self.chrome_version),
            format!("Edge Chromium Version: {}", self.edge_version),
            format!("Edge Legacy Version: {}", self.edge_legacy_version),
        ]
    }
}

/// `marker` 之后紧跟的主版本号，取不到时为 0。
fn version_after(user_agent: &str, marker: &str) -> u32 {
    user_agent
        .find(marker)
        .map(|idx| &user_agent[idx + marker.len()..])
        .map(|rest| {
            rest.chars()
                .take_while(char::is_ascii_digit)
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

/// 根据 User-Agent 和 `showDirectoryPicker` 是否存在给出支持结论。
pub fn check_browser_support(user_agent: &str, has_api: bool) -> SupportReport {
    let flags = UserAgentFlags::parse(user_agent);
    let debug = SupportDebug {
        user_agent: user_agent.to_string(),
        details: flags.details(user_agent, has_api),
    };

    if !has_api {
        let (browser, reason, suggestion) = if flags.mobile {
            (
                "Mobile Browser".to_string(),
                "Mobile browsers do not support the File System Access API",
                "Use desktop Chrome or Edge, or install the mobile app",
            )
        } else if flags.firefox {
            (
                "Firefox".to_string(),
                "Firefox does not support the File System Access API yet",
                "Use Chrome 86+ or Edge 86+ for full file system access",
            )
        } else if flags.safari {
            (
                "Safari".to_string(),
                "Safari does not support the File System Access API yet",
                "Use Chrome 86+ or Edge 86+, or install the desktop app on Mac",
            )
        } else if flags.edge_legacy {
            (
                format!("Edge (Legacy) {}", flags.edge_legacy_version),
                "Edge Legacy does not support the File System Access API",
                "Upgrade to the Chromium-based Edge or use Chrome",
            )
        } else {
            (
                "Unknown".to_string(),
                "This browser does not support the File System Access API",
                "Use the latest Chrome or Edge",
            )
        };
        return SupportReport::unsupported(browser, reason, suggestion, debug);
    }

    if flags.chrome && flags.chrome_version < MIN_CHROMIUM_VERSION {
        return SupportReport::unsupported(
            format!("Chrome {}", flags.chrome_version),
            "Chrome is too old, the File System Access API needs Chrome 86+",
            "Update Chrome to the latest version",
            debug,
        );
    }
    if flags.edge_chromium && flags.edge_version < MIN_CHROMIUM_VERSION {
        return SupportReport::unsupported(
            format!("Edge {}", flags.edge_version),
            "Edge is too old, the File System Access API needs Edge 86+",
            "Update Edge to the latest version",
            debug,
        );
    }

    SupportReport {
        debug: Some(debug),
        ..SupportReport::supported()
    }
}
