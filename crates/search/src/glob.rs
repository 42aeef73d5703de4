//! include/exclude glob 规则。
//!
//! `**` 匹配含 `/` 的任意序列，`*` 匹配不含 `/` 的任意序列，`?` 匹配单个非 `/` 字符，
//! 其余字符按字面匹配；整条规则锚定在相对路径首尾。目录以 `/` 结尾参与匹配。

use regex::RegexSet;

use crate::error::{Result, SearchError};

/// 依赖、构建产物与版本控制目录，总是被排除。
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "node_modules/**",
    "**/node_modules/**",
    ".git/**",
    "**/.git/**",
    "dist/**",
    "**/dist/**",
    ".quasar/**",
    "**/.quasar/**",
    "build/**",
    "**/build/**",
];

/// 把单条 glob 翻译为锚定的正则源码。
pub fn glob_to_regex(glob: &str) -> String {
    let normalized = glob.replace('\\', "/");
    let mut pattern = String::with_capacity(normalized.len() * 2 + 2);
    pattern.push('^');

    let mut chars = normalized.chars().peekable();
    let mut buf = [0u8; 4];
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                pattern.push_str(".*");
            }
            '*' => pattern.push_str("[^/]*"),
            '?' => pattern.push_str("[^/]"),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }

    pattern.push('$');
    pattern
}

/// 编译后的一组 glob，任一命中即匹配。
#[derive(Debug, Clone)]
pub struct GlobSet {
    set: RegexSet,
}

impl GlobSet {
    /// 空白项会被忽略。
    pub fn compile<I, S>(globs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = globs
            .into_iter()
            .map(|glob| glob.as_ref().trim().to_string())
            .filter(|glob| !glob.is_empty())
            .map(|glob| glob_to_regex(&glob))
            .collect();
        let set = RegexSet::new(&patterns).map_err(|err| SearchError::Glob(err.to_string()))?;
        Ok(Self { set })
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.set.is_match(path)
    }
}

/// 一次搜索使用的路径过滤规则。
#[derive(Debug, Clone)]
pub struct PathRules {
    include: GlobSet,
    exclude: GlobSet,
}

impl PathRules {
    /// 内置排除、配置追加的排除与请求中的排除取并集。
    pub fn new(include: &[String], exclude: &[String], extra_excludes: &[String]) -> Result<Self> {
        let include = GlobSet::compile(include)?;
        let exclude = GlobSet::compile(
            DEFAULT_EXCLUDES
                .iter()
                .copied()
                .chain(extra_excludes.iter().map(String::as_str))
                .chain(exclude.iter().map(String::as_str)),
        )?;
        Ok(Self { include, exclude })
    }

    /// 目录命中排除规则时整棵子树跳过。`relative` 不带末尾斜杠。
    pub fn prunes_dir(&self, relative: &str) -> bool {
        self.exclude.is_match(&format!("{relative}/"))
    }

    /// 文件先过排除，再过包含；包含为空表示全部包含。
    pub fn accepts_file(&self, relative: &str) -> bool {
        if self.exclude.is_match(relative) {
            return false;
        }
        self.include.is_empty() || self.include.is_match(relative)
    }
}
