//! 行定位、预览窗口与二进制嗅探。

/// 已知的二进制扩展名（小写）。
pub const BINARY_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".webp", ".bmp", ".ico", ".svgz", ".psd", ".pdf", ".zip",
    ".rar", ".7z", ".gz", ".tar", ".tgz", ".bz2", ".xz", ".apk", ".aab", ".jar", ".war", ".class",
    ".exe", ".dll", ".so", ".dylib", ".wasm", ".ttf", ".otf", ".woff", ".woff2", ".eot", ".mp3",
    ".wav", ".flac", ".aac", ".ogg", ".mp4", ".mkv", ".mov", ".avi", ".webm",
];

/// 预先计算的行起止偏移（字节）。
///
/// `\n`、`\r\n` 与单独的 `\r` 都结束一行，行尾不含换行符。
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    ends: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut starts = vec![0];
        let mut ends = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    ends.push(i);
                    starts.push(i + 2);
                    i += 2;
                }
                b'\r' | b'\n' => {
                    ends.push(i);
                    starts.push(i + 1);
                    i += 1;
                }
                _ => i += 1,
            }
        }
        ends.push(bytes.len());
        Self { starts, ends }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// 偏移所在行（从 0 开始），二分查找。
    pub fn line_of(&self, offset: usize) -> usize {
        self.starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.starts[line]
    }

    /// 第 `line` 行的内容，不含换行符。
    pub fn line<'a>(&self, text: &'a str, line: usize) -> &'a str {
        &text[self.starts[line]..self.ends[line]]
    }
}

/// 预览窗口参数。
#[derive(Debug, Clone, Copy)]
pub struct PreviewWindow {
    pub width: usize,
    pub min_context: usize,
}

impl PreviewWindow {
    /// 截取预览。`column`、`length` 与返回的偏移都按字符计。
    ///
    /// 短行原样返回；长行以匹配为中心截取 `width` 个字符，返回匹配在窗口内的偏移与长度。
    /// 超出窗口的匹配长度截断到窗口末尾。
    pub fn render(&self, line: &str, column: usize, length: usize) -> (String, usize, usize) {
        let line_len = line.chars().count();
        if line_len <= self.width {
            let visible = length.min(line_len.saturating_sub(column));
            return (line.to_string(), column, visible);
        }

        let context = self.min_context.max(self.width.saturating_sub(length) / 2);
        let slice_start = column.saturating_sub(context);
        let slice_end = line_len.min(slice_start + self.width);
        let preview = line
            .chars()
            .skip(slice_start)
            .take(slice_end - slice_start)
            .collect();
        let start = column.saturating_sub(slice_start).min(slice_end - slice_start);
        let visible = length.min(slice_end - slice_start - start);
        (preview, start, visible)
    }
}

/// 扩展名是否属于已知二进制格式。
pub fn is_binary_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    BINARY_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// 内容样本含 NUL 或控制字符占比超过 `control_ratio` 时视为二进制。
pub fn looks_like_binary(sample: &[u8], control_ratio: f64) -> bool {
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }

    let control = sample
        .iter()
        .filter(|&&b| b < 9 || (b > 13 && b < 32))
        .count();
    control as f64 / sample.len() as f64 > control_ratio
}
