use regex::{Regex, RegexBuilder};

use crate::error::{Result, SearchError};
use crate::protocol::{SearchMatch, SearchOptions};
use crate::text::{LineIndex, PreviewWindow};

/// 由查询与选项编译出的匹配器。
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
}

impl Matcher {
    /// 查询先去除首尾空白；非正则模式按字面转义，全词模式加 `\b` 边界。
    pub fn new(query: &str, options: &SearchOptions) -> Result<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let escaped = if options.use_regex {
            trimmed.to_string()
        } else {
            regex::escape(trimmed)
        };
        let source = if options.whole_word {
            format!(r"\b(?:{escaped})\b")
        } else {
            escaped
        };

        let regex = RegexBuilder::new(&source)
            .case_insensitive(!options.match_case)
            .build()?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// 在全文中查找至多 `limit` 条命中，跳过零宽匹配。
    pub fn find_matches(&self, text: &str, limit: usize, window: PreviewWindow) -> Vec<SearchMatch> {
        let mut matches = Vec::new();
        if limit == 0 {
            return matches;
        }

        let index = LineIndex::new(text);
        for found in self.regex.find_iter(text) {
            if found.is_empty() {
                continue;
            }

            let line = index.line_of(found.start());
            let line_start = index.line_start(line);
            let column = text[line_start..found.start()].chars().count();
            let length = found.as_str().chars().count();
            let (preview, start, visible) =
                window.render(index.line(text, line), column, length);

            matches.push(SearchMatch {
                line: line + 1,
                start,
                length: visible,
                preview,
            });
            if matches.len() >= limit {
                break;
            }
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: PreviewWindow = PreviewWindow {
        width: 180,
        min_context: 20,
    };

    fn options() -> SearchOptions {
        SearchOptions::default()
    }

    #[test]
    fn test_case_insensitive_literal_search() {
        let matcher = Matcher::new("foo", &options()).expect("matcher");
        let matches = matcher.find_matches("Foo\nbar foo\nFOO baz", 100, WINDOW);

        let lines: Vec<usize> = matches.iter().map(|m| m.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        let starts: Vec<usize> = matches.iter().map(|m| m.start).collect();
        assert_eq!(starts, vec![0, 4, 0]);
        assert!(matches.iter().all(|m| m.length == 3));
        assert_eq!(matches[1].preview, "bar foo");
    }

    #[test]
    fn test_match_case_is_respected() {
        let options = SearchOptions {
            match_case: true,
            ..options()
        };
        let matcher = Matcher::new("foo", &options).expect("matcher");
        let matches = matcher.find_matches("Foo\nbar foo\nFOO baz", 100, WINDOW);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line, 2);
    }

    #[test]
    fn test_literal_query_escapes_metacharacters() {
        let matcher = Matcher::new("a.b(", &options()).expect("matcher");
        let matches = matcher.find_matches("axb(\na.b(", 100, WINDOW);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line, 2);
    }

    #[test]
    fn test_whole_word() {
        let options = SearchOptions {
            whole_word: true,
            ..options()
        };
        let matcher = Matcher::new("cat", &options).expect("matcher");
        let matches = matcher.find_matches("cat concat cat-like", 100, WINDOW);
        let starts: Vec<usize> = matches.iter().map(|m| m.start).collect();
        assert_eq!(starts, vec![0, 11]);
    }

    #[test]
    fn test_regex_query_and_zero_width_matches() {
        let options = SearchOptions {
            use_regex: true,
            ..options()
        };
        let matcher = Matcher::new(r"\d+", &options).expect("matcher");
        let matches = matcher.find_matches("v1.20", 100, WINDOW);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].start, 3);
        assert_eq!(matches[1].length, 2);

        let empty = Matcher::new("x*", &options).expect("matcher");
        let matches = empty.find_matches("abxxc", 100, WINDOW);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].length, 2);
    }

    #[test]
    fn test_long_match_stays_inside_preview() {
        let options = SearchOptions {
            use_regex: true,
            ..options()
        };
        let matcher = Matcher::new("a{200}", &options).expect("matcher");
        let matches = matcher.find_matches(&"a".repeat(400), 100, WINDOW);

        assert_eq!(matches.len(), 2);
        for m in &matches {
            assert!(m.start + m.length <= m.preview.chars().count());
        }
        assert_eq!((matches[0].start, matches[0].length), (0, 180));
        assert_eq!((matches[1].start, matches[1].length), (20, 160));
    }

    #[test]
    fn test_columns_count_chars() {
        let matcher = Matcher::new("世界", &options()).expect("matcher");
        let matches = matcher.find_matches("héllo 世界\r\n再见 世界", 100, WINDOW);
        assert_eq!(matches.len(), 2);
        assert_eq!((matches[0].line, matches[0].start, matches[0].length), (1, 6, 2));
        assert_eq!(matches[0].preview, "héllo 世界");
        assert_eq!((matches[1].line, matches[1].start), (2, 3));
    }

    #[test]
    fn test_per_file_limit() {
        let matcher = Matcher::new("x", &options()).expect("matcher");
        let text = "x".repeat(500);
        assert_eq!(matcher.find_matches(&text, 120, WINDOW).len(), 120);
        assert!(matcher.find_matches(&text, 0, WINDOW).is_empty());
    }

    #[test]
    fn test_invalid_queries() {
        let err = Matcher::new("   ", &options()).expect_err("blank query");
        assert!(matches!(err, SearchError::EmptyQuery));

        let options = SearchOptions {
            use_regex: true,
            ..options()
        };
        let err = Matcher::new("(unclosed", &options).expect_err("bad regex");
        assert!(err.is_pattern_error());
        assert!(matches!(err, SearchError::Pattern(_)));
    }
}
