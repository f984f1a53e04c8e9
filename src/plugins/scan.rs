//! Line-level source scanning shared by the text-based plugins.
//!
//! The scanners here are heuristics, not parsers: they classify lines as
//! blank, comment or code, strip trailing comments outside string literals,
//! and track loop bodies well enough for pattern counting.

use crate::core::Language;
use crate::io::SourceFile;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Comment,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLine<'a> {
    /// 1-based line number.
    pub number: usize,
    pub kind: LineKind,
    pub raw: &'a str,
    /// Code portion with any trailing comment removed; empty for non-code lines.
    pub code: &'a str,
}

impl ScannedLine<'_> {
    pub fn is_code(&self) -> bool {
        self.kind == LineKind::Code
    }
}

/// Classify every line of `file`.
pub fn scan<'a>(file: &'a SourceFile) -> Vec<ScannedLine<'a>> {
    let language = file.language;
    let marker = language.line_comment();
    let mut lines = Vec::new();
    let mut in_block = false;
    let mut docstring: Option<&'static str> = None;

    for (idx, raw) in file.content.lines().enumerate() {
        let number = idx + 1;
        let trimmed = raw.trim();
        let line = |kind: LineKind, code: &'a str| ScannedLine {
            number,
            kind,
            raw,
            code,
        };

        if trimmed.is_empty() {
            lines.push(line(LineKind::Blank, ""));
            continue;
        }

        if let Some(delim) = docstring {
            if trimmed.contains(delim) {
                docstring = None;
            }
            lines.push(line(LineKind::Comment, ""));
            continue;
        }

        if in_block {
            match raw.find("*/") {
                Some(end) => {
                    in_block = false;
                    let rest = raw[end + 2..].trim();
                    if rest.is_empty() {
                        lines.push(line(LineKind::Comment, ""));
                    } else {
                        lines.push(line(LineKind::Code, strip_trailing_comment(rest, language)));
                    }
                }
                None => lines.push(line(LineKind::Comment, "")),
            }
            continue;
        }

        if language == Language::Python {
            if let Some((delim, rest)) = docstring_opening(trimmed) {
                if !rest.contains(delim) {
                    docstring = Some(delim);
                }
                lines.push(line(LineKind::Comment, ""));
                continue;
            }
        }

        if trimmed.starts_with(marker) {
            lines.push(line(LineKind::Comment, ""));
            continue;
        }

        if language.has_block_comments() && trimmed.starts_with("/*") {
            match trimmed[2..].find("*/") {
                Some(end) => {
                    let rest = trimmed[2 + end + 2..].trim();
                    if rest.is_empty() {
                        lines.push(line(LineKind::Comment, ""));
                    } else {
                        lines.push(line(LineKind::Code, strip_trailing_comment(rest, language)));
                    }
                }
                None => {
                    in_block = true;
                    lines.push(line(LineKind::Comment, ""));
                }
            }
            continue;
        }

        let code = strip_trailing_comment(raw, language);
        if language.has_block_comments() {
            if let Some(open) = code.find("/*") {
                if !code[open..].contains("*/") {
                    in_block = true;
                }
                lines.push(line(LineKind::Code, code[..open].trim_end()));
                continue;
            }
        }
        lines.push(line(LineKind::Code, code));
    }

    lines
}

fn docstring_opening(trimmed: &str) -> Option<(&'static str, &str)> {
    let unprefixed = trimmed.trim_start_matches(['r', 'R', 'u', 'U', 'b', 'B', 'f', 'F']);
    if trimmed.len() - unprefixed.len() > 2 {
        return None;
    }
    ["\"\"\"", "'''"]
        .into_iter()
        .find_map(|delim| unprefixed.strip_prefix(delim).map(|rest| (delim, rest)))
}

/// Cut `line` at its line-comment marker, ignoring markers inside strings.
pub fn strip_trailing_comment(line: &str, language: Language) -> &str {
    let marker = language.line_comment();
    // Rust uses `'` for lifetimes, so only double quotes open strings there.
    let single_quotes = language != Language::Rust;
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'"' || b == b'`' || (single_quotes && b == b'\'') {
                    quote = Some(b);
                } else if bytes[i..].starts_with(marker.as_bytes()) {
                    return line[..i].trim_end();
                }
            }
        }
        i += 1;
    }
    line.trim_end()
}

/// Indentation width in columns, tabs counting as four.
pub fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Tracks whether successive code lines sit inside a loop body.
///
/// Python loops are delimited by indentation, everything else by braces.
#[derive(Debug)]
pub struct LoopTracker {
    language: Language,
    /// Indent of each open loop header (Python) or brace depth before it.
    open: Vec<usize>,
    depth: usize,
}

impl LoopTracker {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            open: Vec::new(),
            depth: 0,
        }
    }

    /// Feed the next code line; returns true if it is inside a loop body.
    pub fn observe(&mut self, code: &str) -> bool {
        if self.language == Language::Python {
            self.observe_indented(code)
        } else {
            self.observe_braced(code)
        }
    }

    fn observe_indented(&mut self, code: &str) -> bool {
        let indent = indent_width(code);
        while self.open.last().is_some_and(|&top| indent <= top) {
            self.open.pop();
        }
        let inside = !self.open.is_empty();
        let trimmed = code.trim();
        if is_loop_header(trimmed) && trimmed.ends_with(':') {
            self.open.push(indent);
        }
        inside
    }

    fn observe_braced(&mut self, code: &str) -> bool {
        let inside = !self.open.is_empty();
        let trimmed = code.trim();
        let opens = code.matches('{').count();
        let closes = code.matches('}').count();
        if is_loop_header(trimmed) && opens > closes {
            self.open.push(self.depth);
        }
        self.depth = (self.depth + opens).saturating_sub(closes);
        while self.open.last().is_some_and(|&top| self.depth <= top) {
            self.open.pop();
        }
        inside
    }
}

fn is_loop_header(trimmed: &str) -> bool {
    let trimmed = trimmed.trim_start_matches('}').trim_start();
    ["for ", "for(", "while ", "while(", "loop ", "loop{", "async for "]
        .iter()
        .any(|kw| trimmed.starts_with(kw))
}

/// Heuristic test-file detection by name, directory and inline test markers.
pub fn is_test_file(path: &Path, content: &str) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or("");

    let by_name = stem.starts_with("test_")
        || stem.ends_with("_test")
        || stem.ends_with("_tests")
        || (stem.ends_with("test") && stem.len() > 4 && name.ends_with(".java"))
        || name.contains(".test.")
        || name.contains(".spec.");
    if by_name {
        return true;
    }

    let in_test_dir = path.components().any(|c| {
        matches!(
            c.as_os_str().to_string_lossy().as_ref(),
            "tests" | "test" | "__tests__" | "spec"
        )
    });
    if in_test_dir {
        return true;
    }

    content.contains("#[cfg(test)]") || content.contains("#[test]")
}

/// Weighted count of findings plus a capped list of examples.
#[derive(Debug, Clone)]
pub struct Findings {
    total: f64,
    occurrences: u64,
    samples: Vec<String>,
    limit: usize,
}

impl Default for Findings {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Findings {
    pub fn new(limit: usize) -> Self {
        Self {
            total: 0.0,
            occurrences: 0,
            samples: Vec::new(),
            limit,
        }
    }

    pub fn record(&mut self, weight: f64, file: &SourceFile, line: usize, what: &str) {
        self.total += weight;
        self.occurrences += 1;
        if self.samples.len() < self.limit {
            self.samples
                .push(format!("{}:{}: {}", file.path.display(), line, what));
        }
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn occurrences(&self) -> u64 {
        self.occurrences
    }

    /// Summary line first, then the capped examples.
    pub fn into_evidence(self, summary: String) -> Vec<String> {
        let mut evidence = Vec::with_capacity(self.samples.len() + 2);
        evidence.push(summary);
        let omitted = self.occurrences.saturating_sub(self.samples.len() as u64);
        evidence.extend(self.samples);
        if omitted > 0 {
            evidence.push(format!("... and {omitted} more"));
        }
        evidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn kinds(path: &str, content: &str) -> Vec<LineKind> {
        let file = SourceFile::new(path, Language::from_path(Path::new(path)), content);
        scan(&file).into_iter().map(|l| l.kind).collect()
    }

    #[test]
    fn test_python_docstrings_are_comments() {
        let src = indoc! {r#"
            """Module docstring
            spanning lines."""
            # comment
            x = 1  # trailing

            def f():
                '''one-liner'''
                return x
        "#};
        use LineKind::*;
        assert_eq!(
            kinds("m.py", src),
            vec![Comment, Comment, Comment, Code, Blank, Code, Comment, Code]
        );
    }

    #[test]
    fn test_block_comments_in_c_like_languages() {
        let src = indoc! {"
            /*
             * header
             */
            int x = 1; /* tail
            still comment */ int y = 2;
            // line
        "};
        use LineKind::*;
        assert_eq!(
            kinds("m.c", src),
            vec![Comment, Comment, Comment, Code, Code, Comment]
        );
    }

    #[test]
    fn test_strip_trailing_comment_respects_strings() {
        assert_eq!(
            strip_trailing_comment(r#"let url = "http://x"; // note"#, Language::Rust),
            r#"let url = "http://x";"#
        );
        assert_eq!(
            strip_trailing_comment("s = '# not a comment'  # real", Language::Python),
            "s = '# not a comment'"
        );
        assert_eq!(
            strip_trailing_comment("fn f<'a>(x: &'a str) // c", Language::Rust),
            "fn f<'a>(x: &'a str)"
        );
    }

    #[test]
    fn test_strip_trailing_comment_handles_non_ascii() {
        assert_eq!(strip_trailing_comment("let c = 'é';", Language::Rust), "let c = 'é';");
        assert_eq!(strip_trailing_comment("café = 1", Language::Python), "café = 1");
        assert_eq!(
            strip_trailing_comment("naïve = \"ü\"  # größe", Language::Python),
            "naïve = \"ü\""
        );
        assert_eq!(
            strip_trailing_comment("let π = 3.14; // ≈ pi", Language::Rust),
            "let π = 3.14;"
        );
    }

    #[test]
    fn test_scan_non_ascii_source() {
        let src = indoc! {"
            // 日本語のコメント
            fn main() {
                let c = 'é'; // trailing ü
            }
        "};
        use LineKind::*;
        assert_eq!(kinds("m.rs", src), vec![Comment, Code, Code, Code]);
    }

    #[test]
    fn test_loop_tracker_python() {
        let mut t = LoopTracker::new(Language::Python);
        assert!(!t.observe("for x in xs:"));
        assert!(t.observe("    s += x"));
        assert!(t.observe("    if x:"));
        assert!(t.observe("        y = 1"));
        assert!(!t.observe("print(s)"));
    }

    #[test]
    fn test_loop_tracker_braces() {
        let mut t = LoopTracker::new(Language::Rust);
        assert!(!t.observe("fn f() {"));
        assert!(!t.observe("    for x in xs {"));
        assert!(t.observe("        let y = x.clone();"));
        assert!(t.observe("        if y { z(); }"));
        assert!(t.observe("    }"));
        assert!(!t.observe("    done();"));
        assert!(!t.observe("}"));
    }

    #[test]
    fn test_is_test_file() {
        assert!(is_test_file(Path::new("pkg/test_core.py"), ""));
        assert!(is_test_file(Path::new("src/app.spec.ts"), ""));
        assert!(is_test_file(Path::new("tests/it.rs"), ""));
        assert!(is_test_file(Path::new("main_test.go"), ""));
        assert!(is_test_file(Path::new("src/lib.rs"), "#[cfg(test)]\nmod tests {}"));
        assert!(!is_test_file(Path::new("src/contest.py"), ""));
    }

    #[test]
    fn test_findings_caps_samples() {
        let file = SourceFile::new("a.py", Language::Python, "");
        let mut findings = Findings::new(2);
        for line in 1..=5 {
            findings.record(0.5, &file, line, "thing");
        }
        assert_eq!(findings.total(), 2.5);
        assert_eq!(findings.occurrences(), 5);
        let evidence = findings.into_evidence("summary".to_string());
        assert_eq!(evidence.len(), 4);
        assert_eq!(evidence[3], "... and 3 more");
    }
}
