//! Unified diff parser.
//!
//! Accepts the subset of the unified format that models reliably produce:
//! optional `---`/`+++`/`index` headers followed by `@@` hunks whose bodies
//! are `' '`, `'+'` or `'-'` prefixed lines. Anything else, including
//! `\ No newline at end of file`, is dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static HUNK_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap());

/// Effect of a single hunk body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTag {
    Context,
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedLine {
    pub tag: LineTag,
    pub text: String,
}

impl TaggedLine {
    pub fn context(text: impl Into<String>) -> Self {
        Self { tag: LineTag::Context, text: text.into() }
    }

    pub fn add(text: impl Into<String>) -> Self {
        Self { tag: LineTag::Add, text: text.into() }
    }

    pub fn remove(text: impl Into<String>) -> Self {
        Self { tag: LineTag::Remove, text: text.into() }
    }
}

/// One `@@` block. Starts are 1-based; `0` means "before the first line".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    pub original_start: usize,
    pub original_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    /// Header text as it appeared in the diff, for error messages.
    pub header: String,
    pub lines: Vec<TaggedLine>,
}

impl DiffHunk {
    pub fn new(original_start: usize, original_count: usize, new_start: usize, new_count: usize) -> Self {
        Self {
            original_start,
            original_count,
            new_start,
            new_count,
            header: format!("@@ -{original_start},{original_count} +{new_start},{new_count} @@"),
            lines: Vec::new(),
        }
    }

    pub fn with_lines(mut self, lines: Vec<TaggedLine>) -> Self {
        self.lines = lines;
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffParseError {
    #[error("invalid hunk header on diff line {line}: {header}")]
    InvalidHeader { line: usize, header: String },
}

/// Split text on `\r\n`, `\r` or `\n`.
///
/// A trailing terminator produces a final empty element.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    lines.push(&text[start..]);
    lines
}

/// Parse diff text into hunks, in order of appearance.
pub fn parse(diff_text: &str) -> Result<Vec<DiffHunk>, DiffParseError> {
    let mut hunks: Vec<DiffHunk> = Vec::new();

    for (idx, line) in split_lines(diff_text).into_iter().enumerate() {
        if line.starts_with("---") || line.starts_with("+++") || line.starts_with("index") {
            continue;
        }

        if let Some(caps) = HUNK_HEADER.captures(line) {
            let number = |group: usize| -> Result<usize, DiffParseError> {
                match caps.get(group) {
                    Some(m) => m.as_str().parse().map_err(|_| DiffParseError::InvalidHeader {
                        line: idx + 1,
                        header: line.to_string(),
                    }),
                    None => Ok(1),
                }
            };
            hunks.push(DiffHunk {
                original_start: number(1)?,
                original_count: number(2)?,
                new_start: number(3)?,
                new_count: number(4)?,
                header: caps[0].to_string(),
                lines: Vec::new(),
            });
            continue;
        }

        let Some(current) = hunks.last_mut() else {
            continue;
        };
        let tagged = if let Some(text) = line.strip_prefix(' ') {
            TaggedLine::context(text)
        } else if let Some(text) = line.strip_prefix('+') {
            TaggedLine::add(text)
        } else if let Some(text) = line.strip_prefix('-') {
            TaggedLine::remove(text)
        } else {
            continue;
        };
        current.lines.push(tagged);
    }

    Ok(hunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_every_line_ending() {
        assert_eq!(split_lines("a\r\nb\rc\nd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n"), vec!["a", ""]);
        assert_eq!(split_lines(""), vec![""]);
        assert_eq!(split_lines("\r\n\r\n"), vec!["", "", ""]);
    }

    #[test]
    fn empty_diff_has_no_hunks() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn parses_headers_and_bodies() {
        let diff = "--- a/ch1.md\n+++ b/ch1.md\nindex 83db48f..bf269f4 100644\n@@ -1,3 +1,4 @@\n a\n+x\n b\n c";
        let hunks = parse(diff).unwrap();
        assert_eq!(hunks.len(), 1);
        let hunk = &hunks[0];
        assert_eq!(
            (hunk.original_start, hunk.original_count, hunk.new_start, hunk.new_count),
            (1, 3, 1, 4)
        );
        assert_eq!(hunk.header, "@@ -1,3 +1,4 @@");
        assert_eq!(
            hunk.lines,
            vec![
                TaggedLine::context("a"),
                TaggedLine::add("x"),
                TaggedLine::context("b"),
                TaggedLine::context("c"),
            ]
        );
    }

    #[test]
    fn omitted_counts_default_to_one() {
        let hunks = parse("@@ -5 +5 @@\n-old\n+new").unwrap();
        assert_eq!(hunks[0].original_count, 1);
        assert_eq!(hunks[0].new_count, 1);
        assert_eq!(hunks[0].original_start, 5);
    }

    #[test]
    fn zero_counts_are_valid() {
        let hunks = parse("@@ -0,0 +1,2 @@\n+line1\n+line2").unwrap();
        assert_eq!(hunks[0].original_start, 0);
        assert_eq!(hunks[0].original_count, 0);
        assert_eq!(hunks[0].lines.len(), 2);
    }

    #[test]
    fn header_trailing_section_name_is_ignored() {
        let hunks = parse("@@ -10,2 +10,2 @@ Chapter One\n-a\n+b").unwrap();
        assert_eq!(hunks[0].header, "@@ -10,2 +10,2 @@");
        assert_eq!(hunks[0].original_start, 10);
    }

    #[test]
    fn drops_markers_stray_text_and_preamble() {
        let diff = "Here is the change:\n+ignored before header\n@@ -1,1 +1,1 @@\n-a\n\\ No newline at end of file\n\n+b\ntrailing prose";
        let hunks = parse(diff).unwrap();
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].lines, vec![TaggedLine::remove("a"), TaggedLine::add("b")]);
    }

    #[test]
    fn crlf_diff_text() {
        let hunks = parse("@@ -1,2 +1,1 @@\r\n a\r\n-b\r\n").unwrap();
        assert_eq!(hunks[0].lines, vec![TaggedLine::context("a"), TaggedLine::remove("b")]);
    }

    #[test]
    fn multiple_hunks_keep_appearance_order() {
        let diff = "@@ -10,1 +10,1 @@\n-x\n+y\n@@ -2,1 +2,1 @@\n-p\n+q";
        let hunks = parse(diff).unwrap();
        let starts: Vec<_> = hunks.iter().map(|h| h.original_start).collect();
        assert_eq!(starts, vec![10, 2]);
    }

    #[test]
    fn empty_context_line_is_kept() {
        // A lone space is a context line for an empty document line.
        let hunks = parse("@@ -1,2 +1,2 @@\n \n-a\n+b").unwrap();
        assert_eq!(hunks[0].lines[0], TaggedLine::context(""));
    }

    #[test]
    fn oversized_number_is_rejected() {
        let err = parse("@@ -99999999999999999999999,1 +1,1 @@\n a").unwrap_err();
        assert!(matches!(err, DiffParseError::InvalidHeader { line: 1, .. }));
    }
}
