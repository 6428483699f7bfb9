//! Patch application.
//!
//! Hunks are applied to an in-memory [`LineDocument`] from the bottom of the
//! file upwards. Each hunk addresses the original document by line number;
//! working bottom-up means every region above the current hunk is still
//! untouched, so those numbers stay valid without offset bookkeeping.

use thiserror::Error;

use crate::diff::{DiffHunk, LineTag};

/// Placeholder reported as the actual text when a hunk runs past the end.
pub const END_OF_FILE: &str = "<end of file>";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("context mismatch at line {line}: expected {expected:?}, found {actual:?} (hunk {hunk_header})")]
    ContextMismatch {
        line: usize,
        expected: String,
        actual: String,
        hunk_header: String,
    },

    #[error("deletion mismatch at line {line}: expected {expected:?}, found {actual:?} (hunk {hunk_header})")]
    DeletionMismatch {
        line: usize,
        expected: String,
        actual: String,
        hunk_header: String,
    },

    #[error("cannot insert {text:?} at line {line}: document has {document_len} lines (hunk {hunk_header})")]
    InvalidInsertPosition {
        line: usize,
        text: String,
        document_len: usize,
        hunk_header: String,
    },
}

impl PatchError {
    /// 1-based line the failure refers to.
    pub fn line(&self) -> usize {
        match self {
            Self::ContextMismatch { line, .. }
            | Self::DeletionMismatch { line, .. }
            | Self::InvalidInsertPosition { line, .. } => *line,
        }
    }
}

/// Growable line buffer with an insertion/removal cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineDocument {
    lines: Vec<String>,
    cursor: usize,
}

impl LineDocument {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor to a 0-based index. May point past the end.
    pub fn seek(&mut self, index: usize) {
        self.cursor = index;
    }

    /// Line under the cursor, if any.
    pub fn current(&self) -> Option<&str> {
        self.lines.get(self.cursor).map(String::as_str)
    }

    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Remove the line under the cursor; the next line slides into its slot.
    pub fn remove_at_cursor(&mut self) -> Option<String> {
        (self.cursor < self.lines.len()).then(|| self.lines.remove(self.cursor))
    }

    /// Insert before the cursor and step past the new line. Returns `false`
    /// if the cursor is beyond the end of the document.
    pub fn insert_at_cursor(&mut self, text: impl Into<String>) -> bool {
        if self.cursor > self.lines.len() {
            return false;
        }
        self.lines.insert(self.cursor, text.into());
        self.cursor += 1;
        true
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Apply `hunks` to `original`, returning the patched lines.
///
/// Fails without side effects on the first line that does not match.
pub fn apply(original: &[String], hunks: &[DiffHunk]) -> Result<Vec<String>, PatchError> {
    let mut document = LineDocument::new(original.to_vec());

    let mut ordered: Vec<&DiffHunk> = hunks.iter().collect();
    ordered.sort_by(|a, b| b.original_start.cmp(&a.original_start));

    for hunk in ordered {
        apply_hunk(&mut document, hunk)?;
    }

    Ok(document.into_lines())
}

fn apply_hunk(document: &mut LineDocument, hunk: &DiffHunk) -> Result<(), PatchError> {
    document.seek(hunk.original_start.saturating_sub(1));

    for line in &hunk.lines {
        let position = document.cursor();
        match line.tag {
            LineTag::Context => {
                check_line(document, &line.text, hunk, false)?;
                document.advance();
            }
            LineTag::Remove => {
                check_line(document, &line.text, hunk, true)?;
                document.remove_at_cursor();
            }
            LineTag::Add => {
                if !document.insert_at_cursor(line.text.as_str()) {
                    return Err(PatchError::InvalidInsertPosition {
                        line: position + 1,
                        text: line.text.clone(),
                        document_len: document.len(),
                        hunk_header: hunk.header.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn check_line(
    document: &LineDocument,
    expected: &str,
    hunk: &DiffHunk,
    deleting: bool,
) -> Result<(), PatchError> {
    match document.current() {
        Some(actual) if actual == expected => Ok(()),
        found => {
            let line = document.cursor() + 1;
            let expected = expected.to_string();
            let actual = found.unwrap_or(END_OF_FILE).to_string();
            let hunk_header = hunk.header.clone();
            Err(if deleting {
                PatchError::DeletionMismatch { line, expected, actual, hunk_header }
            } else {
                PatchError::ContextMismatch { line, expected, actual, hunk_header }
            })
        }
    }
}
