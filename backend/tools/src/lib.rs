pub mod apply_diff;
pub mod diff;
pub mod file;
pub mod patch;
pub mod sandbox;

pub use apply_diff::{ApplyDiffTool, PatchEditor, PatchSummary, TextFile};
pub use diff::{parse as parse_diff, DiffHunk, DiffParseError, LineTag, TaggedLine};
pub use file::{ReadFileTool, ReadOutcome, ACCESS_DENIED, FILE_NOT_FOUND};
pub use patch::{apply as apply_hunks, LineDocument, PatchError};
pub use sandbox::{PathComparison, PathSandbox, SandboxVerdict};
