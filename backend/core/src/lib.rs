pub mod collaborators;
pub mod error;
pub mod tools;
pub mod traits;

pub use collaborators::{
    DisabledVersionControl, EditorSettings, FixedWorkingDirectory, ProcessWorkingDirectory,
    StaticSettings, VersionControl, WorkingDirectory, DEFAULT_MAX_DIFF_BYTES,
};
pub use error::ScribeError;
pub use tools::{ToolDefinition, ToolRegistry};
pub use traits::{required_str, Tool};
