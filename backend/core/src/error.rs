use thiserror::Error;

/// Top-level error type for ScribeForge tool execution.
///
/// Tools return `anyhow::Result`, so callers that need the category use
/// `err.downcast_ref::<ScribeError>()`.
#[derive(Debug, Error)]
pub enum ScribeError {
    #[error("access denied: {0} is outside the working directory")]
    AccessDenied(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("missing '{0}' argument")]
    MissingArgument(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("diff is {size} bytes, limit is {limit}")]
    DiffTooLarge { size: usize, limit: usize },

    #[error("operation cancelled")]
    Cancelled,
}
