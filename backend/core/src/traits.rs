use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::error::ScribeError;

/// A capability that an agent can invoke by name.
///
/// Tools that write to disk report the paths they touch through
/// [`Tool::mutated_paths`]; the dispatcher uses that to decide which
/// invocations get a version-control checkpoint, so a new mutating tool only
/// has to describe its targets.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name of the tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// Description for the LLM prompt.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters(&self) -> Value;

    /// Paths this call would modify. Empty for read-only tools.
    fn mutated_paths(&self, _args: &Value) -> Vec<String> {
        Vec::new()
    }

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: Value) -> Result<String>;
}

/// Pull a required string argument out of a tool call.
pub fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ScribeError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ScribeError::MissingArgument(key.to_string()))
}
