pub mod builtin;
pub mod pipeline;
pub mod registry;
pub mod types;

#[cfg(test)]
mod testing;

pub use builtin::{CheckpointFilter, LoggingFilter};
pub use pipeline::ActionDispatcher;
pub use registry::{ActionFilter, FilterRegistry, Next};
pub use types::{ActionInvocation, ActionOutcome, CheckpointStatus};
