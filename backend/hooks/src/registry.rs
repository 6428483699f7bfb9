/// Action filter trait and registry.
///
/// Filters wrap every tool invocation. They run in registration order, the
/// first registered being outermost; each decides whether and when to call
/// `next`, and sees the outcome of everything inside it.
use async_trait::async_trait;
use scribeforge_core::Tool;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::trace;

use crate::types::{ActionInvocation, ActionOutcome};

// ---------------------------------------------------------------------------
// Filter trait
// ---------------------------------------------------------------------------

/// Interceptor around tool execution.
#[async_trait]
pub trait ActionFilter: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Run the filter. Call `next.run(invocation)` to continue the chain.
    async fn invoke(&self, invocation: &ActionInvocation, next: Next<'_>) -> ActionOutcome;
}

/// The remainder of the chain, ending at the tool itself.
pub struct Next<'a> {
    filters: &'a [Arc<dyn ActionFilter>],
    tool: &'a dyn Tool,
}

impl<'a> Next<'a> {
    pub fn new(filters: &'a [Arc<dyn ActionFilter>], tool: &'a dyn Tool) -> Self {
        Self { filters, tool }
    }

    pub fn run(
        self,
        invocation: &'a ActionInvocation,
    ) -> Pin<Box<dyn Future<Output = ActionOutcome> + Send + 'a>> {
        Box::pin(async move {
            match self.filters.split_first() {
                Some((filter, rest)) => {
                    trace!("[Filters] Entering {} for {}", filter.name(), invocation.name);
                    filter.invoke(invocation, Next::new(rest, self.tool)).await
                }
                None => self.tool.execute(invocation.arguments.clone()).await,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered list of filters applied to every dispatched action.
#[derive(Default, Clone)]
pub struct FilterRegistry {
    filters: Vec<Arc<dyn ActionFilter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter; it runs inside every filter registered before it.
    pub fn register(&mut self, filter: Arc<dyn ActionFilter>) {
        self.filters.push(filter);
    }

    pub fn filters(&self) -> &[Arc<dyn ActionFilter>] {
        &self.filters
    }

    pub fn names(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.name().to_string()).collect()
    }
}
