//! The Tool Handler collaborator interface (spec §6.3 "Tool handler").

use async_trait::async_trait;

use crate::condition::ResultsView;

use super::metadata::ToolMetadata;

/// A registered tool: a function `(input, context) -> output` plus the
/// metadata describing it. The sole injection point for I/O — the core
/// never performs I/O itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn metadata(&self) -> &ToolMetadata;

    async fn call(
        &self,
        input: serde_json::Value,
        ctx: &(dyn ResultsView + Send + Sync),
    ) -> Result<serde_json::Value, String>;
}
