//! Scenario 5 — retry then success (spec §8).

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use workflow_core::{
    InputSpec, ManualClock, NoopSink, ResultsView, RiskLevel, SecurityDescriptor, ToolHandler,
    ToolMetadata, ToolRegistry, WorkflowContext, WorkflowDefinition, WorkflowManager, WorkflowStep,
};

fn metadata(name: &str) -> ToolMetadata {
    ToolMetadata {
        name: name.to_string(),
        version: "1.0.0".to_string(),
        category: "test".to_string(),
        description: String::new(),
        enabled: true,
        deprecated: false,
        deprecation_message: None,
        dependencies: Vec::new(),
        input_schema: json!({}),
        output_schema: json!({}),
        security: SecurityDescriptor {
            idempotent: true,
            risk_level: RiskLevel::Low,
            requires_approval: false,
        },
        tags: Vec::new(),
    }
}

struct FlakyHandler {
    meta: ToolMetadata,
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl ToolHandler for FlakyHandler {
    fn metadata(&self) -> &ToolMetadata {
        &self.meta
    }

    async fn call(&self, _input: Value, _ctx: &(dyn ResultsView + Send + Sync)) -> Result<Value, String> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt < 3 {
            Err("Transient".to_string())
        } else {
            Ok(json!("ok"))
        }
    }
}

/// Tool `flaky` registered with `maxAttempts = 3`, `idempotent = true`,
/// retryable set `{Transient}`. The handler throws on attempts 1-2, returns
/// `"ok"` on attempt 3. The step's recorded result is `"ok"` after three
/// attempts.
///
/// Uses [`ManualClock`] so the retry engine's backoff sleeps resolve
/// instantly instead of costing real wall-clock time.
#[tokio::test]
async fn flaky_tool_resolves_on_its_third_attempt() {
    let registry = ToolRegistry::new(Arc::new(NoopSink));
    let calls = Arc::new(AtomicU32::new(0));
    registry
        .register(Arc::new(FlakyHandler {
            meta: metadata("flaky"),
            calls: Arc::clone(&calls),
        }))
        .await;

    let manager = Arc::new(WorkflowManager::new(
        Arc::new(registry),
        Arc::new(ManualClock::default()),
        Arc::new(NoopSink),
    ));

    let definition = WorkflowDefinition::new(
        "retry-then-success",
        vec![WorkflowStep::tool("s1", "flaky", InputSpec::Literal(Value::Null))],
    );

    let ctx = Arc::new(WorkflowContext::new("run-retry", Utc::now()));
    let outcome = manager.run(definition, Arc::clone(&ctx)).await.unwrap();

    assert!(outcome.success);
    assert_eq!(ctx.snapshot().result("s1").cloned().unwrap(), json!("ok"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
