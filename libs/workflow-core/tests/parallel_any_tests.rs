//! Scenario 4 — parallel "any" (spec §8).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use workflow_core::{
    ErrorPolicy, InputSpec, NoopSink, ParallelGroup, ResultsView, RiskLevel, SecurityDescriptor,
    StepBody, StepList, SystemClock, ToolHandler, ToolMetadata, ToolRegistry, WaitStrategy,
    WorkflowContext, WorkflowDefinition, WorkflowManager, WorkflowStep,
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

struct FailsAfter {
    meta: ToolMetadata,
    delay: Duration,
    message: String,
}

#[async_trait]
impl ToolHandler for FailsAfter {
    fn metadata(&self) -> &ToolMetadata {
        &self.meta
    }

    async fn call(&self, _input: Value, _ctx: &(dyn ResultsView + Send + Sync)) -> Result<Value, String> {
        tokio::time::sleep(self.delay).await;
        Err(self.message.clone())
    }
}

struct SucceedsAfter {
    meta: ToolMetadata,
    delay: Duration,
    value: Value,
}

#[async_trait]
impl ToolHandler for SucceedsAfter {
    fn metadata(&self) -> &ToolMetadata {
        &self.meta
    }

    async fn call(&self, _input: Value, _ctx: &(dyn ResultsView + Send + Sync)) -> Result<Value, String> {
        tokio::time::sleep(self.delay).await;
        Ok(self.value.clone())
    }
}

struct NeverReturns {
    meta: ToolMetadata,
}

#[async_trait]
impl ToolHandler for NeverReturns {
    fn metadata(&self) -> &ToolMetadata {
        &self.meta
    }

    async fn call(&self, _input: Value, _ctx: &(dyn ResultsView + Send + Sync)) -> Result<Value, String> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Value::Null)
    }
}

/// Group `[primary, secondary, cache]` with strategy `any`; `primary` fails
/// after 10ms, `cache` succeeds after 20ms with `"cached"`, `secondary` is
/// still running at group completion. `success = true`, `completedSteps`
/// contains `cache`, `failedSteps` contains `primary`.
#[tokio::test]
async fn any_strategy_succeeds_once_one_member_returns_while_another_is_still_in_flight() {
    let registry = ToolRegistry::new(Arc::new(NoopSink));
    registry
        .register(Arc::new(FailsAfter {
            meta: metadata("primary"),
            delay: Duration::from_millis(10),
            message: "primary down".to_string(),
        }))
        .await;
    registry
        .register(Arc::new(SucceedsAfter {
            meta: metadata("cache"),
            delay: Duration::from_millis(20),
            value: json!("cached"),
        }))
        .await;
    registry
        .register(Arc::new(NeverReturns { meta: metadata("secondary") }))
        .await;

    let manager = Arc::new(WorkflowManager::new(
        Arc::new(registry),
        Arc::new(SystemClock),
        Arc::new(NoopSink),
    ));

    let group_step = WorkflowStep {
        id: "fanout".to_string(),
        body: StepBody::Parallel(ParallelGroup {
            group_id: "fanout".to_string(),
            steps: StepList::Literal(vec![
                "primary".to_string(),
                "secondary".to_string(),
                "cache".to_string(),
            ]),
            strategy: WaitStrategy::Any,
            max_concurrent: None,
            timeout: None,
            continue_on_error: true,
        }),
        depends_on: Vec::new(),
        condition: None,
        on_error: ErrorPolicy::Continue,
        parallel_eligible: false,
    };

    let definition = WorkflowDefinition::new(
        "parallel-any",
        vec![
            group_step,
            WorkflowStep::tool("primary", "primary", InputSpec::Literal(Value::Null)),
            WorkflowStep::tool("secondary", "secondary", InputSpec::Literal(Value::Null)),
            WorkflowStep::tool("cache", "cache", InputSpec::Literal(Value::Null)),
        ],
    );

    let ctx = Arc::new(WorkflowContext::new("run-any", Utc::now()));
    let outcome = manager.run(definition, Arc::clone(&ctx)).await.unwrap();

    assert!(outcome.success);
    let fanout_result = ctx.snapshot().result("fanout").cloned().unwrap();
    assert_eq!(fanout_result["success"], json!(true));
    assert_eq!(fanout_result["completedSteps"], json!(["cache"]));
    assert_eq!(fanout_result["failedSteps"], json!(["primary"]));
}
