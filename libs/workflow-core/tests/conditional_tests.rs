//! Scenario 2 — conditional skip (spec §8).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use workflow_core::{
    BranchDefinition, ConditionExpr, ErrorPolicy, InputSpec, NoopSink, ResultsView, RiskLevel,
    SecurityDescriptor, StepBody, SystemClock, ToolHandler, ToolMetadata, ToolRegistry,
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

struct EchoHandler {
    meta: ToolMetadata,
}

#[async_trait]
impl ToolHandler for EchoHandler {
    fn metadata(&self) -> &ToolMetadata {
        &self.meta
    }

    async fn call(&self, input: Value, _ctx: &(dyn ResultsView + Send + Sync)) -> Result<Value, String> {
        Ok(input)
    }
}

struct StatusHandler {
    meta: ToolMetadata,
    status: String,
}

#[async_trait]
impl ToolHandler for StatusHandler {
    fn metadata(&self) -> &ToolMetadata {
        &self.meta
    }

    async fn call(&self, _input: Value, _ctx: &(dyn ResultsView + Send + Sync)) -> Result<Value, String> {
        Ok(json!({ "status": self.status }))
    }
}

/// `[fetch_user, branch if "$results.fetch_user.status == \"active\"" then
/// [welcome] else [reactivate]]` with `fetch_user -> {status: "inactive"}`:
/// `welcome` is absent from results, `reactivate` is present.
#[tokio::test]
async fn inactive_user_routes_to_the_else_branch() {
    let registry = ToolRegistry::new(Arc::new(NoopSink));
    registry
        .register(Arc::new(StatusHandler {
            meta: metadata("fetch_user"),
            status: "inactive".to_string(),
        }))
        .await;
    registry.register(Arc::new(EchoHandler { meta: metadata("echo") })).await;

    let manager = Arc::new(WorkflowManager::new(
        Arc::new(registry),
        Arc::new(SystemClock),
        Arc::new(NoopSink),
    ));

    let branch = WorkflowStep {
        id: "route".to_string(),
        body: StepBody::Branch(BranchDefinition::Conditional {
            condition: ConditionExpr::String(
                "$results.fetch_user.status == \"active\"".to_string(),
            ),
            then_steps: vec!["welcome".to_string()],
            else_steps: vec!["reactivate".to_string()],
        }),
        depends_on: vec!["fetch_user".to_string()],
        condition: None,
        on_error: ErrorPolicy::Fail,
        parallel_eligible: false,
    };

    let definition = WorkflowDefinition::new(
        "conditional-skip",
        vec![
            WorkflowStep::tool("fetch_user", "fetch_user", InputSpec::Literal(Value::Null)),
            branch,
            WorkflowStep::tool("welcome", "echo", InputSpec::Literal(json!("hi"))),
            WorkflowStep::tool("reactivate", "echo", InputSpec::Literal(json!("come back"))),
        ],
    );

    let ctx = Arc::new(WorkflowContext::new("run-cond", Utc::now()));
    let outcome = manager.run(definition, Arc::clone(&ctx)).await.unwrap();

    assert!(outcome.success);
    assert!(!ctx.has_result("welcome"));
    assert!(ctx.has_result("reactivate"));
}
