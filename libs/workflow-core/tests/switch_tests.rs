//! Scenario 3 — switch with default (spec §8).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use workflow_core::{
    BranchDefinition, ErrorPolicy, InputSpec, NoopSink, ResultsView, RiskLevel, SecurityDescriptor,
    StepBody, SwitchCase, SystemClock, ToolHandler, ToolMetadata, ToolRegistry, ValueExpr,
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

struct PlanHandler {
    meta: ToolMetadata,
}

#[async_trait]
impl ToolHandler for PlanHandler {
    fn metadata(&self) -> &ToolMetadata {
        &self.meta
    }

    async fn call(&self, _input: Value, _ctx: &(dyn ResultsView + Send + Sync)) -> Result<Value, String> {
        Ok(json!({ "tier": "trial" }))
    }
}

/// Expression `$results.fetch_plan.tier`, cases `"enterprise"`,
/// `"professional"`, `"starter"`, default `[no_plan]`. With
/// `fetch_plan -> {tier: "trial"}`, only `no_plan` executes.
#[tokio::test]
async fn unmatched_tier_falls_through_to_the_default_case() {
    let registry = ToolRegistry::new(Arc::new(NoopSink));
    registry.register(Arc::new(PlanHandler { meta: metadata("fetch_plan") })).await;
    registry.register(Arc::new(EchoHandler { meta: metadata("echo") })).await;

    let manager = Arc::new(WorkflowManager::new(
        Arc::new(registry),
        Arc::new(SystemClock),
        Arc::new(NoopSink),
    ));

    let switch_step = WorkflowStep {
        id: "route".to_string(),
        body: StepBody::Branch(BranchDefinition::Switch {
            expr: ValueExpr::String("$results.fetch_plan.tier".to_string()),
            cases: vec![
                SwitchCase { value: json!("enterprise"), steps: vec!["enterprise_step".to_string()] },
                SwitchCase { value: json!("professional"), steps: vec!["professional_step".to_string()] },
                SwitchCase { value: json!("starter"), steps: vec!["starter_step".to_string()] },
            ],
            default_steps: vec!["no_plan".to_string()],
        }),
        depends_on: vec!["fetch_plan".to_string()],
        condition: None,
        on_error: ErrorPolicy::Fail,
        parallel_eligible: false,
    };

    let definition = WorkflowDefinition::new(
        "switch-default",
        vec![
            WorkflowStep::tool("fetch_plan", "fetch_plan", InputSpec::Literal(Value::Null)),
            switch_step,
            WorkflowStep::tool("enterprise_step", "echo", InputSpec::Literal(json!("e"))),
            WorkflowStep::tool("professional_step", "echo", InputSpec::Literal(json!("p"))),
            WorkflowStep::tool("starter_step", "echo", InputSpec::Literal(json!("s"))),
            WorkflowStep::tool("no_plan", "echo", InputSpec::Literal(json!("n"))),
        ],
    );

    let ctx = Arc::new(WorkflowContext::new("run-switch", Utc::now()));
    let outcome = manager.run(definition, Arc::clone(&ctx)).await.unwrap();

    assert!(outcome.success);
    assert!(ctx.has_result("no_plan"));
    assert!(!ctx.has_result("enterprise_step"));
    assert!(!ctx.has_result("professional_step"));
    assert!(!ctx.has_result("starter_step"));
}
