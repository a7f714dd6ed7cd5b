//! Scenario 6 — concurrency cap (spec §8).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

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

struct TrackedSleeper {
    meta: ToolMetadata,
    active: Arc<AtomicUsize>,
    observed_max: Arc<AtomicUsize>,
}

#[async_trait]
impl ToolHandler for TrackedSleeper {
    fn metadata(&self) -> &ToolMetadata {
        &self.meta
    }

    async fn call(&self, _input: Value, _ctx: &(dyn ResultsView + Send + Sync)) -> Result<Value, String> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.observed_max.fetch_max(now_active, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(Value::Null)
    }
}

/// Parallel group of 10 members, each sleeping 50ms, with `maxConcurrent = 3`.
/// Minimum wall-clock is `ceil(10/3) * 50ms = 200ms`; the recorded maximum
/// simultaneously active count never exceeds 3.
#[tokio::test]
async fn ten_member_group_respects_its_concurrency_cap() {
    let registry = ToolRegistry::new(Arc::new(NoopSink));
    let active = Arc::new(AtomicUsize::new(0));
    let observed_max = Arc::new(AtomicUsize::new(0));

    let member_ids: Vec<String> = (0..10).map(|i| format!("member_{i}")).collect();
    for id in &member_ids {
        registry
            .register(Arc::new(TrackedSleeper {
                meta: metadata(id),
                active: Arc::clone(&active),
                observed_max: Arc::clone(&observed_max),
            }))
            .await;
    }

    let manager = Arc::new(WorkflowManager::new(
        Arc::new(registry),
        Arc::new(SystemClock),
        Arc::new(NoopSink),
    ));

    let group_step = WorkflowStep {
        id: "fanout".to_string(),
        body: StepBody::Parallel(ParallelGroup {
            group_id: "fanout".to_string(),
            steps: StepList::Literal(member_ids.clone()),
            strategy: WaitStrategy::All,
            max_concurrent: Some(3),
            timeout: None,
            continue_on_error: false,
        }),
        depends_on: Vec::new(),
        condition: None,
        on_error: ErrorPolicy::Fail,
        parallel_eligible: false,
    };

    let mut steps = vec![group_step];
    for id in &member_ids {
        steps.push(WorkflowStep::tool(id.as_str(), id.as_str(), InputSpec::Literal(Value::Null)));
    }
    let definition = WorkflowDefinition::new("concurrency-cap", steps);

    let ctx = Arc::new(WorkflowContext::new("run-cap", Utc::now()));
    let start = Instant::now();
    let outcome = manager.run(definition, Arc::clone(&ctx)).await.unwrap();
    let elapsed = start.elapsed();

    assert!(outcome.success);
    assert!(
        elapsed >= Duration::from_millis(180),
        "expected at least ~200ms for 10 members capped at 3 concurrent, got {elapsed:?}"
    );
    assert!(observed_max.load(Ordering::SeqCst) <= 3);
}
