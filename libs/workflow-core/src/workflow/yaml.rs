//! Declarative YAML subset of a workflow definition (spec §9 "literal forms
//! only") — condition/input expressions are strings, never closures, so the
//! whole tree round-trips through `serde_yml`. Mirrors the teacher's
//! `parser::parse_workflow` shape: deserialize, then run the same
//! structural validation the in-memory API uses.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::branch::{BranchDefinition, SwitchCase};
use crate::condition::{ConditionExpr, ValueExpr};
use crate::parallel::{ParallelGroup, StepList};
use crate::pool::WaitStrategy;

use super::definition::{PoolConfig, WorkflowDefinition};
use super::step::{ErrorPolicy, InputSpec, StepBody, ToolInvocation, WorkflowStep};
use super::validate::{validate_definition, ValidationIssue};

#[derive(Debug, Error)]
pub enum YamlError {
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yml::Error),
    #[error("step '{0}' must declare exactly one of tool, branch, or parallel")]
    AmbiguousBody(String),
    #[error("branch step '{0}' needs either 'condition' or 'switchOn'")]
    MissingCondition(String),
    #[error("invalid workflow definition: {0:?}")]
    Invalid(Vec<ValidationIssue>),
}

/// Parse and validate a YAML document into a [`WorkflowDefinition`].
pub fn parse_definition(yaml: &str) -> Result<WorkflowDefinition, YamlError> {
    let raw: YamlDefinition = serde_yml::from_str(yaml)?;
    let definition = raw.into_definition()?;
    validate_definition(&definition).map_err(YamlError::Invalid)?;
    Ok(definition)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YamlDefinition {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    max_duration_secs: Option<u64>,
    #[serde(default)]
    pool: Option<YamlPool>,
    steps: Vec<YamlStep>,
}

impl YamlDefinition {
    fn into_definition(self) -> Result<WorkflowDefinition, YamlError> {
        let steps = self
            .steps
            .into_iter()
            .map(YamlStep::into_step)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(WorkflowDefinition {
            name: self.name,
            description: self.description,
            steps,
            max_duration: self.max_duration_secs.map(Duration::from_secs),
            pool: self.pool.map(YamlPool::into_pool_config),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YamlPool {
    max_concurrent: usize,
    #[serde(default)]
    default_timeout_secs: Option<u64>,
}

impl YamlPool {
    fn into_pool_config(self) -> PoolConfig {
        PoolConfig {
            max_concurrent: self.max_concurrent,
            default_timeout: self.default_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
enum YamlErrorPolicy {
    #[default]
    Fail,
    Continue,
    Retry,
}

impl From<YamlErrorPolicy> for ErrorPolicy {
    fn from(value: YamlErrorPolicy) -> Self {
        match value {
            YamlErrorPolicy::Fail => ErrorPolicy::Fail,
            YamlErrorPolicy::Continue => ErrorPolicy::Continue,
            YamlErrorPolicy::Retry => ErrorPolicy::Retry,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YamlStep {
    id: String,
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    on_error: YamlErrorPolicy,
    #[serde(default)]
    parallel_eligible: bool,
    #[serde(default)]
    tool: Option<YamlToolInvocation>,
    #[serde(default)]
    branch: Option<YamlBranch>,
    #[serde(default)]
    parallel: Option<YamlParallelGroup>,
}

impl YamlStep {
    fn into_step(self) -> Result<WorkflowStep, YamlError> {
        let declared = [self.tool.is_some(), self.branch.is_some(), self.parallel.is_some()]
            .into_iter()
            .filter(|present| *present)
            .count();
        if declared != 1 {
            return Err(YamlError::AmbiguousBody(self.id));
        }

        let body = if let Some(tool) = self.tool {
            StepBody::Tool(tool.into_invocation())
        } else if let Some(branch) = self.branch {
            StepBody::Branch(branch.into_branch_definition(&self.id)?)
        } else {
            StepBody::Parallel(self.parallel.expect("exactly one body checked above").into_group())
        };

        Ok(WorkflowStep {
            id: self.id,
            body,
            depends_on: self.depends_on,
            condition: self.condition.map(ConditionExpr::String),
            on_error: self.on_error.into(),
            parallel_eligible: self.parallel_eligible,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YamlToolInvocation {
    tool: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
    #[serde(default)]
    input_expr: Option<String>,
}

impl YamlToolInvocation {
    fn into_invocation(self) -> ToolInvocation {
        let input = match self.input_expr {
            Some(expr) => InputSpec::Computed(ValueExpr::String(expr)),
            None => InputSpec::Literal(self.input.unwrap_or(serde_json::Value::Null)),
        };
        ToolInvocation {
            tool: self.tool,
            version: self.version,
            input,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YamlBranch {
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    then_steps: Vec<String>,
    #[serde(default)]
    else_steps: Vec<String>,
    #[serde(default)]
    switch_on: Option<String>,
    #[serde(default)]
    cases: Vec<YamlSwitchCase>,
    #[serde(default)]
    default_steps: Vec<String>,
}

impl YamlBranch {
    fn into_branch_definition(self, step_id: &str) -> Result<BranchDefinition, YamlError> {
        if let Some(switch_on) = self.switch_on {
            Ok(BranchDefinition::Switch {
                expr: ValueExpr::String(switch_on),
                cases: self.cases.into_iter().map(YamlSwitchCase::into_case).collect(),
                default_steps: self.default_steps,
            })
        } else {
            let condition = self
                .condition
                .ok_or_else(|| YamlError::MissingCondition(step_id.to_string()))?;
            Ok(BranchDefinition::Conditional {
                condition: ConditionExpr::String(condition),
                then_steps: self.then_steps,
                else_steps: self.else_steps,
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct YamlSwitchCase {
    value: serde_json::Value,
    #[serde(default)]
    steps: Vec<String>,
}

impl YamlSwitchCase {
    fn into_case(self) -> SwitchCase {
        SwitchCase {
            value: self.value,
            steps: self.steps,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YamlParallelGroup {
    group_id: String,
    #[serde(default)]
    steps: Vec<String>,
    #[serde(default)]
    steps_expr: Option<String>,
    #[serde(default)]
    strategy: YamlWaitStrategy,
    #[serde(default)]
    max_concurrent: Option<usize>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    continue_on_error: bool,
}

impl YamlParallelGroup {
    fn into_group(self) -> ParallelGroup {
        let steps = match self.steps_expr {
            Some(expr) => StepList::Computed(ValueExpr::String(expr)),
            None => StepList::Literal(self.steps),
        };
        ParallelGroup {
            group_id: self.group_id,
            steps,
            strategy: self.strategy.into(),
            max_concurrent: self.max_concurrent,
            timeout: self.timeout_secs.map(Duration::from_secs),
            continue_on_error: self.continue_on_error,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
enum YamlWaitStrategy {
    #[default]
    All,
    Any,
    AllSettled,
    Race,
}

impl From<YamlWaitStrategy> for WaitStrategy {
    fn from(value: YamlWaitStrategy) -> Self {
        match value {
            YamlWaitStrategy::All => WaitStrategy::All,
            YamlWaitStrategy::Any => WaitStrategy::Any,
            YamlWaitStrategy::AllSettled => WaitStrategy::AllSettled,
            YamlWaitStrategy::Race => WaitStrategy::Race,
        }
    }
}
