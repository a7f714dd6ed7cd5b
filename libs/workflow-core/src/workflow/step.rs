//! Step and definition shapes for a workflow run (spec §3).

use crate::branch::BranchDefinition;
use crate::condition::{ConditionExpr, ValueExpr};
use crate::parallel::ParallelGroup;

/// A step's input: a literal value fixed at definition time, or a closure
/// over the context evaluated at dispatch (spec §9 "Dynamic inputs and
/// conditions as closures").
#[derive(Debug, Clone)]
pub enum InputSpec {
    Literal(serde_json::Value),
    Computed(ValueExpr),
}

/// A single tool invocation (spec §3 "a tool invocation").
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool: String,
    pub version: Option<String>,
    pub input: InputSpec,
}

/// What a step actually does; exactly one of these per step (spec §3).
#[derive(Debug, Clone)]
pub enum StepBody {
    Tool(ToolInvocation),
    Branch(BranchDefinition),
    Parallel(ParallelGroup),
}

/// What happens to the run when this step's own dispatch fails (spec §4.7
/// "Record outcome").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    Fail,
    Continue,
    Retry,
}

/// One node in a workflow definition (spec §3 "WorkflowStep").
#[derive(Debug, Clone)]
pub struct WorkflowStep {
    pub id: String,
    pub body: StepBody,
    pub depends_on: Vec<String>,
    pub condition: Option<ConditionExpr>,
    pub on_error: ErrorPolicy,
    pub parallel_eligible: bool,
}

impl WorkflowStep {
    #[must_use]
    pub fn tool(id: impl Into<String>, tool: impl Into<String>, input: InputSpec) -> Self {
        Self {
            id: id.into(),
            body: StepBody::Tool(ToolInvocation {
                tool: tool.into(),
                version: None,
                input,
            }),
            depends_on: Vec::new(),
            condition: None,
            on_error: ErrorPolicy::Fail,
            parallel_eligible: false,
        }
    }

    #[must_use]
    pub fn with_depends_on(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: ConditionExpr) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn with_on_error(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    /// Step IDs this step structurally refers to beyond `depends_on`: branch
    /// targets or parallel group members (spec invariant 2).
    #[must_use]
    pub fn referenced_step_ids(&self) -> Vec<String> {
        match &self.body {
            StepBody::Tool(_) => Vec::new(),
            StepBody::Branch(branch) => match branch {
                BranchDefinition::Conditional {
                    then_steps,
                    else_steps,
                    ..
                } => {
                    let mut ids = then_steps.clone();
                    ids.extend(else_steps.clone());
                    ids
                }
                BranchDefinition::Switch {
                    cases,
                    default_steps,
                    ..
                } => {
                    let mut ids: Vec<String> =
                        cases.iter().flat_map(|c| c.steps.clone()).collect();
                    ids.extend(default_steps.clone());
                    ids
                }
            },
            StepBody::Parallel(group) => match &group.steps {
                crate::parallel::StepList::Literal(ids) => ids.clone(),
                crate::parallel::StepList::Computed(_) => Vec::new(),
            },
        }
    }
}
