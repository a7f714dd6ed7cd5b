//! Branch Resolver (C4): map a branch definition + context to the ordered
//! list of step IDs to execute next (spec §4.4).

use crate::condition::{evaluate_condition, evaluate_value, ConditionExpr, EvalValue, ResultsView, ValueExpr};

/// One `case` arm of a switch branch.
#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub value: serde_json::Value,
    pub steps: Vec<String>,
}

/// A branch step's definition (spec §3 WorkflowStep "exactly one of ...
/// a branch").
#[derive(Debug, Clone)]
pub enum BranchDefinition {
    /// if/else routing.
    Conditional {
        condition: ConditionExpr,
        then_steps: Vec<String>,
        else_steps: Vec<String>,
    },
    /// switch/case routing.
    Switch {
        expr: ValueExpr,
        cases: Vec<SwitchCase>,
        default_steps: Vec<String>,
    },
}

/// Resolve a branch definition to the step IDs that should run next.
///
/// An evaluator-reported error degrades to the `else`/`default` path rather
/// than propagating (spec §4.4).
#[must_use]
pub fn resolve_branch(branch: &BranchDefinition, ctx: &dyn ResultsView) -> Vec<String> {
    match branch {
        BranchDefinition::Conditional {
            condition,
            then_steps,
            else_steps,
        } => {
            let outcome = evaluate_condition(condition, ctx);
            if outcome.error.is_none() && outcome.matched {
                then_steps.clone()
            } else {
                else_steps.clone()
            }
        }
        BranchDefinition::Switch {
            expr,
            cases,
            default_steps,
        } => {
            let outcome = evaluate_value(expr, ctx);
            if outcome.error.is_some() {
                return default_steps.clone();
            }
            for case in cases {
                if outcome.value.strict_eq(&EvalValue::Json(case.value.clone())) {
                    return case.steps.clone();
                }
            }
            default_steps.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    struct MapView(HashMap<String, serde_json::Value>);
    impl ResultsView for MapView {
        fn result(&self, step_id: &str) -> Option<&serde_json::Value> {
            self.0.get(step_id)
        }
        fn error(&self, _step_id: &str) -> Option<&serde_json::Value> {
            None
        }
    }

    fn view(pairs: &[(&str, serde_json::Value)]) -> MapView {
        MapView(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[test]
    fn conditional_skip_scenario() {
        // Scenario 2: fetch_user -> inactive -> reactivate, not welcome.
        let ctx = view(&[("fetch_user", json!({"status": "inactive"}))]);
        let branch = BranchDefinition::Conditional {
            condition: ConditionExpr::String(
                "$results.fetch_user.status == \"active\"".to_string(),
            ),
            then_steps: vec!["welcome".to_string()],
            else_steps: vec!["reactivate".to_string()],
        };
        let next = resolve_branch(&branch, &ctx);
        assert_eq!(next, vec!["reactivate".to_string()]);
    }

    #[test]
    fn conditional_without_else_returns_empty() {
        let ctx = view(&[("fetch_user", json!({"status": "inactive"}))]);
        let branch = BranchDefinition::Conditional {
            condition: ConditionExpr::String(
                "$results.fetch_user.status == \"active\"".to_string(),
            ),
            then_steps: vec!["welcome".to_string()],
            else_steps: vec![],
        };
        assert!(resolve_branch(&branch, &ctx).is_empty());
    }

    #[test]
    fn switch_with_default_scenario() {
        // Scenario 3: trial tier matches no case, falls to default.
        let ctx = view(&[("fetch_plan", json!({"tier": "trial"}))]);
        let branch = BranchDefinition::Switch {
            expr: ValueExpr::String("$results.fetch_plan.tier".to_string()),
            cases: vec![
                SwitchCase {
                    value: json!("enterprise"),
                    steps: vec!["ent".into()],
                },
                SwitchCase {
                    value: json!("professional"),
                    steps: vec!["pro".into()],
                },
                SwitchCase {
                    value: json!("starter"),
                    steps: vec!["starter".into()],
                },
            ],
            default_steps: vec!["no_plan".to_string()],
        };
        assert_eq!(resolve_branch(&branch, &ctx), vec!["no_plan".to_string()]);
    }

    #[test]
    fn switch_null_case_matches_only_null() {
        let ctx = view(&[("s1", json!({"v": serde_json::Value::Null}))]);
        let branch = BranchDefinition::Switch {
            expr: ValueExpr::String("$results.s1.v".to_string()),
            cases: vec![SwitchCase {
                value: serde_json::Value::Null,
                steps: vec!["null_case".into()],
            }],
            default_steps: vec!["default".into()],
        };
        assert_eq!(resolve_branch(&branch, &ctx), vec!["null_case".to_string()]);

        let ctx2 = view(&[]);
        // expr resolves to Undefined, must NOT match the null case.
        let branch2 = BranchDefinition::Switch {
            expr: ValueExpr::String("$results.missing.v".to_string()),
            cases: vec![SwitchCase {
                value: serde_json::Value::Null,
                steps: vec!["null_case".into()],
            }],
            default_steps: vec!["default".into()],
        };
        assert_eq!(resolve_branch(&branch2, &ctx2), vec!["default".to_string()]);
    }

    #[test]
    fn switch_evaluator_error_routes_to_default() {
        let ctx = view(&[]);
        let branch = BranchDefinition::Switch {
            expr: ValueExpr::String("$bogus.root".to_string()),
            cases: vec![],
            default_steps: vec!["default".into()],
        };
        assert_eq!(resolve_branch(&branch, &ctx), vec!["default".to_string()]);
    }

    #[test]
    fn deep_structural_equality_for_object_case_values() {
        let ctx = view(&[("s1", json!({"v": {"a": 1, "b": [1, 2]}}))]);
        let branch = BranchDefinition::Switch {
            expr: ValueExpr::String("$results.s1.v".to_string()),
            cases: vec![SwitchCase {
                value: json!({"b": [1, 2], "a": 1}),
                steps: vec!["matched".into()],
            }],
            default_steps: vec!["default".into()],
        };
        assert_eq!(resolve_branch(&branch, &ctx), vec!["matched".to_string()]);
    }
}
