//! Structural validation of a workflow definition (spec §4.7 "Validation").
//!
//! Mirrors the shape of a structural-validator pass: step-reference
//! resolution with typo suggestions, then a DAG check (cycle + depth).

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;
use petgraph::Direction;

use super::definition::WorkflowDefinition;
use super::graph::DependencyGraph;

pub const MAX_DEPTH: usize = 20;

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ValidationIssue {
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
        }
    }

    fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Run every structural check; collects every violation rather than
/// stopping at the first (spec §4.7 "Errors are returned as `{valid: false,
/// errors: [...]}`").
pub fn validate_definition(definition: &WorkflowDefinition) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    validate_unique_ids(definition, &mut issues);
    validate_references(definition, &mut issues);

    if issues.is_empty() {
        let graph = DependencyGraph::build(definition);
        validate_acyclic_and_depth(&graph, &mut issues);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn validate_unique_ids(definition: &WorkflowDefinition, issues: &mut Vec<ValidationIssue>) {
    let mut seen = HashSet::new();
    for step in &definition.steps {
        if !seen.insert(step.id.as_str()) {
            issues.push(ValidationIssue::new(format!(
                "duplicate step id '{}'",
                step.id
            )));
        }
    }
}

fn validate_references(definition: &WorkflowDefinition, issues: &mut Vec<ValidationIssue>) {
    let known: HashSet<&str> = definition.steps.iter().map(|s| s.id.as_str()).collect();

    let mut check = |referenced: &str, location: &str, issues: &mut Vec<ValidationIssue>| {
        if known.contains(referenced) {
            return;
        }
        let mut issue = ValidationIssue::new(format!(
            "unknown step id '{referenced}' referenced in {location}"
        ));
        if let Some(suggestion) = find_similar(referenced, &known) {
            issue = issue.with_suggestion(format!("did you mean '{suggestion}'?"));
        }
        issues.push(issue);
    };

    for step in &definition.steps {
        for dep in &step.depends_on {
            check(dep, &format!("'{}'s dependsOn", step.id), issues);
        }
        for target in step.referenced_step_ids() {
            check(&target, &format!("'{}'s branch/group targets", step.id), issues);
        }
    }
}

fn find_similar<'a>(target: &str, known: &HashSet<&'a str>) -> Option<&'a str> {
    known
        .iter()
        .map(|&id| (id, strsim::levenshtein(target, id)))
        .filter(|(_, distance)| *distance <= 3)
        .min_by_key(|(_, distance)| *distance)
        .map(|(id, _)| id)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Three-color DFS: detects cycles and, on an acyclic graph, computes each
/// node's depth (longest chain of dependencies reaching it) via the same
/// walk, memoized per node (spec §4.7).
fn validate_acyclic_and_depth(graph: &DependencyGraph, issues: &mut Vec<ValidationIssue>) {
    let mut color: HashMap<NodeIndex, Color> = HashMap::new();
    let mut depth: HashMap<NodeIndex, usize> = HashMap::new();
    let mut cycle_found = false;

    for &start in graph.index_of.values() {
        if color.get(&start).copied().unwrap_or(Color::White) == Color::White {
            visit(graph, start, &mut color, &mut depth, &mut cycle_found);
        }
    }

    if cycle_found {
        issues.push(ValidationIssue::new("the dependency graph contains a cycle"));
        return;
    }

    if let Some(&max_depth) = depth.values().max() {
        if max_depth > MAX_DEPTH {
            issues.push(ValidationIssue::new(format!(
                "dependency graph depth {max_depth} exceeds the maximum of {MAX_DEPTH}"
            )));
        }
    }
}

fn visit(
    graph: &DependencyGraph,
    node: NodeIndex,
    color: &mut HashMap<NodeIndex, Color>,
    depth: &mut HashMap<NodeIndex, usize>,
    cycle_found: &mut bool,
) {
    if *cycle_found {
        return;
    }
    color.insert(node, Color::Gray);

    let mut max_parent_depth = 0usize;
    for parent in graph.graph.neighbors_directed(node, Direction::Incoming) {
        match color.get(&parent).copied().unwrap_or(Color::White) {
            Color::Gray => {
                *cycle_found = true;
                return;
            }
            Color::White => visit(graph, parent, color, depth, cycle_found),
            Color::Black => {}
        }
        if *cycle_found {
            return;
        }
        max_parent_depth = max_parent_depth.max(depth.get(&parent).copied().unwrap_or(0));
    }

    depth.insert(node, max_parent_depth + 1);
    color.insert(node, Color::Black);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::step::{InputSpec, WorkflowStep};

    fn tool_step(id: &str, deps: &[&str]) -> WorkflowStep {
        WorkflowStep::tool(id, "noop", InputSpec::Literal(serde_json::json!(null)))
            .with_depends_on(deps.to_vec())
    }

    #[test]
    fn duplicate_ids_reject() {
        let def = WorkflowDefinition::new("wf", vec![tool_step("s1", &[]), tool_step("s1", &[])]);
        let err = validate_definition(&def).unwrap_err();
        assert!(err.iter().any(|i| i.message.contains("duplicate")));
    }

    #[test]
    fn unknown_dependency_rejects_with_suggestion() {
        let mut steps = vec![tool_step("review", &[])];
        steps.push(tool_step("next", &["reviw"]));
        let def = WorkflowDefinition::new("wf", steps);
        let err = validate_definition(&def).unwrap_err();
        let issue = err.iter().find(|i| i.message.contains("reviw")).unwrap();
        assert_eq!(issue.suggestion.as_deref(), Some("did you mean 'review'?"));
    }

    #[test]
    fn cycle_rejects() {
        let def = WorkflowDefinition::new(
            "wf",
            vec![tool_step("a", &["b"]), tool_step("b", &["a"])],
        );
        let err = validate_definition(&def).unwrap_err();
        assert!(err.iter().any(|i| i.message.contains("cycle")));
    }

    #[test]
    fn depth_of_exactly_twenty_accepts_twenty_one_rejects() {
        let mut steps = vec![tool_step("s0", &[])];
        for i in 1..20 {
            steps.push(tool_step(&format!("s{i}"), &[&format!("s{}", i - 1)]));
        }
        let def = WorkflowDefinition::new("wf", steps.clone());
        assert!(validate_definition(&def).is_ok());

        steps.push(tool_step("s20", &["s19"]));
        let def = WorkflowDefinition::new("wf", steps);
        let err = validate_definition(&def).unwrap_err();
        assert!(err.iter().any(|i| i.message.contains("exceeds")));
    }

    #[test]
    fn valid_linear_chain_accepts() {
        let def = WorkflowDefinition::new(
            "wf",
            vec![tool_step("s1", &[]), tool_step("s2", &["s1"])],
        );
        assert!(validate_definition(&def).is_ok());
    }
}
