//! Evaluation of conditions and value expressions against workflow state
//! (spec §4.3).
//!
//! Both the closure form and the string form funnel through this module so
//! branch resolution (C4) only ever deals with [`MatchOutcome`]/[`ValueOutcome`].

use std::sync::Arc;

use thiserror::Error;

use super::parser::{parse, Atom, CmpOp, Expr, ParseError, VarRoot};
use super::value::EvalValue;

/// Errors raised evaluating a condition/value expression.
#[derive(Debug, Error, Clone)]
pub enum ConditionError {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("closure condition failed: {0}")]
    ClosureFailed(String),
}

/// Narrow read-only view over a run's recorded results/errors, keyed by step
/// ID (spec §3, §4.3's `$results`/`$errors` roots).
pub trait ResultsView {
    fn result(&self, step_id: &str) -> Option<&serde_json::Value>;
    fn error(&self, step_id: &str) -> Option<&serde_json::Value>;
}

/// Boolean-producing closure form of a condition (spec §9 "Dynamic inputs
/// and conditions as closures").
pub type ConditionClosure =
    Arc<dyn Fn(&dyn ResultsView) -> Result<bool, String> + Send + Sync>;

/// Value-producing closure form, used by switch expressions and computed
/// inputs.
pub type ValueClosure =
    Arc<dyn Fn(&dyn ResultsView) -> Result<serde_json::Value, String> + Send + Sync>;

/// A condition: either the restricted string grammar or a host closure.
#[derive(Clone)]
pub enum ConditionExpr {
    String(String),
    Closure(ConditionClosure),
}

impl std::fmt::Debug for ConditionExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "ConditionExpr::String({s:?})"),
            Self::Closure(_) => write!(f, "ConditionExpr::Closure(..)"),
        }
    }
}

/// A value-producing expression: string grammar or host closure.
#[derive(Clone)]
pub enum ValueExpr {
    String(String),
    Closure(ValueClosure),
}

impl std::fmt::Debug for ValueExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "ValueExpr::String({s:?})"),
            Self::Closure(_) => write!(f, "ValueExpr::Closure(..)"),
        }
    }
}

/// Outcome of evaluating a boolean condition. Parse/closure failures are
/// reported here rather than propagated (spec §4.3).
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub matched: bool,
    pub error: Option<ConditionError>,
}

/// Outcome of evaluating a value-producing expression.
#[derive(Debug, Clone)]
pub struct ValueOutcome {
    pub value: EvalValue,
    pub error: Option<ConditionError>,
}

/// Evaluate a condition to a boolean match/no-match outcome.
#[must_use]
pub fn evaluate_condition(expr: &ConditionExpr, ctx: &dyn ResultsView) -> MatchOutcome {
    match expr {
        ConditionExpr::Closure(f) => match f(ctx) {
            Ok(matched) => MatchOutcome {
                matched,
                error: None,
            },
            Err(e) => MatchOutcome {
                matched: false,
                error: Some(ConditionError::ClosureFailed(e)),
            },
        },
        ConditionExpr::String(src) => match parse(src) {
            Err(e) => MatchOutcome {
                matched: false,
                error: Some(ConditionError::Parse(e)),
            },
            Ok(ast) => MatchOutcome {
                matched: eval_expr(&ast, ctx).truthy(),
                error: None,
            },
        },
    }
}

/// Evaluate a value-producing expression (used by switch branches and
/// computed inputs' string form, if ever exposed that way).
#[must_use]
pub fn evaluate_value(expr: &ValueExpr, ctx: &dyn ResultsView) -> ValueOutcome {
    match expr {
        ValueExpr::Closure(f) => match f(ctx) {
            Ok(v) => ValueOutcome {
                value: EvalValue::Json(v),
                error: None,
            },
            Err(e) => ValueOutcome {
                value: EvalValue::Undefined,
                error: Some(ConditionError::ClosureFailed(e)),
            },
        },
        ValueExpr::String(src) => match parse(src) {
            Err(e) => ValueOutcome {
                value: EvalValue::Undefined,
                error: Some(ConditionError::Parse(e)),
            },
            Ok(ast) => ValueOutcome {
                value: eval_expr(&ast, ctx),
                error: None,
            },
        },
    }
}

fn eval_expr(expr: &Expr, ctx: &dyn ResultsView) -> EvalValue {
    match expr {
        Expr::Or(l, r) => EvalValue::bool(eval_expr(l, ctx).truthy() || eval_expr(r, ctx).truthy()),
        Expr::And(l, r) => {
            EvalValue::bool(eval_expr(l, ctx).truthy() && eval_expr(r, ctx).truthy())
        }
        Expr::Not(inner) => EvalValue::bool(!eval_expr(inner, ctx).truthy()),
        Expr::Atom(atom) => eval_atom(atom, ctx),
        Expr::Compare(left, op, right) => {
            let l = eval_atom(left, ctx);
            let r = eval_atom(right, ctx);
            EvalValue::bool(compare(&l, op, &r))
        }
    }
}

fn eval_atom(atom: &Atom, ctx: &dyn ResultsView) -> EvalValue {
    match atom {
        Atom::Literal(v) => v.clone(),
        Atom::Variable(root, path) => resolve_path(*root, path, ctx),
    }
}

fn resolve_path(root: VarRoot, path: &[String], ctx: &dyn ResultsView) -> EvalValue {
    let Some((head, rest)) = path.split_first() else {
        return EvalValue::Undefined;
    };
    let base = match root {
        VarRoot::Results => ctx.result(head),
        VarRoot::Errors => ctx.error(head),
    };
    let Some(mut current) = base else {
        return EvalValue::Undefined;
    };
    for field in rest {
        match current.get(field) {
            Some(next) => current = next,
            None => return EvalValue::Undefined,
        }
    }
    EvalValue::Json(current.clone())
}

fn compare(left: &EvalValue, op: &CmpOp, right: &EvalValue) -> bool {
    match op {
        CmpOp::Eq => left.loose_eq(right),
        CmpOp::NotEq => !left.loose_eq(right),
        CmpOp::StrictEq => left.strict_eq(right),
        CmpOp::StrictNotEq => !left.strict_eq(right),
        CmpOp::Gt => left
            .partial_cmp_numeric(right)
            .is_some_and(std::cmp::Ordering::is_gt),
        CmpOp::Lt => left
            .partial_cmp_numeric(right)
            .is_some_and(std::cmp::Ordering::is_lt),
        CmpOp::Gte => left
            .partial_cmp_numeric(right)
            .is_some_and(|o| !o.is_lt()),
        CmpOp::Lte => left
            .partial_cmp_numeric(right)
            .is_some_and(|o| !o.is_gt()),
    }
}
