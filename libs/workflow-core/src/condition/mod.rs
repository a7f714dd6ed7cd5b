//! Condition Evaluator (C3): a safe, restricted expression grammar for
//! runtime if/else and switch/case routing over step results (spec §4.3,
//! §6.1). Never executes host code — string expressions are parsed and
//! walked by this module's own evaluator.

mod evaluator;
mod lexer;
mod parser;
mod value;

pub use evaluator::{
    evaluate_condition, evaluate_value, ConditionClosure, ConditionError, ConditionExpr,
    MatchOutcome, ResultsView, ValueClosure, ValueExpr, ValueOutcome,
};
pub use parser::ParseError;
pub use value::EvalValue;
