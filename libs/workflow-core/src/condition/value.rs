//! Value representation and equality/comparison rules for the condition
//! grammar (spec §4.3, §6.1).

use std::cmp::Ordering;

/// A value produced by evaluating a literal or a `$results`/`$errors` path.
///
/// `Undefined` is distinct from JSON `null` — it marks a path that could not
/// be resolved (a missing intermediate key), whereas `Json(Value::Null)` is
/// an explicit null the tool/step actually produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalValue {
    Undefined,
    Json(serde_json::Value),
}

impl EvalValue {
    #[must_use]
    pub fn null() -> Self {
        Self::Json(serde_json::Value::Null)
    }

    #[must_use]
    pub fn bool(b: bool) -> Self {
        Self::Json(serde_json::Value::Bool(b))
    }

    #[must_use]
    pub fn number(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(|n| Self::Json(serde_json::Value::Number(n)))
            .unwrap_or(Self::Undefined)
    }

    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::Json(serde_json::Value::String(s.into()))
    }

    /// Nullish = `undefined` or JSON `null` (spec §9 open question: both
    /// treated as "not matched" everywhere a boolean/match is needed).
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined) || matches!(self, Self::Json(serde_json::Value::Null))
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Json(serde_json::Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    /// Truthiness for a bare value used where a boolean is expected (e.g. a
    /// condition string that is just `$results.foo.active` with no
    /// comparison operator).
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Undefined => false,
            Self::Json(v) => match v {
                serde_json::Value::Null => false,
                serde_json::Value::Bool(b) => *b,
                serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
                serde_json::Value::String(s) => !s.is_empty(),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
            },
        }
    }

    /// Strict equality (`===`): type and value must match exactly.
    #[must_use]
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Undefined, Self::Json(_)) | (Self::Json(_), Self::Undefined) => false,
            (Self::Json(a), Self::Json(b)) => deep_eq(a, b),
        }
    }

    /// Loose (coercing) equality (`==`).
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        if self.is_nullish() && other.is_nullish() {
            return true;
        }
        if self.is_nullish() != other.is_nullish() {
            return false;
        }
        match (self, other) {
            (Self::Json(a), Self::Json(b)) => loose_eq_json(a, b),
            _ => false,
        }
    }

    /// Numeric ordering. Per spec: "numeric comparisons require both sides
    /// to be numeric after resolution, otherwise the comparison evaluates
    /// false" — callers treat `None` as "comparison is false".
    #[must_use]
    pub fn partial_cmp_numeric(&self, other: &Self) -> Option<Ordering> {
        self.as_f64()?.partial_cmp(&other.as_f64()?)
    }
}

fn loose_eq_json(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    use serde_json::Value::{Bool, Null, Number, String as Str};
    match (a, b) {
        (Null, Null) => true,
        (Bool(x), Bool(y)) => x == y,
        (Number(x), Number(y)) => x.as_f64() == y.as_f64(),
        (Str(x), Str(y)) => x == y,
        (Number(x), Str(y)) | (Str(y), Number(x)) => {
            y.trim().parse::<f64>().ok() == x.as_f64()
        }
        (Bool(x), Number(y)) | (Number(y), Bool(x)) => {
            y.as_f64() == Some(if *x { 1.0 } else { 0.0 })
        }
        (Bool(x), Str(y)) | (Str(y), Bool(x)) => match y.as_str() {
            "true" => *x,
            "false" => !*x,
            _ => false,
        },
        _ => deep_eq(a, b),
    }
}

fn deep_eq(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    use serde_json::Value::{Array, Number, Object};
    match (a, b) {
        (Number(x), Number(y)) => x.as_f64() == y.as_f64(),
        (Array(xs), Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_eq(x, y))
        }
        (Object(xs), Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, v)| ys.get(k).is_some_and(|v2| deep_eq(v, v2)))
        }
        _ => a == b,
    }
}
