use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;

/// A declarative predicate evaluated against the execution context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Dotted path into the context (e.g. `result.count`,
    /// `variables.client_segment`, or a bare variable name).
    pub field: String,
    pub operator: ConditionOperator,
    /// Comparison operand; ignored by `exists`.
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    Exists,
}

/// Evaluate a condition against the execution context.
///
/// A field path that does not resolve makes every operator evaluate to
/// `false`, except `exists`, which reports absence. Numeric operators
/// require both sides to be numbers; `contains` requires both sides to be
/// strings. Anything else evaluates to `false` rather than erroring.
pub fn evaluate(condition: &Condition, ctx: &ExecutionContext) -> bool {
    let resolved = ctx.lookup(&condition.field);

    if condition.operator == ConditionOperator::Exists {
        return resolved.is_some_and(|v| !v.is_null());
    }

    let Some(value) = resolved else {
        return false;
    };
    if value.is_null() {
        return false;
    }

    match condition.operator {
        ConditionOperator::Equals => value == condition.value,
        ConditionOperator::NotEquals => value != condition.value,
        ConditionOperator::GreaterThan => match (value.as_f64(), condition.value.as_f64()) {
            (Some(lhs), Some(rhs)) => lhs > rhs,
            _ => false,
        },
        ConditionOperator::LessThan => match (value.as_f64(), condition.value.as_f64()) {
            (Some(lhs), Some(rhs)) => lhs < rhs,
            _ => false,
        },
        ConditionOperator::Contains => value
            .as_str()
            .zip(condition.value.as_str())
            .is_some_and(|(haystack, needle)| haystack.contains(needle)),
        ConditionOperator::Exists => unreachable!("handled above"),
    }
}
