use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// One node in a flow.
///
/// A step either invokes a capability, branches on a condition, or emits
/// (part of) the user-facing response. Successor fields hold step ids;
/// an absent successor terminates the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// Invoke a capability and branch on its `success` flag.
    ///
    /// On success the successor is `on_success`, falling back to
    /// `next_step`. On failure only an explicit `on_failure` continues the
    /// run; without one the failure terminates it.
    Operation {
        /// Capability name to dispatch.
        operation: String,
        /// Argument templates; string values may contain `${path}` markers.
        #[serde(default)]
        args: serde_json::Map<String, serde_json::Value>,
        /// Field names copied from a successful reply into the variable
        /// bindings. Fields absent from the reply are skipped silently.
        #[serde(default)]
        variables: Vec<String>,
        #[serde(default)]
        on_success: Option<String>,
        #[serde(default)]
        on_failure: Option<String>,
        #[serde(default)]
        next_step: Option<String>,
    },
    /// Evaluate a condition and pick `on_true` (falling back to
    /// `next_step`) or `on_false`.
    Branch {
        condition: Condition,
        #[serde(default)]
        on_true: Option<String>,
        #[serde(default)]
        on_false: Option<String>,
        #[serde(default)]
        next_step: Option<String>,
    },
    /// Expand a template into the user-facing response. A `next_step`
    /// lets a flow emit an intermediate message and keep going.
    Response {
        template: String,
        #[serde(default)]
        next_step: Option<String>,
    },
}

impl Step {
    /// Label used in logs and step traces.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Operation { .. } => "operation",
            Step::Branch { .. } => "branch",
            Step::Response { .. } => "response",
        }
    }

    /// All successor step ids this step can reach.
    pub fn successors(&self) -> Vec<&str> {
        match self {
            Step::Operation {
                on_success,
                on_failure,
                next_step,
                ..
            } => [on_success, on_failure, next_step]
                .into_iter()
                .filter_map(|s| s.as_deref())
                .collect(),
            Step::Branch {
                on_true,
                on_false,
                next_step,
                ..
            } => [on_true, on_false, next_step]
                .into_iter()
                .filter_map(|s| s.as_deref())
                .collect(),
            Step::Response { next_step, .. } => next_step.as_deref().into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionOperator;

    #[test]
    fn test_step_kind_roundtrip() {
        let json = r#"{
            "kind": "operation",
            "operation": "client_lookup",
            "args": {"query": "${message}"},
            "variables": ["client_name"],
            "on_success": "greet",
            "on_failure": "apologize"
        }"#;
        let step: Step = serde_json::from_str(json).unwrap();
        assert_eq!(step.kind(), "operation");

        let reparsed: Step = serde_json::from_str(&serde_json::to_string(&step).unwrap()).unwrap();
        match reparsed {
            Step::Operation {
                operation,
                on_success,
                on_failure,
                next_step,
                ..
            } => {
                assert_eq!(operation, "client_lookup");
                assert_eq!(on_success.as_deref(), Some("greet"));
                assert_eq!(on_failure.as_deref(), Some("apologize"));
                assert_eq!(next_step, None);
            }
            other => panic!("expected operation step, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind_rejected_at_parse_time() {
        let json = r#"{"kind": "teleport", "to": "anywhere"}"#;
        assert!(serde_json::from_str::<Step>(json).is_err());
    }

    #[test]
    fn test_successors() {
        let step = Step::Branch {
            condition: Condition {
                field: "variables.count".into(),
                operator: ConditionOperator::Exists,
                value: serde_json::Value::Null,
            },
            on_true: Some("a".into()),
            on_false: None,
            next_step: Some("b".into()),
        };
        assert_eq!(step.successors(), vec!["a", "b"]);
    }

    #[test]
    fn test_step_parses_from_toml() {
        let toml_str = r#"
kind = "response"
template = "Hello ${client_name}"
"#;
        let step: Step = toml::from_str(toml_str).unwrap();
        assert_eq!(step.kind(), "response");
    }
}
