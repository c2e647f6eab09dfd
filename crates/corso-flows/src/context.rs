use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use corso_core::types::{CallerId, ConversationId};

use crate::substitute::{lookup as lookup_vars, resolve_path};

/// Per-run mutable state threaded through one interpreter run.
///
/// Created fresh per invocation and owned by exactly one run; concurrent
/// invocations never share a context.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionContext {
    pub message: String,
    pub caller: CallerId,
    pub conversation_id: ConversationId,
    pub flow_id: String,
    pub flow_name: String,
    /// Raw reply of the last operation step, flattened to a JSON object.
    pub result: Option<Value>,
    /// Accumulated user-facing response (set by response steps).
    pub response: Option<String>,
    /// Variable bindings available to templates and conditions. Seeded
    /// with `message`, `caller`, and `conversation_id` so argument
    /// templates can reference the triggering request.
    pub variables: HashMap<String, Value>,
}

impl ExecutionContext {
    pub fn new(
        message: impl Into<String>,
        caller: CallerId,
        conversation_id: ConversationId,
        flow_id: impl Into<String>,
        flow_name: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let mut variables = HashMap::new();
        variables.insert("message".to_string(), Value::String(message.clone()));
        variables.insert("caller".to_string(), Value::String(caller.to_string()));
        variables.insert(
            "conversation_id".to_string(),
            Value::String(conversation_id.to_string()),
        );

        Self {
            message,
            caller,
            conversation_id,
            flow_id: flow_id.into(),
            flow_name: flow_name.into(),
            result: None,
            response: None,
            variables,
        }
    }

    /// Bind a variable (later bindings overwrite earlier ones).
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Resolve a dotted path against the whole context.
    ///
    /// The first segment picks the root: `message`, `caller`,
    /// `conversation_id`, `flow_id`, `flow_name`, `response`, `result`, or
    /// `variables`; any other name falls back to the variable bindings, so
    /// conditions can say either `variables.count` or just `count`.
    pub fn lookup(&self, path: &str) -> Option<Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        match head {
            "message" => scalar(Value::String(self.message.clone()), rest),
            "caller" => scalar(Value::String(self.caller.to_string()), rest),
            "conversation_id" => scalar(Value::String(self.conversation_id.to_string()), rest),
            "flow_id" => scalar(Value::String(self.flow_id.clone()), rest),
            "flow_name" => scalar(Value::String(self.flow_name.clone()), rest),
            "response" => scalar(Value::String(self.response.clone()?), rest),
            "result" => {
                let result = self.result.as_ref()?;
                match rest {
                    Some(rest) => resolve_path(result, rest).cloned(),
                    None => Some(result.clone()),
                }
            }
            "variables" => match rest {
                Some(rest) => lookup_vars(&self.variables, rest).cloned(),
                None => Some(Value::Object(
                    self.variables
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                )),
            },
            _ => lookup_vars(&self.variables, path).cloned(),
        }
    }
}

// Scalar roots have no inner structure to descend into.
fn scalar(value: Value, rest: Option<&str>) -> Option<Value> {
    match rest {
        Some(_) => None,
        None => Some(value),
    }
}
