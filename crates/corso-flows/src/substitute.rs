use std::collections::HashMap;

use serde_json::Value;

/// Expand `${path.to.value}` markers in a template string.
///
/// Paths resolve against the variable bindings: the first segment names a
/// binding, the rest descend through nested objects (by key) and arrays
/// (by index). A marker whose path does not resolve is left verbatim so
/// missing bindings stay visible in the output. Never errors.
pub fn substitute_str(template: &str, variables: &HashMap<String, Value>) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid");
    re.replace_all(template, |caps: &regex::Captures| {
        match lookup(variables, &caps[1]) {
            Some(value) => render(value),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}

/// Apply substitution through a JSON value: strings are expanded, arrays
/// element-wise, objects value-wise; scalars pass through unchanged.
pub fn substitute(template: &Value, variables: &HashMap<String, Value>) -> Value {
    match template {
        Value::String(s) => Value::String(substitute_str(s, variables)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, variables)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, variables)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Resolve a dotted path against the variable bindings.
pub fn lookup<'a>(variables: &'a HashMap<String, Value>, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        Some((head, rest)) => resolve_path(variables.get(head)?, rest),
        None => variables.get(path),
    }
}

/// Resolve a dotted path inside a JSON value (objects by key, arrays by
/// numeric index).
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// String form of a bound value: strings render bare, everything else as
/// compact JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
