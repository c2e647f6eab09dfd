use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::step::Step;

/// A named, immutable collection of steps plus the trigger that selects it.
///
/// Flows are data: authored in TOML or JSON, loaded once, and shared
/// read-only across invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    /// Unique flow identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub trigger: Trigger,
    /// Id of the step the interpreter starts from.
    pub initial_step: String,
    /// Step id → step. Successor references are checked at traversal
    /// time, not load time; `validate` offers an advisory check.
    pub steps: HashMap<String, Step>,
}

/// How a flow is selected for an incoming message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Case-insensitive substring match of any keyword against the message.
    Keyword { keywords: Vec<String> },
    /// Only invocable by explicit flow id; skipped by the matcher.
    Manual,
}

impl Flow {
    /// Create a flow with no steps yet (builder-style, mostly for tests).
    pub fn new(id: impl Into<String>, name: impl Into<String>, initial_step: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            trigger: Trigger::Manual,
            initial_step: initial_step.into(),
            steps: HashMap::new(),
        }
    }

    /// Set the trigger keywords.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.trigger = Trigger::Keyword { keywords };
        self
    }

    /// Add a step.
    pub fn with_step(mut self, id: impl Into<String>, step: Step) -> Self {
        self.steps.insert(id.into(), step);
        self
    }

    /// Advisory check that `initial_step` and every successor reference
    /// name an existing step. Returns the dangling ids (empty = clean).
    pub fn validate(&self) -> Vec<String> {
        let mut dangling = Vec::new();
        if !self.steps.contains_key(&self.initial_step) {
            dangling.push(self.initial_step.clone());
        }
        for step in self.steps.values() {
            for successor in step.successors() {
                if !self.steps.contains_key(successor) && !dangling.iter().any(|d| d == successor) {
                    dangling.push(successor.to_string());
                }
            }
        }
        dangling.sort();
        dangling
    }
}
