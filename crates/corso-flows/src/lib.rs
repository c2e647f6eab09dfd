//! Flow interpreter — data-driven multi-step decision logic.
//!
//! A flow is a named, directed graph of steps authored as plain data.
//! Given a triggering message, the engine selects a flow (keyword match or
//! explicit id), then walks it step by step: invoking capabilities,
//! evaluating branch conditions, and expanding `${path}` templates, until
//! a terminal step yields the user-facing response.

pub mod condition;
pub mod context;
pub mod engine;
pub mod flow;
pub mod interpreter;
pub mod loader;
pub mod matcher;
pub mod registry;
pub mod step;
pub mod substitute;

pub use condition::{evaluate, Condition, ConditionOperator};
pub use context::ExecutionContext;
pub use engine::{FlowEngine, InvocationReply, InvocationRequest};
pub use flow::{Flow, Trigger};
pub use interpreter::{Interpreter, RunOutcome, StepRecord, DEFAULT_STEP_BUDGET};
pub use loader::{load_dir, load_file};
pub use matcher::match_flow;
pub use registry::FlowRegistry;
pub use step::Step;
