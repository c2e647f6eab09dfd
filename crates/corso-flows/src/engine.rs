use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use corso_capabilities::CapabilityRegistry;
use corso_core::error::CorsoError;
use corso_core::types::{CallerId, ConversationId};

use crate::context::ExecutionContext;
use crate::interpreter::{Interpreter, RunOutcome, DEFAULT_STEP_BUDGET};
use crate::matcher::match_flow;
use crate::registry::FlowRegistry;

/// One invocation of the engine: a triggering message from an
/// authenticated caller, with an optional explicit flow id that skips
/// keyword matching.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub message: String,
    pub caller: CallerId,
    /// Generated when absent.
    pub conversation_id: Option<ConversationId>,
    pub flow_id: Option<String>,
}

impl InvocationRequest {
    pub fn new(message: impl Into<String>, caller: CallerId) -> Self {
        Self {
            message: message.into(),
            caller,
            conversation_id: None,
            flow_id: None,
        }
    }

    /// Force a specific flow instead of keyword matching.
    pub fn with_flow(mut self, flow_id: impl Into<String>) -> Self {
        self.flow_id = Some(flow_id.into());
        self
    }

    pub fn with_conversation(mut self, id: ConversationId) -> Self {
        self.conversation_id = Some(id);
        self
    }
}

/// What the host's request handler gets back.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationReply {
    pub success: bool,
    pub flow_id: Option<String>,
    pub flow_name: Option<String>,
    /// The final response step's expanded text, if any ran.
    pub response: Option<String>,
    pub error: Option<String>,
    /// Full run outcome (context and step trace); absent when no flow
    /// could be resolved.
    pub outcome: Option<RunOutcome>,
}

impl InvocationReply {
    fn unresolved(error: CorsoError) -> Self {
        Self {
            success: false,
            flow_id: None,
            flow_name: None,
            response: None,
            error: Some(error.to_string()),
            outcome: None,
        }
    }
}

/// Invocation entry point: resolves a flow (explicit id or matcher) and
/// runs the interpreter over it.
///
/// The registries are read-only and shared; every invocation gets its own
/// execution context, so concurrent calls are fully independent.
pub struct FlowEngine {
    flows: FlowRegistry,
    capabilities: Arc<CapabilityRegistry>,
    max_steps: usize,
}

impl FlowEngine {
    pub fn new(flows: FlowRegistry, capabilities: Arc<CapabilityRegistry>) -> Self {
        Self {
            flows,
            capabilities,
            max_steps: DEFAULT_STEP_BUDGET,
        }
    }

    /// Override the per-run step budget.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn flows(&self) -> &FlowRegistry {
        &self.flows
    }

    /// Handle one invocation.
    pub async fn handle(&self, request: InvocationRequest) -> InvocationReply {
        let flow = match &request.flow_id {
            Some(id) => match self.flows.get(id) {
                Some(flow) => flow,
                None => {
                    warn!(flow_id = %id, "Explicit flow id not registered");
                    return InvocationReply::unresolved(CorsoError::FlowNotFound(id.clone()));
                }
            },
            None => match match_flow(&request.message, &self.flows) {
                Some(flow) => flow,
                None => {
                    info!("No flow matched the message");
                    return InvocationReply::unresolved(CorsoError::NoMatchingFlow);
                }
            },
        };

        let conversation_id = request.conversation_id.unwrap_or_default();
        info!(
            flow_id = %flow.id,
            flow_name = %flow.name,
            caller = %request.caller,
            conversation_id = %conversation_id,
            "Invoking flow"
        );

        let context = ExecutionContext::new(
            request.message,
            request.caller,
            conversation_id,
            flow.id.clone(),
            flow.name.clone(),
        );

        let interpreter = Interpreter::new(&self.capabilities).with_step_budget(self.max_steps);
        let outcome = interpreter.run(&flow, &flow.initial_step, context).await;

        InvocationReply {
            success: outcome.succeeded,
            flow_id: Some(flow.id.clone()),
            flow_name: Some(flow.name.clone()),
            response: outcome.response.clone(),
            error: outcome.error.clone(),
            outcome: Some(outcome),
        }
    }
}
