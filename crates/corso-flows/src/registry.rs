use std::sync::Arc;

use tracing::debug;

use crate::flow::Flow;

/// Ordered, read-only collection of flows.
///
/// Registration order is the matcher's tie-break between flows whose
/// keywords both hit a message, so it is preserved. Built once at startup
/// and injected into the engine; never mutated during execution.
#[derive(Debug, Default)]
pub struct FlowRegistry {
    flows: Vec<Arc<Flow>>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flow. A duplicate id replaces the earlier definition in
    /// place, keeping its position in the match order.
    pub fn register(&mut self, flow: Flow) {
        if let Some(existing) = self.flows.iter_mut().find(|f| f.id == flow.id) {
            debug!(flow_id = %flow.id, "Replacing flow definition");
            *existing = Arc::new(flow);
        } else {
            self.flows.push(Arc::new(flow));
        }
    }

    /// Get a flow by id.
    pub fn get(&self, id: &str) -> Option<Arc<Flow>> {
        self.flows.iter().find(|f| f.id == id).cloned()
    }

    /// Iterate flows in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Flow>> {
        self.flows.iter()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}
