use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use corso_core::error::{CorsoError, Result};
use corso_core::traits::Capability;
use corso_core::types::{CallerId, CapabilityReply};

/// Registry of available capabilities.
///
/// The mapping is closed after construction: flows name operations by
/// string, and an unknown name yields a `success: false` reply rather than
/// an error, so graph-authoring mistakes stay recoverable through normal
/// `on_failure` branching.
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            capabilities: HashMap::new(),
        }
    }

    /// Register a capability.
    pub fn register(&mut self, capability: impl Capability) {
        let name = capability.name().to_string();
        self.capabilities.insert(name, Arc::new(capability));
    }

    /// Get a capability by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(name).cloned()
    }

    /// List all registered capability names.
    pub fn list(&self) -> Vec<&str> {
        self.capabilities.keys().map(|s| s.as_str()).collect()
    }

    /// Dispatch an operation by name.
    ///
    /// Unknown names produce a failed reply, not an error. Provider errors
    /// and timeouts propagate as `Err` for the interpreter to catch at the
    /// step boundary.
    pub async fn dispatch(
        &self,
        name: &str,
        args: serde_json::Value,
        caller: CallerId,
    ) -> Result<CapabilityReply> {
        let Some(capability) = self.get(name) else {
            warn!(operation = %name, "Operation not implemented");
            return Ok(CapabilityReply::failure(format!(
                "operation not implemented: {}",
                name
            )));
        };

        debug!(operation = %name, caller = %caller, "Dispatching capability");

        let timeout = std::time::Duration::from_secs(capability.timeout_secs());

        match tokio::time::timeout(timeout, capability.invoke(args, caller)).await {
            Ok(reply) => reply,
            Err(_) => Err(CorsoError::CapabilityTimeout {
                capability: name.to_string(),
                timeout_secs: capability.timeout_secs(),
            }),
        }
    }

    /// Create a registry with all built-in capabilities registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(crate::builtin::clients::ClientLookup);
        registry.register(crate::builtin::meetings::ScheduleMeeting);
        registry.register(crate::builtin::news::FetchNews);
        registry.register(crate::builtin::documents::AssembleDocument);

        registry
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
