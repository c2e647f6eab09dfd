use std::sync::Arc;

use tracing::debug;

use crate::flow::{Flow, Trigger};
use crate::registry::FlowRegistry;

/// Select the flow that handles a message.
///
/// Flows are scanned in registration order; the first one with any
/// case-insensitive keyword substring hit wins. No scoring or ranking:
/// ambiguity between candidates is resolved by registry order alone.
pub fn match_flow(message: &str, registry: &FlowRegistry) -> Option<Arc<Flow>> {
    let message = message.to_lowercase();

    for flow in registry.iter() {
        let Trigger::Keyword { keywords } = &flow.trigger else {
            continue;
        };
        if let Some(keyword) = keywords.iter().find(|k| message.contains(&k.to_lowercase())) {
            debug!(flow_id = %flow.id, keyword = %keyword, "Flow matched");
            return Some(flow.clone());
        }
    }

    None
}
