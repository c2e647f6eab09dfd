use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::{CallerId, CapabilityReply};

/// Capability — a named external operation the interpreter invokes on
/// behalf of a flow step.
///
/// Providers own all domain logic (client lookup, scheduling, and so on).
/// The interpreter only depends on the name, the argument bag, and the
/// `success` flag of the reply. Expected failures are replies with
/// `success: false`; an `Err` return is an infrastructure failure and
/// aborts the run at the step boundary.
pub trait Capability: Send + Sync + 'static {
    /// Operation name (referenced by flow steps).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Invoke the capability with resolved arguments and the caller identity.
    fn invoke(
        &self,
        args: serde_json::Value,
        caller: CallerId,
    ) -> BoxFuture<'_, Result<CapabilityReply>>;

    /// Timeout in seconds for this capability.
    fn timeout_secs(&self) -> u64 {
        30
    }
}
