use crate::context::SelectionContext;
use crate::error::SelectError;
use crate::registry::ServiceInstance;

/// Hook the client calls once per RPC to pick the instance to dial.
pub trait SelectionStrategy: Send + Sync {
    fn select<'a>(
        &self,
        ctx: &SelectionContext,
        candidates: &'a [ServiceInstance],
    ) -> Result<&'a ServiceInstance, SelectError>;

    fn name(&self) -> &'static str;

    // Optional debug info to be logged per call
    fn debug_snapshot(&self) -> Option<String> {
        None
    }
}
