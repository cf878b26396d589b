use std::sync::atomic::{AtomicUsize, Ordering};

use crate::context::SelectionContext;
use crate::error::SelectError;
use crate::registry::ServiceInstance;

use super::strategy::SelectionStrategy;

/// Round-robin over the candidate set, ignoring the context sequence.
pub struct RoundRobinStrategy {
    counter: AtomicUsize,
}

impl RoundRobinStrategy {
    pub fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
        }
    }
}

impl Default for RoundRobinStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStrategy for RoundRobinStrategy {
    fn select<'a>(
        &self,
        _ctx: &SelectionContext,
        candidates: &'a [ServiceInstance],
    ) -> Result<&'a ServiceInstance, SelectError> {
        if candidates.is_empty() {
            return Err(SelectError::EmptyCandidateSet);
        }

        let index = self.counter.fetch_add(1, Ordering::Relaxed) % candidates.len();
        Ok(&candidates[index])
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }

    fn debug_snapshot(&self) -> Option<String> {
        Some(format!("next={}", self.counter.load(Ordering::Relaxed)))
    }
}
