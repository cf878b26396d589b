use std::sync::Arc;

use crate::context::SelectionContext;
use crate::error::SelectError;
use crate::registry::ServiceInstance;
use crate::rng::RandomSource;

use super::strategy::SelectionStrategy;

/// Uniform pick that ignores the context sequence.
pub struct RandomStrategy {
    rng: Arc<dyn RandomSource>,
}

impl RandomStrategy {
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self { rng }
    }
}

impl SelectionStrategy for RandomStrategy {
    fn select<'a>(
        &self,
        _ctx: &SelectionContext,
        candidates: &'a [ServiceInstance],
    ) -> Result<&'a ServiceInstance, SelectError> {
        if candidates.is_empty() {
            return Err(SelectError::EmptyCandidateSet);
        }
        let idx = (self.rng.next_seed() % candidates.len() as u64) as usize;
        Ok(&candidates[idx])
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
