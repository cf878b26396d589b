pub mod random;
pub mod round_robin;
pub mod sequence;
pub mod strategy;

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::rng::RandomSource;

pub use random::RandomStrategy;
pub use round_robin::RoundRobinStrategy;
pub use sequence::SequenceStrategy;
pub use strategy::SelectionStrategy;

/// Strategy names accepted in the `client.strategy` config key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Sequence,
    Random,
    RoundRobin,
}

impl StrategyKind {
    pub fn build(self, rng: Arc<dyn RandomSource>) -> Arc<dyn SelectionStrategy> {
        match self {
            StrategyKind::Sequence => Arc::new(SequenceStrategy::new(rng)),
            StrategyKind::Random => Arc::new(RandomStrategy::new(rng)),
            StrategyKind::RoundRobin => Arc::new(RoundRobinStrategy::new()),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequence" => Ok(StrategyKind::Sequence),
            "random" => Ok(StrategyKind::Random),
            "round_robin" => Ok(StrategyKind::RoundRobin),
            other => Err(format!("unknown strategy {other:?}")),
        }
    }
}
