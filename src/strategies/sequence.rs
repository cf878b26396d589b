//! Sequence-driven selection: the default load-balancing hook.
//!
//! The chosen index is `|seq| mod len`. Calls that share a sequence value
//! always resolve to the same instance for a given candidate set. A context
//! without a sequence falls back to a seed from the injected random source.

use std::sync::Arc;

use crate::context::SelectionContext;
use crate::error::SelectError;
use crate::registry::ServiceInstance;
use crate::rng::RandomSource;

use super::strategy::SelectionStrategy;

pub struct SequenceStrategy {
    rng: Arc<dyn RandomSource>,
}

impl SequenceStrategy {
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self { rng }
    }
}

/// Maps a signed seed onto `0..len`. `len` must be non-zero.
pub fn index_for(seq: i64, len: usize) -> usize {
    (seq.unsigned_abs() % len as u64) as usize
}

impl SelectionStrategy for SequenceStrategy {
    fn select<'a>(
        &self,
        ctx: &SelectionContext,
        candidates: &'a [ServiceInstance],
    ) -> Result<&'a ServiceInstance, SelectError> {
        let seq = match ctx.seq() {
            Some(seq) => seq,
            None => self.rng.next_seed() as i64,
        };

        if candidates.is_empty() {
            return Err(SelectError::EmptyCandidateSet);
        }

        let instance = &candidates[index_for(seq, candidates.len())];
        tracing::debug!(seq, address = %instance.address, "selected instance");
        Ok(instance)
    }

    fn name(&self) -> &'static str {
        "sequence"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::TimeSeededRandom;

    fn candidates(names: &[&str]) -> Vec<ServiceInstance> {
        names
            .iter()
            .map(|n| ServiceInstance::new("TestService", "v1.0", n))
            .collect()
    }

    fn strategy() -> SequenceStrategy {
        SequenceStrategy::new(Arc::new(TimeSeededRandom::new()))
    }

    #[test]
    fn picks_seq_mod_len() {
        let set = candidates(&["A", "B", "C"]);
        let picked = strategy().select(&SelectionContext::with_seq(5), &set).unwrap();
        assert_eq!(picked.address, "C");
    }

    #[test]
    fn single_candidate_without_seq() {
        let set = candidates(&["A"]);
        let strategy = strategy();
        for _ in 0..100 {
            let picked = strategy.select(&SelectionContext::random(), &set).unwrap();
            assert_eq!(picked.address, "A");
        }
    }

    #[test]
    fn empty_set_is_an_error() {
        let strategy = strategy();
        assert_eq!(
            strategy.select(&SelectionContext::with_seq(7), &[]),
            Err(SelectError::EmptyCandidateSet)
        );
        assert_eq!(
            strategy.select(&SelectionContext::random(), &[]),
            Err(SelectError::EmptyCandidateSet)
        );
    }

    #[test]
    fn non_integer_seq_never_reaches_selection() {
        let err = SelectionContext::from_raw("not-an-int").unwrap_err();
        assert!(matches!(err, SelectError::InvalidContext(_)));
    }

    #[test]
    fn negative_seq_uses_absolute_value() {
        let set = candidates(&["A", "B", "C", "D"]);
        let picked = strategy().select(&SelectionContext::with_seq(-2), &set).unwrap();
        assert_eq!(picked.address, "C");
    }

    #[test]
    fn extreme_seqs_stay_in_bounds() {
        let set = candidates(&["A", "B", "C"]);
        let strategy = strategy();
        for seq in [i64::MIN, i64::MIN + 1, -1, 0, 1, i64::MAX] {
            let picked = strategy.select(&SelectionContext::with_seq(seq), &set).unwrap();
            let expected = &set[(seq.unsigned_abs() % 3) as usize];
            assert_eq!(picked, expected);
        }
    }

    #[test]
    fn index_matches_abs_mod_for_all_small_inputs() {
        let strategy = strategy();
        for len in 1..=7usize {
            let names: Vec<String> = (0..len).map(|i| format!("node-{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let set = candidates(&refs);
            for seq in -50i64..=50 {
                let picked = strategy.select(&SelectionContext::with_seq(seq), &set).unwrap();
                assert_eq!(picked, &set[seq.unsigned_abs() as usize % len]);
            }
        }
    }

    #[test]
    fn deterministic_under_concurrency() {
        let set = Arc::new(candidates(&["A", "B", "C", "D", "E"]));
        let strategy = Arc::new(strategy());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let set = Arc::clone(&set);
                let strategy = Arc::clone(&strategy);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        // Interleave random picks with sequenced ones.
                        let _ = strategy.select(&SelectionContext::random(), &set);
                        let seq = (t * 1000 + i) as i64;
                        let picked = strategy.select(&SelectionContext::with_seq(seq), &set).unwrap();
                        assert_eq!(picked.address, set[seq as usize % 5].address);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
    }

    struct FixedSeed(u64);

    impl RandomSource for FixedSeed {
        fn next_seed(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn missing_seq_uses_injected_seed() {
        let set = candidates(&["A", "B", "C"]);
        let strategy = SequenceStrategy::new(Arc::new(FixedSeed(7)));
        let picked = strategy.select(&SelectionContext::random(), &set).unwrap();
        assert_eq!(picked.address, "B");

        // An explicit sequence wins over the injected seed.
        let picked = strategy.select(&SelectionContext::with_seq(3), &set).unwrap();
        assert_eq!(picked.address, "A");
    }

    #[test]
    fn random_picks_stay_in_bounds() {
        let set = candidates(&["A", "B", "C"]);
        let strategy = strategy();
        for _ in 0..1000 {
            let picked = strategy.select(&SelectionContext::random(), &set).unwrap();
            assert!(set.contains(picked));
        }
    }
}
