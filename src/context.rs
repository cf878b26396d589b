//! Per-call selection context and the caller-owned call counter.

use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::Value;

use crate::error::SelectError;

/// Per-call metadata that steers instance selection.
///
/// A context without a sequence asks the strategy for a pseudo-random pick.
/// Related calls (e.g. retries of one logical request) share a sequence and
/// therefore land on the same instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionContext {
    seq: Option<i64>,
}

impl SelectionContext {
    pub fn with_seq(seq: i64) -> Self {
        Self { seq: Some(seq) }
    }

    pub fn random() -> Self {
        Self { seq: None }
    }

    /// Parses a sequence value carried as text, e.g. in request metadata.
    pub fn from_raw(raw: &str) -> Result<Self, SelectError> {
        raw.trim()
            .parse::<i64>()
            .map(Self::with_seq)
            .map_err(|_| SelectError::InvalidContext(raw.to_string()))
    }

    pub fn seq(&self) -> Option<i64> {
        self.seq
    }
}

impl TryFrom<&Value> for SelectionContext {
    type Error = SelectError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Self::random()),
            Value::Number(n) => n
                .as_i64()
                .map(Self::with_seq)
                .ok_or_else(|| SelectError::InvalidContext(n.to_string())),
            other => Err(SelectError::InvalidContext(other.to_string())),
        }
    }
}

/// Monotonic call counter owned by the component issuing calls.
#[derive(Debug, Default)]
pub struct CallSequence {
    counter: AtomicI64,
}

impl CallSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter whose next call returns `value + 1`.
    pub fn starting_at(value: i64) -> Self {
        Self {
            counter: AtomicI64::new(value),
        }
    }

    /// Increments the counter and returns the new value; the first call yields 1.
    pub fn next(&self) -> i64 {
        self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Fresh context carrying the next sequence value.
    pub fn next_context(&self) -> SelectionContext {
        SelectionContext::with_seq(self.next())
    }

    pub fn current(&self) -> i64 {
        self.counter.load(Ordering::Relaxed)
    }
}
