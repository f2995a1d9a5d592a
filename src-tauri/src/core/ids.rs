//! Identifier Generator
//!
//! Issues numeric identifiers of the form `timestamp_ms * 1000 + jitter` that are
//! strictly increasing within the process.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use super::Id;

/// Monotonic identifier source.
///
/// Each candidate combines the wall clock in milliseconds with a random
/// `0..=999` suffix. When the candidate does not exceed the last issued value
/// (clock went backwards, or two calls in the same millisecond drew a lower
/// suffix), `last + 1` is issued instead.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Returns the next identifier.
    pub fn next_id(&self) -> Id {
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = Self::candidate();
            let next = if candidate > last { candidate } else { last + 1 };
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    /// Last identifier handed out, `0` before the first call
    pub fn last_issued(&self) -> Id {
        self.last.load(Ordering::Relaxed)
    }

    fn candidate() -> Id {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let jitter: u64 = rand::thread_rng().gen_range(0..1000);
        millis.saturating_mul(1000).saturating_add(jitter)
    }
}

static GLOBAL: IdGenerator = IdGenerator::new();

/// Issues an identifier from the process-wide generator.
pub fn random_id() -> Id {
    GLOBAL.next_id()
}
