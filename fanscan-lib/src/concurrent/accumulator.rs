//! Shared running total of per-item contributions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Thread-safe integer total, starting at zero. Clones share the total.
///
/// Each `add` is atomic; `get` is only meaningful once the caller knows every
/// `add` has finished (after `CompletionTracker::wait`).
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    total: Arc<AtomicU64>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, delta: u64) {
        self.total.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(Accumulator::new().get(), 0);
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let acc = Accumulator::new();
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let acc = acc.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        acc.add(1);
                    }
                    acc.add(0);
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(acc.get(), 8000);
    }
}
