//! Admission gate: a fixed-size pool of permits that bounds in-flight work.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting permit pool of fixed capacity.
///
/// The pool is opened when the gate is created and is never closed; when the
/// run ends the gate is simply dropped. Cloning shares the same pool.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One unit of the gate's capacity. Released on drop.
#[derive(Debug)]
pub struct Permit {
    _inner: OwnedSemaphorePermit,
}

impl Permit {
    /// Return this permit to the pool.
    pub fn release(self) {}
}

impl AdmissionGate {
    /// Create a gate admitting at most `capacity` holders at a time.
    ///
    /// A capacity of zero would never admit anything, so it is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait until fewer than `capacity` permits are held, then take one.
    pub async fn acquire(&self) -> Permit {
        match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => Permit { _inner: permit },
            // The semaphore is private to the gate and close() is never called on it.
            Err(_) => unreachable!("admission gate semaphore closed"),
        }
    }

    /// Take a permit only if one is free right now.
    pub fn try_acquire(&self) -> Option<Permit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| Permit { _inner: permit })
    }

    /// Fixed capacity of the pool.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently held.
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let gate = AdmissionGate::new(0);
        assert_eq!(gate.capacity(), 1);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_acquire_and_release_track_usage() {
        let gate = AdmissionGate::new(2);
        let a = gate.acquire().await;
        let b = gate.acquire().await;
        assert_eq!(gate.in_use(), 2);
        assert!(gate.try_acquire().is_none());

        a.release();
        assert_eq!(gate.in_use(), 1);
        drop(b);
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn test_acquire_blocks_until_release() {
        let gate = AdmissionGate::new(1);
        let held = gate.acquire().await;

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move {
                let _permit = gate.acquire().await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        held.release();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter admitted after release")
            .unwrap();
        assert_eq!(gate.available(), 1);
    }
}
