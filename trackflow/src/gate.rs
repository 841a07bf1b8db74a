//! Per-stage bounded admission gates.
//!
//! Each stage's external service gets its own independently sized gate
//! reflecting that service's real backpressure limit. The gate is the
//! single synchronization point during batch execution: acquire blocks
//! until a slot frees, and the returned permit releases its slot exactly
//! once when dropped, on every exit path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A bounded admission gate capping concurrent in-flight calls to one
/// external service.
///
/// Gates are never shared across stages. In-flight and peak counters are
/// exposed so the limit is observable in tests rather than an implicit
/// side effect of the wait primitive.
#[derive(Debug)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    limit: usize,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl AdmissionGate {
    /// Creates a gate admitting at most `limit` concurrent operations.
    /// Limits below 1 are clamped to 1.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Blocks until a slot is free and returns the RAII permit for it.
    ///
    /// Dropping the permit releases the slot. The gate's semaphore is
    /// never closed, so acquisition cannot fail.
    pub async fn acquire(&self) -> AdmissionPermit {
        #[allow(clippy::expect_used)]
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("admission gate semaphore is never closed");

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        AdmissionPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Returns the configured admission limit.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of currently admitted operations.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Returns the highest concurrent admission observed.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Returns the number of free slots.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// RAII permit for one admitted operation.
///
/// The slot is released exactly once, when the permit drops.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_limit_clamped_to_one() {
        let gate = AdmissionGate::new(0);
        assert_eq!(gate.limit(), 1);
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let gate = AdmissionGate::new(2);
        assert_eq!(gate.available(), 2);

        let permit = gate.acquire().await;
        assert_eq!(gate.in_flight(), 1);
        assert_eq!(gate.available(), 1);

        drop(permit);
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn test_blocks_at_limit() {
        let gate = Arc::new(AdmissionGate::new(1));
        let _held = gate.acquire().await;

        let contender = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                let _permit = gate.acquire().await;
            })
        };

        // The second acquire cannot complete while the first permit is held.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(_held);
        contender.await.unwrap();
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_peak_tracks_high_water_mark() {
        let gate = AdmissionGate::new(3);

        let a = gate.acquire().await;
        let b = gate.acquire().await;
        drop(a);
        let c = gate.acquire().await;

        assert_eq!(gate.peak_in_flight(), 2);
        drop(b);
        drop(c);
        assert_eq!(gate.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_release_on_panic_path() {
        let gate = Arc::new(AdmissionGate::new(1));

        let gate_clone = Arc::clone(&gate);
        let task = tokio::spawn(async move {
            let _permit = gate_clone.acquire().await;
            panic!("guarded operation failed");
        });
        assert!(task.await.is_err());

        // The slot came back despite the panic.
        assert_eq!(gate.available(), 1);
        assert_eq!(gate.in_flight(), 0);
    }
}
