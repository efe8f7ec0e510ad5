//! Reward Ingestion Bus - Bounded Drop-Oldest Sample Queue
//!
//! `TigerStyle`: Bounded capacity, explicit overflow policy, atomic drain.
//!
//! The bus bridges asynchronous reward producers (network connection tasks)
//! to the tick loop. `push` never stalls a producer: on overflow the
//! *oldest* queued sample is dropped, favoring freshness over completeness.
//! `drain_all` atomically removes every queued sample at tick start.
//!
//! A sample is applied no earlier than the tick following its enqueue;
//! there is no per-sample acknowledgment (fire-and-forget).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{BUS_CAPACITY_SAMPLES_DEFAULT, BUS_CAPACITY_SAMPLES_MAX};

/// One incoming reward payload: a sequence of floats matched to slots by
/// position when consumed. Length is unconstrained at arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardSample {
    /// Parsed reward values, one per slot position
    pub values: Vec<f32>,
}

impl RewardSample {
    /// Create a sample from parsed values.
    #[must_use]
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }
}

/// Thread-safe bounded FIFO of reward samples with drop-oldest overflow.
#[derive(Debug)]
pub struct RewardBus {
    queue: Mutex<VecDeque<RewardSample>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl RewardBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(BUS_CAPACITY_SAMPLES_DEFAULT)
    }

    /// Create a bus with the given capacity.
    ///
    /// # Panics
    /// Panics if `capacity` is zero or exceeds `BUS_CAPACITY_SAMPLES_MAX`.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        // Preconditions
        assert!(capacity > 0, "bus capacity must be positive");
        assert!(
            capacity <= BUS_CAPACITY_SAMPLES_MAX,
            "bus capacity exceeds max ({BUS_CAPACITY_SAMPLES_MAX})"
        );

        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue a sample, dropping the oldest queued sample on overflow.
    ///
    /// Safe under concurrent callers; never blocks beyond the internal
    /// mutex's short critical section.
    pub fn push(&self, sample: RewardSample) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.len() == self.capacity {
            queue.pop_front();
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(dropped_total = total, "bus overflow, dropped oldest sample");
        }
        queue.push_back(sample);

        // Postcondition
        debug_assert!(queue.len() <= self.capacity, "bus must stay bounded");
    }

    /// Atomically remove and return every currently queued sample.
    ///
    /// Returns an empty vector if nothing is pending; the tick proceeds
    /// regardless (decay happens with or without input).
    #[must_use]
    pub fn drain_all(&self) -> Vec<RewardSample> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.drain(..).collect()
    }

    /// Number of samples currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the bus is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total samples dropped to the overflow policy since construction.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for RewardBus {
    fn default() -> Self {
        Self::new()
    }
}
