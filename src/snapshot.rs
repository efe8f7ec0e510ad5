//! Snapshot Publishing - Double-Buffered Salience/Psi Export
//!
//! `TigerStyle`: Exactly two buffers, monotonic generation, the tick never
//! waits on the consumer.
//!
//! # Protocol
//!
//! The publisher copies the store's `{salience, psi}` state into the buffer
//! *not* currently exposed to the consumer, stamps it with the next
//! generation, then atomically swaps which buffer is current. The copy runs
//! on its own spawned task; the tick loop issues a publish and moves on,
//! awaiting only the completion of its *own previous write* before starting
//! the next one. The loop therefore runs ahead by at most one outstanding
//! publish and never overwrites a buffer still exposed as current.
//!
//! A consumer polls [`SnapshotBuffer::generation`] and calls
//! [`SnapshotBuffer::read`] for a complete, never partially written copy.
//! Observed generations are strictly increasing; no consumer ever sees a
//! lower generation after a higher one.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::constants::SNAPSHOT_BUFFERS_COUNT;

/// A generation-stamped, read-only copy of the store's salience/psi state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Per-slot salience values
    pub salience: Vec<f32>,
    /// Per-slot psi values
    pub psi: Vec<f32>,
    /// Monotonic publish counter; strictly increases across publishes
    pub generation: u64,
}

#[derive(Debug)]
struct Frame {
    salience: Vec<f32>,
    psi: Vec<f32>,
    generation: u64,
}

impl Frame {
    fn zeroed(capacity: usize) -> Self {
        Self {
            salience: vec![0.0; capacity],
            psi: vec![0.0; capacity],
            generation: 0,
        }
    }
}

/// The double buffer shared between the publisher and consumers.
///
/// Consumers hold an `Arc<SnapshotBuffer>` and treat every [`Snapshot`] as
/// read-only. Generation 0 is the pre-publish zeroed state.
#[derive(Debug)]
pub struct SnapshotBuffer {
    frames: [Mutex<Frame>; SNAPSHOT_BUFFERS_COUNT],
    current: AtomicUsize,
    generation: AtomicU64,
    capacity: usize,
}

impl SnapshotBuffer {
    fn new(capacity: usize) -> Self {
        // Precondition
        assert!(capacity > 0, "snapshot capacity must be positive");

        Self {
            frames: [
                Mutex::new(Frame::zeroed(capacity)),
                Mutex::new(Frame::zeroed(capacity)),
            ],
            current: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
            capacity,
        }
    }

    /// Number of slots covered by each snapshot.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Generation of the most recently completed publish.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Copy out the current snapshot.
    ///
    /// Always returns a fully-formed generation: the frame's data and its
    /// generation stamp are written together under the frame lock, and the
    /// current-buffer index only advances to frames whose write completed.
    #[must_use]
    pub fn read(&self) -> Snapshot {
        let index = self.current.load(Ordering::SeqCst);
        let frame = self.frames[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Snapshot {
            salience: frame.salience.clone(),
            psi: frame.psi.clone(),
            generation: frame.generation,
        }
    }

    /// Write into the non-current frame, then swap it in and advance the
    /// generation. Called only from the publisher's copy task.
    fn write(&self, salience: &[f32], psi: &[f32]) {
        // Preconditions
        assert_eq!(salience.len(), self.capacity, "salience length mismatch");
        assert_eq!(psi.len(), self.capacity, "psi length mismatch");

        let back = 1 - self.current.load(Ordering::SeqCst);
        let next_generation = self.generation.load(Ordering::SeqCst) + 1;
        {
            let mut frame = self.frames[back]
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            frame.salience.copy_from_slice(salience);
            frame.psi.copy_from_slice(psi);
            frame.generation = next_generation;
        }
        self.current.store(back, Ordering::SeqCst);
        self.generation.store(next_generation, Ordering::SeqCst);
    }
}

/// Publishes store state into the double buffer without blocking the tick.
///
/// One copy task is in flight at most; [`publish`](Self::publish) awaits the
/// previous task (a bounded O(capacity) copy), never the external consumer.
#[derive(Debug)]
pub struct SnapshotPublisher {
    buffer: Arc<SnapshotBuffer>,
    inflight: Option<JoinHandle<()>>,
}

impl SnapshotPublisher {
    /// Create a publisher with a fresh double buffer for `capacity` slots.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(SnapshotBuffer::new(capacity)),
            inflight: None,
        }
    }

    /// Handle for consumers; they poll `generation()` and `read()` on it.
    #[must_use]
    pub fn buffer(&self) -> Arc<SnapshotBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Generation of the most recently completed publish.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.buffer.generation()
    }

    /// Publish the given state asynchronously.
    ///
    /// Awaits completion of the previous publish write (if any), then spawns
    /// the copy for this one and returns without waiting for it. A failed
    /// previous task is logged and skipped; publishing is best-effort and
    /// never fails the tick.
    pub async fn publish(&mut self, salience: Vec<f32>, psi: Vec<f32>) {
        if let Some(handle) = self.inflight.take() {
            if let Err(error) = handle.await {
                warn!(%error, "previous snapshot publish task failed");
            }
        }

        let buffer = Arc::clone(&self.buffer);
        self.inflight = Some(tokio::spawn(async move {
            buffer.write(&salience, &psi);
        }));
    }

    /// Await the outstanding publish, if any. Called at shutdown so the
    /// final generation is visible before resources are released.
    pub async fn flush(&mut self) {
        if let Some(handle) = self.inflight.take() {
            if let Err(error) = handle.await {
                warn!(%error, "snapshot publish task failed during flush");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_generation_zero() {
        let buffer = SnapshotBuffer::new(4);
        let snapshot = buffer.read();
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.salience, vec![0.0; 4]);
        assert_eq!(snapshot.psi, vec![0.0; 4]);
    }

    #[test]
    fn test_write_advances_generation_and_swaps() {
        let buffer = SnapshotBuffer::new(2);

        buffer.write(&[1.0, 2.0], &[0.1, 0.2]);
        let first = buffer.read();
        assert_eq!(first.generation, 1);
        assert_eq!(first.salience, vec![1.0, 2.0]);

        buffer.write(&[3.0, 4.0], &[0.3, 0.4]);
        let second = buffer.read();
        assert_eq!(second.generation, 2);
        assert_eq!(second.salience, vec![3.0, 4.0]);
        assert_eq!(second.psi, vec![0.3, 0.4]);
    }

    #[test]
    fn test_generation_strictly_increasing() {
        let buffer = SnapshotBuffer::new(1);
        let mut last = buffer.generation();
        for i in 0..10 {
            #[allow(clippy::cast_precision_loss)]
            buffer.write(&[i as f32], &[0.0]);
            let now = buffer.generation();
            assert!(now > last, "generation must strictly increase");
            last = now;
        }
    }

    #[test]
    #[should_panic(expected = "salience length mismatch")]
    fn test_write_length_mismatch() {
        let buffer = SnapshotBuffer::new(2);
        buffer.write(&[1.0], &[1.0, 2.0]);
    }

    #[tokio::test]
    async fn test_publisher_round_trip() {
        let mut publisher = SnapshotPublisher::new(3);
        let consumer = publisher.buffer();

        publisher.publish(vec![1.0, 2.0, 3.0], vec![0.0, 0.5, 1.0]).await;
        publisher.flush().await;

        let snapshot = consumer.read();
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.salience, vec![1.0, 2.0, 3.0]);
        assert_eq!(snapshot.psi, vec![0.0, 0.5, 1.0]);
    }

    #[tokio::test]
    async fn test_publisher_runs_ahead_by_at_most_one() {
        let mut publisher = SnapshotPublisher::new(1);

        // Issue several publishes back to back; each awaits only the
        // previous write, so all complete and generations stay ordered.
        for i in 1..=5u64 {
            #[allow(clippy::cast_precision_loss)]
            publisher.publish(vec![i as f32], vec![0.0]).await;
        }
        publisher.flush().await;

        assert_eq!(publisher.generation(), 5);
        let snapshot = publisher.buffer().read();
        assert_eq!(snapshot.salience, vec![5.0]);
    }

    #[tokio::test]
    async fn test_consumer_never_sees_lower_generation() {
        let mut publisher = SnapshotPublisher::new(2);
        let consumer = publisher.buffer();

        let mut last = 0;
        for i in 1..=20u64 {
            #[allow(clippy::cast_precision_loss)]
            publisher.publish(vec![i as f32; 2], vec![0.0; 2]).await;
            let observed = consumer.read().generation;
            assert!(observed >= last, "generation went backwards");
            last = observed;
        }
        publisher.flush().await;
        assert_eq!(consumer.read().generation, 20);
    }
}
