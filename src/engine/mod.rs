//! Simulation Engine - The Tick Loop
//!
//! `TigerStyle`: One writer, fixed phase order, no externally visible
//! intermediate state.
//!
//! # Phases
//!
//! Every tick runs the same cycle:
//!
//! ```text
//! Idle -> Draining -> Decaying -> Classifying -> Generating -> Evicting -> Publishing -> Idle
//! ```
//!
//! The engine is the sole writer of the [`MemoryStore`]; readers outside the
//! loop see either the snapshot from the previous completed tick or, after
//! Publishing, the new one, never a mix. The loop runs until an external
//! stop signal; after shutdown no further ticks occur.

mod generate;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::bus::{RewardBus, RewardSample};
use crate::config::EngineConfig;
use crate::snapshot::SnapshotPublisher;
use crate::store::MemoryStore;

pub use generate::{ActivationSource, NewActivation, RngActivationSource};

// =============================================================================
// Phase & Report Types
// =============================================================================

/// Phase of the tick cycle the engine is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickPhase {
    /// Between ticks
    Idle,
    /// Draining the reward bus
    Draining,
    /// Applying decay and reward blending
    Decaying,
    /// Redetermining tier membership
    Classifying,
    /// Producing the admission batch
    Generating,
    /// Selecting eviction slots and admitting
    Evicting,
    /// Handing state to the snapshot publisher
    Publishing,
}

/// Structured summary of one completed tick, consumed by the external audit
/// ledger alongside [`MemoryStore::last_admission`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,
    /// Samples drained from the bus this tick
    pub drained_samples: usize,
    /// Activations admitted this tick
    pub admissions: usize,
    /// Slot of the last admission this tick, if any
    pub last_admitted_slot: Option<usize>,
    /// Generation of the most recently completed publish
    pub published_generation: u64,
}

// =============================================================================
// Engine
// =============================================================================

/// Orchestrates the tick loop over store, bus, publisher, and source.
#[derive(Debug)]
pub struct Engine<S: ActivationSource> {
    store: MemoryStore,
    bus: Arc<RewardBus>,
    publisher: SnapshotPublisher,
    source: S,
    config: EngineConfig,
    tick: u64,
    phase: TickPhase,
}

impl<S: ActivationSource> Engine<S> {
    /// Create an engine over its collaborators.
    #[must_use]
    pub fn new(
        store: MemoryStore,
        bus: Arc<RewardBus>,
        publisher: SnapshotPublisher,
        source: S,
        config: EngineConfig,
    ) -> Self {
        // Precondition: the publisher must cover the store.
        assert_eq!(
            publisher.buffer().capacity(),
            store.capacity(),
            "publisher capacity must match store capacity"
        );

        Self {
            store,
            bus,
            publisher,
            source,
            config,
            tick: 0,
            phase: TickPhase::Idle,
        }
    }

    /// Read access to the store (tick domain only).
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Current phase of the tick cycle.
    #[must_use]
    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    /// Number of completed ticks.
    #[must_use]
    pub fn completed_ticks(&self) -> u64 {
        self.tick
    }

    /// Run one full tick.
    pub async fn tick(&mut self) -> TickReport {
        self.tick += 1;

        self.phase = TickPhase::Draining;
        let samples = self.bus.drain_all();
        let drained_samples = samples.len();
        let merged = merge_rewards(&samples, self.store.capacity());

        self.phase = TickPhase::Decaying;
        self.store.decay_and_update(&merged);

        self.phase = TickPhase::Classifying;
        self.store.classify_tiers();

        self.phase = TickPhase::Generating;
        let batch = self
            .source
            .next_batch(self.store.config().admit_per_tick, self.store.width());

        self.phase = TickPhase::Evicting;
        let mut admissions = 0;
        let mut last_admitted_slot = None;
        for activation in batch {
            let slot = self.store.select_eviction_slot();
            match self.store.admit(slot, activation.vector, activation.reward) {
                Ok(()) => {
                    admissions += 1;
                    last_admitted_slot = Some(slot);
                }
                Err(error) => debug!(%error, slot, "admission rejected"),
            }
        }

        self.phase = TickPhase::Publishing;
        let (salience, psi) = self.store.export_state();
        self.publisher.publish(salience, psi).await;

        self.phase = TickPhase::Idle;
        let report = TickReport {
            tick: self.tick,
            drained_samples,
            admissions,
            last_admitted_slot,
            published_generation: self.publisher.generation(),
        };
        trace!(
            tick = report.tick,
            drained = report.drained_samples,
            admissions = report.admissions,
            "tick complete"
        );
        report
    }

    /// Run ticks until the shutdown signal flips, then flush the publisher.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            capacity = self.store.capacity(),
            width = self.store.width(),
            tick_interval_ms = self.config.tick_interval_ms,
            "engine started"
        );

        while !*shutdown.borrow() {
            tokio::select! {
                _ = shutdown.changed() => break,
                () = tokio::time::sleep(Duration::from_millis(self.config.tick_interval_ms)) => {
                    let _ = self.tick().await;
                }
            }
        }

        self.publisher.flush().await;
        info!(ticks = self.tick, "engine stopped");
    }
}

/// Merge drained samples into a single per-slot reward vector.
///
/// Samples cover slot positions as a prefix (`values[i]` is for slot `i`);
/// each covered position receives the arithmetic mean of the samples that
/// cover it. The result is truncated to `capacity`. Empty input yields an
/// empty vector (no reward anywhere; decay still applies).
#[must_use]
#[allow(clippy::cast_precision_loss)]
fn merge_rewards(samples: &[RewardSample], capacity: usize) -> Vec<f32> {
    let longest = samples
        .iter()
        .map(|s| s.values.len())
        .max()
        .unwrap_or(0)
        .min(capacity);
    if longest == 0 {
        return Vec::new();
    }

    let mut sums = vec![0.0f32; longest];
    let mut counts = vec![0u32; longest];
    for sample in samples {
        for (i, &value) in sample.values.iter().take(longest).enumerate() {
            sums[i] += value;
            counts[i] += 1;
        }
    }

    sums.iter()
        .zip(&counts)
        .map(|(&sum, &count)| if count == 0 { 0.0 } else { sum / count as f32 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    fn sample(values: &[f32]) -> RewardSample {
        RewardSample::new(values.to_vec())
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_rewards(&[], 8).is_empty());
    }

    #[test]
    fn test_merge_single_sample_passthrough() {
        let merged = merge_rewards(&[sample(&[1.0, 2.0])], 8);
        assert_eq!(merged, vec![1.0, 2.0]);
    }

    #[test]
    fn test_merge_means_overlapping_positions() {
        let merged = merge_rewards(&[sample(&[1.0, 4.0]), sample(&[3.0])], 8);
        // Position 0 covered by both (mean 2.0), position 1 by one sample.
        assert_eq!(merged, vec![2.0, 4.0]);
    }

    #[test]
    fn test_merge_truncates_to_capacity() {
        let merged = merge_rewards(&[sample(&[1.0, 2.0, 3.0, 4.0])], 2);
        assert_eq!(merged, vec![1.0, 2.0]);
    }

    fn test_engine(admit_per_tick: usize) -> Engine<RngActivationSource> {
        let config = StoreConfig::default()
            .with_capacity(4)
            .with_width(2)
            .with_tiers(1, 1)
            .with_decay(0.9)
            .with_reward_alpha(0.5)
            .with_admit_per_tick(admit_per_tick);
        let store = MemoryStore::new(config).unwrap();
        let publisher = SnapshotPublisher::new(store.capacity());
        Engine::new(
            store,
            Arc::new(RewardBus::new()),
            publisher,
            RngActivationSource::new(42),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_tick_without_input_still_publishes() {
        let mut engine = test_engine(0);
        let report = engine.tick().await;

        assert_eq!(report.tick, 1);
        assert_eq!(report.drained_samples, 0);
        assert_eq!(report.admissions, 0);
        assert!(report.last_admitted_slot.is_none());
    }

    #[tokio::test]
    async fn test_tick_admits_batch() {
        let mut engine = test_engine(2);
        let report = engine.tick().await;

        assert_eq!(report.admissions, 2);
        assert!(report.last_admitted_slot.is_some());
        assert!(engine.store().last_admission().is_some());
    }

    #[tokio::test]
    async fn test_phase_returns_to_idle() {
        let mut engine = test_engine(1);
        let _ = engine.tick().await;
        assert_eq!(engine.phase(), TickPhase::Idle);
    }

    #[tokio::test]
    async fn test_run_stops_on_signal() {
        let mut engine = test_engine(1);
        let (tx, rx) = watch::channel(false);

        let run = async {
            engine.run(rx).await;
            engine.completed_ticks()
        };
        let stopper = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = tx.send(true);
        };

        let (ticks, ()) = tokio::join!(run, stopper);
        assert!(ticks > 0, "engine should have ticked before shutdown");
    }
}
