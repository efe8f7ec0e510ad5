//! Memory Store - Fixed-Capacity Tiered-Priority Activation Store
//!
//! `TigerStyle`: Bounded capacity, deterministic tie-breaking, single writer.
//!
//! # Design
//!
//! The store owns a dense array of `capacity` slots, each holding a
//! fixed-width activation vector, a decaying salience score, and a smoothed
//! reward signal (psi). Every tick the caller:
//!
//! 1. applies decay and blends the merged reward vector
//!    ([`decay_and_update`](MemoryStore::decay_and_update)),
//! 2. redetermines tier membership from salience rank
//!    ([`classify_tiers`](MemoryStore::classify_tiers)),
//! 3. admits new activations into evicted slots
//!    ([`select_eviction_slot`](MemoryStore::select_eviction_slot) +
//!    [`admit`](MemoryStore::admit)).
//!
//! Slots are allocated once at construction and never reallocated; the store
//! is the sole writer and requires no internal locking.
//!
//! Reward is applied by slot *position*: a slot evicted between a sample's
//! enqueue and its drain receives the reward intended for its predecessor.
//! This is the documented behavior (samples carry no identity to follow).

mod slot;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{ConfigError, StoreConfig};

pub use slot::{AdmissionRecord, Slot, Tier};

/// Tier scan order for eviction: Cold first, Hot only as a last resort.
pub const EVICTION_TIER_PREFERENCE: [Tier; 3] = [Tier::Cold, Tier::Warm, Tier::Hot];

// =============================================================================
// Error Types
// =============================================================================

/// Errors from store operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Admitted vector width does not match the store width
    #[error("vector width mismatch: expected {expected}, got {actual}")]
    Shape {
        /// Configured vector width (D)
        expected: usize,
        /// Width of the rejected vector
        actual: usize,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Statistics
// =============================================================================

/// Point-in-time statistics over the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of slots
    pub capacity: usize,
    /// Activation vector width
    pub width: usize,
    /// Slots currently labeled Hot
    pub hot_count: usize,
    /// Slots currently labeled Warm
    pub warm_count: usize,
    /// Slots currently labeled Cold
    pub cold_count: usize,
    /// Mean salience across all slots
    pub salience_mean: f32,
    /// Mean psi across all slots
    pub psi_mean: f32,
}

// =============================================================================
// Memory Store
// =============================================================================

/// Fixed-capacity tiered-priority store of activation vectors.
///
/// `TigerStyle`:
/// - Capacity and width fixed at construction
/// - Tier membership fully redetermined every tick
/// - All tie-breaks deterministic (salience, then slot index)
#[derive(Debug)]
pub struct MemoryStore {
    config: StoreConfig,
    slots: Vec<Slot>,
    last_admission: Option<AdmissionRecord>,
}

impl MemoryStore {
    /// Create a store with all slots zeroed.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the configuration is invalid (zero
    /// capacity or width, tier budget exceeding capacity, decay or alpha out
    /// of range).
    pub fn new(config: StoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let slots = (0..config.capacity)
            .map(|index| Slot::zeroed(index, config.width))
            .collect();

        Ok(Self {
            config,
            slots,
            last_admission: None,
        })
    }

    /// Number of slots (N).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Activation vector width (D).
    #[must_use]
    pub fn width(&self) -> usize {
        self.config.width
    }

    /// The store's configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Read access to a slot.
    ///
    /// # Panics
    /// Panics if `index >= capacity`.
    #[must_use]
    pub fn slot(&self, index: usize) -> &Slot {
        // Precondition
        assert!(
            index < self.slots.len(),
            "slot index {} out of bounds (capacity {})",
            index,
            self.slots.len()
        );
        &self.slots[index]
    }

    /// Iterate over all slots in positional order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// Apply per-tick decay and blend the merged reward vector.
    ///
    /// For every slot `i`, salience is decayed by the configured rate. If
    /// `reward` covers position `i` (`reward.len() > i`), psi is blended via
    /// `psi = (1 - alpha) * psi + alpha * reward[i]` and salience is boosted
    /// by `alpha * |reward[i]|`. Positions not covered receive no reward but
    /// still decay; psi holds its last blended value until the next covering
    /// sample. Reward entries beyond `capacity` are ignored.
    pub fn decay_and_update(&mut self, reward: &[f32]) {
        let alpha = self.config.reward_alpha;
        let decay = self.config.decay;

        for slot in &mut self.slots {
            slot.salience *= decay;
            if let Some(&r) = reward.get(slot.index) {
                slot.psi = (1.0 - alpha) * slot.psi + alpha * r;
                slot.salience += alpha * r.abs();
            }
        }
    }

    /// Redetermine tier membership from salience rank.
    ///
    /// The top `hot_count` slots by salience are Hot, the next `warm_count`
    /// are Warm, everything else is Cold. Ties break by slot index (lowest
    /// first), so classification is a total order and fully deterministic.
    ///
    /// Must be re-run every tick before eviction; admission leaves tier
    /// labels stale.
    pub fn classify_tiers(&mut self) {
        let mut order: Vec<usize> = (0..self.slots.len()).collect();
        order.sort_by(|&a, &b| {
            self.slots[b]
                .salience
                .partial_cmp(&self.slots[a].salience)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.cmp(&b))
        });

        let hot = self.config.hot_count;
        let warm = self.config.warm_count;
        for (rank, &index) in order.iter().enumerate() {
            self.slots[index].tier = if rank < hot {
                Tier::Hot
            } else if rank < hot + warm {
                Tier::Warm
            } else {
                Tier::Cold
            };
        }

        // Postconditions: tier counts follow the configured budgets exactly.
        let n = self.slots.len();
        debug_assert_eq!(self.tier_count(Tier::Hot), hot.min(n));
        debug_assert_eq!(self.tier_count(Tier::Warm), warm.min(n - hot.min(n)));
    }

    /// Select the slot to evict next.
    ///
    /// Scans tiers in [`EVICTION_TIER_PREFERENCE`] order and returns the
    /// minimum-salience slot of the first non-empty tier (ties break by
    /// lowest index). A Hot slot is only reachable when Cold and Warm are
    /// both empty, which requires `hot_count >= capacity`.
    ///
    /// Deliberate divergence from an unconditional "evict slot 0" rule for
    /// the no-Cold/no-Warm case: an all-Hot store still evicts its
    /// minimum-salience slot, so the choice stays salience-driven even in
    /// the degenerate configuration. The slot-0 fallback applies only when
    /// no slot carries any tier label, which is unreachable for a validated
    /// configuration (every slot is labeled at construction and by every
    /// classification pass); it is logged if it ever fires.
    #[must_use]
    pub fn select_eviction_slot(&self) -> usize {
        for tier in EVICTION_TIER_PREFERENCE {
            let candidate = self
                .slots
                .iter()
                .filter(|s| s.tier == tier)
                .min_by(|a, b| {
                    a.salience
                        .partial_cmp(&b.salience)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.index.cmp(&b.index))
                });
            if let Some(slot) = candidate {
                return slot.index;
            }
        }

        warn!("no eviction candidate in any tier, falling back to slot 0");
        0
    }

    /// Overwrite a slot with a new activation vector and salience.
    ///
    /// Psi is reset to zero (a new vector has no reward history). The tier
    /// label is left stale until the next [`classify_tiers`](Self::classify_tiers).
    ///
    /// # Errors
    /// Returns [`StoreError::Shape`] if `vector.len() != width`; the store
    /// is unchanged.
    ///
    /// # Panics
    /// Panics if `slot_index >= capacity`.
    pub fn admit(
        &mut self,
        slot_index: usize,
        vector: Vec<f32>,
        initial_salience: f32,
    ) -> StoreResult<()> {
        // Precondition
        assert!(
            slot_index < self.slots.len(),
            "slot index {} out of bounds (capacity {})",
            slot_index,
            self.slots.len()
        );

        if vector.len() != self.config.width {
            return Err(StoreError::Shape {
                expected: self.config.width,
                actual: vector.len(),
            });
        }

        let slot = &mut self.slots[slot_index];
        slot.vector = vector;
        slot.salience = initial_salience;
        slot.psi = 0.0;

        self.last_admission = Some(AdmissionRecord {
            slot: slot_index,
            vector: slot.vector.clone(),
            salience: initial_salience,
        });

        Ok(())
    }

    /// The most recent admission, for the external audit ledger.
    #[must_use]
    pub fn last_admission(&self) -> Option<&AdmissionRecord> {
        self.last_admission.as_ref()
    }

    /// Copy out the per-slot salience and psi arrays for publishing.
    #[must_use]
    pub fn export_state(&self) -> (Vec<f32>, Vec<f32>) {
        let salience = self.slots.iter().map(|s| s.salience).collect();
        let psi = self.slots.iter().map(|s| s.psi).collect();
        (salience, psi)
    }

    /// Number of slots currently labeled with the given tier.
    #[must_use]
    pub fn tier_count(&self, tier: Tier) -> usize {
        self.slots.iter().filter(|s| s.tier == tier).count()
    }

    /// Point-in-time statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> StoreStats {
        let n = self.slots.len() as f32;
        StoreStats {
            capacity: self.config.capacity,
            width: self.config.width,
            hot_count: self.tier_count(Tier::Hot),
            warm_count: self.tier_count(Tier::Warm),
            cold_count: self.tier_count(Tier::Cold),
            salience_mean: self.slots.iter().map(|s| s.salience).sum::<f32>() / n,
            psi_mean: self.slots.iter().map(|s| s.psi).sum::<f32>() / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dst::DeterministicRng;

    fn small_store() -> MemoryStore {
        let config = StoreConfig::default()
            .with_capacity(4)
            .with_width(2)
            .with_tiers(1, 1)
            .with_decay(0.9)
            .with_reward_alpha(0.5);
        MemoryStore::new(config).unwrap()
    }

    #[test]
    fn test_construction_zeroed() {
        let store = small_store();
        assert_eq!(store.capacity(), 4);
        assert_eq!(store.width(), 2);
        for slot in store.slots() {
            assert_eq!(slot.salience(), 0.0);
            assert_eq!(slot.psi(), 0.0);
        }
    }

    #[test]
    fn test_construction_rejects_invalid_config() {
        let config = StoreConfig::default().with_capacity(2).with_tiers(2, 1);
        assert!(matches!(
            MemoryStore::new(config),
            Err(ConfigError::TierBudgetExceeded { .. })
        ));
    }

    #[test]
    fn test_decay_without_reward_ages_salience() {
        let mut store = small_store();
        store.admit(1, vec![1.0, 2.0], 1.0).unwrap();

        // Zero reward across K ticks: strictly non-increasing, bounded below.
        let mut prev = store.slot(1).salience();
        for _ in 0..10 {
            store.decay_and_update(&[]);
            let now = store.slot(1).salience();
            assert!(now < prev, "salience must strictly decrease under decay");
            assert!(now >= 0.0, "salience must stay bounded below");
            prev = now;
        }
    }

    #[test]
    fn test_reward_blend() {
        let mut store = small_store();
        store.decay_and_update(&[1.0, 0.0, 0.0, 0.0]);

        // psi = (1 - 0.5) * 0 + 0.5 * 1 = 0.5
        assert!((store.slot(0).psi() - 0.5).abs() < f32::EPSILON);
        // salience = 0 * 0.9 + 0.5 * |1| = 0.5
        assert!((store.slot(0).salience() - 0.5).abs() < f32::EPSILON);
        assert_eq!(store.slot(1).psi(), 0.0);
    }

    #[test]
    fn test_reward_shorter_than_capacity_covers_prefix() {
        let mut store = small_store();
        store.decay_and_update(&[2.0]);

        assert!(store.slot(0).salience() > 0.0);
        for i in 1..4 {
            assert_eq!(store.slot(i).salience(), 0.0);
        }
    }

    #[test]
    fn test_reward_longer_than_capacity_ignored() {
        let mut store = small_store();
        store.decay_and_update(&[0.0, 0.0, 0.0, 0.0, 9.0, 9.0]);
        for slot in store.slots() {
            assert_eq!(slot.salience(), 0.0);
        }
    }

    #[test]
    fn test_classify_tier_budgets() {
        let mut store = small_store();
        store.decay_and_update(&[1.0, 0.5, 0.25, 0.1]);
        store.classify_tiers();

        assert_eq!(store.tier_count(Tier::Hot), 1);
        assert_eq!(store.tier_count(Tier::Warm), 1);
        assert_eq!(store.tier_count(Tier::Cold), 2);
        assert_eq!(store.slot(0).tier(), Tier::Hot);
        assert_eq!(store.slot(1).tier(), Tier::Warm);
    }

    #[test]
    fn test_classify_ties_break_by_index() {
        let mut store = small_store();
        // All saliences equal: ranks follow slot index.
        store.classify_tiers();

        assert_eq!(store.slot(0).tier(), Tier::Hot);
        assert_eq!(store.slot(1).tier(), Tier::Warm);
        assert_eq!(store.slot(2).tier(), Tier::Cold);
        assert_eq!(store.slot(3).tier(), Tier::Cold);
    }

    #[test]
    fn test_eviction_prefers_cold_minimum() {
        let mut store = small_store();
        store.decay_and_update(&[1.0, 0.8, 0.6, 0.4]);
        store.classify_tiers();

        // Cold tier = slots 2 and 3; slot 3 has the lower salience.
        assert_eq!(store.select_eviction_slot(), 3);
    }

    #[test]
    fn test_eviction_ties_break_by_lowest_index() {
        let mut store = small_store();
        store.classify_tiers();

        // Slots 2 and 3 are Cold with equal salience.
        assert_eq!(store.select_eviction_slot(), 2);
    }

    #[test]
    fn test_eviction_never_hot_while_cold_or_warm_exists() {
        // Property-based: randomized saliences over several seeds.
        for seed in [42, 7, 999, 123_456] {
            let mut rng = DeterministicRng::new(seed);
            let config = StoreConfig::default()
                .with_capacity(16)
                .with_width(1)
                .with_tiers(4, 4);
            let mut store = MemoryStore::new(config).unwrap();

            for _ in 0..50 {
                #[allow(clippy::cast_possible_truncation)]
                let reward: Vec<f32> =
                    (0..16).map(|_| rng.next_float() as f32).collect();
                store.decay_and_update(&reward);
                store.classify_tiers();

                let victim = store.select_eviction_slot();
                let cold_or_warm_exists =
                    store.tier_count(Tier::Cold) + store.tier_count(Tier::Warm) > 0;
                if cold_or_warm_exists {
                    assert_ne!(
                        store.slot(victim).tier(),
                        Tier::Hot,
                        "evicted a Hot slot while Cold/Warm existed (seed {seed})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_eviction_all_hot_picks_minimum_salience() {
        // hot_count == capacity: no Cold or Warm slots exist, yet eviction
        // still selects the minimum-salience slot rather than slot 0.
        let config = StoreConfig::default()
            .with_capacity(4)
            .with_width(1)
            .with_tiers(4, 0);
        let mut store = MemoryStore::new(config).unwrap();
        store.decay_and_update(&[0.9, 0.2, 0.7, 0.5]);
        store.classify_tiers();

        assert_eq!(store.tier_count(Tier::Hot), 4);
        assert_eq!(store.select_eviction_slot(), 1);
    }

    #[test]
    fn test_admit_overwrites_exactly() {
        let mut store = small_store();
        store.admit(2, vec![0.25, -1.5], 0.7).unwrap();

        assert_eq!(store.slot(2).vector(), &[0.25, -1.5]);
        assert_eq!(store.slot(2).salience(), 0.7);
        assert_eq!(store.slot(2).psi(), 0.0);
    }

    #[test]
    fn test_admit_rejects_shape_mismatch() {
        let mut store = small_store();
        let before = store.slot(0).vector().to_vec();

        let result = store.admit(0, vec![1.0, 2.0, 3.0], 0.5);
        assert!(matches!(
            result,
            Err(StoreError::Shape { expected: 2, actual: 3 })
        ));
        // Store unchanged.
        assert_eq!(store.slot(0).vector(), &before[..]);
        assert!(store.last_admission().is_none());
    }

    #[test]
    fn test_admit_records_audit_entry() {
        let mut store = small_store();
        store.admit(3, vec![1.0, 2.0], 0.9).unwrap();

        let record = store.last_admission().unwrap();
        assert_eq!(record.slot, 3);
        assert_eq!(record.vector, vec![1.0, 2.0]);
        assert_eq!(record.salience, 0.9);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_admit_slot_out_of_bounds() {
        let mut store = small_store();
        let _ = store.admit(4, vec![0.0, 0.0], 0.0);
    }

    #[test]
    fn test_export_state_lengths() {
        let store = small_store();
        let (salience, psi) = store.export_state();
        assert_eq!(salience.len(), 4);
        assert_eq!(psi.len(), 4);
    }

    #[test]
    fn test_stats_tier_occupancy() {
        let mut store = small_store();
        store.decay_and_update(&[1.0, 0.5, 0.0, 0.0]);
        store.classify_tiers();

        let stats = store.stats();
        assert_eq!(stats.hot_count, 1);
        assert_eq!(stats.warm_count, 1);
        assert_eq!(stats.cold_count, 2);
        assert_eq!(stats.hot_count + stats.warm_count + stats.cold_count, 4);
        assert!(stats.salience_mean > 0.0);
    }

    #[test]
    fn test_tier_counts_property_randomized() {
        // |Hot| = min(K_HOT, N), |Warm| = min(K_WARM, N - |Hot|) for every tick.
        for seed in [1, 2, 3] {
            let mut rng = DeterministicRng::new(seed);
            let capacity = 8;
            let config = StoreConfig::default()
                .with_capacity(capacity)
                .with_width(1)
                .with_tiers(3, 5);
            let mut store = MemoryStore::new(config).unwrap();

            for _ in 0..20 {
                #[allow(clippy::cast_possible_truncation)]
                let reward: Vec<f32> = (0..capacity)
                    .map(|_| (rng.next_float() * 2.0 - 1.0) as f32)
                    .collect();
                store.decay_and_update(&reward);
                store.classify_tiers();

                assert_eq!(store.tier_count(Tier::Hot), 3);
                assert_eq!(store.tier_count(Tier::Warm), 5);
                assert_eq!(store.tier_count(Tier::Cold), 0);
            }
        }
    }
}
