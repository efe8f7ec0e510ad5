//! Slot Types
//!
//! A slot is one position in the store: a fixed-width activation vector plus
//! its salience/psi scores and current tier label. Slots are owned
//! exclusively by [`MemoryStore`](super::MemoryStore) and mutated in place.

use serde::{Deserialize, Serialize};

/// Priority band of a slot, recomputed every tick from salience rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Top `hot_count` slots by salience
    Hot,
    /// Next `warm_count` slots
    Warm,
    /// Everything else; preferred for eviction
    Cold,
}

/// One position in the store.
#[derive(Debug, Clone)]
pub struct Slot {
    pub(super) index: usize,
    pub(super) vector: Vec<f32>,
    pub(super) salience: f32,
    pub(super) psi: f32,
    pub(super) tier: Tier,
}

impl Slot {
    pub(super) fn zeroed(index: usize, width: usize) -> Self {
        Self {
            index,
            vector: vec![0.0; width],
            salience: 0.0,
            psi: 0.0,
            tier: Tier::Cold,
        }
    }

    /// Position of this slot in the store.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The activation vector currently occupying this slot.
    #[must_use]
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// Current salience score.
    #[must_use]
    pub fn salience(&self) -> f32 {
        self.salience
    }

    /// Smoothed reward-history signal.
    #[must_use]
    pub fn psi(&self) -> f32 {
        self.psi
    }

    /// Tier label from the most recent classification.
    ///
    /// Stale between an admission and the next
    /// [`classify_tiers`](super::MemoryStore::classify_tiers).
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }
}

/// Record of the most recent admission, exposed for the external audit
/// ledger. The store performs no hashing or persistence itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionRecord {
    /// Slot that was overwritten
    pub slot: usize,
    /// The admitted vector
    pub vector: Vec<f32>,
    /// Salience assigned at admission
    pub salience: f32,
}
