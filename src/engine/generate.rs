//! Activation Generation Seam
//!
//! The Generating phase produces a fixed-size batch of candidate
//! activations once per tick. The source of the vectors (an external model,
//! a sensor frontend) is a collaborator behind [`ActivationSource`]; the
//! default implementation draws from a seeded RNG so ticks are fully
//! reproducible.

use crate::dst::DeterministicRng;

/// A candidate activation pending admission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivation {
    /// The activation vector; must be exactly `width` long to be admitted
    pub vector: Vec<f32>,
    /// Reward attached at generation time; becomes the initial salience
    pub reward: f32,
}

/// Produces the per-tick batch of candidate activations.
pub trait ActivationSource {
    /// Produce up to `count` activations of the given vector width.
    fn next_batch(&mut self, count: usize, width: usize) -> Vec<NewActivation>;
}

/// Default source: seeded random vectors in [-1, 1) with rewards in [0, 1).
#[derive(Debug, Clone)]
pub struct RngActivationSource {
    rng: DeterministicRng,
}

impl RngActivationSource {
    /// Create a source with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: DeterministicRng::new(seed),
        }
    }
}

impl ActivationSource for RngActivationSource {
    #[allow(clippy::cast_possible_truncation)]
    fn next_batch(&mut self, count: usize, width: usize) -> Vec<NewActivation> {
        (0..count)
            .map(|_| {
                let vector = (0..width)
                    .map(|_| (self.rng.next_float() * 2.0 - 1.0) as f32)
                    .collect();
                let reward = self.rng.next_float() as f32;
                NewActivation { vector, reward }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_shape() {
        let mut source = RngActivationSource::new(42);
        let batch = source.next_batch(3, 8);

        assert_eq!(batch.len(), 3);
        for activation in &batch {
            assert_eq!(activation.vector.len(), 8);
            assert!((0.0..1.0).contains(&activation.reward));
            assert!(activation.vector.iter().all(|v| (-1.0..1.0).contains(v)));
        }
    }

    #[test]
    fn test_same_seed_same_batch() {
        let mut a = RngActivationSource::new(7);
        let mut b = RngActivationSource::new(7);
        assert_eq!(a.next_batch(4, 4), b.next_batch(4, 4));
    }

    #[test]
    fn test_zero_count_empty_batch() {
        let mut source = RngActivationSource::new(1);
        assert!(source.next_batch(0, 8).is_empty());
    }
}
