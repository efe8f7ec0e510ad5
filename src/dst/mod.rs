//! DST - Deterministic Simulation Testing Support
//!
//! `TigerStyle`: All randomness flows through a seeded generator; same seed,
//! same run. The default activation source and the randomized property
//! tests both draw from [`DeterministicRng`].

mod rng;

pub use rng::DeterministicRng;
