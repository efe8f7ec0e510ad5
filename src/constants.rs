//! TigerStyle Constants
//!
//! All limits use big-endian naming: CATEGORY_SPECIFICS_UNIT_LIMIT
//! Example: STORE_CAPACITY_SLOTS_MAX (not MAX_STORE_CAPACITY)
//!
//! Every constant includes units in the name:
//! - _SLOTS/_SAMPLES/_COUNT for quantities
//! - _BYTES for sizes
//! - _MS for milliseconds

// =============================================================================
// Memory Store Limits
// =============================================================================

/// Default number of slots in the store
pub const STORE_CAPACITY_SLOTS_DEFAULT: usize = 256;

/// Maximum number of slots in the store
pub const STORE_CAPACITY_SLOTS_MAX: usize = 65_536;

/// Default width of an activation vector
pub const STORE_VECTOR_WIDTH_DEFAULT: usize = 64;

/// Maximum width of an activation vector
pub const STORE_VECTOR_WIDTH_MAX: usize = 4_096;

/// Default number of Hot slots
pub const STORE_HOT_SLOTS_COUNT_DEFAULT: usize = 32;

/// Default number of Warm slots
pub const STORE_WARM_SLOTS_COUNT_DEFAULT: usize = 64;

/// Default per-tick exponential decay applied to salience
pub const STORE_SALIENCE_DECAY_DEFAULT: f32 = 0.95;

/// Default reward blend coefficient (alpha)
pub const STORE_REWARD_ALPHA_DEFAULT: f32 = 0.5;

/// Default number of new activations admitted per tick
pub const STORE_ADMIT_PER_TICK_COUNT_DEFAULT: usize = 4;

// =============================================================================
// Reward Bus Limits
// =============================================================================

/// Default capacity of the reward ingestion bus
pub const BUS_CAPACITY_SAMPLES_DEFAULT: usize = 1_024;

/// Maximum capacity of the reward ingestion bus
pub const BUS_CAPACITY_SAMPLES_MAX: usize = 65_536;

// =============================================================================
// Network Listener Limits
// =============================================================================

/// Default TCP port for reward ingestion
pub const LISTENER_PORT_DEFAULT: u16 = 9_750;

/// Default size of the connection pool
pub const LISTENER_CONNECTIONS_COUNT_DEFAULT: usize = 4;

/// Maximum size of the connection pool
pub const LISTENER_CONNECTIONS_COUNT_MAX: usize = 64;

/// Maximum length of a single reward payload line
pub const LISTENER_LINE_BYTES_MAX: usize = 64 * 1024;

// =============================================================================
// Engine Limits
// =============================================================================

/// Default interval between ticks
pub const ENGINE_TICK_INTERVAL_MS_DEFAULT: u64 = 10;

/// Maximum interval between ticks
pub const ENGINE_TICK_INTERVAL_MS_MAX: u64 = 60_000;

// =============================================================================
// Snapshot Limits
// =============================================================================

/// Number of buffers in the snapshot double buffer
pub const SNAPSHOT_BUFFERS_COUNT: usize = 2;
