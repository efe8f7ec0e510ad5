//! Configuration Types
//!
//! `TigerStyle`: Explicit limits from `constants`, builder methods that assert
//! preconditions, and a `validate()` that returns the construction error.
//!
//! All configuration is fixed for the lifetime of the component it builds;
//! there is no dynamic reconfiguration.

use serde::{Deserialize, Serialize};

use crate::constants::{
    ENGINE_TICK_INTERVAL_MS_DEFAULT, ENGINE_TICK_INTERVAL_MS_MAX, LISTENER_CONNECTIONS_COUNT_DEFAULT,
    LISTENER_CONNECTIONS_COUNT_MAX, LISTENER_LINE_BYTES_MAX, LISTENER_PORT_DEFAULT,
    STORE_ADMIT_PER_TICK_COUNT_DEFAULT, STORE_CAPACITY_SLOTS_DEFAULT, STORE_CAPACITY_SLOTS_MAX,
    STORE_HOT_SLOTS_COUNT_DEFAULT, STORE_REWARD_ALPHA_DEFAULT, STORE_SALIENCE_DECAY_DEFAULT,
    STORE_VECTOR_WIDTH_DEFAULT, STORE_VECTOR_WIDTH_MAX, STORE_WARM_SLOTS_COUNT_DEFAULT,
};

// =============================================================================
// Error Types
// =============================================================================

/// Errors from configuration validation.
///
/// Construction-time misconfiguration is the only fatal error in the system;
/// everything else is recovered locally.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Store capacity is zero
    #[error("store capacity must be > 0")]
    CapacityZero,

    /// Vector width is zero
    #[error("vector width must be > 0")]
    WidthZero,

    /// Hot + Warm tier budget exceeds capacity
    #[error("tier budget exceeds capacity: hot {hot} + warm {warm} > {capacity}")]
    TierBudgetExceeded {
        /// Configured Hot slot count
        hot: usize,
        /// Configured Warm slot count
        warm: usize,
        /// Configured capacity
        capacity: usize,
    },

    /// Decay rate outside (0, 1]
    #[error("decay must be in (0.0, 1.0], got {decay}")]
    DecayOutOfRange {
        /// The invalid decay rate
        decay: f32,
    },

    /// Reward blend coefficient outside [0, 1]
    #[error("reward alpha must be in [0.0, 1.0], got {alpha}")]
    AlphaOutOfRange {
        /// The invalid blend coefficient
        alpha: f32,
    },
}

/// Result type for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Store Configuration
// =============================================================================

/// Configuration for [`MemoryStore`](crate::store::MemoryStore).
///
/// Fixed at construction: capacity, width, and tier budgets never change for
/// the lifetime of the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Number of slots (N)
    pub capacity: usize,
    /// Activation vector width (D)
    pub width: usize,
    /// Number of Hot slots (`K_HOT`)
    pub hot_count: usize,
    /// Number of Warm slots (`K_WARM`)
    pub warm_count: usize,
    /// Per-tick exponential decay applied to salience
    pub decay: f32,
    /// Reward blend coefficient (alpha)
    pub reward_alpha: f32,
    /// Number of new activations admitted per tick (`NEW_PER_STEP`)
    pub admit_per_tick: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: STORE_CAPACITY_SLOTS_DEFAULT,
            width: STORE_VECTOR_WIDTH_DEFAULT,
            hot_count: STORE_HOT_SLOTS_COUNT_DEFAULT,
            warm_count: STORE_WARM_SLOTS_COUNT_DEFAULT,
            decay: STORE_SALIENCE_DECAY_DEFAULT,
            reward_alpha: STORE_REWARD_ALPHA_DEFAULT,
            admit_per_tick: STORE_ADMIT_PER_TICK_COUNT_DEFAULT,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slot capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        assert!(
            capacity <= STORE_CAPACITY_SLOTS_MAX,
            "capacity exceeds max ({STORE_CAPACITY_SLOTS_MAX})"
        );
        self.capacity = capacity;
        self
    }

    /// Set the activation vector width.
    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        assert!(width > 0, "width must be positive");
        assert!(
            width <= STORE_VECTOR_WIDTH_MAX,
            "width exceeds max ({STORE_VECTOR_WIDTH_MAX})"
        );
        self.width = width;
        self
    }

    /// Set the Hot and Warm tier budgets.
    #[must_use]
    pub fn with_tiers(mut self, hot_count: usize, warm_count: usize) -> Self {
        self.hot_count = hot_count;
        self.warm_count = warm_count;
        self
    }

    /// Set the per-tick salience decay.
    #[must_use]
    pub fn with_decay(mut self, decay: f32) -> Self {
        assert!(decay > 0.0 && decay <= 1.0, "decay must be in (0, 1]");
        self.decay = decay;
        self
    }

    /// Set the reward blend coefficient.
    #[must_use]
    pub fn with_reward_alpha(mut self, alpha: f32) -> Self {
        assert!((0.0..=1.0).contains(&alpha), "alpha must be in [0, 1]");
        self.reward_alpha = alpha;
        self
    }

    /// Set the per-tick admission batch size. Zero disables admission.
    #[must_use]
    pub fn with_admit_per_tick(mut self, count: usize) -> Self {
        self.admit_per_tick = count;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns the first violated constraint: zero capacity, zero width, tier
    /// budget exceeding capacity, or decay/alpha outside their ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.capacity == 0 {
            return Err(ConfigError::CapacityZero);
        }
        if self.width == 0 {
            return Err(ConfigError::WidthZero);
        }
        if self.hot_count + self.warm_count > self.capacity {
            return Err(ConfigError::TierBudgetExceeded {
                hot: self.hot_count,
                warm: self.warm_count,
                capacity: self.capacity,
            });
        }
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(ConfigError::DecayOutOfRange { decay: self.decay });
        }
        if !(0.0..=1.0).contains(&self.reward_alpha) {
            return Err(ConfigError::AlphaOutOfRange {
                alpha: self.reward_alpha,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Listener Configuration
// =============================================================================

/// Configuration for [`NetworkListener`](crate::listener::NetworkListener).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// TCP port to listen on (0 = ephemeral, useful in tests)
    pub port: u16,
    /// Maximum number of concurrently served connections
    pub max_connections: usize,
    /// Maximum length of a single payload line; longer payloads are dropped
    pub line_bytes_max: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: LISTENER_PORT_DEFAULT,
            max_connections: LISTENER_CONNECTIONS_COUNT_DEFAULT,
            line_bytes_max: LISTENER_LINE_BYTES_MAX,
        }
    }
}

impl ListenerConfig {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listening port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the connection pool size.
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        assert!(max_connections > 0, "max_connections must be positive");
        assert!(
            max_connections <= LISTENER_CONNECTIONS_COUNT_MAX,
            "max_connections exceeds max ({LISTENER_CONNECTIONS_COUNT_MAX})"
        );
        self.max_connections = max_connections;
        self
    }

    /// Set the payload line length limit.
    #[must_use]
    pub fn with_line_bytes_max(mut self, line_bytes_max: usize) -> Self {
        assert!(line_bytes_max > 0, "line_bytes_max must be positive");
        assert!(
            line_bytes_max <= LISTENER_LINE_BYTES_MAX,
            "line_bytes_max exceeds max ({LISTENER_LINE_BYTES_MAX})"
        );
        self.line_bytes_max = line_bytes_max;
        self
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Configuration for [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interval between ticks in milliseconds (0 = tick as fast as possible)
    pub tick_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: ENGINE_TICK_INTERVAL_MS_DEFAULT,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tick interval.
    #[must_use]
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        assert!(
            ms <= ENGINE_TICK_INTERVAL_MS_MAX,
            "tick_interval_ms exceeds max ({ENGINE_TICK_INTERVAL_MS_MAX})"
        );
        self.tick_interval_ms = ms;
        self
    }
}
