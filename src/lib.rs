//! Nami - Reinforcement-Driven Salience Store
//!
//! A fixed-capacity, tiered-priority store of fixed-width activation
//! vectors. Each slot carries a decaying salience score, continuously
//! refreshed by externally supplied reward samples; new vectors are
//! admitted by evicting the lowest-priority slots. Eviction order is driven
//! by a reinforcement-style priority, not recency or frequency.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Engine (tick)                      │
//! │  drain -> decay -> classify -> generate -> evict -> publish │
//! ├──────────────┬───────────────────┬───────────────────────┤
//! │  RewardBus   │    MemoryStore    │   SnapshotPublisher   │
//! │  bounded,    │  N slots, Hot/    │   double buffer,      │
//! │  drop-oldest │  Warm/Cold tiers  │   monotonic generation│
//! ├──────────────┴───────────────────┴───────────────────────┤
//! │  NetworkListener: TCP, ASCII CSV payloads -> RewardBus    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Three concurrency domains: the tick task is the sole writer of the
//! store; network connection tasks write only to the bus; the publish task
//! copies into the snapshot double buffer. Reward samples take effect no
//! earlier than the tick after their enqueue (fire-and-forget).
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nami::{
//!     Engine, EngineConfig, ListenerConfig, MemoryStore, NetworkListener,
//!     RewardBus, RngActivationSource, SnapshotPublisher, StoreConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new(StoreConfig::default())?;
//!     let bus = Arc::new(RewardBus::new());
//!     let publisher = SnapshotPublisher::new(store.capacity());
//!     let snapshots = publisher.buffer(); // hand to the renderer
//!
//!     let listener =
//!         NetworkListener::bind(ListenerConfig::default(), Arc::clone(&bus)).await?;
//!
//!     let mut engine = Engine::new(
//!         store,
//!         bus,
//!         publisher,
//!         RngActivationSource::new(42),
//!         EngineConfig::default(),
//!     );
//!
//!     let (stop, stop_rx) = tokio::sync::watch::channel(false);
//!     tokio::spawn(async move {
//!         tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!         let _ = stop.send(true);
//!     });
//!     engine.run(stop_rx).await;
//!     listener.stop().await;
//!     let _ = snapshots.read();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bus;
pub mod config;
pub mod constants;
pub mod dst;
pub mod engine;
pub mod listener;
pub mod snapshot;
pub mod store;
pub mod telemetry;

pub use bus::{RewardBus, RewardSample};
pub use config::{ConfigError, EngineConfig, ListenerConfig, StoreConfig};
pub use dst::DeterministicRng;
pub use engine::{
    ActivationSource, Engine, NewActivation, RngActivationSource, TickPhase, TickReport,
};
pub use listener::{ListenerError, NetworkListener};
pub use snapshot::{Snapshot, SnapshotBuffer, SnapshotPublisher};
pub use store::{
    AdmissionRecord, MemoryStore, Slot, StoreError, StoreStats, Tier, EVICTION_TIER_PREFERENCE,
};
pub use telemetry::init_tracing;
