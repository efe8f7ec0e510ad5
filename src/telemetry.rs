//! Tracing Setup
//!
//! `TigerStyle`: Optional, graceful. Never panics if a subscriber is
//! already installed (tests install their own, embedding applications own
//! the global default).
//!
//! Filtering follows the standard `RUST_LOG` environment variable, e.g.
//! `RUST_LOG=nami=debug`.

use tracing_subscriber::EnvFilter;

/// Install a formatted `tracing` subscriber filtered by `RUST_LOG`.
///
/// Returns `true` if this call installed the global default, `false` if one
/// was already set (in which case the existing subscriber is left alone).
pub fn init_tracing() -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("tracing subscriber installed");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        // Whatever the first call returns, the second must not panic and
        // must report that a subscriber already exists.
        let _ = init_tracing();
        assert!(!init_tracing());
    }
}
