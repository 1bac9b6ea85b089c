//! Lattice Prometheus metrics infrastructure.
//!
//! This crate provides centralized metric definitions for Lattice
//! components. Metrics are registered once on the global [`REGISTRY`] and
//! exposed by the node's metrics endpoint.

pub mod dpos;

use once_cell::sync::Lazy;
use prometheus::Registry;

/// Global Prometheus registry for all Lattice metrics.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();

    // Register all metric collectors
    dpos::register_metrics(&registry);

    registry
});

/// Initialize all metrics. Call once at startup.
pub fn init() {
    Lazy::force(&REGISTRY);
    tracing::info!("Lattice metrics initialized");
}
