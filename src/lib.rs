// Impactsim - Asteroid Impact Effects Simulator
// Library entry point: physics engine, impact registry, catalog and controller

pub mod asteroid_catalog;
pub mod config;
pub mod error;
pub mod impact_model;
pub mod impact_registry;
pub mod physics_engine;
pub mod simulation_controller;

pub use asteroid_catalog::{AsteroidBody, AsteroidCatalog, LiveFeedCache};
pub use config::SimulatorConfig;
pub use error::{ImpactError, Result};
pub use impact_model::{
    GeoLocation, ImpactEvent, ImpactResult, ImpactSummary, OverlayKind, OverlaySpec,
};
pub use impact_registry::{ImpactRegistry, OverlayRenderer, RecordingRenderer};
pub use simulation_controller::{ImpactSource, SimulationController, ViewReset};

/// Install the global tracing subscriber (`RUST_LOG`, default `info`).
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
