// Impactsim command-line front end
// Runs one impact through the controller and prints the summary and overlays as JSON

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::info;

use impactsim::{
    AsteroidCatalog, GeoLocation, ImpactSource, ImpactSummary, LiveFeedCache, OverlaySpec,
    RecordingRenderer, SimulationController, SimulatorConfig,
};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Estimate blast, seismic and tsunami effects of an asteroid impact"
)]
struct Cli {
    /// Catalog body by name or SPK id (e.g. Apophis, 99942)
    #[arg(long, conflicts_with_all = ["mass", "velocity"])]
    asteroid: Option<String>,

    /// Manual mass in kg (defaults to the configured manual mass)
    #[arg(long)]
    mass: Option<f64>,

    /// Manual approach velocity in km/s (defaults to the configured manual velocity)
    #[arg(long)]
    velocity: Option<f64>,

    /// Impact latitude in degrees
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
    lat: f64,

    /// Impact longitude in degrees
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
    lng: f64,

    /// Saved NeoWs feed document to add to the catalog
    #[arg(long)]
    feed: Option<PathBuf>,

    /// Print the catalog and exit
    #[arg(long, default_value_t = false)]
    list: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    summary: ImpactSummary,
    overlays: Vec<&'a OverlaySpec>,
}

fn main() -> anyhow::Result<()> {
    impactsim::init_tracing();
    let cli = Cli::parse();
    let config = SimulatorConfig::from_env()?;

    let live = LiveFeedCache::new(config.feed_cache_duration());
    if let Some(path) = &cli.feed {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading feed file {}", path.display()))?;
        live.ingest_json(&json);
    }
    let catalog = AsteroidCatalog::new(live);
    info!(
        live_bodies = catalog.live_feed().body_count(),
        feed_fresh = catalog.live_feed().is_fresh(),
        "catalog ready"
    );

    if cli.list {
        println!("{}", serde_json::to_string_pretty(&catalog.bodies())?);
        return Ok(());
    }

    let source = match &cli.asteroid {
        Some(key) => ImpactSource::Body(
            catalog
                .find(key)
                .with_context(|| format!("no asteroid named {key:?} in the catalog"))?,
        ),
        None => ImpactSource::Manual {
            mass_kg: cli.mass.unwrap_or(config.manual_mass_kg),
            velocity_km_s: cli.velocity.unwrap_or(config.manual_velocity_km_s),
        },
    };
    let location = GeoLocation::new(cli.lat, cli.lng)?;

    let mut controller = SimulationController::new(config, catalog, RecordingRenderer::new());
    let result = controller.simulate(source.clone(), location)?;

    let report = Report {
        summary: source.summary(&result),
        overlays: controller
            .registry()
            .renderer()
            .live_overlays()
            .map(|(_, spec)| spec)
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
