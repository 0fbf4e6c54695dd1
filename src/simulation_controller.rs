// Simulation Controller - orchestrates simulate/reset for the map front end
// Owns the selection, click location and manual-entry state that the UI reads and writes

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::asteroid_catalog::{AsteroidBody, AsteroidCatalog};
use crate::config::SimulatorConfig;
use crate::error::{ImpactError, Result};
use crate::impact_model::{GeoLocation, ImpactInputs, ImpactResult, ImpactSummary};
use crate::impact_registry::{ImpactRegistry, OverlayRenderer};
use crate::physics_engine;

// =============================================================================
// REQUEST / RESPONSE TYPES
// =============================================================================

/// Where the mass and velocity of an impact come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImpactSource {
    /// Catalog or feed body: mass from size/density, entry-adjusted velocity
    Body(AsteroidBody),
    /// Raw values typed by the user; velocity is used without entry adjustment
    Manual { mass_kg: f64, velocity_km_s: f64 },
}

impl ImpactSource {
    /// Text-panel summary of a result computed from this source.
    pub fn summary(&self, result: &ImpactResult) -> ImpactSummary {
        match self {
            ImpactSource::Body(body) => ImpactSummary::for_body(body, result),
            ImpactSource::Manual { velocity_km_s, .. } => {
                ImpactSummary::for_manual(*velocity_km_s, result)
            }
        }
    }
}

/// Manual-entry fields as last parsed from the form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ManualEntry {
    pub mass_kg: Option<f64>,
    pub velocity_km_s: Option<f64>,
}

/// Instruction for the view after a reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewReset {
    pub center: GeoLocation,
    pub zoom: u8,
    pub manual_mass_kg: f64,
    pub manual_velocity_km_s: f64,
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct SimulationController<R: OverlayRenderer> {
    config: SimulatorConfig,
    catalog: AsteroidCatalog,
    registry: ImpactRegistry<R>,
    selected: Option<AsteroidBody>,
    click_location: Option<GeoLocation>,
    manual: ManualEntry,
}

impl<R: OverlayRenderer> SimulationController<R> {
    pub fn new(config: SimulatorConfig, catalog: AsteroidCatalog, renderer: R) -> Self {
        let manual = ManualEntry {
            mass_kg: Some(config.manual_mass_kg),
            velocity_km_s: Some(config.manual_velocity_km_s),
        };
        Self {
            config,
            catalog,
            registry: ImpactRegistry::new(renderer),
            selected: None,
            click_location: None,
            manual,
        }
    }

    /// Compute an impact and draw it. On error nothing is drawn or stored.
    pub fn simulate(
        &mut self,
        source: ImpactSource,
        location: GeoLocation,
    ) -> Result<ImpactResult> {
        location.validate()?;
        let (mass_kg, velocity_m_s, label) = match &source {
            ImpactSource::Body(body) => (
                physics_engine::mass(body.diameter_m(), body.density_kg_m3())?,
                physics_engine::impact_velocity(body.velocity_km_s())?,
                body.name().to_string(),
            ),
            ImpactSource::Manual {
                mass_kg,
                velocity_km_s,
            } => (
                *mass_kg,
                velocity_km_s * 1000.0,
                crate::impact_model::MANUAL_LABEL.to_string(),
            ),
        };

        let inputs = ImpactInputs::new(mass_kg, velocity_m_s, location, label)?;
        let result = physics_engine::compute_impact(&inputs)?;

        self.registry.add_event(location, result.clone())?;
        Ok(result)
    }

    /// Simulate from the current UI state.
    ///
    /// A map click wins over the typed coordinates; a selected body wins over
    /// the manual fields.
    pub fn simulate_current(&mut self, lat_text: &str, lng_text: &str) -> Result<ImpactResult> {
        let location = match self.click_location {
            Some(location) => location,
            None => GeoLocation::parse(lat_text, lng_text)?,
        };
        let source = self.current_source()?;

        self.simulate(source, location).inspect_err(|e| {
            warn!(error = %e, "simulation rejected");
        })
    }

    /// Source the next `simulate_current` will use: selection first, then
    /// the manual fields.
    pub fn current_source(&self) -> Result<ImpactSource> {
        match (&self.selected, self.manual) {
            (Some(body), _) => Ok(ImpactSource::Body(body.clone())),
            (
                None,
                ManualEntry {
                    mass_kg: Some(mass_kg),
                    velocity_km_s: Some(velocity_km_s),
                },
            ) => Ok(ImpactSource::Manual {
                mass_kg,
                velocity_km_s,
            }),
            (None, _) => Err(ImpactError::MissingSelection),
        }
    }

    /// Compute without drawing, for the details panel.
    pub fn preview(&self, source: &ImpactSource) -> Result<ImpactSummary> {
        // Location does not affect the physics; any valid point will do
        let location = self.config.default_center;
        let inputs = match source {
            ImpactSource::Body(body) => ImpactInputs::from_body(body, location)?,
            ImpactSource::Manual {
                mass_kg,
                velocity_km_s,
            } => ImpactInputs::from_manual(*mass_kg, *velocity_km_s, location)?,
        };
        let result = physics_engine::compute_impact(&inputs)?;
        Ok(source.summary(&result))
    }

    /// Select a catalog body by id or name and describe it.
    pub fn select_body(&mut self, key: &str) -> Result<ImpactSummary> {
        let body = self
            .catalog
            .find(key)
            .ok_or_else(|| ImpactError::UnknownBody(key.to_string()))?;
        let summary = self.preview(&ImpactSource::Body(body.clone()))?;
        debug!(id = body.id(), name = body.name(), "asteroid selected");
        self.selected = Some(body);
        Ok(summary)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&AsteroidBody> {
        self.selected.as_ref()
    }

    /// Record a map click as the next impact point.
    pub fn set_click_location(&mut self, lat: f64, lng: f64) -> Result<GeoLocation> {
        let location = GeoLocation::new(lat, lng)?;
        self.click_location = Some(location);
        Ok(location)
    }

    pub fn click_location(&self) -> Option<GeoLocation> {
        self.click_location
    }

    /// Update the manual fields from the form text; unparsable text clears a field.
    pub fn set_manual_fields(&mut self, mass_text: &str, velocity_text: &str) -> ManualEntry {
        self.manual = ManualEntry {
            mass_kg: mass_text.trim().parse().ok(),
            velocity_km_s: velocity_text.trim().parse().ok(),
        };
        self.manual
    }

    pub fn manual_entry(&self) -> ManualEntry {
        self.manual
    }

    /// Clear every impact and return the view to its defaults.
    pub fn reset(&mut self) -> ViewReset {
        let removed = self.registry.clear_all();
        self.selected = None;
        self.click_location = None;
        self.manual = ManualEntry {
            mass_kg: Some(self.config.manual_mass_kg),
            velocity_km_s: Some(self.config.manual_velocity_km_s),
        };
        info!(removed, "simulation reset");

        ViewReset {
            center: self.config.default_center,
            zoom: self.config.default_zoom,
            manual_mass_kg: self.config.manual_mass_kg,
            manual_velocity_km_s: self.config.manual_velocity_km_s,
        }
    }

    pub fn registry(&self) -> &ImpactRegistry<R> {
        &self.registry
    }

    pub fn catalog(&self) -> &AsteroidCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asteroid_catalog::LiveFeedCache;
    use crate::impact_model::OverlayKind;
    use crate::impact_registry::RecordingRenderer;
    use approx::assert_relative_eq;

    fn controller() -> SimulationController<RecordingRenderer> {
        SimulationController::new(
            SimulatorConfig::default(),
            AsteroidCatalog::default(),
            RecordingRenderer::new(),
        )
    }

    fn apophis() -> AsteroidBody {
        AsteroidCatalog::default().find("Apophis").unwrap()
    }

    #[test]
    fn test_apophis_round_trip_matches_engine() {
        let mut ctl = controller();
        let location = GeoLocation::new(0.0, 0.0).unwrap();
        let result = ctl.simulate(ImpactSource::Body(apophis()), location).unwrap();

        let mass = physics_engine::mass(370.0, 3000.0).unwrap();
        let velocity = physics_engine::impact_velocity(7.4).unwrap();
        assert_eq!(result.mass_kg, mass);
        assert_eq!(result.impact_velocity_m_s, velocity);
        assert_eq!(
            result.blast_radius_m,
            physics_engine::blast_radius_meters(mass, velocity).unwrap()
        );
        assert_relative_eq!(result.mass_kg, 7.94e10, max_relative = 0.01);
        assert_eq!(result.label, "Apophis");

        let event = &ctl.registry().events()[0];
        assert_eq!(event.location(), location);
        assert_eq!(event.result(), &result);
    }

    #[test]
    fn test_invalid_location_leaves_registry_untouched() {
        let mut ctl = controller();
        let bad = GeoLocation { lat: 200.0, lng: 0.0 };
        let err = ctl.simulate(ImpactSource::Body(apophis()), bad).unwrap_err();
        assert!(matches!(err, ImpactError::InvalidLocation(_)));
        assert_eq!(ctl.registry().len(), 0);
        assert_eq!(ctl.registry().renderer().created_count(), 0);
    }

    #[test]
    fn test_manual_entry_adds_one_event_with_three_overlays() {
        let mut ctl = controller();
        let location = GeoLocation::new(10.0, 10.0).unwrap();
        let result = ctl
            .simulate(
                ImpactSource::Manual {
                    mass_kg: 1000.0,
                    velocity_km_s: 20.0,
                },
                location,
            )
            .unwrap();

        assert!(result.blast_radius_m > 0.0);
        assert_eq!(result.impact_velocity_m_s, 20_000.0);
        assert_eq!(ctl.registry().len(), 1);
        assert_eq!(ctl.registry().events()[0].overlays().len(), 3);
        assert_eq!(ctl.registry().renderer().live_count(), 3);
    }

    #[test]
    fn test_invalid_physical_input_leaves_registry_untouched() {
        let mut ctl = controller();
        let location = GeoLocation::new(0.0, 0.0).unwrap();
        let bad_inputs = [(0.0, 20.0), (-5.0, 20.0), (1000.0, f64::NAN), (1000.0, 0.0)];
        for (mass_kg, velocity_km_s) in bad_inputs {
            let err = ctl
                .simulate(
                    ImpactSource::Manual {
                        mass_kg,
                        velocity_km_s,
                    },
                    location,
                )
                .unwrap_err();
            assert!(matches!(err, ImpactError::InvalidPhysicalInput(_)));
        }
        assert!(ctl.registry().is_empty());
    }

    #[test]
    fn test_location_checked_before_physical_input() {
        let mut ctl = controller();
        let err = ctl
            .simulate(
                ImpactSource::Manual {
                    mass_kg: -1.0,
                    velocity_km_s: 20.0,
                },
                GeoLocation { lat: f64::NAN, lng: 0.0 },
            )
            .unwrap_err();
        assert!(matches!(err, ImpactError::InvalidLocation(_)));
    }

    #[test]
    fn test_click_location_takes_precedence_over_typed_fields() {
        let mut ctl = controller();
        ctl.set_click_location(35.0, 139.0).unwrap();
        ctl.simulate_current("not a number", "").unwrap();
        assert_eq!(
            ctl.registry().events()[0].location(),
            GeoLocation { lat: 35.0, lng: 139.0 }
        );
    }

    #[test]
    fn test_typed_fields_used_without_click() {
        let mut ctl = controller();
        ctl.simulate_current("-33.9", "151.2").unwrap();
        assert_eq!(
            ctl.registry().events()[0].location(),
            GeoLocation { lat: -33.9, lng: 151.2 }
        );

        let err = ctl.simulate_current("abc", "151.2").unwrap_err();
        assert!(matches!(err, ImpactError::InvalidLocation(_)));
        assert_eq!(ctl.registry().len(), 1);
    }

    #[test]
    fn test_selection_overrides_manual_fields() {
        let mut ctl = controller();
        let summary = ctl.select_body("Bennu").unwrap();
        assert_eq!(summary.name, "Bennu");
        assert_eq!(summary.diameter_m, Some(492.0));

        let source = ctl.current_source().unwrap();
        let result = ctl.simulate_current("0", "0").unwrap();
        assert_eq!(result.label, "Bennu");
        assert!(result.impact_velocity_m_s > 12_000.0);
        assert_eq!(source.summary(&result).diameter_m, Some(492.0));
    }

    #[test]
    fn test_summary_follows_source_after_selection_changes() {
        let mut ctl = controller();
        ctl.select_body("Bennu").unwrap();
        let bennu = ctl.current_source().unwrap();
        let result = ctl.simulate_current("0", "0").unwrap();

        ctl.select_body("Eros").unwrap();
        let summary = bennu.summary(&result);
        assert_eq!(summary.name, "Bennu");
        assert_eq!(summary.diameter_m, Some(492.0));
        assert_eq!(summary.velocity_km_s, 12.0);
        assert!(summary.impact_velocity_km_s > summary.velocity_km_s);

        let manual = ImpactSource::Manual {
            mass_kg: 1000.0,
            velocity_km_s: 20.0,
        };
        let result = ctl
            .simulate(manual.clone(), GeoLocation::new(0.0, 0.0).unwrap())
            .unwrap();
        let summary = manual.summary(&result);
        assert_eq!(summary.diameter_m, None);
        assert_eq!(summary.velocity_km_s, 20.0);
    }

    #[test]
    fn test_manual_fields_default_and_missing_selection() {
        let mut ctl = controller();
        assert_eq!(
            ctl.manual_entry(),
            ManualEntry {
                mass_kg: Some(1000.0),
                velocity_km_s: Some(20.0)
            }
        );
        let result = ctl.simulate_current("0", "0").unwrap();
        assert_eq!(result.label, "Custom");

        ctl.set_manual_fields("", "20");
        let err = ctl.simulate_current("0", "0").unwrap_err();
        assert!(matches!(err, ImpactError::MissingSelection));
        assert_eq!(ctl.registry().len(), 1);
    }

    #[test]
    fn test_unknown_body() {
        let mut ctl = controller();
        let err = ctl.select_body("Vesta").unwrap_err();
        assert!(matches!(err, ImpactError::UnknownBody(_)));
        assert!(ctl.selected().is_none());
    }

    #[test]
    fn test_reset_clears_everything_and_returns_defaults() {
        let mut ctl = controller();
        ctl.select_body("Eros").unwrap();
        ctl.set_click_location(1.0, 2.0).unwrap();
        ctl.simulate_current("", "").unwrap();
        ctl.clear_selection();
        ctl.set_manual_fields("5e9", "30");
        ctl.simulate_current("", "").unwrap();
        assert_eq!(ctl.registry().len(), 2);

        let view = ctl.reset();
        assert_eq!(view.center, GeoLocation { lat: 20.0, lng: 0.0 });
        assert_eq!(view.zoom, 2);
        assert_eq!(view.manual_mass_kg, 1000.0);
        assert_eq!(view.manual_velocity_km_s, 20.0);

        assert!(ctl.registry().is_empty());
        assert_eq!(ctl.registry().renderer().removed_count(), 6);
        assert_eq!(ctl.registry().renderer().live_count(), 0);
        assert!(ctl.selected().is_none());
        assert!(ctl.click_location().is_none());
        assert_eq!(ctl.manual_entry().mass_kg, Some(1000.0));

        // Second reset issues no removals
        ctl.reset();
        assert_eq!(ctl.registry().renderer().removed_count(), 6);
    }

    #[test]
    fn test_feed_bodies_become_selectable() {
        let cache = LiveFeedCache::default();
        let mut ctl = SimulationController::new(
            SimulatorConfig::default(),
            AsteroidCatalog::new(cache.clone()),
            RecordingRenderer::new(),
        );
        cache.ingest_json(
            r#"{"near_earth_objects": {"2024-05-01": [{
                "id": "54016573", "name": "(2020 KZ2)",
                "estimated_diameter": {"meters": {"estimated_diameter_min": 40.0, "estimated_diameter_max": 60.0}},
                "close_approach_data": [{"relative_velocity": {"kilometers_per_second": "9.5"}}]
            }]}}"#,
        );

        let summary = ctl.select_body("54016573").unwrap();
        assert_eq!(summary.diameter_m, Some(50.0));

        let result = ctl.simulate_current("0", "0").unwrap();
        let expected_mass = physics_engine::mass(50.0, 2000.0).unwrap();
        assert_eq!(result.mass_kg, expected_mass);
        let event = &ctl.registry().events()[0];
        let spec = ctl
            .registry()
            .renderer()
            .overlay(event.overlay(OverlayKind::Seismic))
            .unwrap();
        assert_eq!(spec.radius_m, result.seismic_radius_m);
    }
}
