// Impact Model - value types shared by the engine, registry and controller

use serde::{Deserialize, Serialize};

use crate::asteroid_catalog::AsteroidBody;
use crate::error::{ImpactError, Result};
use crate::physics_engine;

/// Label used for impacts entered as raw mass/velocity
pub const MANUAL_LABEL: &str = "Custom";

// =============================================================================
// LOCATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Degrees, [-90, 90]
    pub lat: f64,
    /// Degrees, unbounded (the map allows unwrapped longitude)
    pub lng: f64,
}

impl GeoLocation {
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        let location = Self { lat, lng };
        location.validate()?;
        Ok(location)
    }

    /// Parse typed coordinate fields.
    pub fn parse(lat: &str, lng: &str) -> Result<Self> {
        let parse = |axis: &str, text: &str| {
            text.trim().parse::<f64>().map_err(|_| {
                ImpactError::InvalidLocation(format!("{axis} {text:?} is not a number"))
            })
        };
        Self::new(parse("latitude", lat)?, parse("longitude", lng)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(ImpactError::InvalidLocation(format!(
                "coordinates must be finite, got ({}, {})",
                self.lat, self.lng
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(ImpactError::InvalidLocation(format!(
                "latitude {} outside [-90, 90]",
                self.lat
            )));
        }
        Ok(())
    }
}

// =============================================================================
// INPUTS & RESULTS
// =============================================================================

/// Resolved inputs for one simulate action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactInputs {
    pub mass_kg: f64,
    /// m/s at the surface
    pub impact_velocity_m_s: f64,
    pub location: GeoLocation,
    pub label: String,
}

impl ImpactInputs {
    pub fn new(
        mass_kg: f64,
        impact_velocity_m_s: f64,
        location: GeoLocation,
        label: impl Into<String>,
    ) -> Result<Self> {
        location.validate()?;
        physics_engine::require_positive("mass", mass_kg)?;
        physics_engine::require_positive("impact velocity", impact_velocity_m_s)?;
        Ok(Self {
            mass_kg,
            impact_velocity_m_s,
            location,
            label: label.into(),
        })
    }

    /// Catalog/feed body: mass from size and density, entry-adjusted velocity.
    pub fn from_body(body: &AsteroidBody, location: GeoLocation) -> Result<Self> {
        let mass_kg = physics_engine::mass(body.diameter_m(), body.density_kg_m3())?;
        let velocity = physics_engine::impact_velocity(body.velocity_km_s())?;
        Self::new(mass_kg, velocity, location, body.name())
    }

    /// Manual entry: mass as typed, velocity converted km/s → m/s without the
    /// entry adjustment applied to catalog bodies.
    pub fn from_manual(mass_kg: f64, velocity_km_s: f64, location: GeoLocation) -> Result<Self> {
        Self::new(mass_kg, velocity_km_s * 1000.0, location, MANUAL_LABEL)
    }
}

/// Effect estimates for one impact. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResult {
    pub label: String,
    pub mass_kg: f64,
    pub impact_velocity_m_s: f64,
    pub kinetic_energy_j: f64,
    pub tnt_equivalent_kg: f64,
    pub blast_radius_m: f64,
    pub seismic_magnitude: f64,
    pub seismic_radius_m: f64,
    pub tsunami_radius_m: f64,
}

// =============================================================================
// OVERLAYS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayKind {
    Blast,
    Seismic,
    Tsunami,
}

impl OverlayKind {
    /// Draw order for each event
    pub const ALL: [OverlayKind; 3] = [
        OverlayKind::Blast,
        OverlayKind::Seismic,
        OverlayKind::Tsunami,
    ];

    pub fn stroke_color(self) -> &'static str {
        match self {
            OverlayKind::Blast => "red",
            OverlayKind::Seismic => "orange",
            OverlayKind::Tsunami => "blue",
        }
    }

    pub fn fill_color(self) -> &'static str {
        match self {
            OverlayKind::Blast => "#f03",
            OverlayKind::Seismic => "#ffa500",
            OverlayKind::Tsunami => "#00f",
        }
    }

    pub fn fill_opacity(self) -> f64 {
        match self {
            OverlayKind::Blast => 0.4,
            OverlayKind::Seismic => 0.2,
            OverlayKind::Tsunami => 0.1,
        }
    }

    pub fn radius_m(self, result: &ImpactResult) -> f64 {
        match self {
            OverlayKind::Blast => result.blast_radius_m,
            OverlayKind::Seismic => result.seismic_radius_m,
            OverlayKind::Tsunami => result.tsunami_radius_m,
        }
    }

    fn title(self) -> &'static str {
        match self {
            OverlayKind::Blast => "Meteor Impact",
            OverlayKind::Seismic => "Seismic Shaking",
            OverlayKind::Tsunami => "Tsunami Inundation",
        }
    }
}

/// Opaque handle issued by the renderer for one drawn overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OverlayHandle(pub u64);

/// Circle the renderer is asked to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySpec {
    pub kind: OverlayKind,
    pub center: GeoLocation,
    pub radius_m: f64,
    pub stroke_color: &'static str,
    pub fill_color: &'static str,
    pub fill_opacity: f64,
    pub popup_text: String,
}

impl OverlaySpec {
    pub fn for_result(kind: OverlayKind, center: GeoLocation, result: &ImpactResult) -> Self {
        let radius_m = kind.radius_m(result);
        let mut popup_text = format!(
            "{}\nAsteroid: {}\nMass: {} kg\nImpact velocity: {:.2} km/s\nRadius: {} m",
            kind.title(),
            result.label,
            format_exponential(result.mass_kg, 2),
            result.impact_velocity_m_s / 1000.0,
            radius_m.round(),
        );
        if kind == OverlayKind::Seismic {
            popup_text.push_str(&format!("\nMagnitude: {:.1}", result.seismic_magnitude));
        }

        Self {
            kind,
            center,
            radius_m,
            stroke_color: kind.stroke_color(),
            fill_color: kind.fill_color(),
            fill_opacity: kind.fill_opacity(),
            popup_text,
        }
    }
}

// =============================================================================
// REGISTRY ENTRY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "impact-{}", self.0)
    }
}

/// One rendered impact. Owned by the registry until clear-all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactEvent {
    pub(crate) id: EventId,
    pub(crate) location: GeoLocation,
    pub(crate) result: ImpactResult,
    /// Indexed in [`OverlayKind::ALL`] order
    pub(crate) overlays: [OverlayHandle; 3],
}

impl ImpactEvent {
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn location(&self) -> GeoLocation {
        self.location
    }

    pub fn result(&self) -> &ImpactResult {
        &self.result
    }

    pub fn overlays(&self) -> &[OverlayHandle; 3] {
        &self.overlays
    }

    pub fn overlay(&self, kind: OverlayKind) -> OverlayHandle {
        match kind {
            OverlayKind::Blast => self.overlays[0],
            OverlayKind::Seismic => self.overlays[1],
            OverlayKind::Tsunami => self.overlays[2],
        }
    }
}

// =============================================================================
// DISPLAY SUMMARY
// =============================================================================

/// Text-panel summary of an impact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactSummary {
    pub name: String,
    /// Present for catalog/feed bodies only
    pub diameter_m: Option<f64>,
    /// Approach velocity as selected or typed (km/s)
    pub velocity_km_s: f64,
    pub impact_velocity_km_s: f64,
    pub mass_kg: f64,
    /// e.g. "7.94e+10"
    pub mass_display: String,
    pub kinetic_energy_j: f64,
    pub blast_radius_m: f64,
    pub seismic_magnitude: f64,
    pub seismic_radius_m: f64,
    pub tsunami_radius_m: f64,
}

impl ImpactSummary {
    pub fn for_body(body: &AsteroidBody, result: &ImpactResult) -> Self {
        Self::build(Some(body.diameter_m()), body.velocity_km_s(), result)
    }

    pub fn for_manual(velocity_km_s: f64, result: &ImpactResult) -> Self {
        Self::build(None, velocity_km_s, result)
    }

    fn build(diameter_m: Option<f64>, velocity_km_s: f64, result: &ImpactResult) -> Self {
        Self {
            name: result.label.clone(),
            diameter_m,
            velocity_km_s,
            impact_velocity_km_s: result.impact_velocity_m_s / 1000.0,
            mass_kg: result.mass_kg,
            mass_display: format_exponential(result.mass_kg, 2),
            kinetic_energy_j: result.kinetic_energy_j,
            blast_radius_m: result.blast_radius_m.round(),
            seismic_magnitude: (result.seismic_magnitude * 10.0).round() / 10.0,
            seismic_radius_m: result.seismic_radius_m.round(),
            tsunami_radius_m: result.tsunami_radius_m.round(),
        }
    }
}

/// Exponential notation with an explicit exponent sign ("7.94e+10", "1.50e-3").
pub fn format_exponential(value: f64, digits: usize) -> String {
    let raw = format!("{value:.digits$e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => raw,
    }
}

// =============================================================================
// TESTS
// =============================================================================
