// Physics Engine - Impact Effect Estimates
// Closed-form approximations for mass, entry velocity, blast, seismic and tsunami effects

use std::f64::consts::PI;

use tracing::debug;

use crate::error::{ImpactError, Result};
use crate::impact_model::{ImpactInputs, ImpactResult};

// =============================================================================
// PHYSICAL CONSTANTS (SI Units)
// =============================================================================

/// Earth's escape velocity squared (m²/s²), ≈ (11.2 km/s)²
pub const EARTH_ESCAPE_VELOCITY_SQ: f64 = 125_440_000.0;

/// Energy released per kilogram of TNT (J/kg)
pub const JOULES_PER_KG_TNT: f64 = 4_184_000.0;

/// Calibration constant K in the blast scaling law r = K · W^(1/3)
///
/// Earlier revisions used 22.0; 58.6 is the value the final revision settled on.
pub const BLAST_RADIUS_COEFFICIENT: f64 = 58.6;

/// Exponent of the cube-root blast scaling law
pub const BLAST_SCALING_EXPONENT: f64 = 1.0 / 3.0;

/// Fraction of kinetic energy converted to ground-shaking energy
pub const SEISMIC_EFFICIENCY: f64 = 1e-2;

/// Gutenberg-Richter energy relation: log10(E) = 4.8 + 1.5·M
pub const SEISMIC_LOG_ENERGY_OFFSET: f64 = 4.8;
pub const SEISMIC_LOG_ENERGY_SLOPE: f64 = 1.5;

/// Fraction of kinetic energy coupled into water waves
pub const WATER_COUPLING_EFFICIENCY: f64 = 1e-3;

/// Sea water density (kg/m³)
pub const WATER_DENSITY: f64 = 1000.0;

/// Surface gravity (m/s²)
pub const SURFACE_GRAVITY: f64 = 9.81;

/// Ocean surface area over which wave energy is spread (m²)
pub const TSUNAMI_IMPACT_AREA: f64 = 1e10;

/// Average coastal slope (rise over run)
pub const COASTAL_SLOPE: f64 = 0.01;

// =============================================================================
// INPUT GUARDS
// =============================================================================

fn require_finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ImpactError::InvalidPhysicalInput(format!(
            "{name} must be a finite number, got {value}"
        )))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<f64> {
    let value = require_finite(name, value)?;
    if value < 0.0 {
        return Err(ImpactError::InvalidPhysicalInput(format!(
            "{name} must not be negative, got {value}"
        )));
    }
    Ok(value)
}

pub(crate) fn require_positive(name: &str, value: f64) -> Result<f64> {
    let value = require_finite(name, value)?;
    if value <= 0.0 {
        return Err(ImpactError::InvalidPhysicalInput(format!(
            "{name} must be greater than zero, got {value}"
        )));
    }
    Ok(value)
}

// =============================================================================
// BODY PROPERTIES
// =============================================================================

/// Mass of a spherical body: (4/3)·π·(d/2)³·ρ
pub fn mass(diameter_m: f64, density_kg_m3: f64) -> Result<f64> {
    let diameter = require_non_negative("diameter", diameter_m)?;
    let density = require_non_negative("density", density_kg_m3)?;

    let radius = diameter / 2.0;
    let volume = (4.0 / 3.0) * PI * radius.powi(3);
    Ok(volume * density)
}

/// Surface impact velocity (m/s) from a deep-space approach velocity (km/s)
///
/// Adds Earth's escape-velocity contribution in quadrature:
/// v_impact = sqrt((v·1000)² + v_esc²)
pub fn impact_velocity(approach_velocity_km_s: f64) -> Result<f64> {
    let v = require_non_negative("approach velocity", approach_velocity_km_s)? * 1000.0;
    Ok((v * v + EARTH_ESCAPE_VELOCITY_SQ).sqrt())
}

// =============================================================================
// ENERGY
// =============================================================================

/// Kinetic energy 0.5·m·v² (J)
pub fn kinetic_energy_joules(mass_kg: f64, velocity_m_s: f64) -> Result<f64> {
    let m = require_positive("mass", mass_kg)?;
    let v = require_positive("velocity", velocity_m_s)?;
    Ok(0.5 * m * v * v)
}

/// TNT-equivalent charge (kg of TNT) for an energy in joules
pub fn tnt_equivalent_kg(energy_j: f64) -> Result<f64> {
    let energy = require_non_negative("energy", energy_j)?;
    Ok(energy / JOULES_PER_KG_TNT)
}

/// Share of the kinetic energy that becomes seismic energy (J)
pub fn seismic_energy_joules(kinetic_energy_j: f64) -> Result<f64> {
    Ok(require_non_negative("kinetic energy", kinetic_energy_j)? * SEISMIC_EFFICIENCY)
}

/// Share of the kinetic energy that becomes wave energy (J)
pub fn wave_energy_joules(kinetic_energy_j: f64) -> Result<f64> {
    Ok(require_non_negative("kinetic energy", kinetic_energy_j)? * WATER_COUPLING_EFFICIENCY)
}

// =============================================================================
// EFFECTS
// =============================================================================

/// Ground destruction radius (m) via cube-root TNT scaling: K · W^(1/3)
pub fn blast_radius_meters(mass_kg: f64, velocity_m_s: f64) -> Result<f64> {
    let energy = kinetic_energy_joules(mass_kg, velocity_m_s)?;
    let w_tnt = tnt_equivalent_kg(energy)?;
    // cbrt is the exact form of W^BLAST_SCALING_EXPONENT
    Ok(BLAST_RADIUS_COEFFICIENT * w_tnt.cbrt())
}

/// Richter-like magnitude from seismic energy: (log10(E) - 4.8) / 1.5
pub fn seismic_magnitude(seismic_energy_j: f64) -> Result<f64> {
    let energy = require_positive("seismic energy", seismic_energy_j)?;
    Ok((energy.log10() - SEISMIC_LOG_ENERGY_OFFSET) / SEISMIC_LOG_ENERGY_SLOPE)
}

/// Felt radius (m) for a magnitude: 10^(0.5·M - 1) · 1000
pub fn seismic_radius_meters(magnitude: f64) -> Result<f64> {
    let m = require_finite("magnitude", magnitude)?;
    Ok(10f64.powf(0.5 * m - 1.0) * 1000.0)
}

/// Wave height h = sqrt(2·E / (ρ·g·A)) (m)
pub fn wave_height_meters(wave_energy_j: f64) -> Result<f64> {
    let energy = require_non_negative("wave energy", wave_energy_j)?;
    Ok((2.0 * energy / (WATER_DENSITY * SURFACE_GRAVITY * TSUNAMI_IMPACT_AREA)).sqrt())
}

/// Inland inundation distance (m) = wave height / coastal slope
pub fn tsunami_inundation_meters(wave_energy_j: f64) -> Result<f64> {
    Ok(wave_height_meters(wave_energy_j)? / COASTAL_SLOPE)
}

// =============================================================================
// FULL IMPACT
// =============================================================================

/// Run every estimate for one set of resolved inputs.
///
/// Inputs are re-validated here so a result can never carry NaN or infinite
/// values, even when the caller skipped [`ImpactInputs::new`].
pub fn compute_impact(inputs: &ImpactInputs) -> Result<ImpactResult> {
    let mass_kg = require_positive("mass", inputs.mass_kg)?;
    let velocity = require_positive("impact velocity", inputs.impact_velocity_m_s)?;

    let kinetic_energy_j = kinetic_energy_joules(mass_kg, velocity)?;
    let tnt_equivalent_kg = tnt_equivalent_kg(kinetic_energy_j)?;
    let blast_radius_m = blast_radius_meters(mass_kg, velocity)?;
    let seismic_magnitude = seismic_magnitude(seismic_energy_joules(kinetic_energy_j)?)?;
    let seismic_radius_m = seismic_radius_meters(seismic_magnitude)?;
    let tsunami_radius_m = tsunami_inundation_meters(wave_energy_joules(kinetic_energy_j)?)?;

    // Overflow (e.g. absurd manual mass) must not leak out as inf
    for (name, value) in [
        ("kinetic energy", kinetic_energy_j),
        ("blast radius", blast_radius_m),
        ("seismic radius", seismic_radius_m),
        ("tsunami radius", tsunami_radius_m),
    ] {
        require_finite(name, value)?;
    }

    debug!(
        label = %inputs.label,
        mass_kg,
        velocity,
        kinetic_energy_j,
        blast_radius_m,
        seismic_magnitude,
        "computed impact effects"
    );

    Ok(ImpactResult {
        label: inputs.label.clone(),
        mass_kg,
        impact_velocity_m_s: velocity,
        kinetic_energy_j,
        tnt_equivalent_kg,
        blast_radius_m,
        seismic_magnitude,
        seismic_radius_m,
        tsunami_radius_m,
    })
}

// =============================================================================
// TESTS
// =============================================================================
