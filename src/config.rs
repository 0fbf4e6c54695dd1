// Simulator configuration
// Read from the process environment, with an optional .env file loaded first

use serde::{Deserialize, Serialize};

use crate::error::{ImpactError, Result};
use crate::impact_model::GeoLocation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Map center restored on reset
    pub default_center: GeoLocation,
    pub default_zoom: u8,
    /// Manual-entry field defaults restored on reset
    pub manual_mass_kg: f64,
    pub manual_velocity_km_s: f64,
    /// How long a fetched feed counts as fresh
    pub feed_cache_secs: i64,
    /// Passed through to the external feed fetcher
    pub nasa_api_key: Option<String>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            default_center: GeoLocation { lat: 20.0, lng: 0.0 },
            default_zoom: 2,
            manual_mass_kg: 1000.0,
            manual_velocity_km_s: 20.0,
            feed_cache_secs: 3600,
            nasa_api_key: None,
        }
    }
}

impl SimulatorConfig {
    /// Load `.env` (if present) and read overrides from the environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(lat) = parse_var::<f64, _>(&lookup, "IMPACTSIM_DEFAULT_LAT")? {
            config.default_center.lat = lat;
        }
        if let Some(lng) = parse_var::<f64, _>(&lookup, "IMPACTSIM_DEFAULT_LNG")? {
            config.default_center.lng = lng;
        }
        let center = config.default_center;
        if GeoLocation::new(center.lat, 0.0).is_err() {
            return Err(ImpactError::Config {
                key: "IMPACTSIM_DEFAULT_LAT",
                value: center.lat.to_string(),
            });
        }
        if !center.lng.is_finite() {
            return Err(ImpactError::Config {
                key: "IMPACTSIM_DEFAULT_LNG",
                value: center.lng.to_string(),
            });
        }
        if let Some(zoom) = parse_var::<u8, _>(&lookup, "IMPACTSIM_DEFAULT_ZOOM")? {
            config.default_zoom = zoom;
        }
        if let Some(mass) = parse_var::<f64, _>(&lookup, "IMPACTSIM_MANUAL_MASS_KG")? {
            config.manual_mass_kg = require_positive("IMPACTSIM_MANUAL_MASS_KG", mass)?;
        }
        if let Some(velocity) = parse_var::<f64, _>(&lookup, "IMPACTSIM_MANUAL_VELOCITY_KM_S")? {
            config.manual_velocity_km_s =
                require_positive("IMPACTSIM_MANUAL_VELOCITY_KM_S", velocity)?;
        }
        if let Some(secs) = parse_var::<i64, _>(&lookup, "IMPACTSIM_FEED_CACHE_SECS")? {
            if secs < 0 || chrono::Duration::try_seconds(secs).is_none() {
                return Err(ImpactError::Config {
                    key: "IMPACTSIM_FEED_CACHE_SECS",
                    value: secs.to_string(),
                });
            }
            config.feed_cache_secs = secs;
        }
        config.nasa_api_key = lookup("NASA_API_KEY").filter(|k| !k.trim().is_empty());

        Ok(config)
    }

    /// Out-of-range values (only reachable by editing the field) saturate.
    pub fn feed_cache_duration(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.feed_cache_secs).unwrap_or(chrono::Duration::MAX)
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ImpactError::Config { key, value: raw }),
    }
}

fn require_positive(key: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ImpactError::Config {
            key,
            value: value.to_string(),
        })
    }
}
