// Asteroid Catalog - preset bodies and the NASA NeoWs feed adapter
// Feed bodies arrive asynchronously from an external fetcher via LiveFeedCache

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ImpactError, Result};
use crate::physics_engine;

/// Density assumed for feed bodies (kg/m³).
///
/// NeoWs does not report density; 2000 kg/m³ is a rubble-pile average and only
/// an approximation.
pub const DEFAULT_FEED_DENSITY_KG_M3: f64 = 2000.0;

// =============================================================================
// ASTEROID BODY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodySource {
    Preset,
    LiveFeed,
}

/// Physical description of one selectable body. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsteroidBody {
    id: String,
    name: String,
    diameter_m: f64,
    velocity_km_s: f64,
    density_kg_m3: f64,
    source: BodySource,
    approach_date: Option<NaiveDate>,
}

impl AsteroidBody {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        diameter_m: f64,
        velocity_km_s: f64,
        density_kg_m3: f64,
    ) -> Result<Self> {
        physics_engine::require_positive("diameter", diameter_m)?;
        physics_engine::require_positive("velocity", velocity_km_s)?;
        physics_engine::require_positive("density", density_kg_m3)?;
        Ok(Self {
            id: id.into(),
            name: name.into(),
            diameter_m,
            velocity_km_s,
            density_kg_m3,
            source: BodySource::Preset,
            approach_date: None,
        })
    }

    fn into_feed_body(self, approach_date: Option<NaiveDate>) -> Self {
        Self {
            source: BodySource::LiveFeed,
            approach_date,
            ..self
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn diameter_m(&self) -> f64 {
        self.diameter_m
    }

    pub fn velocity_km_s(&self) -> f64 {
        self.velocity_km_s
    }

    pub fn density_kg_m3(&self) -> f64 {
        self.density_kg_m3
    }

    pub fn source(&self) -> BodySource {
        self.source
    }

    /// Close-approach date for feed bodies
    pub fn approach_date(&self) -> Option<NaiveDate> {
        self.approach_date
    }

    pub fn mass_kg(&self) -> Result<f64> {
        physics_engine::mass(self.diameter_m, self.density_kg_m3)
    }

    fn matches(&self, key: &str) -> bool {
        self.id == key || self.name.eq_ignore_ascii_case(key)
    }
}

// =============================================================================
// PRESETS
// =============================================================================

/// (SPK id, name, diameter m, velocity km/s, density kg/m³)
const PRESETS: [(&str, &str, f64, f64, f64); 8] = [
    ("99942", "Apophis", 370.0, 7.4, 3000.0),
    ("2000433", "Eros", 34_400.0, 5.9, 2700.0),
    ("101955", "Bennu", 492.0, 12.0, 1200.0),
    ("25143", "Itokawa", 535.0, 6.1, 1900.0),
    ("162173", "Ryugu", 900.0, 5.0, 1300.0),
    ("243", "Ida", 15_000.0, 5.3, 2600.0),
    ("3122", "Florence", 4400.0, 13.3, 2700.0),
    ("52768", "1998 OR2", 2800.0, 7.1, 2500.0),
];

pub fn preset_bodies() -> Vec<AsteroidBody> {
    PRESETS
        .iter()
        .map(|&(id, name, diameter, velocity, density)| AsteroidBody {
            id: id.to_string(),
            name: name.to_string(),
            diameter_m: diameter,
            velocity_km_s: velocity,
            density_kg_m3: density,
            source: BodySource::Preset,
            approach_date: None,
        })
        .collect()
}

// =============================================================================
// FEED RESPONSE TYPES
// =============================================================================

/// Records stay as raw JSON so one malformed object cannot sink the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeoFeedResponse {
    pub near_earth_objects: Option<HashMap<String, Vec<serde_json::Value>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeoObject {
    pub id: String,
    pub name: String,
    pub estimated_diameter: Option<EstimatedDiameter>,
    pub close_approach_data: Option<Vec<CloseApproachData>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatedDiameter {
    pub meters: Option<DiameterRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiameterRange {
    pub estimated_diameter_min: Option<f64>,
    pub estimated_diameter_max: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseApproachData {
    pub relative_velocity: Option<RelativeVelocity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativeVelocity {
    /// NeoWs sends numbers as strings
    pub kilometers_per_second: Option<String>,
}

impl NeoObject {
    /// Convert a feed record into a body, rejecting records the engine cannot use.
    pub fn to_body(&self, approach_date: Option<NaiveDate>) -> Result<AsteroidBody> {
        let invalid = |detail: &str| {
            ImpactError::InvalidPhysicalInput(format!(
                "feed object {} ({}): {detail}",
                self.id, self.name
            ))
        };

        let range = self
            .estimated_diameter
            .as_ref()
            .and_then(|d| d.meters.as_ref())
            .ok_or_else(|| invalid("missing estimated diameter in meters"))?;
        let (Some(min), Some(max)) = (range.estimated_diameter_min, range.estimated_diameter_max)
        else {
            return Err(invalid("incomplete diameter range"));
        };
        let diameter = (min + max) / 2.0;

        let velocity = self
            .close_approach_data
            .as_ref()
            .and_then(|approaches| approaches.first())
            .and_then(|ca| ca.relative_velocity.as_ref())
            .and_then(|v| v.kilometers_per_second.as_ref())
            .ok_or_else(|| invalid("missing close-approach velocity"))?;
        let velocity: f64 = velocity
            .trim()
            .parse()
            .map_err(|_| invalid(&format!("velocity {velocity:?} is not a number")))?;

        let body = AsteroidBody::new(
            self.id.clone(),
            self.name.clone(),
            diameter,
            velocity,
            DEFAULT_FEED_DENSITY_KG_M3,
        )
        .map_err(|e| invalid(&e.to_string()))?;

        Ok(body.into_feed_body(approach_date))
    }
}

/// Parse a NeoWs feed document into bodies ordered by approach date.
///
/// Malformed date keys and unusable records are skipped with a warning; only a
/// document that is not valid feed JSON is an error.
pub fn parse_feed(json: &str) -> Result<Vec<AsteroidBody>> {
    let response: NeoFeedResponse = serde_json::from_str(json)?;

    let mut by_date: BTreeMap<NaiveDate, Vec<serde_json::Value>> = BTreeMap::new();
    for (key, records) in response.near_earth_objects.unwrap_or_default() {
        match NaiveDate::parse_from_str(&key, "%Y-%m-%d") {
            Ok(date) => by_date.entry(date).or_default().extend(records),
            Err(e) => warn!(key = %key, error = %e, "skipping entries under malformed date key"),
        }
    }

    let mut bodies = Vec::new();
    for (date, records) in by_date {
        for record in records {
            let body = serde_json::from_value::<NeoObject>(record)
                .map_err(ImpactError::from)
                .and_then(|neo| neo.to_body(Some(date)));
            match body {
                Ok(body) => bodies.push(body),
                Err(e) => warn!(%date, error = %e, "skipping feed object"),
            }
        }
    }
    debug!(count = bodies.len(), "parsed feed");
    Ok(bodies)
}

// =============================================================================
// LIVE FEED CACHE
// =============================================================================

/// Shared list of feed bodies written by the external fetcher.
///
/// Cloning yields another handle to the same list.
#[derive(Clone)]
pub struct LiveFeedCache {
    bodies: Arc<RwLock<Vec<AsteroidBody>>>,
    last_update: Arc<RwLock<Option<DateTime<Utc>>>>,
    cache_duration: chrono::Duration,
}

impl LiveFeedCache {
    pub fn new(cache_duration: chrono::Duration) -> Self {
        Self {
            bodies: Arc::new(RwLock::new(Vec::new())),
            last_update: Arc::new(RwLock::new(None)),
            cache_duration,
        }
    }

    pub fn bodies(&self) -> Vec<AsteroidBody> {
        self.bodies.read().clone()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.read().len()
    }

    pub fn find(&self, key: &str) -> Option<AsteroidBody> {
        self.bodies.read().iter().find(|b| b.matches(key)).cloned()
    }

    pub fn set_bodies(&self, bodies: Vec<AsteroidBody>) {
        self.set_bodies_at(bodies, Utc::now());
    }

    fn set_bodies_at(&self, bodies: Vec<AsteroidBody>, now: DateTime<Utc>) {
        info!(count = bodies.len(), "live feed updated");
        *self.bodies.write() = bodies;
        *self.last_update.write() = Some(now);
    }

    /// Replace the live list from a fetched feed document.
    ///
    /// Parse failures are logged and leave the previous list in place.
    /// Returns the number of bodies now cached from this document.
    pub fn ingest_json(&self, json: &str) -> usize {
        match parse_feed(json) {
            Ok(bodies) => {
                let count = bodies.len();
                self.set_bodies(bodies);
                count
            }
            Err(e) => {
                self.report_failure(&e);
                0
            }
        }
    }

    /// Record a fetch failure from the external fetcher.
    pub fn report_failure(&self, error: &dyn std::fmt::Display) {
        warn!(error = %error, cached = self.body_count(), "live feed update failed");
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        *self.last_update.read()
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        match *self.last_update.read() {
            Some(last) => now - last < self.cache_duration,
            None => false,
        }
    }
}

impl Default for LiveFeedCache {
    fn default() -> Self {
        Self::new(chrono::Duration::hours(1))
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// Presets plus whatever the live feed currently holds.
#[derive(Clone)]
pub struct AsteroidCatalog {
    presets: Vec<AsteroidBody>,
    live: LiveFeedCache,
}

impl AsteroidCatalog {
    pub fn new(live: LiveFeedCache) -> Self {
        Self {
            presets: preset_bodies(),
            live,
        }
    }

    pub fn presets(&self) -> &[AsteroidBody] {
        &self.presets
    }

    pub fn live_feed(&self) -> &LiveFeedCache {
        &self.live
    }

    /// Presets first, then live bodies in approach-date order.
    pub fn bodies(&self) -> Vec<AsteroidBody> {
        let mut all = self.presets.clone();
        all.extend(self.live.bodies());
        all
    }

    /// Look up by id or case-insensitive name; presets win on collision.
    pub fn find(&self, key: &str) -> Option<AsteroidBody> {
        let key = key.trim();
        self.presets
            .iter()
            .find(|b| b.matches(key))
            .cloned()
            .or_else(|| self.live.find(key))
    }
}

impl Default for AsteroidCatalog {
    fn default() -> Self {
        Self::new(LiveFeedCache::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FEED: &str = r#"{
        "element_count": 4,
        "near_earth_objects": {
            "2024-03-02": [
                {
                    "id": "3542519",
                    "name": "(2010 PK9)",
                    "estimated_diameter": {
                        "meters": { "estimated_diameter_min": 100.0, "estimated_diameter_max": 300.0 }
                    },
                    "close_approach_data": [
                        { "close_approach_date": "2024-03-02",
                          "relative_velocity": { "kilometers_per_second": "14.25" } }
                    ]
                },
                {
                    "id": "bad-diameter",
                    "name": "Negative",
                    "estimated_diameter": {
                        "meters": { "estimated_diameter_min": -50.0, "estimated_diameter_max": -10.0 }
                    },
                    "close_approach_data": [
                        { "relative_velocity": { "kilometers_per_second": "5.0" } }
                    ]
                }
            ],
            "2024-03-01": [
                {
                    "id": "2465633",
                    "name": "465633 (2009 JR5)",
                    "estimated_diameter": {
                        "meters": { "estimated_diameter_min": 200.0, "estimated_diameter_max": 400.0 }
                    },
                    "close_approach_data": [
                        { "relative_velocity": { "kilometers_per_second": "18.1" } }
                    ]
                },
                {
                    "id": "no-velocity",
                    "name": "Silent",
                    "estimated_diameter": {
                        "meters": { "estimated_diameter_min": 10.0, "estimated_diameter_max": 20.0 }
                    },
                    "close_approach_data": []
                }
            ],
            "not-a-date": [
                {
                    "id": "orphan",
                    "name": "Orphan",
                    "estimated_diameter": {
                        "meters": { "estimated_diameter_min": 10.0, "estimated_diameter_max": 20.0 }
                    },
                    "close_approach_data": [
                        { "relative_velocity": { "kilometers_per_second": "5.0" } }
                    ]
                }
            ]
        }
    }"#;

    #[test]
    fn test_presets_contain_apophis() {
        let catalog = AsteroidCatalog::default();
        assert_eq!(catalog.presets().len(), 8);
        let apophis = catalog.find("apophis").unwrap();
        assert_eq!(apophis.id(), "99942");
        assert_eq!(apophis.diameter_m(), 370.0);
        assert_eq!(apophis.velocity_km_s(), 7.4);
        assert_eq!(apophis.density_kg_m3(), 3000.0);
        assert_eq!(apophis.source(), BodySource::Preset);
        assert_eq!(catalog.find("99942").unwrap().name(), "Apophis");
        assert!(catalog.find("Vesta").is_none());
    }

    #[test]
    fn test_body_rejects_non_positive_values() {
        assert!(AsteroidBody::new("x", "x", 0.0, 5.0, 2000.0).is_err());
        assert!(AsteroidBody::new("x", "x", 10.0, -5.0, 2000.0).is_err());
        assert!(AsteroidBody::new("x", "x", 10.0, 5.0, f64::NAN).is_err());
    }

    #[test]
    fn test_parse_feed_orders_by_date_and_skips_bad_records() {
        let bodies = parse_feed(FEED).unwrap();
        let ids: Vec<_> = bodies.iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec!["2465633", "3542519"]);

        let first = &bodies[0];
        assert_relative_eq!(first.diameter_m(), 300.0);
        assert_relative_eq!(first.velocity_km_s(), 18.1);
        assert_eq!(first.density_kg_m3(), DEFAULT_FEED_DENSITY_KG_M3);
        assert_eq!(first.source(), BodySource::LiveFeed);
        assert_eq!(first.approach_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_malformed_record_does_not_drop_its_neighbours() {
        let feed = r#"{
            "near_earth_objects": {
                "2024-05-10": [
                    {
                        "id": "null-diameter",
                        "name": "Nullish",
                        "estimated_diameter": {
                            "meters": { "estimated_diameter_min": null, "estimated_diameter_max": 40.0 }
                        },
                        "close_approach_data": [
                            { "relative_velocity": { "kilometers_per_second": "9.0" } }
                        ]
                    },
                    { "id": 17, "name": ["not", "a", "name"] },
                    {
                        "id": "54321",
                        "name": "Keeper",
                        "estimated_diameter": {
                            "meters": { "estimated_diameter_min": 50.0, "estimated_diameter_max": 70.0 }
                        },
                        "close_approach_data": [
                            { "relative_velocity": { "kilometers_per_second": "11.5" } }
                        ]
                    }
                ]
            }
        }"#;

        let bodies = parse_feed(feed).unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].id(), "54321");
        assert_relative_eq!(bodies[0].diameter_m(), 60.0);

        let cache = LiveFeedCache::default();
        assert_eq!(cache.ingest_json(feed), 1);
        assert_eq!(cache.body_count(), 1);
    }

    #[test]
    fn test_parse_feed_rejects_invalid_json() {
        assert!(matches!(parse_feed("[1, 2"), Err(ImpactError::FeedParse(_))));
    }

    #[test]
    fn test_parse_feed_without_objects_is_empty() {
        assert!(parse_feed(r#"{"element_count": 0}"#).unwrap().is_empty());
    }

    #[test]
    fn test_ingest_populates_catalog_through_shared_cache() {
        let cache = LiveFeedCache::default();
        let catalog = AsteroidCatalog::new(cache.clone());
        assert_eq!(catalog.bodies().len(), 8);

        assert_eq!(cache.ingest_json(FEED), 2);
        assert_eq!(catalog.bodies().len(), 10);
        assert_eq!(catalog.find("(2010 pk9)").unwrap().id(), "3542519");
        assert!(cache.is_fresh());
    }

    #[test]
    fn test_failed_ingest_keeps_previous_bodies() {
        let cache = LiveFeedCache::default();
        cache.ingest_json(FEED);
        assert_eq!(cache.ingest_json("garbage"), 0);
        assert_eq!(cache.body_count(), 2);
    }

    #[test]
    fn test_cache_freshness_window() {
        let cache = LiveFeedCache::new(chrono::Duration::minutes(10));
        assert!(!cache.is_fresh());

        let t0 = Utc::now();
        cache.set_bodies_at(Vec::new(), t0);
        assert!(cache.is_fresh_at(t0 + chrono::Duration::minutes(9)));
        assert!(!cache.is_fresh_at(t0 + chrono::Duration::minutes(11)));
    }
}
