// Impact Registry - active impacts and the overlays drawn for them
// Registry contents and rendered overlays stay in 1:1 correspondence

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::Result;
use crate::impact_model::{
    EventId, GeoLocation, ImpactEvent, ImpactResult, OverlayHandle, OverlayKind, OverlaySpec,
};

// =============================================================================
// RENDERER SEAM
// =============================================================================

/// External map renderer that draws and removes circle overlays.
pub trait OverlayRenderer {
    fn create_overlay(&mut self, spec: &OverlaySpec) -> OverlayHandle;
    fn remove_overlay(&mut self, handle: OverlayHandle);
}

/// Headless renderer: keeps live overlays in memory and counts requests.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    next_handle: u64,
    live: BTreeMap<OverlayHandle, OverlaySpec>,
    created: usize,
    removed: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlay(&self, handle: OverlayHandle) -> Option<&OverlaySpec> {
        self.live.get(&handle)
    }

    pub fn live_overlays(&self) -> impl Iterator<Item = (&OverlayHandle, &OverlaySpec)> {
        self.live.iter()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total create requests received
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Total remove requests received
    pub fn removed_count(&self) -> usize {
        self.removed
    }
}

impl OverlayRenderer for RecordingRenderer {
    fn create_overlay(&mut self, spec: &OverlaySpec) -> OverlayHandle {
        self.next_handle += 1;
        let handle = OverlayHandle(self.next_handle);
        self.live.insert(handle, spec.clone());
        self.created += 1;
        handle
    }

    fn remove_overlay(&mut self, handle: OverlayHandle) {
        self.live.remove(&handle);
        self.removed += 1;
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

pub struct ImpactRegistry<R: OverlayRenderer> {
    renderer: R,
    events: Vec<ImpactEvent>,
    next_id: u64,
}

impl<R: OverlayRenderer> ImpactRegistry<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            events: Vec::new(),
            next_id: 0,
        }
    }

    /// Draw the blast, seismic and tsunami circles for `result` and keep the event.
    pub fn add_event(
        &mut self,
        location: GeoLocation,
        result: ImpactResult,
    ) -> Result<&ImpactEvent> {
        location.validate()?;

        let overlays = OverlayKind::ALL.map(|kind| {
            let spec = OverlaySpec::for_result(kind, location, &result);
            self.renderer.create_overlay(&spec)
        });

        self.next_id += 1;
        let event = ImpactEvent {
            id: EventId(self.next_id),
            location,
            result,
            overlays,
        };
        info!(
            id = %event.id,
            label = %event.result.label,
            lat = location.lat,
            lng = location.lng,
            blast_radius_m = event.result.blast_radius_m,
            "impact added"
        );

        self.events.push(event);
        // Just pushed, so the vec is non-empty
        Ok(&self.events[self.events.len() - 1])
    }

    /// Remove every overlay and forget every event. Returns overlays removed.
    pub fn clear_all(&mut self) -> usize {
        if self.events.is_empty() {
            debug!("clear requested on empty registry");
            return 0;
        }

        let mut removed = 0;
        for event in self.events.drain(..) {
            for handle in event.overlays {
                self.renderer.remove_overlay(handle);
                removed += 1;
            }
        }
        info!(removed, "cleared all impacts");
        removed
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[ImpactEvent] {
        &self.events
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

// =============================================================================
// TESTS
// =============================================================================
