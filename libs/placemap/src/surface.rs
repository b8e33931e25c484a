use std::collections::BTreeMap;
use tracing::debug;

use crate::geo::{LatLng, LatLngBounds};

/// Opaque id for a pin placed on a [`RenderSurface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(pub u64);

impl std::fmt::Display for MarkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerSpec {
    pub position: LatLng,
    pub title: String,
    pub icon: Option<String>,
}

/// The map the view model draws on.
///
/// Only the marker registry touches marker handles; the view model itself
/// only pans, fits and opens info panels. Clicks travel the other way, via
/// [`crate::view::ViewModel::marker_clicked`].
pub trait RenderSurface {
    /// Places a new pin and attaches it to the map.
    fn place_marker(&mut self, spec: MarkerSpec) -> MarkerHandle;
    /// Shows or hides an existing pin without dropping it.
    fn set_attached(&mut self, handle: MarkerHandle, attached: bool);
    /// Detaches the pin and releases the handle. Unknown handles are a no-op.
    fn remove_marker(&mut self, handle: MarkerHandle);
    fn pan_to(&mut self, position: LatLng);
    fn fit_bounds(&mut self, bounds: LatLngBounds);
    fn open_info_panel(&mut self, handle: MarkerHandle, content: &str);
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedMarker {
    pub spec: MarkerSpec,
    pub attached: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OpenPanel {
    pub handle: MarkerHandle,
    pub content: String,
}

/// Headless surface that keeps the whole map state in memory.
#[derive(Debug, Default)]
pub struct MemorySurface {
    next_handle: u64,
    markers: BTreeMap<MarkerHandle, PlacedMarker>,
    pub center: Option<LatLng>,
    pub bounds: Option<LatLngBounds>,
    pub info_panel: Option<OpenPanel>,
    pub removed: usize,
}

impl MemorySurface {
    pub fn marker(&self, handle: MarkerHandle) -> Option<&PlacedMarker> {
        self.markers.get(&handle)
    }

    pub fn is_attached(&self, handle: MarkerHandle) -> bool {
        self.markers.get(&handle).is_some_and(|m| m.attached)
    }

    /// Pins that have been placed and not removed, attached or not.
    pub fn live_count(&self) -> usize {
        self.markers.len()
    }

    pub fn attached_count(&self) -> usize {
        self.markers.values().filter(|m| m.attached).count()
    }

    pub fn attached_handles(&self) -> Vec<MarkerHandle> {
        self.markers
            .iter()
            .filter(|(_, m)| m.attached)
            .map(|(h, _)| *h)
            .collect()
    }

    pub fn attached_titles(&self) -> Vec<&str> {
        self.markers
            .values()
            .filter(|m| m.attached)
            .map(|m| m.spec.title.as_str())
            .collect()
    }
}

impl RenderSurface for MemorySurface {
    fn place_marker(&mut self, spec: MarkerSpec) -> MarkerHandle {
        self.next_handle += 1;
        let handle = MarkerHandle(self.next_handle);
        self.markers.insert(
            handle,
            PlacedMarker {
                spec,
                attached: true,
            },
        );
        handle
    }

    fn set_attached(&mut self, handle: MarkerHandle, attached: bool) {
        if let Some(marker) = self.markers.get_mut(&handle) {
            marker.attached = attached;
        }
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        if self.markers.remove(&handle).is_some() {
            self.removed += 1;
        }
        if self.info_panel.as_ref().is_some_and(|p| p.handle == handle) {
            self.info_panel = None;
        }
    }

    fn pan_to(&mut self, position: LatLng) {
        self.center = Some(position);
    }

    fn fit_bounds(&mut self, bounds: LatLngBounds) {
        self.bounds = Some(bounds);
    }

    fn open_info_panel(&mut self, handle: MarkerHandle, content: &str) {
        self.info_panel = Some(OpenPanel {
            handle,
            content: content.to_string(),
        });
    }
}

/// Wraps another surface and traces every call on it.
#[derive(Debug, Default)]
pub struct LogSurface<S> {
    pub inner: S,
}

impl<S> LogSurface<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: RenderSurface> RenderSurface for LogSurface<S> {
    fn place_marker(&mut self, spec: MarkerSpec) -> MarkerHandle {
        let title = spec.title.clone();
        let position = spec.position;
        let handle = self.inner.place_marker(spec);
        debug!(%handle, %title, %position, "place marker");
        handle
    }

    fn set_attached(&mut self, handle: MarkerHandle, attached: bool) {
        debug!(%handle, attached, "set marker attachment");
        self.inner.set_attached(handle, attached);
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        debug!(%handle, "remove marker");
        self.inner.remove_marker(handle);
    }

    fn pan_to(&mut self, position: LatLng) {
        debug!(%position, "pan to");
        self.inner.pan_to(position);
    }

    fn fit_bounds(&mut self, bounds: LatLngBounds) {
        debug!(sw = %bounds.sw, ne = %bounds.ne, "fit bounds");
        self.inner.fit_bounds(bounds);
    }

    fn open_info_panel(&mut self, handle: MarkerHandle, content: &str) {
        debug!(%handle, len = content.len(), "open info panel");
        self.inner.open_info_panel(handle, content);
    }
}
