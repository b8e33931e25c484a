use tracing::debug;

use crate::Error;
use crate::geo::LatLng;
use crate::surface::{MarkerHandle, RenderSurface};

/// A venue pin together with the metadata used to search it.
///
/// Name and category are case-folded once here so that keyword edits never
/// re-fold them. Attachment is the only state that changes after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerRecord {
    handle: MarkerHandle,
    venue_id: String,
    name: String,
    category: String,
    position: LatLng,
    info: String,
    attached: bool,
}

impl MarkerRecord {
    /// Builds a record for a freshly placed (and therefore attached) pin.
    pub fn new(
        handle: MarkerHandle,
        venue_id: impl Into<String>,
        name: &str,
        category: &str,
        position: LatLng,
    ) -> Self {
        Self {
            handle,
            venue_id: venue_id.into(),
            name: name.to_lowercase(),
            category: category.to_lowercase(),
            position,
            info: String::new(),
            attached: true,
        }
    }

    /// Content shown when the pin is clicked.
    pub fn with_info(mut self, info: String) -> Self {
        self.info = info;
        self
    }

    pub fn handle(&self) -> MarkerHandle {
        self.handle
    }

    pub fn venue_id(&self) -> &str {
        &self.venue_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

/// The single pin marking the resolved neighborhood center.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborhoodPin {
    pub handle: MarkerHandle,
    pub name: String,
    pub position: LatLng,
    pub info: String,
}

/// What a click on a handle resolved to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickTarget<'a> {
    pub handle: MarkerHandle,
    pub info: &'a str,
}

/// Owns every pin the view model has placed.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    pin: Option<NeighborhoodPin>,
    venues: Vec<MarkerRecord>,
}

impl MarkerRegistry {
    pub fn neighborhood_pin(&self) -> Option<&NeighborhoodPin> {
        self.pin.as_ref()
    }

    pub fn venue_markers(&self) -> &[MarkerRecord] {
        &self.venues
    }

    /// Registers the neighborhood pin. The previous pin must have been cleared first.
    pub fn add_neighborhood_pin(&mut self, pin: NeighborhoodPin) -> Result<(), Error> {
        if let Some(existing) = &self.pin {
            return Err(Error::PinAlreadyRegistered(existing.handle));
        }
        self.pin = Some(pin);
        Ok(())
    }

    pub fn clear_neighborhood_pin(&mut self, surface: &mut impl RenderSurface) {
        if let Some(pin) = self.pin.take() {
            debug!(handle = %pin.handle, name = %pin.name, "clearing neighborhood pin");
            surface.remove_marker(pin.handle);
        }
    }

    pub fn add_venue_marker(&mut self, record: MarkerRecord) {
        self.venues.push(record);
    }

    /// Detaches every venue pin, then empties the collection. Returns how many were dropped.
    pub fn clear_venue_markers(&mut self, surface: &mut impl RenderSurface) -> usize {
        let count = self.venues.len();
        for record in self.venues.drain(..) {
            surface.remove_marker(record.handle);
        }
        if count > 0 {
            debug!(count, "cleared venue markers");
        }
        count
    }

    /// Attaches exactly the venue pins matching `predicate`. Nothing is removed.
    pub fn set_venue_marker_visibility(
        &mut self,
        surface: &mut impl RenderSurface,
        predicate: impl Fn(&MarkerRecord) -> bool,
    ) {
        for record in &mut self.venues {
            let visible = predicate(record);
            if visible != record.attached {
                surface.set_attached(record.handle, visible);
                record.attached = visible;
            }
        }
    }

    pub fn find_venue(&self, venue_id: &str) -> Option<&MarkerRecord> {
        self.venues.iter().find(|r| r.venue_id == venue_id)
    }

    /// Resolves a click on `handle`. Handles that were cleared resolve to nothing.
    pub fn click_target(&self, handle: MarkerHandle) -> Option<ClickTarget<'_>> {
        if let Some(pin) = self.pin.as_ref().filter(|p| p.handle == handle) {
            return Some(ClickTarget {
                handle,
                info: &pin.info,
            });
        }
        self.venues
            .iter()
            .find(|r| r.handle == handle)
            .map(|r| ClickTarget {
                handle,
                info: &r.info,
            })
    }
}
