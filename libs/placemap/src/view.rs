//! The application state the UI binds to.
//!
//! [`ViewModel`] is the single owner of the neighborhood, the keyword, the
//! venue list and every marker on the render surface. Commands mutate an
//! input, mark it dirty in the [`Graph`] and settle; derived fields (filtered
//! list, marker visibility, carousel) are only ever written by rules.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::Error;
use crate::carousel::{Affordances, Carousel};
use crate::config::{Config, ViewConfig};
use crate::filter::{Keyword, filter_indices};
use crate::geo::{LatLng, LatLngBounds};
use crate::lookup::{
    Generation, GenerationCounter, LookupEvent, LookupRequest, LookupStage, Lookups,
};
use crate::marker::{MarkerRecord, MarkerRegistry, NeighborhoodPin};
use crate::reactive::{Graph, Rule, Signal, SignalSet};
use crate::surface::{MarkerHandle, MarkerSpec, RenderSurface};
use crate::venue::{InfoPanel, Venue};

/// The active neighborhood. Replaced wholesale whenever the name changes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NeighborhoodState {
    pub query: String,
    pub resolved_center: Option<LatLng>,
    pub suggested_bounds: Option<LatLngBounds>,
}

impl NeighborhoodState {
    fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

pub struct ViewModel<S> {
    surface: S,
    config: ViewConfig,
    panel: InfoPanel,
    neighborhood: NeighborhoodState,
    keyword: Keyword,
    venues: Vec<Venue>,
    filtered: Vec<usize>,
    list_visible: bool,
    settings_visible: bool,
    selected: Option<String>,
    layout_width: Option<f32>,
    markers: MarkerRegistry,
    carousel: Carousel,
    graph: Graph,
    generation: GenerationCounter,
    loading: bool,
    requests: flume::Sender<LookupRequest>,
    events: flume::Receiver<LookupEvent>,
    subscribers: Vec<flume::Sender<SignalSet>>,
}

impl<S: RenderSurface> ViewModel<S> {
    /// Builds the view model and immediately starts looking up the default
    /// neighborhood. The returned [`Lookups`] go to a [`crate::LookupDriver`].
    pub fn new(surface: S, config: &Config) -> (Self, Lookups) {
        let (request_tx, request_rx) = flume::unbounded();
        let (event_tx, event_rx) = flume::unbounded();
        let generation = GenerationCounter::default();
        let mut view = Self {
            surface,
            config: config.view.clone(),
            panel: InfoPanel::new(config.view.image_dir.clone()),
            neighborhood: NeighborhoodState::default(),
            keyword: Keyword::default(),
            venues: vec![],
            filtered: vec![],
            list_visible: true,
            settings_visible: false,
            selected: None,
            layout_width: None,
            markers: MarkerRegistry::default(),
            carousel: Carousel::new(config.view.carousel()),
            graph: Graph::default(),
            generation: generation.clone(),
            loading: false,
            requests: request_tx,
            events: event_rx,
            subscribers: vec![],
        };
        view.set_neighborhood(config.default_neighborhood.clone());
        let lookups = Lookups {
            requests: request_rx,
            events: event_tx,
            generation,
        };
        (view, lookups)
    }

    /// Receives one batched change set per settle.
    pub fn subscribe(&mut self) -> flume::Receiver<SignalSet> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn markers(&self) -> &MarkerRegistry {
        &self.markers
    }

    pub fn neighborhood(&self) -> &str {
        &self.neighborhood.query
    }

    pub fn neighborhood_state(&self) -> &NeighborhoodState {
        &self.neighborhood
    }

    pub fn keyword(&self) -> &str {
        self.keyword.raw()
    }

    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    pub fn filtered_list(&self) -> impl Iterator<Item = &Venue> + '_ {
        self.filtered.iter().map(|i| &self.venues[*i])
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn list_visible(&self) -> bool {
        self.list_visible
    }

    pub fn settings_visible(&self) -> bool {
        self.settings_visible
    }

    pub fn selected_venue(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    pub fn carousel_index(&self) -> Option<usize> {
        self.carousel.index()
    }

    pub fn can_swipe_left(&self) -> bool {
        self.affordances().can_swipe_left
    }

    pub fn can_swipe_right(&self) -> bool {
        self.affordances().can_swipe_right
    }

    fn affordances(&self) -> Affordances {
        self.carousel.affordances()
    }

    pub fn generation(&self) -> Generation {
        self.generation.current()
    }

    /// True while the current neighborhood's lookup has not finished or failed.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_neighborhood(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name == self.neighborhood.query {
            return;
        }
        self.neighborhood = NeighborhoodState::new(name);
        self.graph.mark(Signal::Neighborhood);
        self.settle();
    }

    pub fn set_keyword(&mut self, keyword: impl Into<String>) {
        let keyword = Keyword::new(keyword);
        if keyword == self.keyword {
            return;
        }
        self.keyword = keyword;
        self.graph.mark(Signal::Keyword);
        self.settle();
    }

    pub fn toggle_list(&mut self) {
        self.list_visible = !self.list_visible;
        self.graph.mark(Signal::ListVisible);
        self.settle();
    }

    pub fn toggle_settings(&mut self) {
        self.settings_visible = !self.settings_visible;
        self.graph.mark(Signal::SettingsVisible);
        self.settle();
    }

    /// Same as clicking the venue's marker: opens its info panel and centers it.
    pub fn select_venue(&mut self, venue_id: &str) {
        if !self.focus_venue(venue_id) {
            return;
        }
        if let Some(pos) = self
            .filtered
            .iter()
            .position(|i| self.venues[*i].id == venue_id)
        {
            if self.carousel.show(pos) {
                self.graph.mark(Signal::Carousel);
            }
        }
        self.settle();
    }

    /// Click callback from the render surface.
    pub fn marker_clicked(&mut self, handle: MarkerHandle) {
        if let Some(venue_id) = self
            .markers
            .venue_markers()
            .iter()
            .find(|r| r.handle() == handle)
            .map(|r| r.venue_id().to_string())
        {
            self.select_venue(&venue_id);
            return;
        }
        match self.markers.click_target(handle) {
            Some(target) => self.surface.open_info_panel(target.handle, target.info),
            None => debug!(%handle, "click on unknown marker"),
        }
    }

    /// Window resize. Refits the last suggested bounds and engages the carousel on narrow layouts.
    pub fn set_layout_width(&mut self, width: f32) {
        self.layout_width = Some(width);
        if let Some(bounds) = self.neighborhood.suggested_bounds {
            self.surface.fit_bounds(bounds);
        }
        self.graph.mark(Signal::Layout);
        self.settle();
    }

    fn is_narrow(&self) -> bool {
        self.layout_width
            .is_some_and(|w| w < self.config.carousel_max_width)
    }

    pub fn drag_start(&mut self, x: f32, at: Duration) -> bool {
        self.carousel.drag_start(x, at)
    }

    pub fn drag_move(&mut self, x: f32) -> Option<f32> {
        self.carousel.drag_move(x)
    }

    pub fn drag_end(&mut self, x: f32, at: Duration) -> Option<usize> {
        let target = self.carousel.drag_end(x, at)?;
        self.graph.mark(Signal::Carousel);
        self.settle();
        Some(target)
    }

    /// Called by the render layer when the settle animation has finished.
    pub fn carousel_settled(&mut self) {
        let Some(index) = self.carousel.finish_settle() else {
            return;
        };
        self.graph.mark(Signal::Carousel);
        if let Some(id) = self.filtered.get(index).map(|i| self.venues[*i].id.clone()) {
            self.focus_venue(&id);
        }
        self.settle();
    }

    /// Applies every lookup event already delivered. Returns how many were accepted.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            applied += self.apply(event) as usize;
        }
        applied
    }

    /// Waits for at least one lookup event, then drains the rest.
    pub async fn pump_async(&mut self) -> Result<usize, Error> {
        let event = self
            .events
            .recv_async()
            .await
            .map_err(|_| Error::LookupChannelClosed)?;
        let applied = self.apply(event) as usize;
        Ok(applied + self.pump())
    }

    /// Applies one lookup event. Events from superseded lookups are dropped.
    pub fn apply(&mut self, event: LookupEvent) -> bool {
        let generation = event.generation();
        if !self.generation.is_current(generation) {
            debug!(%generation, current = %self.generation.current(), "dropping stale lookup event");
            return false;
        }
        match event {
            LookupEvent::Resolved { place, .. } => {
                self.install_pin(place.name, place.center);
            }
            LookupEvent::Venues { result, .. } => {
                self.loading = false;
                self.install_venues(result.venues, result.bounds);
            }
            LookupEvent::Failed { stage, error, .. } => {
                self.loading = false;
                match stage {
                    LookupStage::Resolve => {
                        warn!(neighborhood = %self.neighborhood.query, %error, "neighborhood not resolved")
                    }
                    LookupStage::Search => {
                        warn!(neighborhood = %self.neighborhood.query, %error, "venues not loaded")
                    }
                }
            }
        }
        self.settle();
        true
    }

    fn install_pin(&mut self, name: String, center: LatLng) {
        self.markers.clear_neighborhood_pin(&mut self.surface);
        let handle = self.surface.place_marker(MarkerSpec {
            position: center,
            title: name.clone(),
            icon: Some(self.config.pin_icon.clone()),
        });
        let pin = NeighborhoodPin {
            handle,
            info: self.panel.neighborhood(&name),
            name,
            position: center,
        };
        if let Err(err) = self.markers.add_neighborhood_pin(pin) {
            warn!(?err, "neighborhood pin rejected");
            self.surface.remove_marker(handle);
            return;
        }
        self.surface.pan_to(center);
        self.neighborhood.resolved_center = Some(center);
        self.graph.mark(Signal::Pin);
    }

    fn install_venues(&mut self, venues: Vec<Venue>, bounds: Option<LatLngBounds>) {
        if self.markers.clear_venue_markers(&mut self.surface) > 0 {
            self.graph.mark(Signal::Markers);
        }
        for venue in &venues {
            let handle = self.surface.place_marker(MarkerSpec {
                position: venue.position,
                title: venue.name.clone(),
                icon: None,
            });
            let record = MarkerRecord::new(
                handle,
                venue.id.clone(),
                &venue.name,
                venue.primary_category(),
                venue.position,
            )
            .with_info(self.panel.venue(venue));
            self.markers.add_venue_marker(record);
        }
        info!(
            neighborhood = %self.neighborhood.query,
            venues = venues.len(),
            "installed venues"
        );
        self.venues = venues;
        self.selected = None;
        self.graph.mark(Signal::Venues);
        self.graph.mark(Signal::Markers);
        if let Some(bounds) = bounds {
            self.neighborhood.suggested_bounds = Some(bounds);
            self.surface.fit_bounds(bounds);
            self.graph.mark(Signal::Bounds);
        }
    }

    fn focus_venue(&mut self, venue_id: &str) -> bool {
        let Some(record) = self.markers.find_venue(venue_id) else {
            debug!(venue_id, "select on unknown venue");
            return false;
        };
        self.surface.open_info_panel(record.handle(), record.info());
        self.surface.pan_to(record.position());
        self.selected = Some(venue_id.to_string());
        self.graph.mark(Signal::Selection);
        true
    }

    fn settle(&mut self) {
        for rule in Rule::ORDER {
            if self.graph.should_run(rule) {
                self.run(rule);
            }
        }
        let changed = self.graph.finish();
        if changed.is_empty() {
            return;
        }
        debug!(?changed, "view settled");
        self.subscribers.retain(|tx| tx.send(changed).is_ok());
    }

    fn run(&mut self, rule: Rule) {
        match rule {
            Rule::Neighborhood => self.neighborhood_rule(),
            Rule::Filter => {
                self.filtered = filter_indices(&self.keyword, &self.venues);
                self.graph.mark(Signal::FilteredList);
            }
            Rule::Visibility => {
                let keyword = &self.keyword;
                self.markers
                    .set_venue_marker_visibility(&mut self.surface, |r| {
                        keyword.matches_folded(r.name(), r.category())
                    });
            }
            Rule::Carousel => self.carousel_rule(),
        }
    }

    fn neighborhood_rule(&mut self) {
        let query = self.neighborhood.query.clone();
        if query.is_empty() {
            return;
        }
        self.markers.clear_venue_markers(&mut self.surface);
        self.markers.clear_neighborhood_pin(&mut self.surface);
        self.graph.mark(Signal::Markers);
        self.graph.mark(Signal::Pin);
        self.graph.mark(Signal::Bounds);
        if self.selected.take().is_some() {
            self.graph.mark(Signal::Selection);
        }

        let generation = self.generation.bump();
        self.loading = true;
        info!(neighborhood = %query, %generation, "neighborhood changed");
        if self
            .requests
            .send(LookupRequest { generation, query })
            .is_err()
        {
            warn!(%generation, "no lookup driver, request dropped");
            self.loading = false;
        }

        if !self.keyword.is_empty() {
            self.keyword = Keyword::default();
            self.graph.mark(Signal::Keyword);
        }
    }

    fn carousel_rule(&mut self) {
        let was_engaged = self.carousel.is_engaged();
        let narrow = self.is_narrow();
        self.carousel.set_engaged(narrow);
        let list_changed = self.graph.dirty().contains(Signal::FilteredList);
        if list_changed {
            self.carousel.reset(self.filtered.len());
        }
        if list_changed || was_engaged != narrow {
            self.graph.mark(Signal::Carousel);
        }
        if !narrow || !(list_changed || !was_engaged) {
            return;
        }
        let Some(index) = self.carousel.index() else {
            return;
        };
        if let Some(id) = self.filtered.get(index).map(|i| self.venues[*i].id.clone()) {
            self.focus_venue(&id);
        }
    }
}
