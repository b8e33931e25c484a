use futures::FutureExt;
use futures::future::BoxFuture;
use placemap::config::Config;
use placemap::surface::MemorySurface;
use placemap::venue::{NO_RATING, Venue};
use placemap::{
    GatewayError, LatLng, LatLngBounds, LookupDriver, PlaceResolver, ResolvedPlace, VenueSearch,
    VenueSearchResult, ViewModel,
};
use std::collections::HashMap;
use std::time::Duration;

const MOUNTAIN_VIEW: LatLng = LatLng::new(37.38, -122.08);
const PALO_ALTO: LatLng = LatLng::new(37.44, -122.14);
const LOS_ALTOS: LatLng = LatLng::new(37.38, -122.11);

#[derive(Default)]
struct FakePlaces {
    places: HashMap<String, (LatLng, Duration)>,
}

impl FakePlaces {
    fn with(mut self, name: &str, center: LatLng, delay: Duration) -> Self {
        self.places.insert(name.to_string(), (center, delay));
        self
    }
}

impl PlaceResolver for FakePlaces {
    fn resolve(&self, query: &str) -> BoxFuture<'_, Result<ResolvedPlace, GatewayError>> {
        let found = self.places.get(query).copied();
        let name = query.to_string();
        async move {
            let (center, delay) = found.ok_or(GatewayError::NotFound)?;
            tokio::time::sleep(delay).await;
            Ok(ResolvedPlace { name, center })
        }
        .boxed()
    }
}

#[derive(Default)]
struct FakeVenues {
    venues: Vec<(LatLng, Vec<Venue>, Option<LatLngBounds>)>,
}

impl FakeVenues {
    fn with(mut self, center: LatLng, venues: Vec<Venue>) -> Self {
        self.venues.push((center, venues, None));
        self
    }
}

impl VenueSearch for FakeVenues {
    fn search(&self, center: LatLng) -> BoxFuture<'_, Result<VenueSearchResult, GatewayError>> {
        let found = self
            .venues
            .iter()
            .find(|(c, _, _)| *c == center)
            .map(|(_, venues, bounds)| VenueSearchResult {
                venues: venues.clone(),
                bounds: *bounds,
            });
        async move { found.ok_or_else(|| GatewayError::Unavailable("no venues".to_string())) }
            .boxed()
    }
}

fn venue(id: &str, name: &str, category: &str, at: LatLng) -> Venue {
    Venue::new(id, name, category).at(at).with_rating(8.0)
}

fn mountain_view_venues() -> Vec<Venue> {
    vec![
        venue("mv-1", "Cafe A", "Coffee Shop", MOUNTAIN_VIEW),
        venue("mv-2", "Park B", "Park", MOUNTAIN_VIEW),
        venue("mv-3", "Cafe C", "Bakery", MOUNTAIN_VIEW),
    ]
}

fn palo_alto_venues() -> Vec<Venue> {
    vec![
        venue("pa-1", "Philz", "Coffee Shop", PALO_ALTO),
        venue("pa-2", "Museum", "Art Museum", PALO_ALTO),
    ]
}

fn gateways(mv_delay: Duration) -> LookupDriver<FakePlaces, FakeVenues> {
    LookupDriver::new(
        FakePlaces::default()
            .with("Mountain View", MOUNTAIN_VIEW, mv_delay)
            .with("Palo Alto", PALO_ALTO, Duration::ZERO)
            .with("Los Altos", LOS_ALTOS, Duration::ZERO),
        FakeVenues::default()
            .with(MOUNTAIN_VIEW, mountain_view_venues())
            .with(PALO_ALTO, palo_alto_venues()),
    )
}

async fn load(view: &mut ViewModel<MemorySurface>) {
    while view.is_loading() {
        tokio::time::timeout(Duration::from_secs(5), view.pump_async())
            .await
            .expect("lookup timed out")
            .unwrap();
    }
}

fn venue_marker_ids(view: &ViewModel<MemorySurface>) -> Vec<String> {
    view.markers()
        .venue_markers()
        .iter()
        .map(|r| r.venue_id().to_string())
        .collect()
}

async fn scenario_a() -> ViewModel<MemorySurface> {
    let (mut view, lookups) = ViewModel::new(MemorySurface::default(), &Config::default());
    tokio::spawn(gateways(Duration::ZERO).run(lookups));
    load(&mut view).await;
    view.set_keyword("cafe");
    view
}

#[tokio::test]
async fn test_scenario_a_keyword_filters_list_and_markers() {
    let view = scenario_a().await;
    assert_eq!(
        view.neighborhood_state().resolved_center,
        Some(MOUNTAIN_VIEW)
    );
    let names: Vec<_> = view.filtered_list().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["Cafe A", "Cafe C"]);
    let attached: Vec<_> = view
        .markers()
        .venue_markers()
        .iter()
        .filter(|r| view.surface().is_attached(r.handle()))
        .map(|r| r.venue_id())
        .collect();
    assert_eq!(attached, vec!["mv-1", "mv-3"]);
    assert_eq!(view.markers().venue_markers().len(), 3);
    assert_eq!(view.surface().center, Some(MOUNTAIN_VIEW));
}

#[tokio::test]
async fn test_scenario_b_neighborhood_change_clears_first() {
    let mut view = scenario_a().await;
    let changes = view.subscribe();
    view.set_neighborhood("Palo Alto");
    assert!(view.markers().venue_markers().is_empty());
    assert!(view.markers().neighborhood_pin().is_none());
    assert_eq!(view.keyword(), "");
    assert_eq!(view.surface().live_count(), 0);

    while view.is_loading() {
        tokio::time::timeout(Duration::from_secs(5), view.pump_async())
            .await
            .unwrap()
            .unwrap();
        let ids = venue_marker_ids(&view);
        assert!(
            ids.iter().all(|id| id.starts_with("pa-")) || ids.iter().all(|id| id.starts_with("mv-")),
            "markers from two neighborhoods coexist: {ids:?}"
        );
    }
    assert_eq!(venue_marker_ids(&view), vec!["pa-1", "pa-2"]);
    assert_eq!(view.surface().live_count(), 3);
    assert_eq!(view.surface().attached_count(), 3);
    assert_eq!(view.filtered_len(), 2);
    assert!(changes.drain().count() >= 2);
}

#[tokio::test]
async fn test_scenario_c_missing_rating_fallback() {
    let mut unrated = venue("mv-9", "Mystery Spot", "Landmark", MOUNTAIN_VIEW);
    unrated.rating = None;
    let driver = LookupDriver::new(
        FakePlaces::default().with("Mountain View", MOUNTAIN_VIEW, Duration::ZERO),
        FakeVenues::default().with(MOUNTAIN_VIEW, vec![unrated]),
    );
    let (mut view, lookups) = ViewModel::new(MemorySurface::default(), &Config::default());
    tokio::spawn(driver.run(lookups));
    load(&mut view).await;

    view.select_venue("mv-9");
    let panel = view.surface().info_panel.clone().expect("info panel open");
    assert!(panel.content.contains(NO_RATING));
    assert!(!panel.content.contains("rating-stars"));
}

#[tokio::test]
async fn test_scenario_d_single_slide_has_no_affordances() {
    let mut view = scenario_a().await;
    view.set_layout_width(375.0);
    view.set_keyword("park");
    assert_eq!(view.filtered_len(), 1);
    assert_eq!(view.carousel_index(), Some(0));
    assert!(!view.can_swipe_left());
    assert!(!view.can_swipe_right());
    assert_eq!(view.selected_venue(), Some("mv-2"));
}

#[tokio::test]
async fn test_stale_lookup_is_ignored() {
    let (mut view, lookups) = ViewModel::new(MemorySurface::default(), &Config::default());
    tokio::spawn(gateways(Duration::from_millis(50)).run(lookups));
    view.set_neighborhood("Palo Alto");
    load(&mut view).await;
    assert_eq!(venue_marker_ids(&view), vec!["pa-1", "pa-2"]);

    // let the slow Mountain View resolution land
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(view.pump(), 0);
    assert_eq!(venue_marker_ids(&view), vec!["pa-1", "pa-2"]);
    let pin = view.markers().neighborhood_pin().unwrap();
    assert_eq!(pin.name, "Palo Alto");
    assert_eq!(view.surface().live_count(), 3);
}

#[tokio::test]
async fn test_unknown_neighborhood_leaves_empty_map() {
    let mut view = scenario_a().await;
    view.set_neighborhood("Atlantis");
    load(&mut view).await;
    assert!(view.markers().neighborhood_pin().is_none());
    assert!(view.markers().venue_markers().is_empty());
    assert_eq!(view.surface().live_count(), 0);
    assert_eq!(view.neighborhood(), "Atlantis");
}

#[tokio::test]
async fn test_venue_search_failure_keeps_new_pin() {
    let mut view = scenario_a().await;
    view.set_neighborhood("Los Altos");
    load(&mut view).await;
    let pin = view.markers().neighborhood_pin().unwrap();
    assert_eq!(pin.name, "Los Altos");
    assert_eq!(pin.position, LOS_ALTOS);
    assert!(view.markers().venue_markers().is_empty());
    assert_eq!(view.venues().len(), 3);
    assert_eq!(view.surface().live_count(), 1);
    assert_eq!(view.surface().center, Some(LOS_ALTOS));
}

#[tokio::test]
async fn test_same_neighborhood_keeps_loaded_map() {
    let mut view = scenario_a().await;
    view.set_neighborhood("Mountain View");
    assert!(!view.is_loading());
    assert_eq!(view.keyword(), "cafe");
    assert_eq!(venue_marker_ids(&view), vec!["mv-1", "mv-2", "mv-3"]);
    assert_eq!(view.surface().live_count(), 4);
}

#[tokio::test]
async fn test_driver_stops_when_view_dropped() {
    let (view, lookups) = ViewModel::new(MemorySurface::default(), &Config::default());
    let driver = tokio::spawn(gateways(Duration::ZERO).run(lookups));
    drop(view);
    tokio::time::timeout(Duration::from_secs(5), driver)
        .await
        .expect("driver did not stop")
        .unwrap();
}
