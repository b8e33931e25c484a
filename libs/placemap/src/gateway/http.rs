use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;

use super::{GatewayError, PlaceResolver, ResolvedPlace, VenueSearch, VenueSearchResult};
use crate::Error;
use crate::config::{PlacesConfig, VenuesConfig};
use crate::geo::{LatLng, LatLngBounds};
use crate::venue::Venue;

/// Place text search against the Google Places web service.
pub struct PlacesClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl PlacesClient {
    pub fn new(config: &PlacesConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn text_search(&self, query: &str) -> Result<ResolvedPlace, GatewayError> {
        let mut request = self.client.get(&self.endpoint).query(&[("query", query)]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }
        let bytes = fetch(request).await?;
        parse_place_response(&bytes)
    }
}

impl PlaceResolver for PlacesClient {
    fn resolve(&self, query: &str) -> BoxFuture<'_, Result<ResolvedPlace, GatewayError>> {
        let query = query.to_string();
        async move { self.text_search(&query).await }.boxed()
    }
}

/// Venue "explore" search against the Foursquare v2 API.
pub struct ExploreClient {
    client: reqwest::Client,
    config: VenuesConfig,
    oauth_token: String,
}

impl ExploreClient {
    pub fn new(config: &VenuesConfig) -> Result<Self, Error> {
        let oauth_token = config
            .oauth_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingCredential("venues.oauth_token"))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
            oauth_token,
        })
    }

    async fn explore(&self, center: LatLng) -> Result<VenueSearchResult, GatewayError> {
        let ll = format!("{}, {}", center.lat, center.lng);
        let limit = self.config.limit.to_string();
        let request = self.client.get(&self.config.endpoint).query(&[
            ("ll", ll.as_str()),
            ("limit", limit.as_str()),
            ("section", self.config.section.as_str()),
            ("day", "any"),
            ("time", "any"),
            ("locale", self.config.locale.as_str()),
            ("oauth_token", self.oauth_token.as_str()),
            ("v", self.config.version.as_str()),
        ]);
        let bytes = fetch(request).await?;
        parse_explore_response(&bytes)
    }
}

impl VenueSearch for ExploreClient {
    fn search(&self, center: LatLng) -> BoxFuture<'_, Result<VenueSearchResult, GatewayError>> {
        self.explore(center).boxed()
    }
}

async fn fetch(request: reqwest::RequestBuilder) -> Result<Vec<u8>, GatewayError> {
    let response = request
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::Status(status.as_u16()));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| GatewayError::Unavailable(format!("invalid bytes: {e}")))?;
    debug!(len = bytes.len(), "gateway response");
    Ok(bytes.to_vec())
}

#[derive(Deserialize)]
struct PlaceResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Deserialize)]
struct PlaceResult {
    name: String,
    geometry: PlaceGeometry,
}

#[derive(Deserialize)]
struct PlaceGeometry {
    location: LatLng,
}

pub fn parse_place_response(bytes: &[u8]) -> Result<ResolvedPlace, GatewayError> {
    let parsed: PlaceResponse =
        serde_json::from_slice(bytes).map_err(|e| GatewayError::Malformed(e.to_string()))?;
    match parsed.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Err(GatewayError::NotFound),
        other => return Err(GatewayError::Unavailable(other.to_string())),
    }
    let place = parsed
        .results
        .into_iter()
        .next()
        .ok_or(GatewayError::NotFound)?;
    Ok(ResolvedPlace {
        name: place.name,
        center: place.geometry.location,
    })
}

#[derive(Deserialize)]
struct ExploreEnvelope {
    response: ExploreResponse,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExploreResponse {
    suggested_bounds: Option<ExploreBounds>,
    #[serde(default)]
    groups: Vec<ExploreGroup>,
}

#[derive(Deserialize)]
struct ExploreBounds {
    ne: LatLng,
    sw: LatLng,
}

#[derive(Deserialize)]
struct ExploreGroup {
    #[serde(default)]
    items: Vec<ExploreItem>,
}

#[derive(Deserialize)]
struct ExploreItem {
    venue: ExploreVenue,
}

#[derive(Deserialize)]
struct ExploreVenue {
    id: String,
    name: String,
    #[serde(default)]
    categories: Vec<ExploreCategory>,
    location: ExploreLocation,
    #[serde(default)]
    contact: ExploreContact,
    rating: Option<f64>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct ExploreCategory {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExploreLocation {
    lat: f64,
    lng: f64,
    #[serde(default)]
    formatted_address: Vec<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ExploreContact {
    formatted_phone: Option<String>,
}

impl From<ExploreVenue> for Venue {
    fn from(v: ExploreVenue) -> Self {
        Venue {
            id: v.id,
            name: v.name,
            categories: v.categories.into_iter().map(|c| c.name).collect(),
            position: LatLng::new(v.location.lat, v.location.lng),
            address: v.location.formatted_address,
            phone: v.contact.formatted_phone,
            rating: v.rating,
            url: v.url,
        }
    }
}

/// Venues of the first group, in provider order, plus the suggested bounds if any.
pub fn parse_explore_response(bytes: &[u8]) -> Result<VenueSearchResult, GatewayError> {
    let parsed: ExploreEnvelope =
        serde_json::from_slice(bytes).map_err(|e| GatewayError::Malformed(e.to_string()))?;
    let venues = parsed
        .response
        .groups
        .into_iter()
        .next()
        .map(|g| g.items.into_iter().map(|i| Venue::from(i.venue)).collect())
        .unwrap_or_default();
    let bounds = parsed
        .response
        .suggested_bounds
        .map(|b| LatLngBounds::new(b.sw, b.ne));
    Ok(VenueSearchResult { venues, bounds })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_place_ok() {
        let body = br#"{
            "status": "OK",
            "results": [
                {"name": "Mountain View", "geometry": {"location": {"lat": 37.38, "lng": -122.08}}},
                {"name": "Mountain View Ave", "geometry": {"location": {"lat": 1.0, "lng": 2.0}}}
            ]
        }"#;
        let place = parse_place_response(body).unwrap();
        assert_eq!(place.name, "Mountain View");
        assert_eq!(place.center, LatLng::new(37.38, -122.08));
    }

    #[test]
    fn test_parse_place_not_found() {
        let body = br#"{"status": "ZERO_RESULTS", "results": []}"#;
        assert_eq!(parse_place_response(body), Err(GatewayError::NotFound));
        let body = br#"{"status": "REQUEST_DENIED"}"#;
        assert_eq!(
            parse_place_response(body),
            Err(GatewayError::Unavailable("REQUEST_DENIED".to_string()))
        );
        assert!(matches!(
            parse_place_response(b"<html>"),
            Err(GatewayError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_explore() {
        let body = br#"{
            "meta": {"code": 200},
            "response": {
                "suggestedBounds": {
                    "ne": {"lat": 37.4, "lng": -122.0},
                    "sw": {"lat": 37.3, "lng": -122.1}
                },
                "groups": [{"items": [
                    {"venue": {
                        "id": "v1", "name": "Cafe A",
                        "categories": [{"name": "Coffee Shop"}, {"name": "Bakery"}],
                        "location": {"lat": 37.39, "lng": -122.07, "formattedAddress": ["1 Main St", "Mountain View, CA"]},
                        "contact": {"formattedPhone": "(650) 555-0100"},
                        "rating": 8.9,
                        "url": "http://cafe-a.example"
                    }},
                    {"venue": {
                        "id": "v2", "name": "Park B",
                        "categories": [{"name": "Park"}],
                        "location": {"lat": 37.38, "lng": -122.09}
                    }}
                ]}]
            }
        }"#;
        let result = parse_explore_response(body).unwrap();
        assert_eq!(
            result.bounds,
            Some(LatLngBounds::new(
                LatLng::new(37.3, -122.1),
                LatLng::new(37.4, -122.0)
            ))
        );
        assert_eq!(result.venues.len(), 2);
        let cafe = &result.venues[0];
        assert_eq!(cafe.primary_category(), "Coffee Shop");
        assert_eq!(cafe.address, vec!["1 Main St", "Mountain View, CA"]);
        assert_eq!(cafe.phone.as_deref(), Some("(650) 555-0100"));
        assert_eq!(cafe.rating, Some(8.9));
        let park = &result.venues[1];
        assert_eq!(park.name, "Park B");
        assert!(park.phone.is_none());
        assert!(park.rating.is_none());
        assert!(park.url.is_none());
    }

    #[test]
    fn test_parse_explore_without_bounds_or_groups() {
        let result = parse_explore_response(br#"{"response": {}}"#).unwrap();
        assert!(result.venues.is_empty());
        assert!(result.bounds.is_none());
    }

    #[test]
    fn test_explore_client_requires_token() {
        let config = VenuesConfig::default();
        assert!(matches!(
            ExploreClient::new(&config),
            Err(Error::MissingCredential(_))
        ));
    }
}
