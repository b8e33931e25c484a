use futures::future::BoxFuture;
use miette::Diagnostic;
use thiserror::Error;

use crate::geo::{LatLng, LatLngBounds};
use crate::venue::Venue;

pub mod http;

/// A free-text place query resolved to a single point.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPlace {
    pub name: String,
    pub center: LatLng,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VenueSearchResult {
    /// Venues in the order the provider ranked them.
    pub venues: Vec<Venue>,
    pub bounds: Option<LatLngBounds>,
}

#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("place not found")]
    NotFound,
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
    #[error("gateway returned HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Geocoding / place text search.
pub trait PlaceResolver: Send + Sync + 'static {
    fn resolve(&self, query: &str) -> BoxFuture<'_, Result<ResolvedPlace, GatewayError>>;
}

/// Venue search around a center point.
pub trait VenueSearch: Send + Sync + 'static {
    fn search(&self, center: LatLng) -> BoxFuture<'_, Result<VenueSearchResult, GatewayError>>;
}
