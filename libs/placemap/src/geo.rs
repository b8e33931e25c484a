use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Axis-aligned box given by its south-west and north-east corners.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct LatLngBounds {
    pub sw: LatLng,
    pub ne: LatLng,
}

impl LatLngBounds {
    pub const fn new(sw: LatLng, ne: LatLng) -> Self {
        Self { sw, ne }
    }
}
