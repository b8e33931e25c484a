use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Error;
use crate::carousel::CarouselConfig;

pub const DEFAULT_NEIGHBORHOOD: &str = "Mountain View";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub default_neighborhood: String,
    pub places: PlacesConfig,
    pub venues: VenuesConfig,
    pub view: ViewConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_neighborhood: DEFAULT_NEIGHBORHOOD.to_string(),
            places: PlacesConfig::default(),
            venues: VenuesConfig::default(),
            view: ViewConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PlacesConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_s: u64,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://maps.googleapis.com/maps/api/place/textsearch/json".to_string(),
            api_key: None,
            timeout_s: 20,
        }
    }
}

impl PlacesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct VenuesConfig {
    pub endpoint: String,
    pub oauth_token: Option<String>,
    pub version: String,
    pub limit: u32,
    pub section: String,
    pub locale: String,
    pub timeout_s: u64,
}

impl Default for VenuesConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.foursquare.com/v2/venues/explore".to_string(),
            oauth_token: None,
            version: "20141121".to_string(),
            limit: 20,
            section: "topPicks".to_string(),
            locale: "en".to_string(),
            timeout_s: 20,
        }
    }
}

impl VenuesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub pin_icon: String,
    pub image_dir: String,
    /// Layout widths below this engage the swipe carousel.
    pub carousel_max_width: f32,
    pub slide_width: f32,
    /// Release speed in px/ms that counts as a flick.
    pub flick_velocity: f32,
    pub flick_max_ms: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            pin_icon: "images/ic_grade_black_18dp.png".to_string(),
            image_dir: "images".to_string(),
            carousel_max_width: 768.0,
            slide_width: 280.0,
            flick_velocity: 0.5,
            flick_max_ms: 250,
        }
    }
}

impl ViewConfig {
    pub fn carousel(&self) -> CarouselConfig {
        CarouselConfig {
            slide_width: self.slide_width,
            flick_velocity: self.flick_velocity,
            flick_max: Duration::from_millis(self.flick_max_ms),
        }
    }
}

impl Config {
    pub fn parse(path: Option<String>) -> Result<Self, Error> {
        let config_paths = [
            std::env::var("PLACEMAP_CONFIG").ok(),
            Some("./placemap.toml".to_string()),
        ];
        for path in path.into_iter().chain(config_paths.into_iter().flatten()) {
            let Ok(config) = std::fs::read_to_string(path) else {
                continue;
            };
            let mut config: Config = toml::from_str(&config)?;
            config.apply_env();
            return Ok(config);
        }
        Err(Error::ConfigNotFound)
    }

    /// Credentials from the environment win over the file.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("PLACEMAP_PLACES_KEY") {
            self.places.api_key = Some(key);
        }
        if let Ok(token) = std::env::var("PLACEMAP_FOURSQUARE_TOKEN") {
            self.venues.oauth_token = Some(token);
        }
    }
}
