use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::geo::LatLng;

pub const NO_RATING: &str = "no rating available";
const PROVIDER_VENUE_URL: &str = "https://foursquare.com/v/";

/// A point of interest as returned by the venue search. Never mutated after fetch.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Venue {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub position: LatLng,
    #[serde(default)]
    pub address: Vec<String>,
    pub phone: Option<String>,
    /// Provider rating on a 0-10 scale.
    pub rating: Option<f64>,
    pub url: Option<String>,
}

impl Venue {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            categories: vec![category.into()],
            position: LatLng::default(),
            address: vec![],
            phone: None,
            rating: None,
            url: None,
        }
    }

    pub fn at(mut self, position: LatLng) -> Self {
        self.position = position;
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// The first listed category, or an empty string for uncategorised venues.
    pub fn primary_category(&self) -> &str {
        self.categories.first().map(String::as_str).unwrap_or_default()
    }

    pub fn provider_url(&self) -> String {
        format!("{PROVIDER_VENUE_URL}{}", self.id)
    }

    /// Website with the scheme stripped, for use as link text.
    pub fn display_url(&self) -> Option<&str> {
        let url = self.url.as_deref()?;
        Some(
            url.strip_prefix("http://")
                .or_else(|| url.strip_prefix("https://"))
                .unwrap_or(url),
        )
    }
}

/// Star image bucket derived from half of the 0-10 rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StarTier {
    Five,
    FourHalf,
    Four,
    ThreeHalf,
    Three,
    TwoHalf,
}

impl StarTier {
    pub fn from_rating(rating: f64) -> Self {
        let half = rating / 2.0;
        if half >= 4.9 {
            StarTier::Five
        } else if half >= 4.25 {
            StarTier::FourHalf
        } else if half >= 3.75 {
            StarTier::Four
        } else if half >= 3.25 {
            StarTier::ThreeHalf
        } else if half >= 2.75 {
            StarTier::Three
        } else {
            StarTier::TwoHalf
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StarTier::Five => "5.0",
            StarTier::FourHalf => "4.5",
            StarTier::Four => "4.0",
            StarTier::ThreeHalf => "3.5",
            StarTier::Three => "3.0",
            StarTier::TwoHalf => "2.5",
        }
    }

    pub fn image(self, image_dir: &str) -> String {
        format!("{}/star-{}.png", image_dir.trim_end_matches('/'), self.label())
    }
}

/// Renders the HTML shown in the map's info panel when a marker is clicked.
#[derive(Clone, Debug)]
pub struct InfoPanel {
    image_dir: String,
}

impl Default for InfoPanel {
    fn default() -> Self {
        Self::new("images")
    }
}

impl InfoPanel {
    pub fn new(image_dir: impl Into<String>) -> Self {
        Self {
            image_dir: image_dir.into(),
        }
    }

    pub fn venue(&self, venue: &Venue) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            r#"<div class="infowindow"><p><span class="v-name">{}</span></p><p class="v-category"><span>{}</span></p><p class="v-address"><span>{}</span></p>"#,
            escape_html(&venue.name),
            escape_html(venue.primary_category()),
            escape_html(&venue.address.join(", ")),
        );
        if let Some(phone) = &venue.phone {
            let _ = write!(
                html,
                r#"<p><span class="v-contact">{}</span></p>"#,
                escape_html(phone)
            );
        }
        if let (Some(url), Some(display)) = (&venue.url, venue.display_url()) {
            let _ = write!(
                html,
                r#"<p><a href="{}" class="v-link" target="_blank">{}</a></p>"#,
                escape_html(url),
                escape_html(display)
            );
        }
        let image_dir = self.image_dir.trim_end_matches('/');
        let _ = write!(
            html,
            r#"<p><a href="{}" target="_blank"><img class="fs-icon" src="{image_dir}/Foursquare-icon.png"></a>"#,
            escape_html(&venue.provider_url()),
        );
        match venue.rating {
            Some(rating) => {
                let _ = write!(
                    html,
                    r#"<span class="v-rating">{rating:.1}</span><img src="{}" class="rating-stars">"#,
                    StarTier::from_rating(rating).image(image_dir)
                );
            }
            None => {
                let _ = write!(html, r#"<span class="v-rating">{NO_RATING}</span>"#);
            }
        }
        html.push_str("</p></div>");
        html
    }

    pub fn neighborhood(&self, name: &str) -> String {
        escape_html(name)
    }
}

pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_tiers() {
        assert_eq!(StarTier::from_rating(9.8), StarTier::Five);
        assert_eq!(StarTier::from_rating(9.7), StarTier::FourHalf);
        assert_eq!(StarTier::from_rating(8.5), StarTier::FourHalf);
        assert_eq!(StarTier::from_rating(8.4), StarTier::Four);
        assert_eq!(StarTier::from_rating(7.5), StarTier::Four);
        assert_eq!(StarTier::from_rating(6.5), StarTier::ThreeHalf);
        assert_eq!(StarTier::from_rating(5.5), StarTier::Three);
        assert_eq!(StarTier::from_rating(2.0), StarTier::TwoHalf);
        assert_eq!(StarTier::FourHalf.image("images/"), "images/star-4.5.png");
    }

    #[test]
    fn test_display_url() {
        let mut venue = Venue::new("1", "Cafe", "Coffee Shop");
        assert_eq!(venue.display_url(), None);
        venue.url = Some("http://cafe.example".to_string());
        assert_eq!(venue.display_url(), Some("cafe.example"));
        venue.url = Some("https://cafe.example/menu".to_string());
        assert_eq!(venue.display_url(), Some("cafe.example/menu"));
        venue.url = Some("cafe.example".to_string());
        assert_eq!(venue.display_url(), Some("cafe.example"));
    }

    #[test]
    fn test_missing_rating_falls_back() {
        let venue = Venue::new("4b", "Cafe A", "Cafe");
        let html = InfoPanel::default().venue(&venue);
        assert!(html.contains(NO_RATING));
        assert!(!html.contains("rating-stars"));
        assert!(!html.contains("v-contact"));
        assert!(!html.contains("v-link"));
        assert!(html.contains("https://foursquare.com/v/4b"));
    }

    #[test]
    fn test_full_venue_panel() {
        let mut venue = Venue::new("4c", "Tom & Jerry's", "Bar").with_rating(8.66);
        venue.phone = Some("(650) 555-0100".to_string());
        venue.url = Some("https://tj.example".to_string());
        venue.address = vec!["1 Main St".to_string(), "Mountain View, CA".to_string()];
        let html = InfoPanel::new("img").venue(&venue);
        assert!(html.contains("Tom &amp; Jerry&#39;s"));
        assert!(html.contains("1 Main St, Mountain View, CA"));
        assert!(html.contains(r#"<span class="v-contact">(650) 555-0100</span>"#));
        assert!(html.contains(r#"class="v-link" target="_blank">tj.example</a>"#));
        assert!(html.contains(r#"<span class="v-rating">8.7</span>"#));
        assert!(html.contains("img/star-4.5.png"));
    }

    #[test]
    fn test_primary_category_empty() {
        let mut venue = Venue::new("1", "Nowhere", "x");
        venue.categories.clear();
        assert_eq!(venue.primary_category(), "");
    }
}
