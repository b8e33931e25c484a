use crate::venue::Venue;

/// Case-folded search keyword shared by the list filter and marker visibility.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Keyword {
    raw: String,
    folded: String,
}

impl Keyword {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let folded = raw.to_lowercase();
        Self { raw, folded }
    }

    /// The keyword as the user typed it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Matches already-folded name and category text.
    pub fn matches_folded(&self, name: &str, category: &str) -> bool {
        name.contains(&self.folded) || category.contains(&self.folded)
    }

    pub fn matches(&self, venue: &Venue) -> bool {
        self.matches_folded(
            &venue.name.to_lowercase(),
            &venue.primary_category().to_lowercase(),
        )
    }
}

/// Indices into `venues` of every venue matching `keyword`, in their original order.
pub fn filter_indices(keyword: &Keyword, venues: &[Venue]) -> Vec<usize> {
    venues
        .iter()
        .enumerate()
        .filter(|(_, venue)| keyword.matches(venue))
        .map(|(i, _)| i)
        .collect()
}
