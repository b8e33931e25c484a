//! Dependency graph behind the view model's derived state.
//!
//! Every observable field is a [`Signal`]. Mutations mark signals dirty; a
//! settle then runs, in [`Rule::ORDER`], each rule with at least one dirty
//! input. The order is topological, so a single pass reaches a fixed point and
//! subscribers see one batched [`SignalSet`] per settle.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Signal {
    Neighborhood,
    Keyword,
    Venues,
    FilteredList,
    Layout,
    Markers,
    Pin,
    Bounds,
    Carousel,
    Selection,
    ListVisible,
    SettingsVisible,
}

impl Signal {
    pub const ALL: [Signal; 12] = [
        Signal::Neighborhood,
        Signal::Keyword,
        Signal::Venues,
        Signal::FilteredList,
        Signal::Layout,
        Signal::Markers,
        Signal::Pin,
        Signal::Bounds,
        Signal::Carousel,
        Signal::Selection,
        Signal::ListVisible,
        Signal::SettingsVisible,
    ];

    const fn bit(self) -> u16 {
        1 << self as u8
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SignalSet(u16);

impl SignalSet {
    pub const EMPTY: SignalSet = SignalSet(0);

    pub const fn of(signals: &[Signal]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < signals.len() {
            bits |= signals[i].bit();
            i += 1;
        }
        SignalSet(bits)
    }

    pub fn insert(&mut self, signal: Signal) {
        self.0 |= signal.bit();
    }

    pub fn contains(self, signal: Signal) -> bool {
        self.0 & signal.bit() != 0
    }

    pub fn intersects(self, other: SignalSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Signal> {
        Signal::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl std::fmt::Debug for SignalSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Signal> for SignalSet {
    fn from_iter<T: IntoIterator<Item = Signal>>(iter: T) -> Self {
        let mut set = SignalSet::EMPTY;
        for signal in iter {
            set.insert(signal);
        }
        set
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    /// Tears down the old neighborhood and requests the new one.
    Neighborhood,
    /// Recomputes the filtered list.
    Filter,
    /// Attaches exactly the matching venue markers.
    Visibility,
    /// Resets the carousel onto the new list and focuses its first slide.
    Carousel,
}

impl Rule {
    pub const ORDER: [Rule; 4] = [Rule::Neighborhood, Rule::Filter, Rule::Visibility, Rule::Carousel];

    pub const fn inputs(self) -> SignalSet {
        match self {
            Rule::Neighborhood => SignalSet::of(&[Signal::Neighborhood]),
            Rule::Filter => SignalSet::of(&[Signal::Keyword, Signal::Venues]),
            Rule::Visibility => SignalSet::of(&[Signal::Keyword, Signal::Venues]),
            Rule::Carousel => SignalSet::of(&[Signal::FilteredList, Signal::Layout]),
        }
    }

    pub const fn outputs(self) -> SignalSet {
        match self {
            Rule::Neighborhood => {
                SignalSet::of(&[
                    Signal::Keyword,
                    Signal::Markers,
                    Signal::Pin,
                    Signal::Bounds,
                    Signal::Selection,
                ])
            }
            Rule::Filter => SignalSet::of(&[Signal::FilteredList]),
            Rule::Visibility => SignalSet::of(&[Signal::Markers]),
            Rule::Carousel => SignalSet::of(&[Signal::Carousel, Signal::Selection]),
        }
    }
}

/// Dirty/changed bookkeeping for one view model.
#[derive(Debug, Default)]
pub struct Graph {
    dirty: SignalSet,
    changed: SignalSet,
}

impl Graph {
    pub fn mark(&mut self, signal: Signal) {
        self.dirty.insert(signal);
        self.changed.insert(signal);
    }

    pub fn dirty(&self) -> SignalSet {
        self.dirty
    }

    pub fn should_run(&self, rule: Rule) -> bool {
        rule.inputs().intersects(self.dirty)
    }

    /// Ends a settle, returning everything that changed since the last one.
    pub fn finish(&mut self) -> SignalSet {
        self.dirty = SignalSet::EMPTY;
        std::mem::take(&mut self.changed)
    }
}
