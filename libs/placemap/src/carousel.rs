//! Swipeable one-venue-per-slide list used on narrow layouts.
//!
//! Positions are discrete slide indices `0..len`; a drag moves a continuous
//! offset (in px, slide `i` sits at `i * slide_width`) and the release decides
//! whether to move by exactly one slide or snap back. Time is passed in as a
//! `Duration` since an arbitrary origin so gesture traces can be synthesised.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarouselConfig {
    pub slide_width: f32,
    /// Minimum release speed, in px/ms, for a short gesture to count as a flick.
    pub flick_velocity: f32,
    /// Gestures held longer than this are never flicks.
    pub flick_max: Duration,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            slide_width: 280.0,
            flick_velocity: 0.5,
            flick_max: Duration::from_millis(250),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    Idle,
    Dragging {
        anchor_offset: f32,
        start_x: f32,
        started_at: Duration,
    },
    Settling {
        target: usize,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Affordances {
    pub can_swipe_left: bool,
    pub can_swipe_right: bool,
}

impl Affordances {
    pub fn at(index: usize, len: usize) -> Self {
        Self {
            can_swipe_left: len > 0 && index > 0,
            can_swipe_right: len >= 2 && index < len - 1,
        }
    }
}

/// Index a drag released with displacement `dx` after `elapsed` lands on.
///
/// Moves by exactly one slide against the finger when the drag passed half a
/// slide or was a flick, and never leaves `0..len`.
pub fn release_target(
    index: usize,
    len: usize,
    dx: f32,
    elapsed: Duration,
    config: &CarouselConfig,
) -> usize {
    if len == 0 {
        return 0;
    }
    let past_half = dx.abs() > config.slide_width / 2.0;
    let flick = dx != 0.0 && elapsed <= config.flick_max && {
        let ms = elapsed.as_secs_f32() * 1000.0;
        ms == 0.0 || dx.abs() / ms >= config.flick_velocity
    };
    if !(past_half || flick) {
        return index;
    }
    if dx < 0.0 {
        (index + 1).min(len - 1)
    } else {
        index.saturating_sub(1)
    }
}

#[derive(Clone, Debug)]
pub struct Carousel {
    config: CarouselConfig,
    len: usize,
    index: usize,
    offset: f32,
    gesture: Gesture,
    engaged: bool,
}

impl Carousel {
    pub fn new(config: CarouselConfig) -> Self {
        Self {
            config,
            len: 0,
            index: 0,
            offset: 0.0,
            gesture: Gesture::Idle,
            engaged: false,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current slide, or `None` while there is nothing to show.
    pub fn index(&self) -> Option<usize> {
        (self.len > 0).then_some(self.index)
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn affordances(&self) -> Affordances {
        Affordances::at(self.index, self.len)
    }

    fn max_offset(&self) -> f32 {
        self.len.saturating_sub(1) as f32 * self.config.slide_width
    }

    fn rest_offset(&self, index: usize) -> f32 {
        index as f32 * self.config.slide_width
    }

    pub fn set_engaged(&mut self, engaged: bool) {
        if self.engaged && !engaged {
            self.finish_settle();
            self.gesture = Gesture::Idle;
            self.offset = self.rest_offset(self.index);
        }
        self.engaged = engaged;
    }

    /// Back to the first slide of a list of `len` items.
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.index = 0;
        self.offset = 0.0;
        self.gesture = Gesture::Idle;
    }

    pub fn drag_start(&mut self, x: f32, at: Duration) -> bool {
        if !self.engaged || self.len == 0 {
            return false;
        }
        self.finish_settle();
        self.gesture = Gesture::Dragging {
            anchor_offset: self.offset,
            start_x: x,
            started_at: at,
        };
        true
    }

    /// Follows the finger, clamped to the first and last slide. Returns the new offset.
    pub fn drag_move(&mut self, x: f32) -> Option<f32> {
        let Gesture::Dragging {
            anchor_offset,
            start_x,
            ..
        } = self.gesture
        else {
            return None;
        };
        self.offset = (anchor_offset - (x - start_x)).clamp(0.0, self.max_offset());
        Some(self.offset)
    }

    /// Releases the drag and starts settling. Returns the slide being settled on.
    pub fn drag_end(&mut self, x: f32, at: Duration) -> Option<usize> {
        let Gesture::Dragging {
            start_x,
            started_at,
            ..
        } = self.gesture
        else {
            return None;
        };
        let target = release_target(
            self.index,
            self.len,
            x - start_x,
            at.saturating_sub(started_at),
            &self.config,
        );
        self.gesture = Gesture::Settling { target };
        Some(target)
    }

    /// Jumps straight to `index`, e.g. when the venue was picked on the map.
    pub fn show(&mut self, index: usize) -> bool {
        if index >= self.len || (index == self.index && self.gesture == Gesture::Idle) {
            return false;
        }
        self.gesture = Gesture::Idle;
        self.index = index;
        self.offset = self.rest_offset(index);
        true
    }

    /// Completes a settle. Returns the new index if it changed.
    pub fn finish_settle(&mut self) -> Option<usize> {
        let Gesture::Settling { target } = self.gesture else {
            return None;
        };
        self.gesture = Gesture::Idle;
        self.offset = self.rest_offset(target);
        let changed = target != self.index;
        self.index = target;
        changed.then_some(target)
    }
}
