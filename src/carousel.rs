//! Auto-advancing slide carousel
//!
//! `AutoCarousel` owns the carousel's transient state: which slide is up and
//! whether the autoplay timer is live. It never touches the document; the
//! page renders `current()` after every transition.

use log::debug;

use crate::config::CarouselConfig;
use crate::engine::{Scheduler, TimerHandle};
use crate::error::{AuraError, Result};

/// Slide rotation state
#[derive(Debug, Clone)]
pub struct AutoCarousel {
    slide_count: usize,
    current: usize,
    delay_ms: u64,
    timer: Option<TimerHandle>,
}

impl AutoCarousel {
    /// Carousel over `slide_count` slides, showing slide 0, timer not started
    pub fn new(slide_count: usize, config: &CarouselConfig) -> Self {
        Self {
            slide_count,
            current: 0,
            delay_ms: config.autoplay_delay_ms,
            timer: None,
        }
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    /// Index of the active slide (0 for an empty carousel)
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Index of the active slide, or `None` when there are no slides
    pub fn current(&self) -> Option<usize> {
        (self.slide_count > 0).then_some(self.current)
    }

    /// Whether the autoplay timer is live
    pub fn is_auto_playing(&self) -> bool {
        self.timer.is_some()
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    /// Make `index` the active slide
    ///
    /// # Errors
    /// * `SlideOutOfRange` - `index >= slide_count`
    pub fn go_to_slide(&mut self, index: usize) -> Result<()> {
        if index >= self.slide_count {
            return Err(AuraError::SlideOutOfRange {
                index,
                len: self.slide_count,
            });
        }
        debug!("[CAROUSEL] slide {} -> {}", self.current, index);
        self.current = index;
        Ok(())
    }

    /// Advance to the next slide, wrapping at the end
    pub fn next_slide(&mut self) {
        if self.slide_count == 0 {
            return;
        }
        self.current = (self.current + 1) % self.slide_count;
        debug!("[CAROUSEL] advanced to slide {}", self.current);
    }

    /// Start the autoplay interval
    ///
    /// No-op when a timer is already live or there are no slides; returns
    /// whether a timer was started.
    pub fn start_auto_play(&mut self, scheduler: &mut Scheduler) -> bool {
        if self.timer.is_some() || self.slide_count == 0 {
            return false;
        }
        self.timer = Some(scheduler.set_interval(self.delay_ms));
        true
    }

    /// Cancel the autoplay interval, if any
    pub fn pause_auto_play(&mut self, scheduler: &mut Scheduler) {
        if let Some(handle) = self.timer.take() {
            scheduler.clear(handle);
        }
    }

    /// Restart the autoplay period from now
    pub fn reset_auto_play(&mut self, scheduler: &mut Scheduler) {
        self.pause_auto_play(scheduler);
        self.start_auto_play(scheduler);
    }

    /// Pointer entered the carousel
    pub fn mouse_enter(&mut self, scheduler: &mut Scheduler) {
        self.pause_auto_play(scheduler);
    }

    /// Pointer left the carousel
    pub fn mouse_leave(&mut self, scheduler: &mut Scheduler) {
        self.start_auto_play(scheduler);
    }

    /// An indicator dot was clicked
    pub fn indicator_click(&mut self, index: usize, scheduler: &mut Scheduler) -> Result<()> {
        self.go_to_slide(index)?;
        self.reset_auto_play(scheduler);
        Ok(())
    }

    /// Handle a fired timer; returns false if it belongs to someone else
    pub fn on_timer(&mut self, handle: TimerHandle) -> bool {
        if self.timer != Some(handle) {
            return false;
        }
        self.next_slide();
        true
    }
}
