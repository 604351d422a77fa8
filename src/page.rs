//! Page composition
//!
//! `Page` owns the document, the timer scheduler and one instance of each
//! controller. DOM events arrive through `dispatch`, time passes through
//! `advance`; both render the document afterwards.
//!
//! Timer callbacks run one at a time in due order. Before each callback the
//! audio context is advanced to the callback's instant, so scheduled ramps
//! and timers observe the same clock.

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::carousel::AutoCarousel;
use crate::config::AuraConfig;
use crate::engine::{AudioBackend, Scheduler};
use crate::error::Result;
use crate::player::AmbientPlayer;
use crate::stats::StatsPanel;
use crate::ui::{CarouselView, Document, PlayerView, StatsView};

/// Something the user (or the viewport) did to the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// Click on `#musicBtn`
    MusicButtonClick,
    /// Pointer entered `.zen-carousel`
    CarouselMouseEnter,
    /// Pointer left `.zen-carousel`
    CarouselMouseLeave,
    /// Click on the indicator dot at this index
    IndicatorClick(usize),
    /// `.hero-stats` scrolled into view
    StatsVisible,
}

/// The landing page with its live controllers
pub struct Page<B: AudioBackend> {
    document: Document,
    scheduler: Scheduler,
    player: AmbientPlayer<B>,
    player_view: PlayerView,
    carousel: AutoCarousel,
    carousel_view: CarouselView,
    stats: StatsPanel,
    stats_view: StatsView,
    /// Scheduler time the audio context has been advanced to
    audio_synced_ms: u64,
}

impl<B: AudioBackend> Page<B> {
    /// Bind the controllers to `document` and start the carousel
    ///
    /// # Errors
    /// * `MissingElement` - a required element is absent
    /// * `InvalidConfig` - the configuration or the markup is inconsistent
    pub fn new(document: Document, backend: B, config: &AuraConfig) -> Result<Self> {
        Self::with_rng(document, backend, config, StdRng::from_os_rng())
    }

    /// Like `new`, with an explicit random source for the player
    pub fn with_rng(
        document: Document,
        backend: B,
        config: &AuraConfig,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;

        let player_view = PlayerView::bind(&document)?;
        let carousel_view = CarouselView::bind(&document)?;
        let stats_view = StatsView::bind(&document, config.stats.counters.len())?;

        let mut scheduler = Scheduler::new();
        let mut carousel = AutoCarousel::new(carousel_view.len(), &config.carousel);
        carousel.start_auto_play(&mut scheduler);

        let mut page = Self {
            document,
            scheduler,
            player: AmbientPlayer::with_rng(backend, config.player.clone(), rng),
            player_view,
            carousel,
            carousel_view,
            stats: StatsPanel::new(&config.stats),
            stats_view,
            audio_synced_ms: 0,
        };
        page.render();
        debug!(
            "[PAGE] bound {} slides, {} stat counters",
            page.carousel.slide_count(),
            page.stats.counters().len()
        );
        Ok(page)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn player(&self) -> &AmbientPlayer<B> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut AmbientPlayer<B> {
        &mut self.player
    }

    pub fn carousel(&self) -> &AutoCarousel {
        &self.carousel
    }

    pub fn carousel_view(&self) -> &CarouselView {
        &self.carousel_view
    }

    pub fn stats(&self) -> &StatsPanel {
        &self.stats
    }

    pub fn stats_view(&self) -> &StatsView {
        &self.stats_view
    }

    /// Page time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Handle one page event, then render
    ///
    /// An unavailable audio subsystem is logged and otherwise ignored.
    ///
    /// # Errors
    /// * `SlideOutOfRange` - indicator index past the last slide
    pub fn dispatch(&mut self, event: PageEvent) -> Result<()> {
        debug!("[PAGE] {:?} at {} ms", event, self.now_ms());
        let result = match event {
            PageEvent::MusicButtonClick => match self.player.toggle(&mut self.scheduler) {
                Err(e) if e.is_recoverable() => {
                    warn!("[PAGE] Ambient audio unavailable: {}", e);
                    Ok(())
                }
                other => other,
            },
            PageEvent::CarouselMouseEnter => {
                if self.carousel_view.root.is_some() {
                    self.carousel.mouse_enter(&mut self.scheduler);
                }
                Ok(())
            }
            PageEvent::CarouselMouseLeave => {
                if self.carousel_view.root.is_some() {
                    self.carousel.mouse_leave(&mut self.scheduler);
                }
                Ok(())
            }
            PageEvent::IndicatorClick(index) => {
                self.carousel.indicator_click(index, &mut self.scheduler)
            }
            PageEvent::StatsVisible => {
                self.stats.reveal(&mut self.scheduler);
                Ok(())
            }
        };
        self.render();
        result
    }

    /// Let `ms` milliseconds of page time pass, firing due timers in order
    pub fn advance(&mut self, ms: u64) {
        let target = self.scheduler.now_ms().saturating_add(ms);
        self.advance_to(target);
    }

    /// Advance page time to `target_ms`
    pub fn advance_to(&mut self, target_ms: u64) {
        while let Some(fired) = self.scheduler.pop_due(target_ms) {
            self.sync_audio(fired.at_ms);
            let handled = self.player.on_timer(fired.handle, &mut self.scheduler)
                || self.carousel.on_timer(fired.handle)
                || self.stats.on_timer(fired.handle, &mut self.scheduler);
            if !handled {
                debug!("[PAGE] {} fired with no owner", fired.handle);
            }
            self.render();
        }
        self.scheduler.advance_to(target_ms);
        self.sync_audio(self.scheduler.now_ms());
    }

    /// Project every controller's state onto the document
    pub fn render(&mut self) {
        self.player_view
            .render(&mut self.document, self.player.is_playing());
        self.carousel_view
            .render(&mut self.document, self.carousel.current());
        self.stats_view.render(&mut self.document, &self.stats);
    }

    fn sync_audio(&mut self, now_ms: u64) {
        if now_ms > self.audio_synced_ms {
            self.player
                .advance((now_ms - self.audio_synced_ms) as f64 / 1000.0);
            self.audio_synced_ms = now_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{OfflineBackend, UnavailableBackend};
    use crate::ui::landing_page;
    use crate::ui::views::{ACTIVE, HIDDEN, PLAYING};
    use pretty_assertions::assert_eq;

    fn page(slides: usize) -> Page<OfflineBackend> {
        Page::with_rng(
            landing_page(slides),
            OfflineBackend::new(8000),
            &AuraConfig::default(),
            StdRng::seed_from_u64(3),
        )
        .unwrap()
    }

    #[test]
    fn test_construction_starts_carousel_without_mutation() {
        let page = page(3);
        assert!(page.carousel().is_auto_playing());
        assert_eq!(page.scheduler().active_count(), 1);
        assert_eq!(page.document().mutation_count(), 0);
    }

    #[test]
    fn test_music_click_renders_icons() {
        let mut page = page(3);
        page.dispatch(PageEvent::MusicButtonClick).unwrap();
        let doc = page.document();
        let player = doc.get_element_by_id("musicPlayer").unwrap();
        let pause = doc.require(".pause-icon").unwrap();
        assert!(doc.has_class(player, PLAYING));
        assert!(!doc.has_class(pause, HIDDEN));

        page.dispatch(PageEvent::MusicButtonClick).unwrap();
        // Fading out already shows the stopped UI
        assert!(!page.document().has_class(player, PLAYING));
        page.advance(1500);
        assert!(page.player().layers().is_empty());
    }

    #[test]
    fn test_unavailable_audio_is_swallowed() {
        let mut page = Page::new(
            landing_page(3),
            UnavailableBackend::default(),
            &AuraConfig::default(),
        )
        .unwrap();
        page.dispatch(PageEvent::MusicButtonClick).unwrap();
        assert!(!page.player().is_playing());
        assert_eq!(page.document().mutation_count(), 0);
    }

    #[test]
    fn test_autoplay_renders_active_slide() {
        let mut page = page(3);
        page.advance(5000);
        let slides = page.carousel_view().slides.clone();
        assert_eq!(page.carousel().current_index(), 1);
        assert!(page.document().has_class(slides[1], ACTIVE));
        assert!(!page.document().has_class(slides[0], ACTIVE));
    }

    #[test]
    fn test_indicator_out_of_range_is_an_error() {
        let mut page = page(3);
        let err = page.dispatch(PageEvent::IndicatorClick(7)).unwrap_err();
        assert_eq!(err.error_code(), "SLIDE_OUT_OF_RANGE");
        assert_eq!(page.carousel().current_index(), 0);
    }

    #[test]
    fn test_advance_saturates_at_the_end_of_time() {
        let mut page = page(0);
        page.advance(10);
        page.advance(u64::MAX);
        assert_eq!(page.now_ms(), u64::MAX);
        page.advance(1);
        assert_eq!(page.now_ms(), u64::MAX);
    }

    #[test]
    fn test_missing_stats_block_is_rejected() {
        let err = Page::new(Document::new(), OfflineBackend::default(), &AuraConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "MISSING_ELEMENT");
    }
}
