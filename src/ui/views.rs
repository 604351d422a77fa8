//! View bindings
//!
//! Each view resolves its elements once, at construction, and then projects
//! controller state onto them in `render`. Rendering only writes what
//! differs, so re-rendering an unchanged state leaves the document alone.

use crate::error::{AuraError, Result};
use crate::stats::StatsPanel;
use crate::ui::document::{Document, ElementId};

pub const HIDDEN: &str = "hidden";
pub const PLAYING: &str = "playing";
pub const ACTIVE: &str = "active";
pub const ANIMATED: &str = "animated";

/// Music player button icons and container
#[derive(Debug, Clone)]
pub struct PlayerView {
    pub button: ElementId,
    pub player: ElementId,
    pub play_icon: ElementId,
    pub pause_icon: ElementId,
}

impl PlayerView {
    pub fn bind(doc: &Document) -> Result<Self> {
        Ok(Self {
            button: doc.require("#musicBtn")?,
            player: doc.require("#musicPlayer")?,
            play_icon: doc.require(".play-icon")?,
            pause_icon: doc.require(".pause-icon")?,
        })
    }

    pub fn render(&self, doc: &mut Document, playing: bool) {
        doc.set_class(self.play_icon, HIDDEN, playing);
        doc.set_class(self.pause_icon, HIDDEN, !playing);
        doc.set_class(self.player, PLAYING, playing);
    }
}

/// Carousel slides and their indicator dots
#[derive(Debug, Clone)]
pub struct CarouselView {
    /// Hover target; absent pages simply never pause on hover
    pub root: Option<ElementId>,
    pub slides: Vec<ElementId>,
    pub dots: Vec<ElementId>,
}

impl CarouselView {
    /// Bind every `.carousel-slide` and `.carousel-dots .dot`
    ///
    /// # Errors
    /// * `InvalidConfig` - slide and dot counts differ
    pub fn bind(doc: &Document) -> Result<Self> {
        let slides = doc.query_selector_all(".carousel-slide");
        let dots = doc.query_selector_all(".carousel-dots .dot");
        if slides.len() != dots.len() {
            return Err(AuraError::InvalidConfig {
                reason: format!(
                    "carousel has {} slides but {} indicator dots",
                    slides.len(),
                    dots.len()
                ),
            });
        }
        Ok(Self {
            root: doc.query_selector(".zen-carousel"),
            slides,
            dots,
        })
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Mark exactly the slide/dot pair at `current` as active
    pub fn render(&self, doc: &mut Document, current: Option<usize>) {
        for (i, (&slide, &dot)) in self.slides.iter().zip(&self.dots).enumerate() {
            let active = current == Some(i);
            doc.set_class(slide, ACTIVE, active);
            doc.set_class(dot, ACTIVE, active);
        }
    }
}

/// Hero statistics block
#[derive(Debug, Clone)]
pub struct StatsView {
    pub root: ElementId,
    pub numbers: Vec<ElementId>,
}

impl StatsView {
    /// Bind `.hero-stats` and its `.stat-number` slots
    ///
    /// # Errors
    /// * `MissingElement` - no `.hero-stats` block
    /// * `InvalidConfig` - fewer slots than configured counters
    pub fn bind(doc: &Document, counters: usize) -> Result<Self> {
        let root = doc.require(".hero-stats")?;
        let numbers = doc.query_selector_all(".hero-stats .stat-number");
        if numbers.len() < counters {
            return Err(AuraError::InvalidConfig {
                reason: format!(
                    "{} stat counters configured but the page has {} slots",
                    counters,
                    numbers.len()
                ),
            });
        }
        Ok(Self { root, numbers })
    }

    pub fn render(&self, doc: &mut Document, panel: &StatsPanel) {
        if !panel.is_revealed() {
            return;
        }
        doc.add_class(self.root, ANIMATED);
        for (&slot, counter) in self.numbers.iter().zip(panel.counters()) {
            if let Some(label) = counter.label() {
                doc.set_text(slot, label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatsConfig;
    use crate::engine::Scheduler;
    use crate::ui::landing::landing_page;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_player_view_render() {
        let mut doc = landing_page(3);
        let view = PlayerView::bind(&doc).unwrap();
        view.render(&mut doc, false);
        assert_eq!(doc.mutation_count(), 0);

        view.render(&mut doc, true);
        assert!(doc.has_class(view.play_icon, HIDDEN));
        assert!(!doc.has_class(view.pause_icon, HIDDEN));
        assert!(doc.has_class(view.player, PLAYING));
        assert_eq!(doc.mutation_count(), 3);
    }

    #[test]
    fn test_player_view_requires_button() {
        let doc = Document::new();
        assert_eq!(
            PlayerView::bind(&doc).unwrap_err().error_code(),
            "MISSING_ELEMENT"
        );
    }

    #[test]
    fn test_carousel_view_activates_exactly_one_pair() {
        let mut doc = landing_page(4);
        let view = CarouselView::bind(&doc).unwrap();
        assert_eq!(view.len(), 4);
        view.render(&mut doc, Some(2));
        assert_eq!(doc.query_selector_all(".carousel-slide.active"), vec![view.slides[2]]);
        assert_eq!(doc.query_selector_all(".dot.active"), vec![view.dots[2]]);
    }

    #[test]
    fn test_carousel_view_rejects_mismatched_dots() {
        let mut doc = landing_page(2);
        let dots = doc.require(".carousel-dots").unwrap();
        doc.append(Some(dots), "button", None, &["dot"]);
        assert!(CarouselView::bind(&doc).is_err());
    }

    #[test]
    fn test_stats_view_waits_for_reveal() {
        let mut doc = landing_page(1);
        let config = StatsConfig::default();
        let view = StatsView::bind(&doc, config.counters.len()).unwrap();
        let mut panel = StatsPanel::new(&config);

        view.render(&mut doc, &panel);
        assert_eq!(doc.mutation_count(), 0);

        panel.reveal(&mut Scheduler::new());
        view.render(&mut doc, &panel);
        assert!(doc.has_class(view.root, ANIMATED));
        assert_eq!(doc.text(view.numbers[1]), "4.9");
    }
}
