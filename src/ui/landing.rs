//! The landing page markup the controllers bind to

use crate::ui::document::Document;

/// Build the landing page with `slides` carousel slides
///
/// Initial markup matches the static page: play icon visible, pause icon
/// hidden, first slide and dot active, stats showing their static labels.
pub fn landing_page(slides: usize) -> Document {
    let mut doc = Document::new();

    let hero = doc.append(None, "section", None, &["hero"]);
    let stats = doc.append(Some(hero), "div", None, &["hero-stats"]);
    for label in ["500K+", "4.9", "10M+"] {
        let stat = doc.append(Some(stats), "div", None, &["stat"]);
        let number = doc.append(Some(stat), "span", None, &["stat-number"]);
        doc.set_text(number, label);
    }

    let button = doc.append(None, "button", Some("musicBtn"), &["music-btn"]);
    let player = doc.append(Some(button), "div", Some("musicPlayer"), &["music-player"]);
    doc.append(Some(player), "svg", None, &["play-icon"]);
    doc.append(Some(player), "svg", None, &["pause-icon", "hidden"]);

    let carousel = doc.append(None, "div", None, &["zen-carousel"]);
    let track = doc.append(Some(carousel), "div", None, &["carousel-track"]);
    for i in 0..slides {
        let classes: &[&str] = if i == 0 {
            &["carousel-slide", "active"]
        } else {
            &["carousel-slide"]
        };
        doc.append(Some(track), "div", None, classes);
    }
    let dots = doc.append(Some(carousel), "div", None, &["carousel-dots"]);
    for i in 0..slides {
        let classes: &[&str] = if i == 0 { &["dot", "active"] } else { &["dot"] };
        doc.append(Some(dots), "button", None, classes);
    }

    // Markup construction is not a page mutation
    doc.reset_mutation_count();
    doc
}
