//! Page UI Module
//!
//! The element tree the controllers render into, and the views that bind
//! controller state to it.

pub mod document;
pub mod landing;
pub mod views;

pub use document::{Document, ElementId};
pub use landing::landing_page;
pub use views::{CarouselView, PlayerView, StatsView};
