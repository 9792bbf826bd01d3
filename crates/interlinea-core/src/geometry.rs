//! Geometry queries the core delegates to the presentation layer.

use crate::config::LayoutConfig;
use crate::word::{PageNumber, WordBox};
use kurbo::Rect;
use std::fmt::Debug;

/// Measurements that depend on how the page is actually rendered.
///
/// The editor core never reads pixel geometry directly; it asks through
/// this trait so tests and headless tools can substitute their own layout.
pub trait Geometry: Debug {
    /// Rendered width of a box's text.
    fn box_width(&self, word: &WordBox) -> f64;

    /// Page containing document-space coordinate `y`.
    fn page_at(&self, y: f64) -> PageNumber;

    /// Bounding rectangle of a box.
    fn box_bounds(&self, word: &WordBox) -> Rect {
        word.bounds(self.box_width(word))
    }

    /// Page a box currently sits on.
    fn page_of(&self, word: &WordBox) -> PageNumber {
        self.page_at(word.position.y)
    }
}

/// Pages stacked top to bottom with fixed-advance text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackedPages {
    pub page_height: f64,
    pub char_width: f64,
}

impl StackedPages {
    pub fn new(page_height: f64, char_width: f64) -> Self {
        Self {
            page_height,
            char_width,
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(config.page_height, config.char_width)
    }
}

impl Default for StackedPages {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

impl Geometry for StackedPages {
    fn box_width(&self, word: &WordBox) -> f64 {
        word.text.chars().count().max(1) as f64 * self.char_width
    }

    fn page_at(&self, y: f64) -> PageNumber {
        if self.page_height <= 0.0 || y < 0.0 {
            return 1;
        }
        (y / self.page_height).floor() as PageNumber + 1
    }
}
