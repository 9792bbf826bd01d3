//! Layout configuration injected by the presentation layer.

use serde::{Deserialize, Serialize};

/// Height of a plain word box (matches the body font line height).
pub const BASE_BOX_HEIGHT: f64 = 24.0;

/// Default vertical gap between a box and its glosses.
pub const DEFAULT_VERTICAL_SPACING: f64 = 6.0;

/// Distance within which a dragged box attaches to a line.
pub const SNAP_DISTANCE: f64 = 20.0;

/// Radius of the connector markers drawn above and below a box.
pub const MARKER_RADIUS: f64 = 4.0;

/// US Letter at 96 dpi.
pub const PAGE_WIDTH: f64 = 816.0;
pub const PAGE_HEIGHT: f64 = 1056.0;
pub const PAGE_MARGIN: f64 = 72.0;

/// Layout values the core needs but does not own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Gap between a parent box and each of its children.
    pub vertical_spacing: f64,
    /// Left page margin; lines start here.
    pub margin_left: f64,
    /// Right page margin; lines end at `page_width - margin_right`.
    pub margin_right: f64,
    pub page_width: f64,
    pub page_height: f64,
    /// Height of a plain word box. Headings scale from this.
    pub base_box_height: f64,
    /// Vertical distance within which a box snaps to a line.
    pub snap_distance: f64,
    /// Extent of a line's collision band above the baseline.
    pub cap_height: f64,
    /// Extent of a line's collision band below the baseline.
    pub descender_height: f64,
    /// Connector marker radius used by line collision tests.
    pub marker_radius: f64,
    /// Advance width per character used by the default geometry.
    pub char_width: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            vertical_spacing: DEFAULT_VERTICAL_SPACING,
            margin_left: PAGE_MARGIN,
            margin_right: PAGE_MARGIN,
            page_width: PAGE_WIDTH,
            page_height: PAGE_HEIGHT,
            base_box_height: BASE_BOX_HEIGHT,
            snap_distance: SNAP_DISTANCE,
            cap_height: BASE_BOX_HEIGHT * 0.75,
            descender_height: BASE_BOX_HEIGHT * 0.25,
            marker_radius: MARKER_RADIUS,
            char_width: 10.0,
        }
    }
}

impl LayoutConfig {
    /// Horizontal extent of a line, margin to margin.
    pub fn line_span(&self) -> (f64, f64) {
        (self.margin_left, self.page_width - self.margin_right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_span() {
        let config = LayoutConfig::default();
        assert_eq!(config.line_span(), (72.0, 744.0));
    }

    #[test]
    fn test_config_json() {
        let config = LayoutConfig {
            vertical_spacing: 10.0,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: LayoutConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
