//! Snap functionality for keeping glosses and lines aligned.
//!
//! Boxes in a connected component move rigidly: a child sits directly above
//! or below its parent, one box height plus the global vertical spacing
//! away, at the parent's horizontal position. Roots sit on their line's
//! baseline.

use crate::config::LayoutConfig;
use crate::geometry::Geometry;
use crate::graph::EntityGraph;
use crate::line::{LineId, LineRegistry};
use crate::word::{BoxId, ChildSlot, PageNumber, WordBox};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashSet;

/// Y for the top edge of a box of `height` resting on `baseline`.
pub fn root_y_for_baseline(baseline: f64, height: f64) -> f64 {
    baseline - height
}

/// Where a child box goes relative to its parent.
///
/// `forced_x` overrides the parent's stored X, which may lag behind the
/// pointer in the middle of a drag.
pub fn child_position(
    parent: &WordBox,
    child_height: f64,
    slot: ChildSlot,
    forced_x: Option<f64>,
    spacing: f64,
) -> Point {
    let x = forced_x.unwrap_or(parent.position.x);
    let y = match slot {
        ChildSlot::Top => parent.position.y - child_height - spacing,
        ChildSlot::Bottom => parent.position.y + parent.height() + spacing,
    };
    Point::new(x, y)
}

/// Place every descendant of `parent` relative to it, recursively.
///
/// Each placed child becomes the parent for the next level, and `forced_x`
/// is threaded through so the whole chain shares one X during a drag.
pub fn reposition_children(
    graph: &mut EntityGraph,
    parent: BoxId,
    forced_x: Option<f64>,
    spacing: f64,
) {
    let mut seen = HashSet::from([parent]);
    let mut pending = vec![parent];

    while let Some(current) = pending.pop() {
        let Some(parent_box) = graph.get(current).cloned() else {
            continue;
        };
        for slot in ChildSlot::both() {
            let Some(child) = parent_box.child(slot) else {
                continue;
            };
            if !seen.insert(child) {
                continue;
            }
            let Some(child_box) = graph.get_mut(child) else {
                log::warn!("skipping dangling child {child} of {current}");
                continue;
            };
            child_box.position =
                child_position(&parent_box, child_box.height(), slot, forced_x, spacing);
            pending.push(child);
        }
    }
}

/// Rest a root box on `baseline` and bring its glosses along.
pub fn place_on_baseline(graph: &mut EntityGraph, root: BoxId, baseline: f64, config: &LayoutConfig) {
    let Some(word) = graph.get_mut(root) else {
        return;
    };
    word.position.y = root_y_for_baseline(baseline, word.height());
    reposition_children(graph, root, None, config.vertical_spacing);
}

/// Move a root to `position` and drag its glosses with it.
pub fn move_component(
    graph: &mut EntityGraph,
    root: BoxId,
    position: Point,
    config: &LayoutConfig,
) {
    let Some(word) = graph.get_mut(root) else {
        return;
    };
    word.position = position;
    reposition_children(graph, root, Some(position.x), config.vertical_spacing);
}

/// Result of a line proximity search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSnap {
    pub line: LineId,
    /// Absolute vertical distance to the baseline.
    pub distance: f64,
}

/// Find the line on `page` whose baseline is closest to `y`, within
/// `snap_distance`. On equal distances the line registered first wins.
pub fn nearest_line(
    lines: &LineRegistry,
    page: PageNumber,
    y: f64,
    snap_distance: f64,
) -> Option<LineSnap> {
    let mut best: Option<LineSnap> = None;
    for line in lines.lines_on_page(page) {
        let distance = (line.y() - y).abs();
        if distance > snap_distance {
            continue;
        }
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(LineSnap {
                line: line.id(),
                distance,
            });
        }
    }
    best
}

/// The band a line occupies for collision purposes.
pub fn line_band(y: f64, config: &LayoutConfig) -> Rect {
    let (x0, x1) = config.line_span();
    Rect::new(x0, y - config.cap_height, x1, y + config.descender_height)
}

fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Distance from a point to the segment a->b.
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    point.distance(proj)
}

/// Whether moving `line_id` to baseline `candidate_y` would run it into a
/// box it does not own, either by overlapping the box or by passing within
/// marker radius of one of its connector markers.
pub fn line_move_blocked(
    line_id: LineId,
    candidate_y: f64,
    graph: &EntityGraph,
    geometry: &dyn Geometry,
    config: &LayoutConfig,
) -> bool {
    let band = line_band(candidate_y, config);
    let (x0, x1) = config.line_span();
    let start = Point::new(x0, candidate_y);
    let end = Point::new(x1, candidate_y);

    graph
        .iter()
        .filter(|word| word.line() != Some(line_id))
        .any(|word| {
            let width = geometry.box_width(word);
            if rects_overlap(band, word.bounds(width)) {
                return true;
            }
            [word.top_marker(width), word.bottom_marker(width)]
                .into_iter()
                .any(|marker| point_to_segment_dist(marker, start, end) <= config.marker_radius)
        })
}
