//! Live state of a drag gesture between start and stop.

use crate::history::ComponentLayout;
use crate::line::LineId;
use crate::marginalia::MarginaliaId;
use crate::word::BoxId;
use kurbo::{Point, Rect, Vec2};

/// Smallest width or height a marginalia block can be resized to.
pub const MIN_MARGINALIA_SIZE: f64 = 20.0;

/// State for dragging a connected component by its root.
#[derive(Debug, Clone)]
pub struct BoxDrag {
    pub root: BoxId,
    /// Pointer position relative to the root's top-left corner.
    pub grab_offset: Vec2,
    /// Layout at drag start, for undo and cancel.
    pub before: ComponentLayout,
}

impl BoxDrag {
    /// Where the root goes for a given pointer position.
    pub fn root_position(&self, pointer: Point) -> Point {
        pointer - self.grab_offset
    }
}

/// State for dragging a line's baseline.
#[derive(Debug, Clone)]
pub struct LineDrag {
    pub line: LineId,
    /// Pointer Y minus baseline Y at drag start.
    pub grab_offset: f64,
    pub start_y: f64,
    /// Refuse positions that would collide with other boxes (shift-drag).
    pub avoid_collisions: bool,
}

impl LineDrag {
    pub fn candidate_y(&self, pointer: Point) -> f64 {
        pointer.y - self.grab_offset
    }
}

/// How a marginalia drag changes the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarginaliaDragMode {
    #[default]
    Move,
    /// Drag the bottom-right corner.
    Resize,
}

/// State for moving or resizing a marginalia block.
#[derive(Debug, Clone)]
pub struct MarginaliaDrag {
    pub id: MarginaliaId,
    pub mode: MarginaliaDragMode,
    pub start_point: Point,
    pub original: Rect,
}

impl MarginaliaDrag {
    /// The block's rectangle for a given pointer position.
    pub fn rect_for(&self, pointer: Point) -> Rect {
        let delta = pointer - self.start_point;
        match self.mode {
            MarginaliaDragMode::Move => self.original + delta,
            MarginaliaDragMode::Resize => {
                let width = (self.original.width() + delta.x).max(MIN_MARGINALIA_SIZE);
                let height = (self.original.height() + delta.y).max(MIN_MARGINALIA_SIZE);
                Rect::from_origin_size(self.original.origin(), (width, height))
            }
        }
    }
}

/// The drag in progress, if any.
#[derive(Debug, Clone)]
pub enum DragState {
    Box(BoxDrag),
    Line(LineDrag),
    Marginalia(MarginaliaDrag),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marginalia_move_rect() {
        let drag = MarginaliaDrag {
            id: MarginaliaId::new(),
            mode: MarginaliaDragMode::Move,
            start_point: Point::new(10.0, 10.0),
            original: Rect::new(0.0, 0.0, 100.0, 50.0),
        };
        assert_eq!(
            drag.rect_for(Point::new(30.0, 15.0)),
            Rect::new(20.0, 5.0, 120.0, 55.0)
        );
    }

    #[test]
    fn test_marginalia_resize_clamps() {
        let drag = MarginaliaDrag {
            id: MarginaliaId::new(),
            mode: MarginaliaDragMode::Resize,
            start_point: Point::new(100.0, 50.0),
            original: Rect::new(0.0, 0.0, 100.0, 50.0),
        };
        assert_eq!(
            drag.rect_for(Point::new(150.0, 60.0)),
            Rect::new(0.0, 0.0, 150.0, 60.0)
        );
        assert_eq!(
            drag.rect_for(Point::new(-500.0, -500.0)),
            Rect::new(0.0, 0.0, MIN_MARGINALIA_SIZE, MIN_MARGINALIA_SIZE)
        );
    }

    #[test]
    fn test_line_candidate() {
        let drag = LineDrag {
            line: LineId::new(),
            grab_offset: -4.0,
            start_y: 300.0,
            avoid_collisions: false,
        };
        assert_eq!(drag.candidate_y(Point::new(0.0, 350.0)), 354.0);
    }
}
