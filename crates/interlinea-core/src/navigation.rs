//! Keyboard traversal between boxes.

use crate::graph::EntityGraph;
use crate::line::LineRegistry;
use crate::word::{BoxId, ChildSlot};

/// Arrow-key direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The box reached by moving from `from` in `direction`, if any.
///
/// Up and Down walk the gloss tree: from a bottom gloss Up returns to its
/// parent, otherwise Up goes to the top gloss (and symmetrically for Down).
/// Left and Right step between the roots of the same line.
pub fn neighbor(
    graph: &EntityGraph,
    lines: &LineRegistry,
    from: BoxId,
    direction: Direction,
) -> Option<BoxId> {
    let word = graph.get(from)?;
    let slot_in_parent = word
        .parent()
        .and_then(|p| graph.get(p))
        .and_then(|p| p.slot_of(from));

    match direction {
        Direction::Up => match slot_in_parent {
            Some(ChildSlot::Bottom) => word.parent(),
            _ => word.child_top(),
        },
        Direction::Down => match slot_in_parent {
            Some(ChildSlot::Top) => word.parent(),
            _ => word.child_bottom(),
        },
        Direction::Left | Direction::Right => {
            let root = graph.root_of(from);
            let line = graph.get(root)?.line()?;
            let roots = lines.roots(line, graph);
            let index = roots.iter().position(|&id| id == root)?;
            let target = match direction {
                Direction::Left => index.checked_sub(1)?,
                _ => index + 1,
            };
            roots.get(target).copied()
        }
    }
}
