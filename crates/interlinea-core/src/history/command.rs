//! Reversible commands.
//!
//! Each variant captures, when it is built, everything needed to run it
//! forwards and backwards without looking at the state it mutated.

use crate::config::LayoutConfig;
use crate::document::Document;
use crate::graph::EntityGraph;
use crate::line::{Line, LineId};
use crate::marginalia::{Marginalia, MarginaliaId};
use crate::word::{BoxId, ChildSlot, WordBox};
use kurbo::{Point, Rect, Vec2};

/// Editable content of a box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxContent {
    pub text: String,
    pub metadata: String,
    pub language: bool,
}

impl BoxContent {
    pub fn of(word: &WordBox) -> Self {
        Self {
            text: word.text.clone(),
            metadata: word.metadata.clone(),
            language: word.language,
        }
    }

    fn write_to(&self, word: &mut WordBox) {
        word.text.clone_from(&self.text);
        word.metadata.clone_from(&self.metadata);
        word.language = self.language;
    }
}

/// Editable content of a marginalia block.
#[derive(Debug, Clone, PartialEq)]
pub struct MarginaliaContent {
    pub text: String,
    pub language: bool,
}

impl MarginaliaContent {
    pub fn of(block: &Marginalia) -> Self {
        Self {
            text: block.text.clone(),
            language: block.language,
        }
    }
}

/// Placement of a whole connected component, relative to its root.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentLayout {
    pub root_position: Point,
    /// Offset of every member from the root, the root included.
    pub offsets: Vec<(BoxId, Vec2)>,
    /// Line the component belonged to.
    pub line: Option<LineId>,
}

impl ComponentLayout {
    /// Record the current layout of the component rooted at `root`.
    pub fn capture(graph: &EntityGraph, root: BoxId) -> Option<Self> {
        let root_box = graph.get(root)?;
        let root_position = root_box.position;
        let mut offsets: Vec<(BoxId, Vec2)> = graph
            .connected_component(root)
            .into_iter()
            .filter_map(|id| graph.get(id).map(|b| (id, b.position - root_position)))
            .collect();
        offsets.sort_by_key(|(id, _)| *id);
        Some(Self {
            root_position,
            offsets,
            line: root_box.line(),
        })
    }

    /// Put every member back at its recorded offset and line.
    pub(crate) fn restore(&self, doc: &mut Document, root: BoxId, config: &LayoutConfig) {
        for &(id, offset) in &self.offsets {
            if let Some(word) = doc.boxes.get_mut(id) {
                word.position = self.root_position + offset;
            }
        }
        let current = doc.boxes.get(root).and_then(WordBox::line);
        if current == self.line {
            return;
        }
        if let Some(line) = current {
            doc.lines.remove_box_from_line(line, root, &mut doc.boxes);
        }
        if let Some(line) = self.line {
            doc.lines
                .attach_without_snap(line, root, &mut doc.boxes, config);
        }
    }
}

/// Discriminant of [`Command`], used to key undo dependency rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    AddBox,
    DeleteBox,
    MoveBox,
    EditBox,
    AddLine,
    DeleteLine,
    MoveLine,
    EditLine,
    AddMarginalia,
    DeleteMarginalia,
    MoveMarginalia,
    EditMarginalia,
    Save,
}

/// A recorded, reversible operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A box was created, optionally as a gloss of `parent`.
    AddBox {
        word: WordBox,
        parent: Option<(BoxId, ChildSlot)>,
    },
    /// A box and its descendants were deleted.
    DeleteBox {
        boxes: Vec<WordBox>,
        parent: Option<(BoxId, ChildSlot)>,
    },
    /// A component was dragged by its root.
    MoveBox {
        root: BoxId,
        before: ComponentLayout,
        after: ComponentLayout,
    },
    EditBox {
        id: BoxId,
        before: BoxContent,
        after: BoxContent,
    },
    AddLine {
        line: Line,
        index: usize,
    },
    /// A line was deleted. `line` still lists its former members.
    DeleteLine {
        line: Line,
        index: usize,
    },
    MoveLine {
        id: LineId,
        from_y: f64,
        to_y: f64,
    },
    EditLine {
        id: LineId,
        from_body_height: f64,
        to_body_height: f64,
    },
    AddMarginalia {
        block: Marginalia,
    },
    DeleteMarginalia {
        block: Marginalia,
    },
    /// Moved or resized.
    MoveMarginalia {
        id: MarginaliaId,
        from: Rect,
        to: Rect,
    },
    EditMarginalia {
        id: MarginaliaId,
        before: MarginaliaContent,
        after: MarginaliaContent,
    },
    /// Marks the point at which the document was last saved.
    Save,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::AddBox { .. } => CommandKind::AddBox,
            Command::DeleteBox { .. } => CommandKind::DeleteBox,
            Command::MoveBox { .. } => CommandKind::MoveBox,
            Command::EditBox { .. } => CommandKind::EditBox,
            Command::AddLine { .. } => CommandKind::AddLine,
            Command::DeleteLine { .. } => CommandKind::DeleteLine,
            Command::MoveLine { .. } => CommandKind::MoveLine,
            Command::EditLine { .. } => CommandKind::EditLine,
            Command::AddMarginalia { .. } => CommandKind::AddMarginalia,
            Command::DeleteMarginalia { .. } => CommandKind::DeleteMarginalia,
            Command::MoveMarginalia { .. } => CommandKind::MoveMarginalia,
            Command::EditMarginalia { .. } => CommandKind::EditMarginalia,
            Command::Save => CommandKind::Save,
        }
    }

    /// The marginalia block this command touches, if any.
    pub fn marginalia(&self) -> Option<MarginaliaId> {
        match self {
            Command::AddMarginalia { block } | Command::DeleteMarginalia { block } => {
                Some(block.id())
            }
            Command::MoveMarginalia { id, .. } | Command::EditMarginalia { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Run the forward effect.
    pub fn apply(&self, doc: &mut Document, config: &LayoutConfig) {
        match self {
            Command::AddBox { word, parent } => {
                doc.restore_boxes(std::slice::from_ref(word), *parent, config);
            }
            Command::DeleteBox { boxes, .. } => {
                if let Some(first) = boxes.first() {
                    doc.remove_subtree(first.id());
                }
            }
            Command::MoveBox { root, after, .. } => after.restore(doc, *root, config),
            Command::EditBox { id, after, .. } => {
                if let Some(word) = doc.boxes.get_mut(*id) {
                    after.write_to(word);
                }
            }
            Command::AddLine { line, index } => doc.lines.insert_line(line.clone(), *index),
            Command::DeleteLine { line, .. } => {
                doc.lines.delete_line(line.id(), &mut doc.boxes);
            }
            Command::MoveLine { id, to_y, .. } => {
                doc.lines.set_y(*id, *to_y, &mut doc.boxes, config);
            }
            Command::EditLine {
                id, to_body_height, ..
            } => {
                doc.lines.set_body_height(*id, *to_body_height);
            }
            Command::AddMarginalia { block } => {
                doc.marginalia.insert(block.clone());
            }
            Command::DeleteMarginalia { block } => {
                doc.marginalia.remove(block.id());
            }
            Command::MoveMarginalia { id, to, .. } => {
                if let Some(block) = doc.marginalia.get_mut(*id) {
                    block.set_rect(*to);
                }
            }
            Command::EditMarginalia { id, after, .. } => {
                if let Some(block) = doc.marginalia.get_mut(*id) {
                    block.text.clone_from(&after.text);
                    block.language = after.language;
                }
            }
            Command::Save => {}
        }
    }

    /// Run the inverse effect.
    pub fn revert(&self, doc: &mut Document, config: &LayoutConfig) {
        match self {
            Command::AddBox { word, .. } => {
                doc.remove_subtree(word.id());
            }
            Command::DeleteBox { boxes, parent } => doc.restore_boxes(boxes, *parent, config),
            Command::MoveBox { root, before, .. } => before.restore(doc, *root, config),
            Command::EditBox { id, before, .. } => {
                if let Some(word) = doc.boxes.get_mut(*id) {
                    before.write_to(word);
                }
            }
            Command::AddLine { line, .. } => {
                doc.lines.delete_line(line.id(), &mut doc.boxes);
            }
            Command::DeleteLine { line, index } => {
                doc.lines.insert_line(line.clone(), *index);
                for &member in line.members() {
                    if doc.boxes.contains(member) {
                        doc.lines
                            .attach_without_snap(line.id(), member, &mut doc.boxes, config);
                    }
                }
            }
            Command::MoveLine { id, from_y, .. } => {
                doc.lines.set_y(*id, *from_y, &mut doc.boxes, config);
            }
            Command::EditLine {
                id,
                from_body_height,
                ..
            } => {
                doc.lines.set_body_height(*id, *from_body_height);
            }
            Command::AddMarginalia { block } => {
                doc.marginalia.remove(block.id());
            }
            Command::DeleteMarginalia { block } => {
                doc.marginalia.insert(block.clone());
            }
            Command::MoveMarginalia { id, from, .. } => {
                if let Some(block) = doc.marginalia.get_mut(*id) {
                    block.set_rect(*from);
                }
            }
            Command::EditMarginalia { id, before, .. } => {
                if let Some(block) = doc.marginalia.get_mut(*id) {
                    block.text.clone_from(&before.text);
                    block.language = before.language;
                }
            }
            Command::Save => {}
        }
    }
}
