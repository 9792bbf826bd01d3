//! Ordering rules consulted before a command is undone.
//!
//! Some commands cannot be undone while later state still depends on them.
//! Each command kind may register a rule here.

use super::command::{Command, CommandKind};
use crate::document::Document;

/// What to do when the command on top of the undo stack matches a rule.
#[derive(Debug, Clone, Copy)]
pub enum UndoRule {
    /// Leave the command pending while the predicate holds.
    RefuseWhile(fn(&Command, &Document) -> bool),
    /// Undo the nearest earlier pending command for which the predicate
    /// holds (called with the top command, then the candidate) instead,
    /// leaving the top command pending.
    DependentFirst(fn(&Command, &Command) -> bool),
}

/// A rule bound to a command kind.
#[derive(Debug, Clone, Copy)]
pub struct DependencyRule {
    pub kind: CommandKind,
    pub rule: UndoRule,
}

/// A box cannot be un-created while glosses hang off it.
fn box_has_children(command: &Command, doc: &Document) -> bool {
    match command {
        Command::AddBox { word, .. } => doc
            .boxes
            .get(word.id())
            .is_some_and(|current| current.has_children()),
        _ => false,
    }
}

/// A pending move of the same block must be undone before its creation.
fn moves_same_marginalia(top: &Command, candidate: &Command) -> bool {
    candidate.kind() == CommandKind::MoveMarginalia
        && top.marginalia().is_some()
        && candidate.marginalia() == top.marginalia()
}

/// Rules installed in every new history.
pub const DEFAULT_RULES: &[DependencyRule] = &[
    DependencyRule {
        kind: CommandKind::AddBox,
        rule: UndoRule::RefuseWhile(box_has_children),
    },
    DependencyRule {
        kind: CommandKind::AddMarginalia,
        rule: UndoRule::DependentFirst(moves_same_marginalia),
    },
];
