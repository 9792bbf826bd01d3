//! Undo/redo command log.
//!
//! Two stacks of [`Command`]s, newest at the back. Recording a new command
//! clears the redo stack: history is strictly linear.
//!
//! Undo normally pops the newest command and runs its inverse, but the
//! [`rules`] table may refuse or redirect it first:
//!
//! ```text
//! undo stack: [AddMarginalia(m), MoveMarginalia(m), AddMarginalia(m)*]
//!                                 ^ nearest pending move of m is undone,
//!                                   the add marked * stays on top
//! ```

mod command;
pub mod rules;

pub use command::{BoxContent, Command, CommandKind, ComponentLayout, MarginaliaContent};
pub use rules::{DependencyRule, UndoRule, DEFAULT_RULES};

use crate::config::LayoutConfig;
use crate::document::Document;

/// Default number of undo entries to keep.
pub const DEFAULT_MAX_DEPTH: usize = 200;

/// Configuration for the command history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryConfig {
    /// Maximum number of commands in the undo stack. Oldest are evicted.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Undo and redo stacks plus the rules that order them.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    config: HistoryConfig,
    rules: Vec<DependencyRule>,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl CommandHistory {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            config,
            rules: DEFAULT_RULES.to_vec(),
        }
    }

    /// Register an additional undo ordering rule.
    pub fn add_rule(&mut self, rule: DependencyRule) {
        self.rules.push(rule);
    }

    /// Record a command whose effect has already been applied.
    /// Clears the redo stack.
    pub fn push(&mut self, command: Command) {
        log::debug!("history: record {:?}", command.kind());
        self.undo_stack.push(command);
        self.redo_stack.clear();

        if self.undo_stack.len() > self.config.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Apply a command and record it.
    pub fn execute(&mut self, command: Command, doc: &mut Document, config: &LayoutConfig) {
        command.apply(doc, config);
        self.push(command);
    }

    /// Record a save marker.
    pub fn mark_saved(&mut self) {
        self.push(Command::Save);
    }

    /// Undo the newest command, subject to the ordering rules.
    /// Returns true if anything was undone.
    ///
    /// A save marker takes one undo of its own: popping it returns true and
    /// leaves the document untouched.
    pub fn undo(&mut self, doc: &mut Document, config: &LayoutConfig) -> bool {
        let Some(top) = self.undo_stack.last() else {
            return false;
        };
        let kind = top.kind();

        for rule in self.rules.iter().filter(|r| r.kind == kind) {
            match rule.rule {
                UndoRule::RefuseWhile(blocked) => {
                    if blocked(top, doc) {
                        log::debug!("history: refusing to undo {kind:?}");
                        return false;
                    }
                }
                UndoRule::DependentFirst(depends) => {
                    let below = self.undo_stack.len() - 1;
                    if let Some(index) = self.undo_stack[..below]
                        .iter()
                        .rposition(|candidate| depends(top, candidate))
                    {
                        let dependent = self.undo_stack.remove(index);
                        log::debug!(
                            "history: undoing {:?} before {kind:?}",
                            dependent.kind()
                        );
                        dependent.revert(doc, config);
                        self.redo_stack.push(dependent);
                        return true;
                    }
                }
            }
        }

        let Some(command) = self.undo_stack.pop() else {
            return false;
        };
        log::debug!("history: undo {kind:?}");
        command.revert(doc, config);
        self.redo_stack.push(command);
        true
    }

    /// Re-apply the most recently undone command.
    /// Returns true if anything was redone.
    pub fn redo(&mut self, doc: &mut Document, config: &LayoutConfig) -> bool {
        let Some(command) = self.redo_stack.pop() else {
            return false;
        };
        log::debug!("history: redo {:?}", command.kind());
        command.apply(doc, config);
        self.undo_stack.push(command);
        true
    }

    /// Unsaved unless the newest undo entry is a save marker. With no
    /// marker at all, any recorded command counts as unsaved.
    pub fn has_unsaved_changes(&self) -> bool {
        !matches!(self.undo_stack.last(), None | Some(Command::Save))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pending commands, oldest first.
    pub fn undo_stack(&self) -> &[Command] {
        &self.undo_stack
    }

    /// Undone commands, oldest undo last.
    pub fn redo_stack(&self) -> &[Command] {
        &self.redo_stack
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marginalia::Marginalia;
    use crate::word::{BoxKind, ChildSlot, WordBox};
    use kurbo::{Point, Rect};

    fn setup() -> (CommandHistory, Document, LayoutConfig) {
        (
            CommandHistory::default(),
            Document::new(),
            LayoutConfig::default(),
        )
    }

    fn add_box(history: &mut CommandHistory, doc: &mut Document, config: &LayoutConfig) -> WordBox {
        let word = WordBox::new(Point::new(100.0, 100.0), "logos", BoxKind::Word, 24.0);
        history.execute(
            Command::AddBox {
                word: word.clone(),
                parent: None,
            },
            doc,
            config,
        );
        word
    }

    fn move_marginalia(id: crate::marginalia::MarginaliaId, from: Rect, to: Rect) -> Command {
        Command::MoveMarginalia { id, from, to }
    }

    #[test]
    fn test_undo_redo_add_box() {
        let (mut history, mut doc, config) = setup();
        let word = add_box(&mut history, &mut doc, &config);
        assert!(doc.boxes.contains(word.id()));

        assert!(history.undo(&mut doc, &config));
        assert!(!doc.boxes.contains(word.id()));
        assert!(history.can_redo());

        assert!(history.redo(&mut doc, &config));
        assert_eq!(doc.boxes.get(word.id()), Some(&word));
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let (mut history, mut doc, config) = setup();
        assert!(!history.undo(&mut doc, &config));
        assert!(!history.redo(&mut doc, &config));
    }

    #[test]
    fn test_push_clears_redo() {
        let (mut history, mut doc, config) = setup();
        add_box(&mut history, &mut doc, &config);
        history.undo(&mut doc, &config);
        assert!(history.can_redo());

        add_box(&mut history, &mut doc, &config);
        assert!(!history.can_redo());
        assert!(!history.redo(&mut doc, &config));
    }

    #[test]
    fn test_refuse_undo_of_box_with_children() {
        let (mut history, mut doc, config) = setup();
        let parent = add_box(&mut history, &mut doc, &config);
        // A child attached outside the history, as a collaborator might.
        let child = doc
            .boxes
            .register(WordBox::new(Point::ZERO, "word", BoxKind::Word, 24.0));
        doc.boxes.set_child(parent.id(), ChildSlot::Bottom, Some(child));
        doc.boxes.set_parent(child, Some(parent.id()));

        assert!(!history.undo(&mut doc, &config));
        assert_eq!(history.undo_stack().len(), 1);
        assert!(doc.boxes.contains(parent.id()));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_pending_marginalia_move_undone_before_add() {
        let (mut history, mut doc, config) = setup();
        let block = Marginalia::new(Point::new(10.0, 10.0), "note");
        let id = block.id();
        let start = block.rect();
        let moved = Rect::new(50.0, 50.0, 210.0, 130.0);

        // The move is recorded below the add, as happens when the add is
        // committed only once the block's first edit completes.
        history.execute(
            Command::AddMarginalia {
                block: block.clone(),
            },
            &mut doc,
            &config,
        );
        history.execute(move_marginalia(id, start, moved), &mut doc, &config);
        let add = history.undo_stack()[0].clone();
        history.undo_stack.remove(0);
        history.undo_stack.push(add);

        assert!(history.undo(&mut doc, &config));
        assert_eq!(doc.marginalia.get(id).unwrap().rect(), start);
        assert_eq!(history.undo_stack().len(), 1);
        assert_eq!(history.undo_stack()[0].kind(), CommandKind::AddMarginalia);
        assert_eq!(history.redo_stack()[0].kind(), CommandKind::MoveMarginalia);

        assert!(history.undo(&mut doc, &config));
        assert!(doc.marginalia.is_empty());
    }

    #[test]
    fn test_unrelated_marginalia_move_not_redirected() {
        let (mut history, mut doc, config) = setup();
        let other = Marginalia::new(Point::ZERO, "other");
        let other_id = other.id();
        history.execute(Command::AddMarginalia { block: other.clone() }, &mut doc, &config);
        history.execute(
            move_marginalia(other_id, other.rect(), Rect::new(1.0, 1.0, 2.0, 2.0)),
            &mut doc,
            &config,
        );
        let block = Marginalia::new(Point::new(300.0, 0.0), "note");
        history.execute(Command::AddMarginalia { block: block.clone() }, &mut doc, &config);

        assert!(history.undo(&mut doc, &config));
        assert!(!doc.marginalia.contains(block.id()));
        assert_eq!(
            doc.marginalia.get(other_id).unwrap().rect(),
            Rect::new(1.0, 1.0, 2.0, 2.0)
        );
    }

    #[test]
    fn test_unsaved_changes() {
        let (mut history, mut doc, config) = setup();
        assert!(!history.has_unsaved_changes());

        add_box(&mut history, &mut doc, &config);
        assert!(history.has_unsaved_changes());

        history.mark_saved();
        assert!(!history.has_unsaved_changes());

        add_box(&mut history, &mut doc, &config);
        assert!(history.has_unsaved_changes());
    }

    #[test]
    fn test_max_depth_evicts_oldest() {
        let mut history = CommandHistory::new(HistoryConfig { max_depth: 2 });
        let mut doc = Document::new();
        let config = LayoutConfig::default();
        let first = add_box(&mut history, &mut doc, &config);
        add_box(&mut history, &mut doc, &config);
        add_box(&mut history, &mut doc, &config);

        assert_eq!(history.undo_stack().len(), 2);
        assert!(history.undo(&mut doc, &config));
        assert!(history.undo(&mut doc, &config));
        assert!(!history.undo(&mut doc, &config));
        assert!(doc.boxes.contains(first.id()));
    }

    #[test]
    fn test_line_commands_round_trip() {
        let (mut history, mut doc, config) = setup();
        let line = crate::line::Line::new(1, 300.0, 24.0);
        let line_id = line.id();
        history.execute(Command::AddLine { line, index: 0 }, &mut doc, &config);
        let word = add_box(&mut history, &mut doc, &config);
        doc.lines
            .add_box_to_line(line_id, word.id(), &mut doc.boxes, &config);

        history.execute(
            Command::MoveLine {
                id: line_id,
                from_y: 300.0,
                to_y: 400.0,
            },
            &mut doc,
            &config,
        );
        assert_eq!(doc.boxes.get(word.id()).unwrap().bottom(), 400.0);

        assert!(history.undo(&mut doc, &config));
        assert_eq!(doc.lines.get(line_id).unwrap().y(), 300.0);
        assert_eq!(doc.boxes.get(word.id()).unwrap().bottom(), 300.0);

        assert!(history.redo(&mut doc, &config));
        assert_eq!(doc.lines.get(line_id).unwrap().y(), 400.0);
    }

    fn always_refuse(_: &Command, _: &Document) -> bool {
        true
    }

    #[test]
    fn test_custom_rule_refuses_undo() {
        let (mut history, mut doc, config) = setup();
        let line = crate::line::Line::new(1, 300.0, 24.0);
        let line_id = line.id();
        history.execute(
            Command::AddLine {
                line: line.clone(),
                index: 0,
            },
            &mut doc,
            &config,
        );
        history.execute(Command::DeleteLine { line, index: 0 }, &mut doc, &config);
        history.add_rule(DependencyRule {
            kind: CommandKind::DeleteLine,
            rule: UndoRule::RefuseWhile(always_refuse),
        });
        let pending = history.undo_stack().to_vec();

        assert!(!history.undo(&mut doc, &config));
        assert_eq!(history.undo_stack(), pending.as_slice());
        assert!(!history.can_redo());
        assert!(doc.lines.get(line_id).is_none());
    }

    #[test]
    fn test_undo_pops_save_marker_alone() {
        let (mut history, mut doc, config) = setup();
        let word = add_box(&mut history, &mut doc, &config);
        history.mark_saved();
        assert!(!history.has_unsaved_changes());

        assert!(history.undo(&mut doc, &config));
        assert!(doc.boxes.contains(word.id()));
        assert_eq!(history.undo_stack().len(), 1);
        assert_eq!(history.undo_stack()[0].kind(), CommandKind::AddBox);
        assert!(history.has_unsaved_changes());

        assert!(history.undo(&mut doc, &config));
        assert!(!doc.boxes.contains(word.id()));
    }
}
