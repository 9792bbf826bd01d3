//! Editing session: the document plus everything that is not saved with it.
//!
//! Every gesture from the presentation layer comes through here. Gestures
//! that change the document are turned into [`Command`]s and recorded, so
//! they can be undone; drags only record a command when they stop.

use crate::config::LayoutConfig;
use crate::document::Document;
use crate::drag::{BoxDrag, DragState, LineDrag, MarginaliaDrag, MarginaliaDragMode};
use crate::error::{DocumentError, EditError, EditResult};
use crate::geometry::{Geometry, StackedPages};
use crate::history::{
    BoxContent, Command, CommandHistory, ComponentLayout, HistoryConfig, MarginaliaContent,
};
use crate::lexicon::Lexicon;
use crate::line::LineId;
use crate::marginalia::{Marginalia, MarginaliaId};
use crate::navigation::{self, Direction};
use crate::snap;
use crate::word::{BoxId, BoxKind, ChildSlot, PageNumber, WordBox};
use kurbo::{Point, Rect};

/// Runtime editing state (not persisted).
#[derive(Debug)]
pub struct Session {
    document: Document,
    history: CommandHistory,
    config: LayoutConfig,
    geometry: Box<dyn Geometry>,
    drag: Option<DragState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a session with an empty document and default layout.
    pub fn new() -> Self {
        let config = LayoutConfig::default();
        let geometry = Box::new(StackedPages::from_config(&config));
        Self::with_geometry(config, geometry)
    }

    /// Create a session with injected layout and geometry.
    pub fn with_geometry(config: LayoutConfig, geometry: Box<dyn Geometry>) -> Self {
        Self {
            document: Document::new(),
            history: CommandHistory::new(HistoryConfig::default()),
            config,
            geometry,
            drag: None,
        }
    }

    /// Create a session editing an existing document.
    pub fn with_document(document: Document) -> Self {
        let mut session = Self::new();
        session.document = document;
        session
    }

    /// Open a document from its JSON form.
    pub fn open(json: &str) -> Result<Self, DocumentError> {
        Ok(Self::with_document(Document::from_json(json)?))
    }

    /// Discard everything and start an empty document.
    pub fn new_document(&mut self) {
        self.document = Document::new();
        self.history.clear();
        self.drag = None;
        log::info!("started new document {}", self.document.id);
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn geometry(&self) -> &dyn Geometry {
        self.geometry.as_ref()
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.document.lexicon
    }

    /// Replace the layout configuration and re-place every gloss.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        let roots: Vec<BoxId> = self
            .document
            .boxes
            .iter()
            .filter(|b| b.is_root())
            .map(WordBox::id)
            .collect();
        for root in roots {
            snap::reposition_children(
                &mut self.document.boxes,
                root,
                None,
                self.config.vertical_spacing,
            );
        }
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Apply a command and record it.
    pub fn execute(&mut self, command: Command) {
        self.history
            .execute(command, &mut self.document, &self.config);
    }

    /// Record a command whose effect the caller already applied.
    pub fn add_operation(&mut self, command: Command) {
        self.history.push(command);
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.document, &self.config)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.document, &self.config)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.history.has_unsaved_changes()
    }

    /// Serialize the document and, on success, record a save marker.
    pub fn save(&mut self) -> Result<String, DocumentError> {
        let json = self.document.to_json()?;
        self.history.mark_saved();
        log::info!("saved document {}", self.document.id);
        Ok(json)
    }

    // ------------------------------------------------------------------
    // Boxes
    // ------------------------------------------------------------------

    fn word(&self, id: BoxId) -> EditResult<&WordBox> {
        self.document.boxes.get(id).ok_or(EditError::UnknownBox(id))
    }

    /// Create a root box. If it lands within snap distance of a line on its
    /// page, it joins that line and rests on the baseline.
    pub fn add_box(&mut self, position: Point, text: &str, kind: BoxKind) -> BoxId {
        let mut word = WordBox::new(position, text, kind, self.config.base_box_height);
        let page = self.geometry.page_of(&word);
        if let Some(target) = snap::nearest_line(
            &self.document.lines,
            page,
            word.bottom(),
            self.config.snap_distance,
        ) {
            if let Some(line) = self.document.lines.get(target.line) {
                word.position.y = snap::root_y_for_baseline(line.y(), word.height());
                word.line = Some(line.id());
            }
        }
        let id = word.id();
        log::debug!("adding {id} on page {page}");
        self.execute(Command::AddBox { word, parent: None });
        id
    }

    /// Create a gloss of `parent` in `slot`. It joins the parent's line.
    pub fn add_child_box(&mut self, parent: BoxId, slot: ChildSlot, text: &str) -> EditResult<BoxId> {
        let parent_box = self.word(parent)?;
        if parent_box.child(slot).is_some() {
            return Err(EditError::SlotOccupied { parent, slot });
        }
        let mut word = WordBox::new(Point::ZERO, text, BoxKind::Word, self.config.base_box_height);
        word.position = snap::child_position(
            parent_box,
            word.height(),
            slot,
            None,
            self.config.vertical_spacing,
        );
        word.parent = Some(parent);
        word.line = parent_box.line();
        let id = word.id();
        self.execute(Command::AddBox {
            word,
            parent: Some((parent, slot)),
        });
        Ok(id)
    }

    /// Delete a box together with all of its glosses.
    pub fn delete_box(&mut self, id: BoxId) -> EditResult<()> {
        let removed = self
            .document
            .remove_subtree(id)
            .ok_or(EditError::UnknownBox(id))?;
        log::debug!("deleted {} box(es) under {id}", removed.boxes.len());
        self.history.push(Command::DeleteBox {
            boxes: removed.boxes,
            parent: removed.parent,
        });
        Ok(())
    }

    /// Commit new content to a box. Returns false if nothing changed.
    ///
    /// The lexicon observes this first commit only. Undo and redo replay the
    /// box content and leave the lexicon alone, since entries are never removed.
    pub fn edit_box(&mut self, id: BoxId, content: BoxContent) -> EditResult<bool> {
        let before = BoxContent::of(self.word(id)?);
        if before == content {
            return Ok(false);
        }
        let text_changed = before.text != content.text;
        self.execute(Command::EditBox {
            id,
            before,
            after: content,
        });
        if text_changed {
            self.document
                .lexicon
                .observe_edit(&self.document.boxes, id, self.geometry.as_ref());
        }
        Ok(true)
    }

    /// Commit new text to a box, keeping its metadata and language.
    pub fn set_box_text(&mut self, id: BoxId, text: &str) -> EditResult<bool> {
        let mut content = BoxContent::of(self.word(id)?);
        content.text = text.to_string();
        self.edit_box(id, content)
    }

    /// Move the component containing `id` so its root's top-left lands at
    /// `position`, snapping to a line as a drag would.
    pub fn move_box(&mut self, id: BoxId, position: Point) -> EditResult<bool> {
        let root = self.document.boxes.root_of(id);
        let start = self.word(root)?.position;
        self.start_box_drag(root, start)?;
        self.stop_drag(position)
    }

    // ------------------------------------------------------------------
    // Drags
    // ------------------------------------------------------------------

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Begin dragging the component containing `id` by its root.
    pub fn start_box_drag(&mut self, id: BoxId, pointer: Point) -> EditResult<()> {
        if self.drag.is_some() {
            return Err(EditError::DragInProgress);
        }
        self.word(id)?;
        let root = self.document.boxes.root_of(id);
        let before = ComponentLayout::capture(&self.document.boxes, root)
            .ok_or(EditError::UnknownBox(root))?;
        self.drag = Some(DragState::Box(BoxDrag {
            root,
            grab_offset: pointer - before.root_position,
            before,
        }));
        Ok(())
    }

    /// Begin dragging a line. With `avoid_collisions`, positions that would
    /// run the line into other boxes are skipped.
    pub fn start_line_drag(
        &mut self,
        id: LineId,
        pointer: Point,
        avoid_collisions: bool,
    ) -> EditResult<()> {
        if self.drag.is_some() {
            return Err(EditError::DragInProgress);
        }
        let line = self
            .document
            .lines
            .get(id)
            .ok_or(EditError::UnknownLine(id))?;
        self.drag = Some(DragState::Line(LineDrag {
            line: id,
            grab_offset: pointer.y - line.y(),
            start_y: line.y(),
            avoid_collisions,
        }));
        Ok(())
    }

    /// Begin moving or resizing a marginalia block.
    pub fn start_marginalia_drag(
        &mut self,
        id: MarginaliaId,
        pointer: Point,
        mode: MarginaliaDragMode,
    ) -> EditResult<()> {
        if self.drag.is_some() {
            return Err(EditError::DragInProgress);
        }
        let block = self
            .document
            .marginalia
            .get(id)
            .ok_or(EditError::UnknownMarginalia(id))?;
        self.drag = Some(DragState::Marginalia(MarginaliaDrag {
            id,
            mode,
            start_point: pointer,
            original: block.rect(),
        }));
        Ok(())
    }

    /// Track the pointer. Nothing is recorded.
    pub fn continue_drag(&mut self, pointer: Point) -> EditResult<()> {
        let drag = self.drag.as_ref().ok_or(EditError::NoDrag)?;
        track_pointer(
            drag,
            pointer,
            &mut self.document,
            &self.config,
            self.geometry.as_ref(),
        );
        Ok(())
    }

    /// Finish the drag at `pointer`. Returns true if a command was recorded,
    /// false if the drag ended where it started.
    pub fn stop_drag(&mut self, pointer: Point) -> EditResult<bool> {
        let drag = self.drag.take().ok_or(EditError::NoDrag)?;
        track_pointer(
            &drag,
            pointer,
            &mut self.document,
            &self.config,
            self.geometry.as_ref(),
        );

        let command = match drag {
            DragState::Box(drag) => self.finish_box_drag(drag),
            DragState::Line(drag) => {
                let to_y = self.document.lines.get(drag.line).map(|l| l.y());
                to_y.filter(|&y| y != drag.start_y).map(|to_y| Command::MoveLine {
                    id: drag.line,
                    from_y: drag.start_y,
                    to_y,
                })
            }
            DragState::Marginalia(drag) => {
                let to = self.document.marginalia.get(drag.id).map(Marginalia::rect);
                to.filter(|&rect| rect != drag.original)
                    .map(|to| Command::MoveMarginalia {
                        id: drag.id,
                        from: drag.original,
                        to,
                    })
            }
        };

        match command {
            Some(command) => {
                self.history.push(command);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Attach the dragged root to the nearest line, or detach it if none is
    /// close enough, and build the move command if anything changed.
    fn finish_box_drag(&mut self, drag: BoxDrag) -> Option<Command> {
        let root = drag.root;
        let word = self.document.boxes.get(root)?;
        let page = self.geometry.page_of(word);
        let current_line = word.line();
        let target = snap::nearest_line(
            &self.document.lines,
            page,
            word.bottom(),
            self.config.snap_distance,
        );

        match (target, current_line) {
            (Some(target), _) => {
                log::debug!("{root} snaps to {} ({:.1} away)", target.line, target.distance);
                self.document.lines.add_box_to_line(
                    target.line,
                    root,
                    &mut self.document.boxes,
                    &self.config,
                );
            }
            (None, Some(line)) => {
                log::debug!("{root} leaves {line}");
                self.document
                    .lines
                    .remove_box_from_line(line, root, &mut self.document.boxes);
            }
            (None, None) => {}
        }

        let after = ComponentLayout::capture(&self.document.boxes, root)?;
        if after == drag.before {
            return None;
        }
        Some(Command::MoveBox {
            root,
            before: drag.before,
            after,
        })
    }

    /// Abandon the drag and put everything back. Nothing is recorded.
    pub fn cancel_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        match drag {
            DragState::Box(drag) => drag.before.restore(&mut self.document, drag.root, &self.config),
            DragState::Line(drag) => {
                self.document.lines.set_y(
                    drag.line,
                    drag.start_y,
                    &mut self.document.boxes,
                    &self.config,
                );
            }
            DragState::Marginalia(drag) => {
                if let Some(block) = self.document.marginalia.get_mut(drag.id) {
                    block.set_rect(drag.original);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Lines
    // ------------------------------------------------------------------

    pub fn add_line(&mut self, page: PageNumber, y: f64) -> LineId {
        let line = crate::line::Line::new(page, y, self.config.base_box_height);
        let id = line.id();
        let index = self.document.lines.lines_on_page(page).len();
        self.execute(Command::AddLine { line, index });
        id
    }

    /// Create a line whose baseline passes through `point`.
    pub fn add_line_at(&mut self, point: Point) -> LineId {
        let page = self.geometry.page_at(point.y);
        self.add_line(page, point.y)
    }

    pub fn delete_line(&mut self, id: LineId) -> EditResult<()> {
        let line = self
            .document
            .lines
            .get(id)
            .cloned()
            .ok_or(EditError::UnknownLine(id))?;
        let index = self
            .document
            .lines
            .lines_on_page(line.page())
            .iter()
            .position(|l| l.id() == id)
            .unwrap_or(0);
        self.execute(Command::DeleteLine { line, index });
        Ok(())
    }

    /// Move a line's baseline without dragging.
    pub fn move_line(&mut self, id: LineId, y: f64) -> EditResult<bool> {
        let from_y = self
            .document
            .lines
            .get(id)
            .map(|l| l.y())
            .ok_or(EditError::UnknownLine(id))?;
        if from_y == y {
            return Ok(false);
        }
        self.execute(Command::MoveLine {
            id,
            from_y,
            to_y: y,
        });
        Ok(true)
    }

    pub fn set_line_body_height(&mut self, id: LineId, body_height: f64) -> EditResult<bool> {
        let from = self
            .document
            .lines
            .get(id)
            .map(|l| l.body_height)
            .ok_or(EditError::UnknownLine(id))?;
        if from == body_height {
            return Ok(false);
        }
        self.execute(Command::EditLine {
            id,
            from_body_height: from,
            to_body_height: body_height,
        });
        Ok(true)
    }

    /// Line within snap distance of `point`, on the page containing it.
    pub fn line_near(&self, point: Point) -> Option<LineId> {
        let page = self.geometry.page_at(point.y);
        snap::nearest_line(&self.document.lines, page, point.y, self.config.snap_distance)
            .map(|s| s.line)
    }

    // ------------------------------------------------------------------
    // Marginalia
    // ------------------------------------------------------------------

    pub fn add_marginalia(&mut self, position: Point, text: &str) -> MarginaliaId {
        let block = Marginalia::new(position, text);
        let id = block.id();
        self.execute(Command::AddMarginalia { block });
        id
    }

    pub fn delete_marginalia(&mut self, id: MarginaliaId) -> EditResult<()> {
        let block = self
            .document
            .marginalia
            .get(id)
            .cloned()
            .ok_or(EditError::UnknownMarginalia(id))?;
        self.execute(Command::DeleteMarginalia { block });
        Ok(())
    }

    /// Move or resize a block without dragging.
    pub fn set_marginalia_rect(&mut self, id: MarginaliaId, rect: Rect) -> EditResult<bool> {
        let from = self
            .document
            .marginalia
            .get(id)
            .map(Marginalia::rect)
            .ok_or(EditError::UnknownMarginalia(id))?;
        if from == rect {
            return Ok(false);
        }
        self.execute(Command::MoveMarginalia { id, from, to: rect });
        Ok(true)
    }

    pub fn edit_marginalia(&mut self, id: MarginaliaId, content: MarginaliaContent) -> EditResult<bool> {
        let before = self
            .document
            .marginalia
            .get(id)
            .map(MarginaliaContent::of)
            .ok_or(EditError::UnknownMarginalia(id))?;
        if before == content {
            return Ok(false);
        }
        self.execute(Command::EditMarginalia {
            id,
            before,
            after: content,
        });
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Selection and traversal
    // ------------------------------------------------------------------

    /// Select a single box on its own.
    pub fn select_box(&mut self, id: BoxId) -> EditResult<()> {
        self.word(id)?;
        self.clear_selection();
        if let Some(word) = self.document.boxes.get_mut(id) {
            word.selected = true;
            word.individually_selected = true;
        }
        Ok(())
    }

    /// Select every box connected to `id`.
    pub fn select_component(&mut self, id: BoxId) -> EditResult<()> {
        self.word(id)?;
        self.clear_selection();
        for member in self.document.boxes.connected_component(id) {
            if let Some(word) = self.document.boxes.get_mut(member) {
                word.selected = true;
            }
        }
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        for word in self.document.boxes.iter_mut() {
            word.selected = false;
            word.individually_selected = false;
        }
    }

    pub fn selected_boxes(&self) -> Vec<BoxId> {
        self.document
            .boxes
            .iter()
            .filter(|b| b.selected)
            .map(WordBox::id)
            .collect()
    }

    /// Delete every selected box with its glosses. One command is recorded
    /// per deleted subtree. Returns the number of commands.
    pub fn delete_selection(&mut self) -> usize {
        let selected = self.selected_boxes();
        let tops: Vec<BoxId> = selected
            .iter()
            .copied()
            .filter(|&id| {
                self.document
                    .boxes
                    .parent(id)
                    .is_none_or(|parent| !selected.contains(&parent))
            })
            .collect();
        tops.into_iter()
            .filter(|&id| self.delete_box(id).is_ok())
            .count()
    }

    /// Move keyboard focus from `from`. The box reached records which side
    /// it was entered from.
    pub fn navigate(&mut self, from: BoxId, direction: Direction) -> Option<BoxId> {
        let target =
            navigation::neighbor(&self.document.boxes, &self.document.lines, from, direction)?;
        for word in self.document.boxes.iter_mut() {
            word.navigated_from_above = false;
            word.navigated_from_below = false;
        }
        if let Some(word) = self.document.boxes.get_mut(target) {
            word.navigated_from_below = direction == Direction::Up;
            word.navigated_from_above = direction == Direction::Down;
        }
        Some(target)
    }

    // ------------------------------------------------------------------
    // Queries for redraw and the sidebar
    // ------------------------------------------------------------------

    pub fn connected_component(&self, id: BoxId) -> Vec<BoxId> {
        self.document.boxes.connected_component(id)
    }

    /// Re-place the glosses under `id` after its position changed.
    pub fn reposition_children(&mut self, id: BoxId) {
        snap::reposition_children(
            &mut self.document.boxes,
            id,
            None,
            self.config.vertical_spacing,
        );
    }

    pub fn box_bounds(&self, id: BoxId) -> Option<Rect> {
        self.document
            .boxes
            .get(id)
            .map(|b| self.geometry.box_bounds(b))
    }

    pub fn suggest_translation(&self, child: BoxId) -> Option<&str> {
        self.document
            .lexicon
            .suggest_translation(&self.document.boxes, child)
    }

    pub fn translations_for(&self, parent: BoxId) -> &[String] {
        self.document
            .lexicon
            .translations_for(&self.document.boxes, parent)
    }
}

/// Apply the live effect of a drag for the current pointer position.
fn track_pointer(
    drag: &DragState,
    pointer: Point,
    doc: &mut Document,
    config: &LayoutConfig,
    geometry: &dyn Geometry,
) {
    match drag {
        DragState::Box(drag) => {
            snap::move_component(&mut doc.boxes, drag.root, drag.root_position(pointer), config);
        }
        DragState::Line(drag) => {
            let candidate = drag.candidate_y(pointer);
            if drag.avoid_collisions
                && snap::line_move_blocked(drag.line, candidate, &doc.boxes, geometry, config)
            {
                return;
            }
            doc.lines.set_y(drag.line, candidate, &mut doc.boxes, config);
        }
        DragState::Marginalia(drag) => {
            if let Some(block) = doc.marginalia.get_mut(drag.id) {
                block.set_rect(drag.rect_for(pointer));
            }
        }
    }
}
