//! Document state: everything that is saved with a manuscript.

use crate::config::LayoutConfig;
use crate::error::DocumentError;
use crate::graph::EntityGraph;
use crate::lexicon::Lexicon;
use crate::line::LineRegistry;
use crate::marginalia::MarginaliaStore;
use crate::word::{BoxId, ChildSlot, WordBox};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Boxes taken out of the graph together, parents before children.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedSubtree {
    pub boxes: Vec<WordBox>,
    /// Where the subtree hung before removal.
    pub parent: Option<(BoxId, ChildSlot)>,
}

/// A manuscript document: boxes, lines, marginalia and the lexicon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier.
    pub id: String,
    /// Document name.
    pub name: String,
    pub boxes: EntityGraph,
    pub lines: LineRegistry,
    pub marginalia: MarginaliaStore,
    #[serde(default)]
    pub lexicon: Lexicon,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            boxes: EntityGraph::new(),
            lines: LineRegistry::new(),
            marginalia: MarginaliaStore::new(),
            lexicon: Lexicon::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty() && self.lines.is_empty() && self.marginalia.is_empty()
    }

    /// Put previously removed boxes back exactly where they were.
    ///
    /// Links inside the set come back from the snapshots; the link from the
    /// outside parent is restored from `parent`. Line membership is restored
    /// without snapping so recorded positions stand.
    pub(crate) fn restore_boxes(
        &mut self,
        boxes: &[WordBox],
        parent: Option<(BoxId, ChildSlot)>,
        config: &LayoutConfig,
    ) {
        for snapshot in boxes {
            let mut word = snapshot.clone();
            word.line = None;
            self.boxes.register(word);
        }
        if let (Some((parent_id, slot)), Some(first)) = (parent, boxes.first()) {
            self.boxes.set_child(parent_id, slot, Some(first.id()));
            self.boxes.set_parent(first.id(), Some(parent_id));
        }
        for snapshot in boxes {
            if let Some(line) = snapshot.line() {
                if !self
                    .lines
                    .attach_without_snap(line, snapshot.id(), &mut self.boxes, config)
                {
                    log::warn!("line {line} of restored {} no longer exists", snapshot.id());
                }
            }
        }
    }

    /// Remove a box and all of its descendants.
    ///
    /// The link from the parent is severed first so no surviving box points
    /// at a removed one.
    pub(crate) fn remove_subtree(&mut self, id: BoxId) -> Option<RemovedSubtree> {
        let root = self.boxes.get(id)?;
        let parent = root.parent().and_then(|parent_id| {
            self.boxes
                .get(parent_id)
                .and_then(|p| p.slot_of(id))
                .map(|slot| (parent_id, slot))
        });
        let ids = self.boxes.subtree(id);
        let boxes: Vec<WordBox> = ids
            .iter()
            .filter_map(|&member| self.boxes.get(member).cloned())
            .collect();

        if let Some((parent_id, slot)) = parent {
            self.boxes.set_child(parent_id, slot, None);
        }
        self.boxes.set_parent(id, None);
        for member in ids {
            self.lines.forget_box(member);
            self.boxes.unregister(member);
        }

        Some(RemovedSubtree { boxes, parent })
    }

    /// Links are mirrored and line membership agrees with box pointers.
    pub fn is_consistent(&self) -> bool {
        self.boxes.links_consistent() && self.lines.membership_consistent(&self.boxes)
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marginalia::Marginalia;
    use crate::word::BoxKind;
    use kurbo::Point;

    fn tree(doc: &mut Document, config: &LayoutConfig) -> (BoxId, BoxId, BoxId) {
        let line = doc.lines.add_line(1, 300.0, 24.0);
        let a = doc
            .boxes
            .register(WordBox::new(Point::new(100.0, 0.0), "logos", BoxKind::Word, 24.0));
        let b = doc
            .boxes
            .register(WordBox::new(Point::ZERO, "word", BoxKind::Word, 24.0));
        let c = doc
            .boxes
            .register(WordBox::new(Point::ZERO, "verbum", BoxKind::Word, 24.0));
        doc.boxes.set_child(a, ChildSlot::Bottom, Some(b));
        doc.boxes.set_parent(b, Some(a));
        doc.boxes.set_child(b, ChildSlot::Bottom, Some(c));
        doc.boxes.set_parent(c, Some(b));
        doc.lines.add_box_to_line(line, a, &mut doc.boxes, config);
        (a, b, c)
    }

    #[test]
    fn test_document_creation() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert!(doc.is_consistent());
    }

    #[test]
    fn test_remove_and_restore_subtree() {
        let config = LayoutConfig::default();
        let mut doc = Document::new();
        let (a, b, c) = tree(&mut doc, &config);
        let before = doc.boxes.clone();

        let removed = doc.remove_subtree(b).unwrap();
        assert_eq!(removed.parent, Some((a, ChildSlot::Bottom)));
        assert_eq!(removed.boxes.len(), 2);
        assert!(!doc.boxes.contains(b));
        assert!(!doc.boxes.contains(c));
        assert_eq!(doc.boxes.get(a).unwrap().child_bottom(), None);
        assert!(doc.is_consistent());

        doc.restore_boxes(&removed.boxes, removed.parent, &config);
        assert!(doc.is_consistent());
        for id in [a, b, c] {
            assert_eq!(doc.boxes.get(id), before.get(id));
        }
    }

    #[test]
    fn test_remove_root_takes_component() {
        let config = LayoutConfig::default();
        let mut doc = Document::new();
        let (a, b, c) = tree(&mut doc, &config);
        let removed = doc.remove_subtree(a).unwrap();
        assert_eq!(removed.parent, None);
        assert!(doc.boxes.is_empty());
        assert!(doc.lines.iter().all(|l| l.members().is_empty()));
        assert!(![a, b, c].iter().any(|&id| doc.boxes.contains(id)));
    }

    #[test]
    fn test_json_round_trip() {
        let config = LayoutConfig::default();
        let mut doc = Document::new();
        let (a, b, _) = tree(&mut doc, &config);
        doc.boxes.get_mut(b).unwrap().metadata = "gloss".into();
        doc.boxes.get_mut(a).unwrap().navigated_from_below = true;
        doc.marginalia.insert(Marginalia::new(Point::new(700.0, 40.0), "note"));
        doc.lexicon.register("logos", 1);
        doc.lexicon.add_translation("logos", "word");

        let json = doc.to_json().unwrap();
        let loaded = Document::from_json(&json).unwrap();
        assert_eq!(loaded.id, doc.id);
        for word in doc.boxes.iter() {
            assert_eq!(loaded.boxes.get(word.id()), Some(word));
        }
        for line in doc.lines.iter() {
            assert_eq!(loaded.lines.get(line.id()), Some(line));
        }
        assert_eq!(loaded.marginalia.len(), 1);
        assert_eq!(loaded.lexicon, doc.lexicon);
        assert!(loaded.is_consistent());
    }

    #[test]
    fn test_from_invalid_json() {
        assert!(matches!(
            Document::from_json("{"),
            Err(DocumentError::Serialization(_))
        ));
    }
}
