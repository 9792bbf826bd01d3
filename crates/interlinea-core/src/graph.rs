//! Box registry and the parent/child gloss graph.
//!
//! Every box is owned here, keyed by id. Links are plain ids, so a link may
//! dangle for a moment while an operation is half done; lookups through a
//! dangling id resolve to nothing and traversal skips them.
//!
//! The graph never pairs links on its own: setting `child_top` on a parent
//! does not touch the child's `parent`. The command that makes the change is
//! responsible for both sides.

use crate::line::LineId;
use crate::word::{BoxId, ChildSlot, WordBox};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Owner of all word boxes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityGraph {
    boxes: HashMap<BoxId, WordBox>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a box. Replaces any box already stored under the same id.
    pub fn register(&mut self, word: WordBox) -> BoxId {
        let id = word.id;
        self.boxes.insert(id, word);
        id
    }

    /// Remove a box from the registry. Links pointing at it are left alone.
    pub fn unregister(&mut self, id: BoxId) -> Option<WordBox> {
        self.boxes.remove(&id)
    }

    pub fn get(&self, id: BoxId) -> Option<&WordBox> {
        self.boxes.get(&id)
    }

    pub fn get_mut(&mut self, id: BoxId) -> Option<&mut WordBox> {
        self.boxes.get_mut(&id)
    }

    pub fn contains(&self, id: BoxId) -> bool {
        self.boxes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordBox> {
        self.boxes.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut WordBox> {
        self.boxes.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = BoxId> + '_ {
        self.boxes.keys().copied()
    }

    pub fn parent(&self, id: BoxId) -> Option<BoxId> {
        self.get(id).and_then(WordBox::parent)
    }

    pub fn child(&self, id: BoxId, slot: ChildSlot) -> Option<BoxId> {
        self.get(id).and_then(|b| b.child(slot))
    }

    /// Set the parent link of `child`. Returns false if `child` is unknown.
    pub fn set_parent(&mut self, child: BoxId, parent: Option<BoxId>) -> bool {
        match self.boxes.get_mut(&child) {
            Some(word) => {
                word.parent = parent;
                true
            }
            None => false,
        }
    }

    /// Set one child link of `parent`. Returns false if `parent` is unknown.
    pub fn set_child(&mut self, parent: BoxId, slot: ChildSlot, child: Option<BoxId>) -> bool {
        match self.boxes.get_mut(&parent) {
            Some(word) => {
                match slot {
                    ChildSlot::Top => word.child_top = child,
                    ChildSlot::Bottom => word.child_bottom = child,
                }
                true
            }
            None => false,
        }
    }

    /// Set the line membership pointer. Only [`LineRegistry`](crate::line::LineRegistry)
    /// calls this, so the pointer always mirrors a line's member set.
    pub(crate) fn set_line(&mut self, id: BoxId, line: Option<LineId>) {
        if let Some(word) = self.boxes.get_mut(&id) {
            word.line = line;
        }
    }

    /// Every box reachable from `id` through parent and child links.
    ///
    /// Children of every ancestor are explored, not only those of the start
    /// box, so the result is the whole tree. The start box is always part of
    /// the result, even if it is not registered. Order is unspecified.
    pub fn connected_component(&self, id: BoxId) -> Vec<BoxId> {
        let mut seen = HashSet::new();
        let mut component = Vec::new();
        let mut pending = vec![id];

        while let Some(current) = pending.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(word) = self.boxes.get(&current) else {
                if current == id {
                    component.push(current);
                } else {
                    log::warn!("skipping dangling link to {current}");
                }
                continue;
            };
            component.push(current);
            pending.extend(word.parent);
            pending.extend(word.children());
        }

        component
    }

    /// The box and all of its descendants, parents before children.
    pub fn subtree(&self, id: BoxId) -> Vec<BoxId> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let mut pending = vec![id];

        while let Some(current) = pending.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(word) = self.boxes.get(&current) else {
                continue;
            };
            result.push(current);
            pending.extend(word.children());
        }

        result
    }

    /// Walk parent links up to the root of the tree containing `id`.
    pub fn root_of(&self, id: BoxId) -> BoxId {
        let mut seen = HashSet::new();
        let mut current = id;
        while seen.insert(current) {
            match self.parent(current) {
                Some(parent) if self.contains(parent) => current = parent,
                _ => break,
            }
        }
        current
    }

    /// True when every parent/child link is mirrored on the other side.
    pub fn links_consistent(&self) -> bool {
        self.boxes.values().all(|word| {
            let parent_ok = match word.parent {
                Some(parent) => self
                    .get(parent)
                    .is_some_and(|p| p.slot_of(word.id).is_some()),
                None => true,
            };
            let children_ok = word
                .children()
                .all(|child| self.parent(child) == Some(word.id));
            parent_ok && children_ok
        })
    }
}
