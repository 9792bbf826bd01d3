//! Baselines and their box membership.
//!
//! A line owns a set of boxes. Membership is always expanded to a whole
//! connected component: attaching one gloss attaches its entire tree. A box's
//! `line` pointer is set exactly when the box sits in that line's member set.

use crate::config::LayoutConfig;
use crate::graph::EntityGraph;
use crate::snap;
use crate::word::{BoxId, PageNumber};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a line. Does not encode the line's Y, which moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId(Uuid);

impl LineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line:{}", self.0)
    }
}

/// A horizontal baseline on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    id: LineId,
    page: PageNumber,
    y: f64,
    /// Height of the text body above the baseline, used for picking.
    pub body_height: f64,
    members: HashSet<BoxId>,
}

impl Line {
    pub fn new(page: PageNumber, y: f64, body_height: f64) -> Self {
        Self {
            id: LineId::new(),
            page,
            y,
            body_height,
            members: HashSet::new(),
        }
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn page(&self) -> PageNumber {
        self.page
    }

    /// Baseline Y in document coordinates.
    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn members(&self) -> &HashSet<BoxId> {
        &self.members
    }

    pub fn contains(&self, id: BoxId) -> bool {
        self.members.contains(&id)
    }

    /// True if `y` falls within the body band above the baseline.
    pub fn hit_test(&self, y: f64) -> bool {
        y >= self.y - self.body_height && y <= self.y
    }
}

/// All lines of a document, grouped by page in registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineRegistry {
    pages: BTreeMap<PageNumber, Vec<Line>>,
    /// Attach boxes without moving them onto the baseline.
    #[serde(skip)]
    prevent_snap: bool,
}

impl LineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a line on `page` at baseline `y`.
    pub fn add_line(&mut self, page: PageNumber, y: f64, body_height: f64) -> LineId {
        let line = Line::new(page, y, body_height);
        let id = line.id;
        self.pages.entry(page).or_default().push(line);
        id
    }

    /// Put a line back at a given position in its page's order.
    /// Members are cleared; re-attach boxes through [`Self::add_box_to_line`].
    pub(crate) fn insert_line(&mut self, mut line: Line, index: usize) {
        line.members.clear();
        let lines = self.pages.entry(line.page).or_default();
        let index = index.min(lines.len());
        lines.insert(index, line);
    }

    /// Remove a line, clearing the line pointer of every member box.
    /// Returns the removed line and its former index within the page.
    pub fn delete_line(&mut self, id: LineId, graph: &mut EntityGraph) -> Option<(Line, usize)> {
        let (page, index) = self.locate(id)?;
        let lines = self.pages.get_mut(&page)?;
        let line = lines.remove(index);
        if lines.is_empty() {
            self.pages.remove(&page);
        }
        for &member in &line.members {
            graph.set_line(member, None);
        }
        Some((line, index))
    }

    fn locate(&self, id: LineId) -> Option<(PageNumber, usize)> {
        self.pages.iter().find_map(|(&page, lines)| {
            lines
                .iter()
                .position(|line| line.id == id)
                .map(|index| (page, index))
        })
    }

    pub fn get(&self, id: LineId) -> Option<&Line> {
        self.iter().find(|line| line.id == id)
    }

    fn get_mut(&mut self, id: LineId) -> Option<&mut Line> {
        self.pages
            .values_mut()
            .flat_map(|lines| lines.iter_mut())
            .find(|line| line.id == id)
    }

    /// Lines of one page, in registration order.
    pub fn lines_on_page(&self, page: PageNumber) -> &[Line] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.pages.values().flat_map(|lines| lines.iter())
    }

    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Line whose body band contains `y` on `page`.
    pub fn line_at(&self, page: PageNumber, y: f64) -> Option<LineId> {
        self.lines_on_page(page)
            .iter()
            .find(|line| line.hit_test(y))
            .map(Line::id)
    }

    pub fn prevent_snap(&self) -> bool {
        self.prevent_snap
    }

    pub fn set_prevent_snap(&mut self, prevent: bool) {
        self.prevent_snap = prevent;
    }

    /// Attach the whole connected component of `box_id` to a line.
    ///
    /// Members already on another line are moved over. Unless snapping is
    /// prevented, the component's root is placed on the baseline and its
    /// glosses follow. Returns false if the line does not exist.
    pub fn add_box_to_line(
        &mut self,
        line_id: LineId,
        box_id: BoxId,
        graph: &mut EntityGraph,
        config: &LayoutConfig,
    ) -> bool {
        let Some(line_y) = self.get(line_id).map(Line::y) else {
            return false;
        };

        for member in graph.connected_component(box_id) {
            let Some(current) = graph.get(member).map(|b| b.line()) else {
                continue;
            };
            match current {
                Some(old) if old == line_id => {}
                Some(old) => {
                    if let Some(old_line) = self.get_mut(old) {
                        old_line.members.remove(&member);
                    }
                }
                None => {}
            }
            if let Some(line) = self.get_mut(line_id) {
                line.members.insert(member);
            }
            graph.set_line(member, Some(line_id));
        }

        if !self.prevent_snap {
            let root = graph.root_of(box_id);
            snap::place_on_baseline(graph, root, line_y, config);
        }
        true
    }

    /// Attach without moving anything, as when restoring recorded state.
    pub fn attach_without_snap(
        &mut self,
        line_id: LineId,
        box_id: BoxId,
        graph: &mut EntityGraph,
        config: &LayoutConfig,
    ) -> bool {
        let previous = self.prevent_snap;
        self.prevent_snap = true;
        let attached = self.add_box_to_line(line_id, box_id, graph, config);
        self.prevent_snap = previous;
        attached
    }

    /// Detach the whole connected component of `box_id` from a line.
    pub fn remove_box_from_line(
        &mut self,
        line_id: LineId,
        box_id: BoxId,
        graph: &mut EntityGraph,
    ) -> bool {
        let component = graph.connected_component(box_id);
        let Some(line) = self.get_mut(line_id) else {
            return false;
        };
        for member in component {
            if line.members.remove(&member) {
                graph.set_line(member, None);
            }
        }
        true
    }

    /// Move a line's baseline and carry every root member with it.
    /// Non-root members are only moved through their root.
    pub fn set_y(
        &mut self,
        line_id: LineId,
        y: f64,
        graph: &mut EntityGraph,
        config: &LayoutConfig,
    ) -> bool {
        let Some(line) = self.get_mut(line_id) else {
            return false;
        };
        line.y = y;
        let roots: Vec<BoxId> = line
            .members
            .iter()
            .copied()
            .filter(|&id| graph.get(id).is_some_and(|b| b.is_root()))
            .collect();
        for root in roots {
            snap::place_on_baseline(graph, root, y, config);
        }
        true
    }

    pub fn set_body_height(&mut self, line_id: LineId, body_height: f64) -> bool {
        match self.get_mut(line_id) {
            Some(line) => {
                line.body_height = body_height;
                true
            }
            None => false,
        }
    }

    /// Drop a box from whatever member set holds it. Used when a box is
    /// unregistered so no line keeps a dangling member.
    pub(crate) fn forget_box(&mut self, box_id: BoxId) {
        for line in self.pages.values_mut().flat_map(|lines| lines.iter_mut()) {
            line.members.remove(&box_id);
        }
    }

    /// Root members of a line, left to right.
    pub fn roots(&self, line_id: LineId, graph: &EntityGraph) -> Vec<BoxId> {
        let Some(line) = self.get(line_id) else {
            return Vec::new();
        };
        let mut roots: Vec<_> = line
            .members
            .iter()
            .filter_map(|&id| graph.get(id))
            .filter(|b| b.is_root())
            .map(|b| (b.position.x, b.id()))
            .collect();
        roots.sort_by(|a, b| a.0.total_cmp(&b.0));
        roots.into_iter().map(|(_, id)| id).collect()
    }

    /// True when every member set agrees with the boxes' line pointers.
    pub fn membership_consistent(&self, graph: &EntityGraph) -> bool {
        let members_ok = self.iter().all(|line| {
            line.members
                .iter()
                .all(|&id| graph.get(id).is_some_and(|b| b.line() == Some(line.id)))
        });
        let pointers_ok = graph.iter().all(|b| match b.line() {
            Some(line_id) => self.iter().filter(|l| l.contains(b.id())).count() == 1
                && self.get(line_id).is_some_and(|l| l.contains(b.id())),
            None => self.iter().all(|l| !l.contains(b.id())),
        });
        members_ok && pointers_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::{BoxKind, ChildSlot, WordBox};
    use kurbo::Point;

    fn setup() -> (LineRegistry, EntityGraph, LayoutConfig) {
        (LineRegistry::new(), EntityGraph::new(), LayoutConfig::default())
    }

    fn word_at(graph: &mut EntityGraph, x: f64, y: f64) -> BoxId {
        graph.register(WordBox::new(Point::new(x, y), "w", BoxKind::Word, 24.0))
    }

    #[test]
    fn test_add_line_per_page() {
        let (mut lines, _, _) = setup();
        let a = lines.add_line(1, 100.0, 24.0);
        let b = lines.add_line(1, 200.0, 24.0);
        let c = lines.add_line(2, 1200.0, 24.0);
        let page_one: Vec<_> = lines.lines_on_page(1).iter().map(Line::id).collect();
        assert_eq!(page_one, vec![a, b]);
        assert_eq!(lines.lines_on_page(2)[0].id(), c);
        assert!(lines.lines_on_page(3).is_empty());
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_add_box_expands_component() {
        let (mut lines, mut graph, config) = setup();
        let line = lines.add_line(1, 300.0, 24.0);
        let a = word_at(&mut graph, 100.0, 100.0);
        let b = word_at(&mut graph, 0.0, 0.0);
        graph.set_child(a, ChildSlot::Bottom, Some(b));
        graph.set_parent(b, Some(a));

        assert!(lines.add_box_to_line(line, b, &mut graph, &config));
        assert_eq!(graph.get(a).unwrap().line(), Some(line));
        assert_eq!(graph.get(b).unwrap().line(), Some(line));
        // Root sits on the baseline, child below it.
        assert_eq!(graph.get(a).unwrap().bottom(), 300.0);
        assert_eq!(graph.get(b).unwrap().position.y, 300.0 + config.vertical_spacing);
        assert!(lines.membership_consistent(&graph));
    }

    #[test]
    fn test_prevent_snap_keeps_position() {
        let (mut lines, mut graph, config) = setup();
        let line = lines.add_line(1, 300.0, 24.0);
        let a = word_at(&mut graph, 100.0, 150.0);
        lines.attach_without_snap(line, a, &mut graph, &config);
        assert_eq!(graph.get(a).unwrap().position, Point::new(100.0, 150.0));
        assert!(!lines.prevent_snap());
    }

    #[test]
    fn test_move_between_lines() {
        let (mut lines, mut graph, config) = setup();
        let l1 = lines.add_line(1, 300.0, 24.0);
        let l2 = lines.add_line(1, 400.0, 24.0);
        let a = word_at(&mut graph, 100.0, 100.0);
        lines.add_box_to_line(l1, a, &mut graph, &config);
        lines.add_box_to_line(l2, a, &mut graph, &config);
        assert!(!lines.get(l1).unwrap().contains(a));
        assert!(lines.get(l2).unwrap().contains(a));
        assert!(lines.membership_consistent(&graph));
    }

    #[test]
    fn test_delete_line_clears_members() {
        let (mut lines, mut graph, config) = setup();
        let line = lines.add_line(1, 300.0, 24.0);
        let a = word_at(&mut graph, 100.0, 100.0);
        let b = word_at(&mut graph, 200.0, 100.0);
        lines.add_box_to_line(line, a, &mut graph, &config);
        lines.add_box_to_line(line, b, &mut graph, &config);

        let (removed, index) = lines.delete_line(line, &mut graph).unwrap();
        assert_eq!(index, 0);
        assert_eq!(removed.members().len(), 2);
        assert!(graph.iter().all(|w| w.line().is_none()));
        assert!(lines.is_empty());
    }

    #[test]
    fn test_remove_box_from_line() {
        let (mut lines, mut graph, config) = setup();
        let line = lines.add_line(1, 300.0, 24.0);
        let a = word_at(&mut graph, 100.0, 100.0);
        let b = word_at(&mut graph, 100.0, 100.0);
        graph.set_child(a, ChildSlot::Top, Some(b));
        graph.set_parent(b, Some(a));
        lines.add_box_to_line(line, a, &mut graph, &config);

        lines.remove_box_from_line(line, a, &mut graph);
        assert!(lines.get(line).unwrap().members().is_empty());
        assert!(graph.get(b).unwrap().line().is_none());
    }

    #[test]
    fn test_set_y_moves_roots_and_children() {
        let (mut lines, mut graph, config) = setup();
        let line = lines.add_line(1, 300.0, 24.0);
        let a = word_at(&mut graph, 100.0, 100.0);
        let t = word_at(&mut graph, 0.0, 0.0);
        graph.set_child(a, ChildSlot::Top, Some(t));
        graph.set_parent(t, Some(a));
        lines.add_box_to_line(line, a, &mut graph, &config);

        lines.set_y(line, 500.0, &mut graph, &config);
        let root = graph.get(a).unwrap();
        assert_eq!(root.bottom(), 500.0);
        let top = graph.get(t).unwrap();
        assert_eq!(top.position.x, 100.0);
        assert_eq!(top.bottom() + config.vertical_spacing, root.position.y);
    }

    #[test]
    fn test_roots_sorted_by_x() {
        let (mut lines, mut graph, config) = setup();
        let line = lines.add_line(1, 300.0, 24.0);
        let right = word_at(&mut graph, 400.0, 0.0);
        let left = word_at(&mut graph, 100.0, 0.0);
        lines.add_box_to_line(line, right, &mut graph, &config);
        lines.add_box_to_line(line, left, &mut graph, &config);
        assert_eq!(lines.roots(line, &graph), vec![left, right]);
    }

    #[test]
    fn test_line_at() {
        let (mut lines, _, _) = setup();
        let line = lines.add_line(1, 300.0, 24.0);
        assert_eq!(lines.line_at(1, 290.0), Some(line));
        assert_eq!(lines.line_at(1, 250.0), None);
        assert_eq!(lines.line_at(2, 290.0), None);
    }
}
