//! Glossary derived from committed box text.
//!
//! A root box's text is a headword; the text of its glosses are that
//! headword's translations. The lexicon only grows: editing a box never
//! removes what an earlier edit registered.

use crate::geometry::Geometry;
use crate::graph::EntityGraph;
use crate::word::{is_committed_text, BoxId, PageNumber, WordBox};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One headword and what is known about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    word: String,
    /// Translations in the order they were first registered.
    translations: Vec<String>,
    pages: BTreeSet<PageNumber>,
}

impl LexiconEntry {
    fn new(word: String) -> Self {
        Self {
            word,
            translations: Vec::new(),
            pages: BTreeSet::new(),
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn translations(&self) -> &[String] {
        &self.translations
    }

    pub fn pages(&self) -> &BTreeSet<PageNumber> {
        &self.pages
    }

    fn add_translation(&mut self, translation: &str) {
        if !self.translations.iter().any(|t| t == translation) {
            self.translations.push(translation.to_string());
        }
    }
}

/// Word -> translations/pages index, keyed by headword.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    entries: BTreeMap<String, LexiconEntry>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `word` has an entry and record that it occurs on `page`.
    pub fn register(&mut self, word: &str, page: PageNumber) -> &mut LexiconEntry {
        let word = word.trim();
        let entry = self
            .entries
            .entry(word.to_string())
            .or_insert_with(|| LexiconEntry::new(word.to_string()));
        entry.pages.insert(page);
        entry
    }

    /// Record `translation` under `word`. The headword must already exist.
    pub fn add_translation(&mut self, word: &str, translation: &str) -> bool {
        match self.entries.get_mut(word.trim()) {
            Some(entry) => {
                entry.add_translation(translation.trim());
                true
            }
            None => false,
        }
    }

    /// Update the index after text was committed to `box_id`.
    ///
    /// Headings, and glosses of headings, are ignored, as is blank or
    /// placeholder text.
    pub fn observe_edit(&mut self, graph: &EntityGraph, box_id: BoxId, geometry: &dyn Geometry) {
        let Some(word) = graph.get(box_id) else {
            return;
        };
        if !word.has_committed_text() || word.kind().is_heading() {
            return;
        }
        let parent = word.parent().and_then(|id| graph.get(id));
        if parent.is_some_and(|p| p.kind().is_heading()) {
            return;
        }

        match parent {
            None => {
                self.register(&word.text, geometry.page_of(word));
                for child in word.children().filter_map(|id| graph.get(id)) {
                    if child.has_committed_text() {
                        self.add_translation(&word.text, &child.text);
                    }
                }
                log::debug!("lexicon: registered headword {:?}", word.text.trim());
            }
            Some(parent) => {
                if !parent.has_committed_text() {
                    return;
                }
                self.register(&parent.text, geometry.page_of(parent));
                self.add_translation(&parent.text, &word.text);
                log::debug!(
                    "lexicon: {:?} translates {:?}",
                    word.text.trim(),
                    parent.text.trim()
                );
            }
        }
    }

    /// First translation registered under the parent of `child`.
    pub fn suggest_translation(&self, graph: &EntityGraph, child: BoxId) -> Option<&str> {
        let parent = graph.parent(child).and_then(|id| graph.get(id))?;
        self.translations_of(parent)
            .first()
            .map(String::as_str)
    }

    /// Every translation registered under the text of `parent`.
    pub fn translations_for(&self, graph: &EntityGraph, parent: BoxId) -> &[String] {
        graph
            .get(parent)
            .map(|p| self.translations_of(p))
            .unwrap_or(&[])
    }

    fn translations_of(&self, word: &WordBox) -> &[String] {
        if !is_committed_text(&word.text) {
            return &[];
        }
        self.get(&word.text)
            .map(LexiconEntry::translations)
            .unwrap_or(&[])
    }

    pub fn get(&self, word: &str) -> Option<&LexiconEntry> {
        self.entries.get(word.trim())
    }

    /// Entries in headword order.
    pub fn iter(&self) -> impl Iterator<Item = &LexiconEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::StackedPages;
    use crate::word::{BoxKind, ChildSlot, PLACEHOLDER_TEXT};
    use kurbo::Point;

    struct Fixture {
        graph: EntityGraph,
        geometry: StackedPages,
        lexicon: Lexicon,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                graph: EntityGraph::new(),
                geometry: StackedPages::new(1000.0, 10.0),
                lexicon: Lexicon::new(),
            }
        }

        fn add(&mut self, text: &str, kind: BoxKind, y: f64) -> BoxId {
            self.graph
                .register(WordBox::new(Point::new(100.0, y), text, kind, 24.0))
        }

        fn link(&mut self, parent: BoxId, slot: ChildSlot, child: BoxId) {
            self.graph.set_child(parent, slot, Some(child));
            self.graph.set_parent(child, Some(parent));
        }

        fn observe(&mut self, id: BoxId) {
            self.lexicon.observe_edit(&self.graph, id, &self.geometry);
        }
    }

    #[test]
    fn test_root_registers_headword_with_page() {
        let mut fx = Fixture::new();
        let a = fx.add("logos", BoxKind::Word, 1500.0);
        fx.observe(a);
        let entry = fx.lexicon.get("logos").unwrap();
        assert_eq!(entry.pages().iter().copied().collect::<Vec<_>>(), vec![2]);
        assert!(entry.translations().is_empty());
    }

    #[test]
    fn test_root_picks_up_existing_children() {
        let mut fx = Fixture::new();
        let a = fx.add("logos", BoxKind::Word, 100.0);
        let b = fx.add("word", BoxKind::Word, 130.0);
        let t = fx.add(PLACEHOLDER_TEXT, BoxKind::Word, 70.0);
        fx.link(a, ChildSlot::Bottom, b);
        fx.link(a, ChildSlot::Top, t);
        fx.observe(a);
        assert_eq!(fx.lexicon.get("logos").unwrap().translations(), ["word"]);
    }

    #[test]
    fn test_child_registers_translation_under_parent() {
        let mut fx = Fixture::new();
        let a = fx.add("logos", BoxKind::Word, 100.0);
        let b = fx.add("reason", BoxKind::Word, 130.0);
        fx.link(a, ChildSlot::Bottom, b);
        fx.observe(b);

        assert_eq!(fx.lexicon.translations_for(&fx.graph, a), ["reason"]);
        assert_eq!(fx.lexicon.suggest_translation(&fx.graph, b), Some("reason"));
    }

    #[test]
    fn test_edits_only_add() {
        let mut fx = Fixture::new();
        let a = fx.add("logos", BoxKind::Word, 100.0);
        let b = fx.add("word", BoxKind::Word, 130.0);
        fx.link(a, ChildSlot::Bottom, b);
        fx.observe(b);
        fx.graph.get_mut(b).unwrap().text = "reason".into();
        fx.observe(b);
        fx.observe(b);

        assert_eq!(fx.lexicon.translations_for(&fx.graph, a), ["word", "reason"]);
        assert_eq!(fx.lexicon.suggest_translation(&fx.graph, b), Some("word"));
    }

    #[test]
    fn test_headings_ignored() {
        let mut fx = Fixture::new();
        let chapter = fx.add("Genesis", BoxKind::Chapter, 100.0);
        let gloss = fx.add("Origins", BoxKind::Word, 140.0);
        fx.link(chapter, ChildSlot::Bottom, gloss);
        fx.observe(chapter);
        fx.observe(gloss);
        let headline = fx.add("Title", BoxKind::Headline, 10.0);
        fx.observe(headline);
        assert!(fx.lexicon.is_empty());
    }

    #[test]
    fn test_blank_and_placeholder_ignored() {
        let mut fx = Fixture::new();
        let a = fx.add("  ", BoxKind::Word, 100.0);
        let b = fx.add(PLACEHOLDER_TEXT, BoxKind::Word, 100.0);
        fx.observe(a);
        fx.observe(b);
        assert!(fx.lexicon.is_empty());
    }

    #[test]
    fn test_page_numbers_accumulate() {
        let mut fx = Fixture::new();
        let a = fx.add("kai", BoxKind::Word, 100.0);
        let b = fx.add("kai", BoxKind::Word, 2100.0);
        fx.observe(a);
        fx.observe(b);
        let pages: Vec<_> = fx.lexicon.get("kai").unwrap().pages().iter().copied().collect();
        assert_eq!(pages, vec![1, 3]);
        assert_eq!(fx.lexicon.len(), 1);
    }
}
