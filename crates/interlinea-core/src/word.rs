//! Word boxes: the positioned text tokens of a page.

use crate::line::LineId;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One-based page number.
pub type PageNumber = u32;

/// Text a freshly created box shows until the user commits something else.
pub const PLACEHOLDER_TEXT: &str = "...";

/// Unique identifier for a word box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoxId(Uuid);

impl BoxId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BoxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "box:{}", self.0)
    }
}

/// What a box represents on the page. Fixed when the box is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BoxKind {
    /// An ordinary word or gloss.
    #[default]
    Word,
    Chapter,
    Section,
    Headline,
    PageNumber,
}

impl BoxKind {
    /// Height multiplier relative to a plain word box.
    pub fn height_factor(self) -> f64 {
        match self {
            BoxKind::Section => 1.25,
            BoxKind::Chapter => 1.5,
            BoxKind::Word | BoxKind::Headline | BoxKind::PageNumber => 1.0,
        }
    }

    /// Headings are excluded from the lexicon.
    pub fn is_heading(self) -> bool {
        matches!(self, BoxKind::Chapter | BoxKind::Section | BoxKind::Headline)
    }
}

/// Which child link of a parent box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChildSlot {
    /// Gloss placed directly above the parent.
    Top,
    /// Gloss placed directly below the parent.
    Bottom,
}

impl ChildSlot {
    pub fn both() -> [ChildSlot; 2] {
        [ChildSlot::Top, ChildSlot::Bottom]
    }
}

/// A positioned text token.
///
/// Links (`parent`, children, `line`) are only changed through
/// [`EntityGraph`](crate::graph::EntityGraph) and
/// [`LineRegistry`](crate::line::LineRegistry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordBox {
    pub(crate) id: BoxId,
    /// Top-left corner in logical document coordinates.
    pub position: Point,
    pub text: String,
    /// Free-form annotation attached by the user.
    #[serde(default)]
    pub metadata: String,
    pub(crate) kind: BoxKind,
    pub(crate) height: f64,
    pub(crate) parent: Option<BoxId>,
    pub(crate) child_top: Option<BoxId>,
    pub(crate) child_bottom: Option<BoxId>,
    pub(crate) line: Option<LineId>,
    #[serde(default)]
    pub selected: bool,
    /// Selected on its own rather than as part of its component.
    #[serde(default)]
    pub individually_selected: bool,
    /// Keyboard traversal last arrived here from the box above.
    #[serde(default)]
    pub navigated_from_above: bool,
    /// Keyboard traversal last arrived here from the box below.
    #[serde(default)]
    pub navigated_from_below: bool,
    /// Text is in the secondary (translation) language.
    #[serde(default)]
    pub language: bool,
}

impl WordBox {
    /// Create an unlinked box. Height follows from `kind`.
    pub fn new(position: Point, text: impl Into<String>, kind: BoxKind, base_height: f64) -> Self {
        Self {
            id: BoxId::new(),
            position,
            text: text.into(),
            metadata: String::new(),
            kind,
            height: base_height * kind.height_factor(),
            parent: None,
            child_top: None,
            child_bottom: None,
            line: None,
            selected: false,
            individually_selected: false,
            navigated_from_above: false,
            navigated_from_below: false,
            language: false,
        }
    }

    pub fn id(&self) -> BoxId {
        self.id
    }

    pub fn kind(&self) -> BoxKind {
        self.kind
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn parent(&self) -> Option<BoxId> {
        self.parent
    }

    pub fn child(&self, slot: ChildSlot) -> Option<BoxId> {
        match slot {
            ChildSlot::Top => self.child_top,
            ChildSlot::Bottom => self.child_bottom,
        }
    }

    pub fn child_top(&self) -> Option<BoxId> {
        self.child_top
    }

    pub fn child_bottom(&self) -> Option<BoxId> {
        self.child_bottom
    }

    /// Both child links that are set.
    pub fn children(&self) -> impl Iterator<Item = BoxId> + '_ {
        self.child_top.into_iter().chain(self.child_bottom)
    }

    pub fn line(&self) -> Option<LineId> {
        self.line
    }

    /// A root box has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn has_children(&self) -> bool {
        self.child_top.is_some() || self.child_bottom.is_some()
    }

    /// The slot this box occupies under `parent`, if linked there.
    pub fn slot_of(&self, child: BoxId) -> Option<ChildSlot> {
        ChildSlot::both().into_iter().find(|&slot| self.child(slot) == Some(child))
    }

    /// Text the user actually entered (not blank, not the placeholder).
    pub fn has_committed_text(&self) -> bool {
        is_committed_text(&self.text)
    }

    /// Bounding rectangle for a given rendered width.
    pub fn bounds(&self, width: f64) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + width,
            self.position.y + self.height,
        )
    }

    /// Y coordinate of the box's bottom edge.
    pub fn bottom(&self) -> f64 {
        self.position.y + self.height
    }

    /// Connector marker centred on the top edge.
    pub fn top_marker(&self, width: f64) -> Point {
        Point::new(self.position.x + width / 2.0, self.position.y)
    }

    /// Connector marker centred on the bottom edge.
    pub fn bottom_marker(&self, width: f64) -> Point {
        Point::new(self.position.x + width / 2.0, self.bottom())
    }
}

pub(crate) fn is_committed_text(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed != PLACEHOLDER_TEXT
}
