//! Free-floating annotation blocks.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a marginalia block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarginaliaId(Uuid);

impl MarginaliaId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MarginaliaId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MarginaliaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marginalia:{}", self.0)
    }
}

/// A rectangle of free text, unlinked to boxes or lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marginalia {
    pub(crate) id: MarginaliaId,
    pub position: Point,
    pub size: Size,
    pub text: String,
    #[serde(default)]
    pub language: bool,
}

impl Marginalia {
    /// Default size of a new block.
    pub const DEFAULT_SIZE: Size = Size::new(160.0, 80.0);

    pub fn new(position: Point, text: impl Into<String>) -> Self {
        Self {
            id: MarginaliaId::new(),
            position,
            size: Self::DEFAULT_SIZE,
            text: text.into(),
            language: false,
        }
    }

    pub fn id(&self) -> MarginaliaId {
        self.id
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.position = rect.origin();
        self.size = rect.size();
    }

    pub fn hit_test(&self, point: Point) -> bool {
        self.rect().contains(point)
    }
}

/// Owner of all marginalia blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarginaliaStore {
    blocks: HashMap<MarginaliaId, Marginalia>,
}

impl MarginaliaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, block: Marginalia) -> MarginaliaId {
        let id = block.id;
        self.blocks.insert(id, block);
        id
    }

    pub fn remove(&mut self, id: MarginaliaId) -> Option<Marginalia> {
        self.blocks.remove(&id)
    }

    pub fn get(&self, id: MarginaliaId) -> Option<&Marginalia> {
        self.blocks.get(&id)
    }

    pub fn get_mut(&mut self, id: MarginaliaId) -> Option<&mut Marginalia> {
        self.blocks.get_mut(&id)
    }

    pub fn contains(&self, id: MarginaliaId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marginalia> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Topmost block under `point`, if any.
    pub fn at_point(&self, point: Point) -> Option<MarginaliaId> {
        self.blocks
            .values()
            .find(|block| block.hit_test(point))
            .map(Marginalia::id)
    }
}
