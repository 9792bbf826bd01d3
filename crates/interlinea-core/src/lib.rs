//! Interlinea Core Library
//!
//! Editing model for interlinear manuscripts: word boxes stacked into gloss
//! trees, baselines that hold the trees on a page, free-floating marginalia,
//! a lexicon built from what the translator writes, and an undo history over
//! all of it. Rendering and input handling live outside this crate; the
//! [`Geometry`] trait is the seam between them.

pub mod config;
pub mod document;
pub mod drag;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod history;
pub mod lexicon;
pub mod line;
pub mod marginalia;
pub mod navigation;
pub mod session;
pub mod snap;
pub mod word;

pub use config::LayoutConfig;
pub use document::Document;
pub use drag::{DragState, MarginaliaDragMode};
pub use error::{DocumentError, EditError, EditResult};
pub use geometry::{Geometry, StackedPages};
pub use graph::EntityGraph;
pub use history::{BoxContent, Command, CommandHistory, CommandKind, HistoryConfig, MarginaliaContent};
pub use lexicon::{Lexicon, LexiconEntry};
pub use line::{Line, LineId, LineRegistry};
pub use marginalia::{Marginalia, MarginaliaId, MarginaliaStore};
pub use navigation::Direction;
pub use session::Session;
pub use snap::{LineSnap, nearest_line};
pub use word::{BoxId, BoxKind, ChildSlot, PageNumber, WordBox};
