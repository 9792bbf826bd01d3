//! Error types.

use crate::line::LineId;
use crate::marginalia::MarginaliaId;
use crate::word::{BoxId, ChildSlot};
use thiserror::Error;

/// A gesture that could not be carried out. The document is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("No such box: {0}")]
    UnknownBox(BoxId),
    #[error("No such line: {0}")]
    UnknownLine(LineId),
    #[error("No such marginalia: {0}")]
    UnknownMarginalia(MarginaliaId),
    #[error("{parent} already has a {slot:?} child")]
    SlotOccupied { parent: BoxId, slot: ChildSlot },
    #[error("No drag in progress")]
    NoDrag,
    #[error("A drag is already in progress")]
    DragInProgress,
}

/// Result type for editing gestures.
pub type EditResult<T> = Result<T, EditError>;

/// Errors reading or writing a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
