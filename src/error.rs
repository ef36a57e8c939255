//! Editing errors
//!
//! The simulation itself never fails; only the editing surface reports errors.

use thiserror::Error;

use crate::sim::SpriteId;

/// Editing result type
pub type Result<T> = std::result::Result<T, EditError>;

/// Rejected edit or drag
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("programs and sprites are locked while playing")]
    Playing,

    #[error("sprite not found: {0}")]
    UnknownSprite(SpriteId),

    #[error("block not found in {sprite}: {block}")]
    UnknownBlock { sprite: SpriteId, block: String },

    #[error("index {index} out of range for program of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}
