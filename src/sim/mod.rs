//! Deterministic simulation module
//!
//! All execution logic lives here. This module must stay pure and deterministic:
//! - Virtual millisecond clock only
//! - Seeded RNG only
//! - Stable iteration order (sprites in creation order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod coords;
pub mod interpreter;
pub mod program;
pub mod state;
pub mod tick;

pub use collision::{CollisionMonitor, CollisionOutcome};
pub use coords::StageSize;
pub use interpreter::{Interpreter, InterpreterState, RunToken};
pub use program::ProgramStore;
pub use state::{Sprite, SpriteAsset, SpriteId, SpriteLiveState, Stage};
pub use tick::{Session, SimEvent, TickInput};
