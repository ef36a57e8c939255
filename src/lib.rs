//! Block Stage - a Scratch-style block execution engine
//!
//! Core modules:
//! - `blocks`: Block templates, block instances and the static catalog
//! - `sim`: Deterministic simulation (program store, interpreter, collisions)
//! - `scene`: JSON scene files for the native demo
//! - `settings`: Data-driven timings and stage geometry

pub mod blocks;
pub mod error;
pub mod scene;
pub mod settings;
pub mod sim;

pub use blocks::{BlockCategory, BlockInstance, BlockOp, BlockTemplate, InputType};
pub use error::EditError;
pub use settings::Settings;

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Demo driver timestep (60 Hz)
    pub const FRAME_MS: u64 = 16;

    /// Default stage dimensions in pixels
    pub const STAGE_WIDTH: f32 = 480.0;
    pub const STAGE_HEIGHT: f32 = 360.0;

    /// Sprites are treated as square boxes of this size
    pub const SPRITE_SIZE: f32 = 60.0;

    /// Pause after every Motion block
    pub const STEP_PAUSE_MS: u64 = 500;

    /// Collision monitor polling interval
    pub const COLLISION_INTERVAL_MS: u64 = 50;
    /// Center distance at or below which two sprites collide
    pub const COLLISION_DISTANCE: f32 = 60.0;
    /// Per-pair window during which a collided pair is ignored
    pub const COLLISION_COOLDOWN_MS: u64 = 500;

    /// Play automatically stops after this long
    pub const AUTO_STOP_MS: u64 = 2000;

    /// Zero-duration steps allowed per interpreter per substep
    pub const MAX_INSTANT_STEPS: u32 = 10_000;

    /// Block defaults
    pub const DEFAULT_MOVE_STEPS: f32 = 10.0;
    pub const DEFAULT_TURN_DEGREES: f32 = 90.0;
    pub const DEFAULT_SAY_MESSAGE: &str = "Hello!";
    pub const DEFAULT_SAY_SECS: f32 = 2.0;
    pub const DEFAULT_REPEAT_TIMES: f32 = 10.0;
}

/// Unit heading vector for a rotation in degrees (0 = east)
#[inline]
pub fn heading(rotation_deg: f32) -> Vec2 {
    let radians = rotation_deg.to_radians();
    Vec2::new(radians.cos(), radians.sin())
}

/// Clamp a top-left position into `[0, extent - sprite_size]` on each axis.
///
/// The upper bound is applied first so a stage smaller than a sprite pins the
/// sprite to the origin instead of panicking.
#[inline]
pub fn clamp_to_stage(pos: Vec2, extent: Vec2, sprite_size: f32) -> Vec2 {
    let max = extent - Vec2::splat(sprite_size);
    Vec2::new(pos.x.min(max.x).max(0.0), pos.y.min(max.y).max(0.0))
}
