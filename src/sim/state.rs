//! Sprites, their live simulation state, and the shared stage context
//!
//! `Stage` owns everything the interpreters and the collision monitor touch:
//! the sprite list, the program store and each sprite's live state.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::coords::StageSize;
use super::program::ProgramStore;
use crate::clamp_to_stage;
use crate::error::{EditError, Result};

/// Unique sprite identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpriteId(pub String);

impl fmt::Display for SpriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpriteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Costume a sprite is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpriteAsset {
    #[default]
    Cat,
    Ball,
    Rocket,
    Car,
}

impl SpriteAsset {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpriteAsset::Cat => "Cat",
            SpriteAsset::Ball => "Ball",
            SpriteAsset::Rocket => "Rocket",
            SpriteAsset::Car => "Car",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cat" => Some(SpriteAsset::Cat),
            "ball" => Some(SpriteAsset::Ball),
            "rocket" => Some(SpriteAsset::Rocket),
            "car" => Some(SpriteAsset::Car),
            _ => None,
        }
    }
}

/// An actor on the stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub id: SpriteId,
    pub name: String,
    pub asset: SpriteAsset,
}

/// What the renderer draws each frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteLiveState {
    /// Top-left corner in stage pixels
    pub position: Vec2,
    /// Degrees, 0 = east, not normalized
    pub rotation: f32,
    /// Speech bubble text, empty when silent
    pub message: String,
    pub is_visible: bool,
}

impl SpriteLiveState {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
            message: String::new(),
            is_visible: true,
        }
    }
}

/// Shared simulation context
#[derive(Debug, Clone)]
pub struct Stage {
    pub size: StageSize,
    pub sprite_size: f32,
    pub programs: ProgramStore,
    /// Sprites in creation order
    sprites: Vec<Sprite>,
    live: BTreeMap<SpriteId, SpriteLiveState>,
    next_sprite: u32,
}

impl Stage {
    /// Create an empty stage
    pub fn new(size: StageSize, sprite_size: f32) -> Self {
        Self {
            size,
            sprite_size,
            programs: ProgramStore::new(),
            sprites: Vec::new(),
            live: BTreeMap::new(),
            next_sprite: 0,
        }
    }

    /// Add a sprite centered on the stage with an empty program
    pub fn add_sprite(&mut self, asset: SpriteAsset) -> SpriteId {
        self.next_sprite += 1;
        let id = SpriteId(format!("sprite-{}-{}", asset.as_str().to_lowercase(), self.next_sprite));
        let sprite = Sprite {
            id: id.clone(),
            name: asset.as_str().to_string(),
            asset,
        };
        let start = self.size.center() - Vec2::splat(self.sprite_size / 2.0);
        self.programs.create(&id);
        self.live.insert(id.clone(), SpriteLiveState::at(start));
        self.sprites.push(sprite);
        id
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn sprite(&self, id: &SpriteId) -> Option<&Sprite> {
        self.sprites.iter().find(|s| &s.id == id)
    }

    pub fn live(&self, id: &SpriteId) -> Option<&SpriteLiveState> {
        self.live.get(id)
    }

    pub(crate) fn live_mut(&mut self, id: &SpriteId) -> Option<&mut SpriteLiveState> {
        self.live.get_mut(id)
    }

    /// Sprite center in logical coordinates (what the HUD shows)
    pub fn logical_position(&self, id: &SpriteId) -> Option<Vec2> {
        let live = self.live.get(id)?;
        let center = live.position + Vec2::splat(self.sprite_size / 2.0);
        Some(self.size.to_logical(center))
    }

    /// Clamp a top-left position into the stage
    pub fn clamp(&self, position: Vec2) -> Vec2 {
        clamp_to_stage(position, self.size.extent(), self.sprite_size)
    }

    /// Pointer drag: place a sprite, clamped into the stage
    pub(crate) fn drag_to(&mut self, id: &SpriteId, position: Vec2) -> Result<()> {
        let clamped = self.clamp(position);
        let live = self
            .live
            .get_mut(id)
            .ok_or_else(|| EditError::UnknownSprite(id.clone()))?;
        live.position = clamped;
        Ok(())
    }

    /// Clear every speech bubble
    pub(crate) fn clear_messages(&mut self) {
        for live in self.live.values_mut() {
            live.message.clear();
        }
    }

    /// Move sprites to random positions and headings (deterministic per seed)
    pub(crate) fn scatter(&mut self, ids: &[SpriteId], seed: u64) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let max = (self.size.extent() - Vec2::splat(self.sprite_size)).max(Vec2::ZERO);
        for id in ids {
            if let Some(live) = self.live.get_mut(id) {
                live.position = Vec2::new(
                    rng.random_range(0.0..=max.x),
                    rng.random_range(0.0..=max.y),
                );
                live.rotation = (rng.random_range(0..8) * 45) as f32;
            }
        }
    }
}
