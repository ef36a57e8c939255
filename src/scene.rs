//! Scene files for the native demo
//!
//! A scene lists sprites and their programs in the same block interchange
//! shape the editor uses.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::blocks::{self, BlockInstance, BlockTemplate};
use crate::error::Result;
use crate::sim::{Session, SpriteAsset, SpriteId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub sprites: Vec<SceneSprite>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSprite {
    #[serde(default)]
    pub asset: SpriteAsset,
    /// Logical start position (stage center = origin)
    #[serde(default)]
    pub start: Option<(f32, f32)>,
    #[serde(default)]
    pub program: Vec<BlockInstance>,
}

impl Scene {
    /// Read a scene from a JSON file
    pub fn load(path: &Path) -> Option<Self> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Cannot read scene {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&json) {
            Ok(scene) => Some(scene),
            Err(e) => {
                log::warn!("Invalid scene {}: {}", path.display(), e);
                None
            }
        }
    }

    /// A Cat walking into a Ball that only spins, so the Cat's steps get
    /// handed over on contact.
    pub fn demo() -> Self {
        fn with(template: &BlockTemplate, id: &str, inputs: &[&str]) -> BlockInstance {
            let mut block = template.instantiate(id);
            for (i, v) in inputs.iter().enumerate() {
                block.inputs.insert(i, v.to_string());
            }
            block
        }

        Scene {
            sprites: vec![
                SceneSprite {
                    asset: SpriteAsset::Cat,
                    start: Some((-90.0, 0.0)),
                    program: vec![
                        with(&blocks::WHEN_CLICKED, "demo-1", &[]),
                        with(&blocks::SAY_FOR_SECS, "demo-2", &["Here I go", "0.5"]),
                        with(&blocks::REPEAT_TIMES, "demo-3", &["3"]),
                        with(&blocks::MOVE_STEPS, "demo-4", &["30"]),
                    ],
                },
                SceneSprite {
                    asset: SpriteAsset::Ball,
                    start: Some((40.0, 0.0)),
                    program: vec![
                        with(&blocks::WHEN_CLICKED, "demo-5", &[]),
                        with(&blocks::REPEAT_TIMES, "demo-6", &["4"]),
                        with(&blocks::TURN_DEGREES, "demo-7", &["90"]),
                    ],
                },
            ],
        }
    }

    /// Add every sprite of the scene to a session and install its program.
    /// Sprites without a start position are scattered with the settings seed.
    pub fn install(&self, session: &mut Session) -> Result<Vec<SpriteId>> {
        let half = session.settings().sprite_size / 2.0;
        let mut ids = Vec::with_capacity(self.sprites.len());
        let mut unplaced = Vec::new();
        for sprite in &self.sprites {
            let id = session.add_sprite(sprite.asset);
            match sprite.start {
                Some((x, y)) => {
                    let screen = session.stage().size.to_screen(Vec2::new(x, y));
                    session.drag_sprite(&id, screen - Vec2::splat(half))?;
                }
                None => unplaced.push(id.clone()),
            }
            session.set_program(&id, sprite.program.clone())?;
            ids.push(id);
        }
        if !unplaced.is_empty() {
            session.scatter(&unplaced)?;
        }
        Ok(ids)
    }
}
