//! Execution orchestrator
//!
//! `Session` owns the stage, the play flag, one interpreter per sprite while
//! playing, and the collision monitor. Time is virtual: `tick` advances it in
//! substeps that land exactly on every collision poll and on the auto-stop
//! deadline.

use glam::Vec2;

use super::collision::{CollisionMonitor, CollisionOutcome};
use super::coords::StageSize;
use super::interpreter::{Interpreter, RunToken};
use super::state::{SpriteAsset, SpriteId, Stage};
use crate::blocks::{BlockInstance, BlockTemplate};
use crate::error::{EditError, Result};
use crate::settings::Settings;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Play button pressed
    pub play: bool,
    /// Stop requested
    pub stop: bool,
}

/// Things that happened during a tick, for the UI / logs
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Started { run: RunToken, at_ms: u64 },
    Stopped { run: RunToken, at_ms: u64, automatic: bool },
    Collision { at_ms: u64, outcome: CollisionOutcome },
}

pub struct Session {
    settings: Settings,
    stage: Stage,
    is_playing: bool,
    clock_ms: u64,
    run: RunToken,
    interpreters: Vec<Interpreter>,
    collisions: CollisionMonitor,
    next_collision_ms: u64,
    stop_at_ms: Option<u64>,
    events: Vec<SimEvent>,
}

impl Session {
    /// New session with one default Cat sprite
    pub fn new(settings: Settings) -> Self {
        let mut session = Self::empty(settings);
        session.stage.add_sprite(SpriteAsset::Cat);
        session
    }

    /// New session without sprites
    pub fn empty(settings: Settings) -> Self {
        let stage = Stage::new(settings.stage_size(), settings.sprite_size);
        Self {
            settings,
            stage,
            is_playing: false,
            clock_ms: 0,
            run: RunToken::default(),
            interpreters: Vec::new(),
            collisions: CollisionMonitor::new(),
            next_collision_ms: 0,
            stop_at_ms: None,
            events: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn current_run(&self) -> RunToken {
        self.run
    }

    pub fn interpreters(&self) -> &[Interpreter] {
        &self.interpreters
    }

    /// Take all events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Stage layout changed. Existing sprites keep their pixel positions.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.stage.size = StageSize::new(width, height);
    }

    /// Add a sprite; it joins the next run
    pub fn add_sprite(&mut self, asset: SpriteAsset) -> SpriteId {
        let id = self.stage.add_sprite(asset);
        log::info!("Added sprite {}", id);
        id
    }

    fn ensure_editable(&self) -> Result<()> {
        if self.is_playing {
            Err(EditError::Playing)
        } else {
            Ok(())
        }
    }

    pub fn insert_block(&mut self, sprite: &SpriteId, template: &BlockTemplate, index: usize) -> Result<String> {
        self.ensure_editable()?;
        self.stage.programs.insert(sprite, template, index)
    }

    pub fn reorder_block(&mut self, sprite: &SpriteId, from: usize, to: usize) -> Result<()> {
        self.ensure_editable()?;
        self.stage.programs.reorder(sprite, from, to)
    }

    pub fn remove_block(&mut self, sprite: &SpriteId, index: usize) -> Result<BlockInstance> {
        self.ensure_editable()?;
        self.stage.programs.remove(sprite, index)
    }

    pub fn set_program(&mut self, sprite: &SpriteId, blocks: Vec<BlockInstance>) -> Result<()> {
        self.ensure_editable()?;
        self.stage.programs.set(sprite, blocks)
    }

    pub fn set_input(&mut self, sprite: &SpriteId, block_id: &str, slot: usize, value: &str) -> Result<()> {
        self.ensure_editable()?;
        self.stage.programs.set_input(sprite, block_id, slot, value)
    }

    /// Pointer drag of a sprite (top-left position, stage pixels)
    pub fn drag_sprite(&mut self, sprite: &SpriteId, position: Vec2) -> Result<()> {
        self.ensure_editable()?;
        self.stage.drag_to(sprite, position)
    }

    /// Scatter sprites using the configured seed
    pub fn scatter(&mut self, sprites: &[SpriteId]) -> Result<()> {
        self.ensure_editable()?;
        self.stage.scatter(sprites, self.settings.seed);
        Ok(())
    }

    /// Start a run: one interpreter per sprite plus the collision monitor.
    /// Ignored while already playing.
    pub fn play(&mut self) {
        if self.is_playing {
            log::debug!("Play ignored, run {} in progress", self.run.0);
            return;
        }

        self.run = self.run.next();
        self.is_playing = true;
        self.stage.clear_messages();
        self.interpreters = self
            .stage
            .sprites()
            .iter()
            .map(|s| Interpreter::new(s.id.clone(), self.run, self.clock_ms))
            .collect();
        self.next_collision_ms = self.clock_ms.saturating_add(self.settings.collision_interval());
        self.stop_at_ms = self.settings.auto_stop_ms.map(|d| self.clock_ms.saturating_add(d));

        log::info!(
            "Run {} started with {} sprites at {}ms",
            self.run.0,
            self.interpreters.len(),
            self.clock_ms
        );
        self.events.push(SimEvent::Started {
            run: self.run,
            at_ms: self.clock_ms,
        });

        // First blocks execute immediately
        self.run_interpreters();
    }

    /// Stop the run, cancelling every pending effect
    pub fn stop(&mut self) {
        self.stop_with(false);
    }

    fn stop_with(&mut self, automatic: bool) {
        if !self.is_playing {
            return;
        }
        self.is_playing = false;
        for interp in &mut self.interpreters {
            interp.cancel(&mut self.stage);
        }
        self.interpreters.clear();
        self.collisions.reset();
        self.stop_at_ms = None;

        log::info!(
            "Run {} stopped at {}ms{}",
            self.run.0,
            self.clock_ms,
            if automatic { " (auto)" } else { "" }
        );
        self.events.push(SimEvent::Stopped {
            run: self.run,
            at_ms: self.clock_ms,
            automatic,
        });
    }

    /// Advance the session by `dt_ms` of virtual time
    pub fn tick(&mut self, input: &TickInput, dt_ms: u64) {
        if input.stop {
            self.stop();
        }
        if input.play {
            self.play();
        }

        let target = self.clock_ms.saturating_add(dt_ms);
        if !self.is_playing {
            self.clock_ms = target;
            return;
        }

        while self.is_playing && self.clock_ms < target {
            let mut next = target.min(self.next_collision_ms);
            if let Some(stop_at) = self.stop_at_ms {
                next = next.min(stop_at);
            }
            self.clock_ms = next;

            // Effects due exactly at the deadline belong to the cancelled run
            if self.stop_at_ms == Some(self.clock_ms) {
                self.stop_with(true);
                break;
            }

            self.run_interpreters();

            if self.clock_ms == self.next_collision_ms {
                self.poll_collisions();
                self.next_collision_ms = self.next_collision_ms.saturating_add(self.settings.collision_interval());
            }
        }
        self.clock_ms = target;
    }

    /// Tick until the run stops or `limit_ms` of virtual time passes
    pub fn run_until_stopped(&mut self, step_ms: u64, limit_ms: u64) {
        let deadline = self.clock_ms.saturating_add(limit_ms);
        while self.is_playing && self.clock_ms < deadline {
            self.tick(&TickInput::default(), step_ms.max(1));
        }
    }

    fn run_interpreters(&mut self) {
        for interp in &mut self.interpreters {
            interp.advance(&mut self.stage, self.clock_ms, self.run, &self.settings);
        }
    }

    fn poll_collisions(&mut self) {
        let outcomes = self.collisions.tick(&mut self.stage, self.clock_ms, &self.settings);
        let at_ms = self.clock_ms;
        self.events
            .extend(outcomes.into_iter().map(|outcome| SimEvent::Collision { at_ms, outcome }));
    }
}
