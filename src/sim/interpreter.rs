//! Per-sprite block interpreter
//!
//! A cooperative state machine: `Idle -> Running -> (Suspended)* -> Finished`.
//! The program is re-read from the live store on every step, so mutations
//! made by the collision monitor show up in still-running programs.
//!
//! `Repeat N times` repeats the tail of the program: the blocks after it run
//! N times in total, then that level of the walk ends. Nested repeats
//! multiply.

use glam::Vec2;

use super::state::{SpriteId, Stage};
use crate::blocks::{BlockInstance, BlockOp};
use crate::consts::*;
use crate::heading;
use crate::settings::Settings;

/// Identifies one play run. Effects of a stale run are never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RunToken(pub u64);

impl RunToken {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Interpreter lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterState {
    /// Created, first step not taken yet
    Idle,
    Running,
    /// Waiting for a timed effect; optionally clears the speech bubble on wake
    Suspended { until_ms: u64, clear_message: bool },
    Finished,
}

/// One level of the walk. The root frame covers the whole program once;
/// each Repeat pushes a frame over its tail.
#[derive(Debug, Clone, Copy)]
struct Frame {
    start: usize,
    cursor: usize,
    remaining: u32,
}

/// Cursor value for a frame whose tail was handed to a Repeat frame
const TAIL_CONSUMED: usize = usize::MAX;

/// Result of executing one step
enum Step {
    Instant,
    Suspend { ms: u64, clear_message: bool },
    Done,
}

#[derive(Debug, Clone)]
pub struct Interpreter {
    sprite: SpriteId,
    run: RunToken,
    state: InterpreterState,
    frames: Vec<Frame>,
    /// Virtual time at which the current step executes
    clock_ms: u64,
}

impl Interpreter {
    pub fn new(sprite: SpriteId, run: RunToken, start_ms: u64) -> Self {
        Self {
            sprite,
            run,
            state: InterpreterState::Idle,
            frames: Vec::new(),
            clock_ms: start_ms,
        }
    }

    pub fn sprite(&self) -> &SpriteId {
        &self.sprite
    }

    pub fn run(&self) -> RunToken {
        self.run
    }

    pub fn state(&self) -> InterpreterState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == InterpreterState::Finished
    }

    /// Execute every step due at or before `now_ms`.
    ///
    /// Suspensions resume at their scheduled time, not at `now_ms`, so the
    /// outcome does not depend on how finely the caller slices time.
    pub fn advance(&mut self, stage: &mut Stage, now_ms: u64, current: RunToken, settings: &Settings) {
        if self.run != current {
            self.state = InterpreterState::Finished;
            return;
        }

        // Resuming after a budget yield: later effects are timed from now
        if self.state == InterpreterState::Running {
            self.clock_ms = self.clock_ms.max(now_ms);
        }

        let mut budget = settings.max_instant_steps.max(1);
        loop {
            match self.state {
                InterpreterState::Finished => return,
                InterpreterState::Idle => self.start(stage),
                InterpreterState::Suspended { until_ms, clear_message } => {
                    if until_ms > now_ms {
                        return;
                    }
                    self.clock_ms = until_ms;
                    if clear_message {
                        if let Some(live) = stage.live_mut(&self.sprite) {
                            live.message.clear();
                        }
                    }
                    self.state = InterpreterState::Running;
                }
                InterpreterState::Running => match self.step(stage, settings) {
                    Step::Instant => {
                        budget -= 1;
                        if budget == 0 {
                            return;
                        }
                    }
                    Step::Suspend { ms, clear_message } => {
                        self.state = InterpreterState::Suspended {
                            until_ms: self.clock_ms.saturating_add(ms),
                            clear_message,
                        };
                    }
                    Step::Done => {
                        log::debug!("{} finished at {}ms", self.sprite, self.clock_ms);
                        self.state = InterpreterState::Finished;
                    }
                },
            }
        }
    }

    /// Stop without applying further effects. A pending bubble clear is
    /// applied now so no message outlives its run.
    pub fn cancel(&mut self, stage: &mut Stage) {
        if let InterpreterState::Suspended { clear_message: true, .. } = self.state {
            if let Some(live) = stage.live_mut(&self.sprite) {
                live.message.clear();
            }
        }
        self.frames.clear();
        self.state = InterpreterState::Finished;
    }

    /// Programs without a "When ▶️ clicked" block never run
    fn start(&mut self, stage: &Stage) {
        let has_trigger = stage
            .programs
            .get(&self.sprite)
            .iter()
            .any(|b| b.op() == BlockOp::WhenFlagClicked);
        if has_trigger {
            self.frames.push(Frame {
                start: 0,
                cursor: 0,
                remaining: 1,
            });
            self.state = InterpreterState::Running;
        } else {
            log::debug!("{} has no start block, skipping", self.sprite);
            self.state = InterpreterState::Finished;
        }
    }

    fn step(&mut self, stage: &mut Stage, settings: &Settings) -> Step {
        let Some(frame) = self.frames.last_mut() else {
            return Step::Done;
        };

        let index = frame.cursor;
        let Some(block) = stage.programs.block_at(&self.sprite, index).cloned() else {
            // End of this level
            frame.remaining = frame.remaining.saturating_sub(1);
            if frame.remaining > 0 {
                frame.cursor = frame.start;
            } else {
                self.frames.pop();
            }
            return Step::Instant;
        };
        frame.cursor += 1;

        log::debug!("{} @{}ms: {}", self.sprite, self.clock_ms, block.text);

        match block.op() {
            BlockOp::WhenFlagClicked | BlockOp::Unknown => Step::Instant,
            BlockOp::Move => {
                self.apply_move(stage, &block);
                pause(settings)
            }
            BlockOp::Turn => {
                let degrees = block.number_input(0, DEFAULT_TURN_DEGREES);
                if let Some(live) = stage.live_mut(&self.sprite) {
                    live.rotation += degrees;
                }
                pause(settings)
            }
            BlockOp::GoTo => {
                let target = Vec2::new(block.number_input(0, 0.0), block.number_input(1, 0.0));
                let position = stage.size.to_screen(target) - Vec2::splat(stage.sprite_size / 2.0);
                if let Some(live) = stage.live_mut(&self.sprite) {
                    live.position = position;
                }
                pause(settings)
            }
            BlockOp::SayFor => {
                let message = block.text_input(0, DEFAULT_SAY_MESSAGE).to_string();
                let secs = block.number_input(1, DEFAULT_SAY_SECS);
                self.say(stage, message, secs)
            }
            BlockOp::SayHello => self.say(stage, DEFAULT_SAY_MESSAGE.to_string(), DEFAULT_SAY_SECS),
            BlockOp::Repeat => {
                let times = block.number_input(0, DEFAULT_REPEAT_TIMES).trunc();
                let times = if times > 0.0 { times.min(u32::MAX as f32) as u32 } else { 0 };
                if let Some(frame) = self.frames.last_mut() {
                    frame.cursor = TAIL_CONSUMED;
                }
                if times > 0 {
                    self.frames.push(Frame {
                        start: index + 1,
                        cursor: index + 1,
                        remaining: times,
                    });
                }
                Step::Instant
            }
        }
    }

    fn apply_move(&self, stage: &mut Stage, block: &BlockInstance) {
        let steps = block.move_steps();
        let Some(live) = stage.live(&self.sprite) else {
            return;
        };
        let target = live.position + heading(live.rotation) * steps;
        let clamped = stage.clamp(target);
        if let Some(live) = stage.live_mut(&self.sprite) {
            live.position = clamped;
        }
    }

    fn say(&self, stage: &mut Stage, message: String, secs: f32) -> Step {
        if let Some(live) = stage.live_mut(&self.sprite) {
            live.message = message;
        }
        Step::Suspend {
            ms: (secs.max(0.0) * 1000.0).round() as u64,
            clear_message: true,
        }
    }
}

fn pause(settings: &Settings) -> Step {
    Step::Suspend {
        ms: settings.step_pause_ms,
        clear_message: false,
    }
}
