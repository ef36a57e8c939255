//! Sprite-sprite collision monitor
//!
//! Polled while playing. Sprites are 60x60 boxes compared by distance between
//! their top-left corners, which for equal boxes is the center distance. A
//! collision rewrites the programs of both sprites instead of moving them:
//! differing Move steps are swapped, or a lone mover hands its steps over.

use std::collections::HashMap;

use super::state::{SpriteId, Stage};
use crate::blocks::MOVE_STEPS;
use crate::settings::Settings;

/// What a collision did to the programs
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionOutcome {
    /// Both sprites move; their first Move steps were exchanged
    Swap {
        a: SpriteId,
        b: SpriteId,
        a_steps: f32,
        b_steps: f32,
    },
    /// `from` stopped and `to` received a new Move block with its steps
    Transfer {
        from: SpriteId,
        to: SpriteId,
        steps: f32,
        block_id: String,
    },
}

/// Unordered pair key
fn pair_key(a: &SpriteId, b: &SpriteId) -> (SpriteId, SpriteId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollisionMonitor {
    /// Last mutation time per pair
    cooldowns: HashMap<(SpriteId, SpriteId), u64>,
}

impl CollisionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every cooldown (on stop)
    pub fn reset(&mut self) {
        self.cooldowns.clear();
    }

    /// Whether the pair mutated within the cooldown window
    pub fn in_cooldown(&self, a: &SpriteId, b: &SpriteId, now_ms: u64, settings: &Settings) -> bool {
        self.cooldowns
            .get(&pair_key(a, b))
            .is_some_and(|&last| now_ms.saturating_sub(last) < settings.collision_cooldown_ms)
    }

    /// Check every unordered pair once and apply collision mutations.
    ///
    /// A pass holds `&mut Stage` from the first pair to the last, so no other
    /// pass or interpreter step can observe a half-applied swap.
    pub fn tick(&mut self, stage: &mut Stage, now_ms: u64, settings: &Settings) -> Vec<CollisionOutcome> {
        let ids: Vec<SpriteId> = stage.sprites().iter().map(|s| s.id.clone()).collect();
        let mut outcomes = Vec::new();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                if self.in_cooldown(a, b, now_ms, settings) {
                    continue;
                }
                let (Some(la), Some(lb)) = (stage.live(a), stage.live(b)) else {
                    continue;
                };
                if la.position.distance(lb.position) > settings.collision_distance {
                    continue;
                }
                if let Some(outcome) = resolve(stage, a, b) {
                    self.cooldowns.insert(pair_key(a, b), now_ms);
                    outcomes.push(outcome);
                }
            }
        }
        outcomes
    }
}

/// Rewrite the programs of a colliding pair
fn resolve(stage: &mut Stage, a: &SpriteId, b: &SpriteId) -> Option<CollisionOutcome> {
    let steps_a = stage.programs.first_move(a).map(|m| m.move_steps());
    let steps_b = stage.programs.first_move(b).map(|m| m.move_steps());

    match (steps_a, steps_b) {
        (Some(sa), Some(sb)) if sa != sb => {
            stage.programs.first_move_mut(a)?.set_number(0, sb);
            stage.programs.first_move_mut(b)?.set_number(0, sa);
            log::info!("Collision: swapping steps between {} and {}", a, b);
            Some(CollisionOutcome::Swap {
                a: a.clone(),
                b: b.clone(),
                a_steps: sb,
                b_steps: sa,
            })
        }
        (Some(sa), None) if sa != 0.0 => transfer(stage, a, b, sa),
        (None, Some(sb)) if sb != 0.0 => transfer(stage, b, a, sb),
        _ => None,
    }
}

fn transfer(stage: &mut Stage, from: &SpriteId, to: &SpriteId, steps: f32) -> Option<CollisionOutcome> {
    stage.programs.first_move_mut(from)?.set_number(0, 0.0);

    let block_id = stage.programs.next_block_id();
    let mut block = MOVE_STEPS.instantiate(block_id.clone());
    block.set_number(0, steps);
    stage.programs.push(to, block);

    log::info!("Collision: transferring {} steps from {} to {}", steps, from, to);
    Some(CollisionOutcome::Transfer {
        from: from.clone(),
        to: to.clone(),
        steps,
        block_id,
    })
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::blocks::{BlockInstance, TURN_DEGREES, WHEN_CLICKED};
    use crate::sim::state::SpriteAsset;

    fn mover(id: &str, steps: Option<&str>) -> BlockInstance {
        let mut block = MOVE_STEPS.instantiate(id);
        if let Some(steps) = steps {
            block.inputs.insert(0, steps.to_string());
        }
        block
    }

    /// Two sprites `gap` pixels apart horizontally
    fn pair(gap: f32) -> (Stage, SpriteId, SpriteId) {
        let settings = Settings::default();
        let mut stage = Stage::new(settings.stage_size(), settings.sprite_size);
        let a = stage.add_sprite(SpriteAsset::Cat);
        let b = stage.add_sprite(SpriteAsset::Ball);
        stage.drag_to(&a, Vec2::new(100.0, 100.0)).unwrap();
        stage.drag_to(&b, Vec2::new(100.0 + gap, 100.0)).unwrap();
        (stage, a, b)
    }

    fn steps(stage: &Stage, id: &SpriteId) -> Option<String> {
        stage.programs.first_move(id).and_then(|m| m.inputs.get(&0).cloned())
    }

    #[test]
    fn test_swap_then_cooldown() {
        let settings = Settings::default();
        let (mut stage, a, b) = pair(40.0);
        stage.programs.set(&a, vec![WHEN_CLICKED.instantiate("e1"), mover("m1", Some("10"))]).unwrap();
        stage.programs.set(&b, vec![WHEN_CLICKED.instantiate("e2"), mover("m2", Some("20"))]).unwrap();

        let mut monitor = CollisionMonitor::new();
        let outcomes = monitor.tick(&mut stage, 1000, &settings);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(steps(&stage, &a).as_deref(), Some("20"));
        assert_eq!(steps(&stage, &b).as_deref(), Some("10"));
        assert!(monitor.in_cooldown(&b, &a, 1000, &settings));

        // Still touching inside the window: no swap back
        assert!(monitor.tick(&mut stage, 1450, &settings).is_empty());
        assert_eq!(steps(&stage, &a).as_deref(), Some("20"));

        // Window elapsed
        assert_eq!(monitor.tick(&mut stage, 1500, &settings).len(), 1);
        assert_eq!(steps(&stage, &a).as_deref(), Some("10"));
    }

    #[test]
    fn test_equal_steps_no_cooldown() {
        let settings = Settings::default();
        let (mut stage, a, b) = pair(10.0);
        stage.programs.set(&a, vec![mover("m1", None)]).unwrap();
        stage.programs.set(&b, vec![mover("m2", Some("10"))]).unwrap();

        let mut monitor = CollisionMonitor::new();
        assert!(monitor.tick(&mut stage, 0, &settings).is_empty());
        assert!(!monitor.in_cooldown(&a, &b, 0, &settings));
    }

    #[test]
    fn test_momentum_transfer() {
        let settings = Settings::default();
        let (mut stage, a, b) = pair(60.0);
        stage.programs.set(&a, vec![mover("m1", Some("15"))]).unwrap();
        stage.programs.set(&b, vec![TURN_DEGREES.instantiate("t1")]).unwrap();

        let mut monitor = CollisionMonitor::new();
        let outcomes = monitor.tick(&mut stage, 0, &settings);
        assert!(matches!(
            &outcomes[..],
            [CollisionOutcome::Transfer { from, to, steps, .. }] if from == &a && to == &b && *steps == 15.0
        ));
        assert_eq!(steps(&stage, &a).as_deref(), Some("0"));

        let program_b = stage.programs.get(&b);
        assert_eq!(program_b.len(), 2);
        assert_eq!(program_b[1].text, "Move ___ steps");
        assert_eq!(program_b[1].inputs[&0], "15");
    }

    #[test]
    fn test_transfer_from_second_sprite() {
        let settings = Settings::default();
        let (mut stage, a, b) = pair(30.0);
        stage.programs.set(&b, vec![mover("m2", None)]).unwrap();

        let mut monitor = CollisionMonitor::new();
        monitor.tick(&mut stage, 0, &settings);
        assert_eq!(steps(&stage, &b).as_deref(), Some("0"));
        assert_eq!(steps(&stage, &a).as_deref(), Some("10"));
    }

    #[test]
    fn test_stopped_mover_transfers_nothing() {
        let settings = Settings::default();
        let (mut stage, a, b) = pair(30.0);
        stage.programs.set(&a, vec![mover("m1", Some("0"))]).unwrap();

        let mut monitor = CollisionMonitor::new();
        assert!(monitor.tick(&mut stage, 0, &settings).is_empty());
        assert!(stage.programs.get(&b).is_empty());
    }

    #[test]
    fn test_out_of_range() {
        let settings = Settings::default();
        let (mut stage, a, b) = pair(61.0);
        stage.programs.set(&a, vec![mover("m1", Some("10"))]).unwrap();
        stage.programs.set(&b, vec![mover("m2", Some("20"))]).unwrap();

        let mut monitor = CollisionMonitor::new();
        assert!(monitor.tick(&mut stage, 0, &settings).is_empty());
    }

    #[test]
    fn test_pass_sees_its_own_mutations() {
        let settings = Settings::default();
        let (mut stage, a, b) = pair(20.0);
        let c = stage.add_sprite(SpriteAsset::Rocket);
        stage.drag_to(&c, Vec2::new(140.0, 100.0)).unwrap();
        stage.programs.set(&a, vec![mover("m1", Some("10"))]).unwrap();
        stage.programs.set(&b, vec![mover("m2", Some("20"))]).unwrap();
        stage.programs.set(&c, vec![mover("m3", Some("30"))]).unwrap();

        // (a, b), then (a, c), then (b, c), each reading the previous swap
        let mut monitor = CollisionMonitor::new();
        assert_eq!(monitor.tick(&mut stage, 0, &settings).len(), 3);
        assert_eq!(steps(&stage, &a).as_deref(), Some("30"));
        assert_eq!(steps(&stage, &b).as_deref(), Some("20"));
        assert_eq!(steps(&stage, &c).as_deref(), Some("10"));
    }

    #[test]
    fn test_reset_clears_cooldowns() {
        let settings = Settings::default();
        let (mut stage, a, b) = pair(0.0);
        stage.programs.set(&a, vec![mover("m1", Some("1"))]).unwrap();
        stage.programs.set(&b, vec![mover("m2", Some("2"))]).unwrap();

        let mut monitor = CollisionMonitor::new();
        monitor.tick(&mut stage, 0, &settings);
        monitor.reset();
        assert!(!monitor.in_cooldown(&a, &b, 0, &settings));
        assert_eq!(monitor.tick(&mut stage, 0, &settings).len(), 1);
    }
}
