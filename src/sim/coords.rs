//! Stage-pixel <-> logical coordinate transform
//!
//! Logical coordinates put the origin at the stage center with y growing
//! upward. Logical values are rounded to whole units; screen values are not.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Current stage dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StageSize {
    pub width: f32,
    pub height: f32,
}

impl StageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.extent() / 2.0
    }

    /// Screen pixel -> logical
    pub fn to_logical(&self, screen: Vec2) -> Vec2 {
        let c = self.center();
        Vec2::new((screen.x - c.x).round(), (-(screen.y - c.y)).round())
    }

    /// Logical -> screen pixel
    pub fn to_screen(&self, logical: Vec2) -> Vec2 {
        let c = self.center();
        Vec2::new(logical.x + c.x, c.y - logical.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_center_is_origin() {
        let stage = StageSize::new(480.0, 360.0);
        assert_eq!(stage.to_logical(Vec2::new(240.0, 180.0)), Vec2::ZERO);
        assert_eq!(stage.to_screen(Vec2::ZERO), Vec2::new(240.0, 180.0));
    }

    #[test]
    fn test_y_axis_points_up() {
        let stage = StageSize::new(480.0, 360.0);
        assert_eq!(stage.to_logical(Vec2::new(250.0, 100.0)), Vec2::new(10.0, 80.0));
        assert_eq!(stage.to_screen(Vec2::new(10.0, 80.0)), Vec2::new(250.0, 100.0));
    }

    #[test]
    fn test_before_layout() {
        let stage = StageSize::default();
        assert_eq!(stage.to_screen(Vec2::new(5.0, 5.0)), Vec2::new(5.0, -5.0));
    }

    proptest! {
        #[test]
        fn prop_round_trip(w in 0u32..2000, h in 0u32..2000, fx in 0.0f32..=1.0, fy in 0.0f32..=1.0) {
            let stage = StageSize::new(w as f32, h as f32);
            let p = Vec2::new((fx * w as f32).floor(), (fy * h as f32).floor());
            let back = stage.to_screen(stage.to_logical(p));
            // Odd dimensions put the center on a half pixel
            prop_assert!((back.x - p.x).abs() <= 0.5);
            prop_assert!((back.y - p.y).abs() <= 0.5);
        }
    }
}
