use glam::Vec2;
use parallax::Viewpoint;

/// Fraction of the distance to the target covered per frame at sensitivity 1.
const FOLLOW_RATE: f32 = 0.1;
/// Pointer-to-viewpoint gain at sensitivity 1.
const POINTER_GAIN: f32 = 0.015;
/// Largest viewpoint component at sensitivity 1.
const VIEWPOINT_LIMIT: f32 = 0.008;

/// Eases a pointer towards its target and turns it into a bounded viewpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSmoother {
    position: Vec2,
    sensitivity: f32,
}

impl PointerSmoother {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            sensitivity,
        }
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn reset(&mut self) {
        self.position = Vec2::ZERO;
    }

    pub fn step(&mut self, target: Vec2) -> Viewpoint {
        let k = self.sensitivity;
        let rate = FOLLOW_RATE * k;
        self.position = target * rate + self.position * (1.0 - rate);

        let limit = VIEWPOINT_LIMIT * k.abs();
        let scaled = self.position * (POINTER_GAIN * k);
        Viewpoint(scaled.clamp(Vec2::splat(-limit), Vec2::splat(limit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_moves_a_tenth_of_the_way() {
        let mut smoother = PointerSmoother::new(1.0);
        let viewpoint = smoother.step(Vec2::new(0.4, -0.2));
        assert!((smoother.position() - Vec2::new(0.04, -0.02)).length() < 1e-6);
        assert!((viewpoint.0 - Vec2::new(0.0006, -0.0003)).length() < 1e-7);
    }

    #[test]
    fn output_is_clamped_by_sensitivity() {
        let mut smoother = PointerSmoother::new(2.0);
        let mut viewpoint = Viewpoint::ZERO;
        for _ in 0..200 {
            viewpoint = smoother.step(Vec2::new(10.0, -10.0));
        }
        assert!((viewpoint.0.x - 0.016).abs() < 1e-6);
        assert!((viewpoint.0.y + 0.016).abs() < 1e-6);
    }

    #[test]
    fn converges_to_target() {
        let mut smoother = PointerSmoother::new(1.0);
        for _ in 0..500 {
            smoother.step(Vec2::new(0.3, 0.1));
        }
        assert!((smoother.position() - Vec2::new(0.3, 0.1)).length() < 1e-4);
    }
}
