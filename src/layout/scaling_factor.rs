use crate::model::pos::Pos;

use super::object::OsuObject;

const BROKEN_GAMEFIELD_ROUNDING_ALLOWANCE: f32 = 1.00041;

/// Fields around the scaling of hit objects.
///
/// All objects of a chart share the same scaling so it is stored only once.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScalingFactor {
    pub scale: f32,
    pub radius: f64,
}

impl ScalingFactor {
    /// Radius multiple within which a held cursor tracks the slider ball.
    const FOLLOW_RADIUS_FACTOR: f64 = 2.4;

    pub fn new(cs: f64) -> Self {
        let scale = (f64::from(1.0_f32) - f64::from(0.7_f32) * ((cs - 5.0) / 5.0)) as f32 / 2.0
            * BROKEN_GAMEFIELD_ROUNDING_ALLOWANCE;

        let radius = f64::from(OsuObject::OBJECT_RADIUS * scale);

        Self { scale, radius }
    }

    pub fn stack_offset(&self, stack_height: i32) -> Pos {
        let stack_offset = stack_height as f32 * self.scale * -6.4;

        Pos::new(stack_offset, stack_offset)
    }

    pub fn follow_radius(&self) -> f64 {
        self.radius * Self::FOLLOW_RADIUS_FACTOR
    }
}
