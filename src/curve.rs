//! Power-law pointer acceleration.

use crate::config::MotionCurveConfig;

/// Largest magnitude a mapped axis may take.
pub const OUTPUT_LIMIT: i16 = 255;

#[derive(Debug, Clone, Copy)]
pub struct CurveMapper {
    multiplier: f32,
    exponent: f32,
}

impl CurveMapper {
    pub fn new(cfg: &MotionCurveConfig) -> Self {
        Self {
            multiplier: cfg.curve_multiplier,
            exponent: cfg.curve_exponent,
        }
    }

    /// `multiplier * sign(v) * |v|^exponent`, rounded half away from zero
    /// and saturated to `±OUTPUT_LIMIT`.
    pub fn map(&self, v: i16) -> i16 {
        if v == 0 {
            return 0;
        }
        let magnitude = (v as f32).abs().powf(self.exponent);
        let curved = if v > 0 { magnitude } else { -magnitude };
        let limit = OUTPUT_LIMIT as f32;
        (self.multiplier * curved).round().clamp(-limit, limit) as i16
    }

    pub fn map_pair(&self, (dx, dy): (i16, i16)) -> (i16, i16) {
        (self.map(dx), self.map(dy))
    }
}
