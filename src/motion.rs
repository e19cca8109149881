//! Frame-to-frame motion shaping.

use crate::config::MotionCurveConfig;
use crate::mailbox::MotionMailbox;
use crate::sample::Point;

#[derive(Debug, Clone, Copy)]
pub struct MotionFilter {
    deadzone: i16,
    cap: i16,
}

impl MotionFilter {
    pub fn new(cfg: &MotionCurveConfig) -> Self {
        Self {
            deadzone: cfg.deadzone,
            cap: cfg.movement_cap,
        }
    }

    /// Clamp to the movement cap first, then subtract the deadzone from
    /// whatever survives. A capped spike is never deadzone-reduced.
    pub fn shape(&self, delta: i16) -> i16 {
        if delta < -self.cap {
            -self.cap
        } else if delta > self.cap {
            self.cap
        } else if delta > self.deadzone {
            delta - self.deadzone
        } else if delta < -self.deadzone {
            delta + self.deadzone
        } else {
            0
        }
    }

    /// Shaped `(dx, dy)` between two polls, or `None` unless a finger was
    /// present on both. The y axis is inverted to screen convention.
    pub fn delta(&self, current: Point, previous: Point) -> Option<(i16, i16)> {
        let (cx, cy) = current.coords()?;
        let (px, py) = previous.coords()?;
        let dx = cx.saturating_sub(px);
        let dy = py.saturating_sub(cy);
        Some((self.shape(dx), self.shape(dy)))
    }

    /// Adds this tick's motion to the pending total. Returns what was added.
    pub fn observe(&self, current: Point, previous: Point, acc: &MotionMailbox) -> (i16, i16) {
        match self.delta(current, previous) {
            Some((dx, dy)) => {
                acc.deposit(dx, dy);
                (dx, dy)
            }
            None => (0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(deadzone: i16, cap: i16) -> MotionFilter {
        MotionFilter::new(&MotionCurveConfig {
            deadzone,
            movement_cap: cap,
            ..MotionCurveConfig::default()
        })
    }

    fn at(x: i16, y: i16) -> Point {
        Point::Valid { x, y }
    }

    #[test]
    fn deadzone_edges() {
        let f = filter(1, 10);
        assert_eq!(f.shape(0), 0);
        assert_eq!(f.shape(1), 0);
        assert_eq!(f.shape(-1), 0);
        assert_eq!(f.shape(2), 1);
        assert_eq!(f.shape(-2), -1);

        let wide = filter(3, 10);
        assert_eq!(wide.shape(3), 0);
        assert_eq!(wide.shape(4), 1);
    }

    #[test]
    fn cap_wins_over_deadzone() {
        let f = filter(1, 10);
        assert_eq!(f.shape(10), 9);
        assert_eq!(f.shape(11), 10);
        assert_eq!(f.shape(-11), -10);
        assert_eq!(f.shape(500), 10);
        assert_eq!(f.shape(i16::MIN), -10);
    }

    #[test]
    fn shaped_magnitude_never_exceeds_cap() {
        let f = filter(2, 7);
        for d in -1022..=1022 {
            assert!(f.shape(d).abs() <= 7, "delta {d}");
        }
    }

    #[test]
    fn y_axis_is_inverted() {
        let f = filter(1, 10);
        assert_eq!(f.delta(at(505, 495), at(500, 500)), Some((4, 4)));
        assert_eq!(f.delta(at(495, 505), at(500, 500)), Some((-4, -4)));
    }

    #[test]
    fn needs_a_finger_on_both_polls() {
        let f = filter(1, 10);
        assert_eq!(f.delta(at(5, 5), Point::Absent), None);
        assert_eq!(f.delta(Point::Absent, at(5, 5)), None);
        assert_eq!(f.delta(Point::Absent, Point::Absent), None);
    }

    #[test]
    fn observe_accumulates() {
        let f = filter(1, 10);
        let acc = MotionMailbox::new();
        f.observe(at(505, 495), at(500, 500), &acc);
        f.observe(at(508, 495), at(505, 495), &acc);
        f.observe(Point::Absent, at(508, 495), &acc);
        assert_eq!(acc.drain(), (6, 4));
    }
}
