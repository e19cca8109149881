use log::{debug, trace};

use crate::config::MotionCurveConfig;
use crate::sample::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    LeftClick,
    /// Reserved in the output frame; the classifier never emits it.
    #[allow(dead_code)]
    RightClick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickState {
    #[default]
    Idle,
    Tracking {
        base_x: i16,
        base_y: i16,
        stable_ticks: u16,
    },
}

/// Tap-to-click classifier: finger down, hold still, lift.
///
/// A press only counts if every reading while down stays strictly inside
/// the click radius, and the lift has to be seen on two consecutive polls
/// so a single dropped sample does not end the tap early.
#[derive(Debug)]
pub struct ClickClassifier {
    radius: i16,
    min_ticks: u16,
    max_ticks: u16,
    state: ClickState,
}

impl ClickClassifier {
    pub fn new(cfg: &MotionCurveConfig) -> Self {
        Self {
            radius: cfg.click_deadzone_radius,
            min_ticks: cfg.min_click_ticks,
            max_ticks: cfg.max_click_ticks,
            state: ClickState::Idle,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ClickState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, ClickState::Tracking { .. })
    }

    fn within_radius(&self, v: i16, base: i16) -> bool {
        v == base || (v as i32 - base as i32).abs() < self.radius as i32
    }

    pub fn update(&mut self, current: Point, previous: Point) -> Option<Gesture> {
        match self.state {
            ClickState::Tracking {
                base_x,
                base_y,
                stable_ticks,
            } => match (current, previous) {
                (Point::Valid { x, y }, _) => {
                    if self.within_radius(x, base_x) && self.within_radius(y, base_y) {
                        self.state = ClickState::Tracking {
                            base_x,
                            base_y,
                            stable_ticks: stable_ticks.saturating_add(1),
                        };
                    } else {
                        debug!("tap aborted: moved to ({x}, {y}) from ({base_x}, {base_y})");
                        self.state = ClickState::Idle;
                    }
                    None
                }
                (Point::Absent, Point::Absent) => {
                    self.state = ClickState::Idle;
                    if stable_ticks > self.min_ticks && stable_ticks < self.max_ticks {
                        Some(Gesture::LeftClick)
                    } else {
                        debug!(
                            "tap rejected: {stable_ticks} stable ticks outside ({}, {})",
                            self.min_ticks, self.max_ticks
                        );
                        None
                    }
                }
                // First absent reading; wait for the second before releasing.
                (Point::Absent, Point::Valid { .. }) => None,
            },
            ClickState::Idle => {
                if let (Point::Valid { x, y }, Point::Absent) = (current, previous) {
                    trace!("tap candidate at ({x}, {y})");
                    self.state = ClickState::Tracking {
                        base_x: x,
                        base_y: y,
                        stable_ticks: 0,
                    };
                }
                None
            }
        }
    }
}
