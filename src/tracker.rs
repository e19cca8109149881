//! Poll-side state: the previous reading plus motion and tap tracking.

use log::info;

use crate::config::MotionCurveConfig;
use crate::gestures::{ClickClassifier, Gesture};
use crate::mailbox::SharedState;
use crate::motion::MotionFilter;
use crate::sample::{self, Point, RawSample};

/// What one poll tick saw and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    pub point: Point,
    pub motion: (i16, i16),
    pub gesture: Option<Gesture>,
}

#[derive(Debug)]
pub struct Tracker {
    previous: Point,
    filter: MotionFilter,
    classifier: ClickClassifier,
    pub clicks: u64,
}

impl Tracker {
    pub fn new(cfg: &MotionCurveConfig) -> Self {
        Self {
            previous: Point::Absent,
            filter: MotionFilter::new(cfg),
            classifier: ClickClassifier::new(cfg),
            clicks: 0,
        }
    }

    #[cfg(test)]
    pub fn previous(&self) -> Point {
        self.previous
    }

    #[cfg(test)]
    pub fn classifier(&self) -> &ClickClassifier {
        &self.classifier
    }

    pub fn on_sample(&mut self, raw: &RawSample, shared: &SharedState) -> PollSummary {
        self.on_point(sample::decode(raw), shared)
    }

    pub fn on_point(&mut self, point: Point, shared: &SharedState) -> PollSummary {
        // Hold the pointer still while a tap is being judged.
        let motion = if self.classifier.is_tracking() {
            (0, 0)
        } else {
            self.filter.observe(point, self.previous, &shared.motion)
        };

        let gesture = self.classifier.update(point, self.previous);
        if let Some(Gesture::LeftClick) = gesture {
            // A tap must never also drag.
            shared.motion.clear();
            shared.click.post_left();
            self.clicks += 1;
            info!("left click");
        }

        self.previous = point;
        PollSummary {
            point,
            motion,
            gesture,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> MotionCurveConfig {
        MotionCurveConfig {
            deadzone: 1,
            movement_cap: 10,
            click_deadzone_radius: 20,
            min_click_ticks: 1,
            max_click_ticks: 50,
            ..MotionCurveConfig::default()
        }
    }

    #[test]
    fn previous_lags_by_one_poll() {
        let shared = SharedState::new();
        let mut t = Tracker::new(&cfg());
        assert_eq!(t.previous(), Point::Absent);
        t.on_sample(&RawSample::from_axes(10, 20), &shared);
        assert_eq!(t.previous(), Point::Valid { x: 10, y: 20 });
        t.on_sample(&RawSample::absent(), &shared);
        assert_eq!(t.previous(), Point::Absent);
    }

    #[test]
    fn landing_finger_starts_tap_and_holds_motion() {
        let shared = SharedState::new();
        let mut t = Tracker::new(&cfg());
        t.on_sample(&RawSample::absent(), &shared);
        t.on_sample(&RawSample::from_axes(500, 500), &shared);
        assert!(t.classifier().is_tracking());
        let s = t.on_sample(&RawSample::from_axes(505, 495), &shared);
        assert_eq!(s.motion, (0, 0));
        assert_eq!(shared.motion.peek(), (0, 0));
    }

    #[test]
    fn drag_starts_after_tap_is_abandoned() {
        let shared = SharedState::new();
        let mut t = Tracker::new(&cfg());
        for (x, y) in [(500, 500), (530, 500), (540, 500), (545, 495)] {
            t.on_sample(&RawSample::from_axes(x, y), &shared);
        }
        // Landing, abort at 530, then (540,500) and (545,495) move.
        assert!(!t.classifier().is_tracking());
        assert_eq!(shared.motion.drain(), (9 + 4, 4));
    }

    #[test]
    fn click_discards_motion_and_posts_once() {
        let shared = SharedState::new();
        let mut t = Tracker::new(&cfg());
        shared.motion.deposit(7, 7);
        let seq = [
            RawSample::from_axes(200, 200),
            RawSample::from_axes(201, 200),
            RawSample::from_axes(202, 201),
            RawSample::absent(),
            RawSample::absent(),
        ];
        let gestures: Vec<_> = seq
            .iter()
            .filter_map(|raw| t.on_sample(raw, &shared).gesture)
            .collect();
        assert_eq!(gestures, vec![Gesture::LeftClick]);
        assert_eq!(shared.motion.peek(), (0, 0));
        assert!(shared.click.take_left());
        assert!(!shared.click.take_left());
        assert_eq!(t.clicks, 1);
    }
}
