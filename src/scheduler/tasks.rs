use anyhow::Result;
use log::{debug, error, trace};
use std::sync::Arc;

use crate::actions::FrameSink;
use crate::config::MotionCurveConfig;
use crate::curve::CurveMapper;
use crate::frame::{Buttons, OutputFrame};
use crate::input::SampleSource;
use crate::mailbox::SharedState;
use crate::tracker::{PollSummary, Tracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    Finished,
}

/// A unit of work run once per period, always to completion.
pub trait PeriodicTask: Send {
    fn name(&self) -> &'static str;
    fn tick(&mut self) -> Result<TickFlow>;
}

/// Sensor read, decode, motion filter and tap classification.
pub struct PollTask {
    source: Box<dyn SampleSource>,
    tracker: Tracker,
    shared: Arc<SharedState>,
    pub polls: u64,
}

impl PollTask {
    pub fn new(
        source: Box<dyn SampleSource>,
        cfg: &MotionCurveConfig,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            source,
            tracker: Tracker::new(cfg),
            shared,
            polls: 0,
        }
    }

    pub fn clicks(&self) -> u64 {
        self.tracker.clicks
    }

    /// One poll; `None` once the source has run dry.
    pub fn poll_once(&mut self) -> Result<Option<PollSummary>> {
        let Some(raw) = self.source.next_sample()? else {
            return Ok(None);
        };
        self.polls += 1;
        Ok(Some(self.tracker.on_sample(&raw, &self.shared)))
    }
}

impl PeriodicTask for PollTask {
    fn name(&self) -> &'static str {
        "poll"
    }

    fn tick(&mut self) -> Result<TickFlow> {
        Ok(match self.poll_once()? {
            Some(s) => {
                trace!("poll: {:?} moved {:?} gesture {:?}", s.point, s.motion, s.gesture);
                TickFlow::Continue
            }
            None => {
                debug!("poll: input exhausted after {} samples", self.polls);
                TickFlow::Finished
            }
        })
    }
}

/// Drains pending motion and clicks into exactly one frame per tick.
pub struct OutputTask {
    sink: Box<dyn FrameSink>,
    curve: CurveMapper,
    shared: Arc<SharedState>,
    pub frames: u64,
    pub sink_errors: u64,
}

impl OutputTask {
    pub fn new(sink: Box<dyn FrameSink>, cfg: &MotionCurveConfig, shared: Arc<SharedState>) -> Self {
        Self {
            sink,
            curve: CurveMapper::new(cfg),
            shared,
            frames: 0,
            sink_errors: 0,
        }
    }

    /// Builds this tick's frame. Leaves both mailboxes empty.
    pub fn next_frame(&self) -> OutputFrame {
        let buttons = if self.shared.click.take_left() {
            Buttons::Left
        } else {
            Buttons::None
        };
        let (x, y) = self.curve.map_pair(self.shared.motion.drain());
        OutputFrame::encode(buttons, x, y)
    }

    pub fn emit_once(&mut self) -> OutputFrame {
        let frame = self.next_frame();
        self.frames += 1;
        if !frame.is_heartbeat() {
            debug!("output: {frame:?}");
        }
        // A lost frame is not retried; the next tick carries on.
        if let Err(e) = self.sink.emit(&frame) {
            self.sink_errors += 1;
            error!("frame sink failed: {e}");
        }
        frame
    }
}

impl PeriodicTask for OutputTask {
    fn name(&self) -> &'static str {
        "output"
    }

    fn tick(&mut self) -> Result<TickFlow> {
        self.emit_once();
        Ok(TickFlow::Continue)
    }
}
