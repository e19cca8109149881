//! The two periodic tasks and how they are driven.
//!
//! The poll task runs at the sensor rate and only ever deposits into the
//! shared mailboxes; the output task runs at the (slower) host rate and is
//! the only one that drains them. Each task lives on its own thread, so a
//! task never overlaps itself while the two may interleave freely.

pub mod runtime;
pub mod tasks;

use anyhow::{Result, anyhow};
use log::{info, warn};
use serde::Serialize;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use crate::actions::FrameSink;
use crate::config::Settings;
use crate::input::SampleSource;
use crate::mailbox::SharedState;
use runtime::run_periodic;
use tasks::{OutputTask, PeriodicTask, PollTask, TickFlow};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub polls: u64,
    pub frames: u64,
    pub clicks: u64,
    pub sink_errors: u64,
    pub missed_poll_ticks: u64,
    pub missed_output_ticks: u64,
}

impl RunReport {
    fn collect(poll: &PollTask, output: &OutputTask) -> Self {
        Self {
            polls: poll.polls,
            frames: output.frames,
            clicks: poll.clicks(),
            sink_errors: output.sink_errors,
            ..Self::default()
        }
    }
}

pub struct DualTaskScheduler {
    poll: PollTask,
    output: OutputTask,
    settings: Arc<Settings>,
}

impl DualTaskScheduler {
    pub fn new(
        settings: Arc<Settings>,
        source: Box<dyn SampleSource>,
        sink: Box<dyn FrameSink>,
    ) -> Self {
        let shared = Arc::new(SharedState::new());
        Self {
            poll: PollTask::new(source, &settings.motion, Arc::clone(&shared)),
            output: OutputTask::new(sink, &settings.motion, shared),
            settings,
        }
    }

    /// Runs both tasks on their own threads until the input ends or `stop`
    /// is raised, then emits one last frame so nothing pending is lost.
    pub fn run(self, stop: Arc<AtomicBool>) -> Result<RunReport> {
        let Self {
            mut poll,
            mut output,
            settings,
        } = self;
        let poll_period = settings.scheduler.poll_period();
        let output_period = settings.scheduler.output_period();
        let output_stop = Arc::new(AtomicBool::new(false));

        info!(
            "scheduler: poll every {poll_period:?}, output every {output_period:?}"
        );

        let poll_handle = thread::Builder::new()
            .name("irpoint-poll".into())
            .spawn(move || {
                let res = run_periodic(&mut poll, poll_period, &stop);
                (poll, res)
            })?;

        let out_stop = Arc::clone(&output_stop);
        let output_handle = thread::Builder::new()
            .name("irpoint-output".into())
            .spawn(move || {
                let res = run_periodic(&mut output, output_period, &out_stop);
                (output, res)
            })?;

        let joined_poll = poll_handle.join();
        output_stop.store(true, Ordering::Release);
        let (mut output, output_res) = output_handle
            .join()
            .map_err(|_| anyhow!("output task panicked"))?;
        let (poll, poll_res) = joined_poll.map_err(|_| anyhow!("poll task panicked"))?;

        output.tick()?;

        let mut report = RunReport::collect(&poll, &output);
        report.missed_poll_ticks = poll_res?;
        report.missed_output_ticks = output_res?;
        if report.missed_poll_ticks > 0 || report.missed_output_ticks > 0 {
            warn!(
                "scheduler: skipped {} poll and {} output ticks",
                report.missed_poll_ticks, report.missed_output_ticks
            );
        }
        info!(
            "scheduler: {} polls, {} frames, {} clicks",
            report.polls, report.frames, report.clicks
        );
        Ok(report)
    }
}

/// Single-threaded, clock-free run: one output tick after every
/// `output_period / poll_period` polls, plus a final flush.
pub fn replay(
    settings: &Settings,
    source: Box<dyn SampleSource>,
    sink: Box<dyn FrameSink>,
) -> Result<RunReport> {
    let shared = Arc::new(SharedState::new());
    let mut poll = PollTask::new(source, &settings.motion, Arc::clone(&shared));
    let mut output = OutputTask::new(sink, &settings.motion, shared);
    let ratio = settings.scheduler.polls_per_output();

    let mut since_output = 0;
    while poll.tick()? == TickFlow::Continue {
        since_output += 1;
        if since_output == ratio {
            output.tick()?;
            since_output = 0;
        }
    }
    output.tick()?;

    Ok(RunReport::collect(&poll, &output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::MemorySink;
    use crate::config::{MotionCurveConfig, SchedulerConfig};
    use crate::frame::{Buttons, OutputFrame};
    use crate::input::ScriptedSource;
    use crate::sample::RawSample;

    fn settings(motion: MotionCurveConfig, poll_period_ms: u64, output_period_ms: u64) -> Settings {
        Settings {
            motion,
            scheduler: SchedulerConfig {
                poll_period_ms,
                output_period_ms,
            },
        }
    }

    fn xy(x: u16, y: u16) -> RawSample {
        RawSample::from_axes(x, y)
    }

    #[test]
    fn replay_reference_scenario() {
        let s = settings(
            MotionCurveConfig {
                deadzone: 1,
                movement_cap: 10,
                curve_multiplier: 1.0,
                curve_exponent: 1.2,
                ..MotionCurveConfig::default()
            },
            10,
            50,
        );
        // The first landing starts a tap; jumping away abandons it, so the
        // (500,500) -> (505,495) step is seen with the classifier idle.
        let samples = [
            xy(470, 500),
            xy(500, 500),
            xy(505, 495),
            RawSample::absent(),
            RawSample::absent(),
        ];
        let sink = MemorySink::default();
        let report = replay(
            &s,
            Box::new(ScriptedSource::new(samples)),
            Box::new(sink.clone()),
        )
        .unwrap();

        // (5, 5) shaped by the deadzone to (4, 4); 4^1.2 = 5.28.
        assert_eq!(
            sink.frames(),
            vec![OutputFrame::encode(Buttons::None, 5, 5), OutputFrame::default()]
        );
        assert_eq!(report.polls, 5);
        assert_eq!(report.frames, 2);
        assert_eq!(report.clicks, 0);
    }

    #[test]
    fn replay_emits_one_frame_per_output_tick_and_one_click() {
        let s = settings(
            MotionCurveConfig {
                min_click_ticks: 1,
                max_click_ticks: 10,
                ..MotionCurveConfig::default()
            },
            10,
            20,
        );
        let samples = [
            RawSample::absent(),
            xy(300, 300),
            xy(301, 300),
            xy(301, 301),
            RawSample::absent(),
            RawSample::absent(),
            RawSample::absent(),
        ];
        let sink = MemorySink::default();
        let report = replay(
            &s,
            Box::new(ScriptedSource::new(samples)),
            Box::new(sink.clone()),
        )
        .unwrap();

        let frames = sink.frames();
        // 7 polls at 2 polls per frame -> 3 ticks, plus the flush.
        assert_eq!(frames.len(), 4);
        assert_eq!(report.clicks, 1);
        let clicks: Vec<_> = frames
            .iter()
            .filter(|f| f.buttons == Buttons::Left)
            .collect();
        assert_eq!(clicks.len(), 1);
        assert!(frames.iter().all(|f| f.x == 0 && f.y == 0));
    }

    #[test]
    fn threaded_run_flushes_everything() {
        let s = Arc::new(settings(
            MotionCurveConfig {
                min_click_ticks: 1,
                max_click_ticks: 10,
                curve_multiplier: 1.0,
                curve_exponent: 1.0,
                ..MotionCurveConfig::default()
            },
            1,
            5,
        ));
        let mut samples = vec![xy(100, 100), xy(130, 100)];
        samples.extend((1..=4).map(|i| xy(130 + 5 * i, 100)));
        // Long enough for the output task to drain the drag before the tap
        // lands and clears whatever is still pending.
        samples.extend(std::iter::repeat_n(RawSample::absent(), 100));
        samples.extend([xy(300, 300), xy(301, 300), xy(301, 300)]);
        samples.extend(std::iter::repeat_n(RawSample::absent(), 3));

        let sink = MemorySink::default();
        let scheduler = DualTaskScheduler::new(
            Arc::clone(&s),
            Box::new(ScriptedSource::new(samples)),
            Box::new(sink.clone()),
        );
        let report = scheduler.run(Arc::new(AtomicBool::new(false))).unwrap();

        let frames = sink.frames();
        assert_eq!(report.polls, 112);
        assert_eq!(report.clicks, 1);
        assert_eq!(report.frames, frames.len() as u64);
        assert_eq!(
            frames.iter().filter(|f| f.buttons == Buttons::Left).count(),
            1
        );
        // Four drag steps of 5 -> 4 after the deadzone; none goes up or down.
        let total_x: i32 = frames.iter().map(|f| f.x as i32).sum();
        assert_eq!(total_x, 16);
        assert!(frames.iter().all(|f| f.y == 0));
    }

    #[test]
    fn raised_stop_ends_the_run_early() {
        let s = Arc::new(settings(MotionCurveConfig::default(), 1, 5));
        let sink = MemorySink::default();
        let scheduler = DualTaskScheduler::new(
            s,
            Box::new(ScriptedSource::new(std::iter::repeat_n(RawSample::absent(), 1000))),
            Box::new(sink.clone()),
        );
        let report = scheduler.run(Arc::new(AtomicBool::new(true))).unwrap();
        assert_eq!(report.polls, 0);
        let frames = sink.frames();
        assert!(!frames.is_empty());
        assert!(frames.iter().all(OutputFrame::is_heartbeat));
    }
}
