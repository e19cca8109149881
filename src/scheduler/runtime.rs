use anyhow::Result;
use log::debug;
use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};

use super::tasks::{PeriodicTask, TickFlow};

/// Runs `task` every `period` on the calling thread until it finishes,
/// fails, or `stop` is raised. Deadlines are absolute. A tick that is
/// merely late runs at once and the schedule carries on; deadlines that
/// passed entirely during an overrun are skipped, never replayed back to
/// back. Returns the number of skipped ticks.
pub fn run_periodic(task: &mut dyn PeriodicTask, period: Duration, stop: &AtomicBool) -> Result<u64> {
    let mut next = Instant::now();
    let mut missed = 0u64;

    while !stop.load(Ordering::Acquire) {
        if task.tick()? == TickFlow::Finished {
            break;
        }

        next += period;
        let now = Instant::now();
        if now < next {
            thread::sleep(next - now);
        } else {
            // `next` is late but still runs now; only whole periods past it are lost.
            let skip = ((now - next).as_nanos() / period.as_nanos().max(1)) as u32;
            if skip > 0 {
                next += period * skip;
                missed += skip as u64;
                debug!("{}: overran its period, skipping {skip} tick(s)", task.name());
            }
        }
    }
    Ok(missed)
}
