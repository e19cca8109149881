//! Frame sinks standing in for the serial transport to the host receiver.

use anyhow::{Result, anyhow};
use log::info;
use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
};

use crate::frame::{Buttons, OutputFrame};

pub trait FrameSink: Send {
    fn emit(&mut self, frame: &OutputFrame) -> Result<()>;
}

/// Writes raw 9-byte frames: a serial tty, a file, or stdout.
pub struct WriterSink<W> {
    out: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> FrameSink for WriterSink<W> {
    fn emit(&mut self, frame: &OutputFrame) -> Result<()> {
        self.out.write_all(&frame.to_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// One JSON object per frame, for eyeballing replays.
pub struct JsonLinesSink<W> {
    out: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> FrameSink for JsonLinesSink<W> {
    fn emit(&mut self, frame: &OutputFrame) -> Result<()> {
        let line = serde_json::to_string(frame)?;
        writeln!(self.out, "{line}")?;
        Ok(())
    }
}

/// Acts as the host receiver directly: a virtual relative pointer.
/// Off Linux there is no device and every frame is dropped.
pub struct UinputSink {
    #[cfg(target_os = "linux")]
    linux: Box<LinuxUinput>,
}

impl UinputSink {
    #[cfg(target_os = "linux")]
    pub fn new() -> Result<Self> {
        Ok(Self {
            linux: Box::new(LinuxUinput::create()?),
        })
    }

    #[cfg(not(target_os = "linux"))]
    pub fn new() -> Result<Self> {
        log::warn!("uinput not available; running in NO-OP mode");
        Ok(Self {})
    }
}

impl FrameSink for UinputSink {
    #[cfg(target_os = "linux")]
    fn emit(&mut self, frame: &OutputFrame) -> Result<()> {
        self.linux.apply(frame)
    }

    #[cfg(not(target_os = "linux"))]
    fn emit(&mut self, _frame: &OutputFrame) -> Result<()> {
        Ok(())
    }
}

#[cfg(target_os = "linux")]
struct LinuxUinput {
    dev: uinput::device::Device,
}

#[cfg(target_os = "linux")]
impl LinuxUinput {
    fn create() -> Result<Self> {
        use uinput::event::{controller::Mouse, relative};

        let dev = uinput::default()?
            .name("irpoint virtual pointer")?
            .event(relative::Position::X)?
            .event(relative::Position::Y)?
            .event(Mouse::Left)?
            .event(Mouse::Right)?
            .create()?;

        info!("uinput: created virtual device");
        Ok(Self { dev })
    }

    fn apply(&mut self, frame: &OutputFrame) -> Result<()> {
        use uinput::event::{controller::Mouse, relative::Position};

        if frame.x != 0 || frame.y != 0 {
            self.dev.send(Position::X, frame.x as i32)?;
            self.dev.send(Position::Y, frame.y as i32)?;
            self.dev.synchronize()?;
        }

        let button = match frame.buttons {
            Buttons::None => return Ok(()),
            Buttons::Left => Mouse::Left,
            Buttons::Right => Mouse::Right,
        };
        self.dev.send(button, 1)?;
        self.dev.synchronize()?;
        self.dev.send(button, 0)?;
        self.dev.synchronize()?;
        Ok(())
    }
}

/// `-` is stdout, `uinput` the virtual pointer, anything else a path
/// (typically a serial tty) opened for writing. A regular file is
/// truncated so it only ever holds this run's frames.
pub fn open_sink(target: &str) -> Result<Box<dyn FrameSink>> {
    match target {
        "-" => Ok(Box::new(WriterSink::new(io::stdout()))),
        "uinput" => Ok(Box::new(UinputSink::new()?)),
        path => {
            let path = Path::new(path);
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .map_err(|e| anyhow!("failed to open {}: {e}", path.display()))?;
            info!("emitting frames to {}", path.display());
            Ok(Box::new(WriterSink::new(file)))
        }
    }
}

/// Shared in-memory sink; clones see the same frames.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemorySink {
    frames: std::sync::Arc<std::sync::Mutex<Vec<OutputFrame>>>,
}

#[cfg(test)]
impl MemorySink {
    pub fn frames(&self) -> Vec<OutputFrame> {
        self.frames.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl FrameSink for MemorySink {
    fn emit(&mut self, frame: &OutputFrame) -> Result<()> {
        self.frames.lock().unwrap().push(*frame);
        Ok(())
    }
}
