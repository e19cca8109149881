//! Raw sample sources standing in for the sensor bus transaction.

use anyhow::{Result, anyhow};
use std::{
    collections::VecDeque,
    fs::File,
    io::{self, BufReader, ErrorKind, Read},
    path::Path,
};
use thiserror::Error;

use crate::sample::{RAW_SAMPLE_LEN, RawSample};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("truncated raw sample: got {got} of 16 bytes")]
    Truncated { got: usize },
}

/// Blocking source of raw sensor frames. `Ok(None)` means the input ended.
pub trait SampleSource: Send {
    fn next_sample(&mut self) -> Result<Option<RawSample>>;
}

/// Reads back-to-back 16-byte records, e.g. a capture file or a pipe.
pub struct CaptureSource<R> {
    reader: R,
}

impl<R: Read + Send> CaptureSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read + Send> SampleSource for CaptureSource<R> {
    fn next_sample(&mut self) -> Result<Option<RawSample>> {
        let mut buf = [0u8; RAW_SAMPLE_LEN];
        let mut filled = 0;
        while filled < RAW_SAMPLE_LEN {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        match filled {
            0 => Ok(None),
            RAW_SAMPLE_LEN => Ok(Some(RawSample(buf))),
            got => Err(SourceError::Truncated { got }.into()),
        }
    }
}

/// In-memory queue of frames.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    queue: VecDeque<RawSample>,
}

impl ScriptedSource {
    pub fn new(samples: impl IntoIterator<Item = RawSample>) -> Self {
        Self {
            queue: samples.into_iter().collect(),
        }
    }
}

impl SampleSource for ScriptedSource {
    fn next_sample(&mut self) -> Result<Option<RawSample>> {
        Ok(self.queue.pop_front())
    }
}

/// `-` selects stdin; anything else is opened as a capture file or device.
pub fn open_source(target: &str) -> Result<Box<dyn SampleSource>> {
    if target == "-" {
        return Ok(Box::new(CaptureSource::new(io::stdin())));
    }
    let path = Path::new(target);
    let file = File::open(path).map_err(|e| anyhow!("failed to open {}: {e}", path.display()))?;
    Ok(Box::new(CaptureSource::new(BufReader::new(file))))
}

/// Reads a whole capture into memory.
pub fn read_all(source: &mut dyn SampleSource) -> Result<Vec<RawSample>> {
    let mut out = Vec::new();
    while let Some(raw) = source.next_sample()? {
        out.push(raw);
    }
    Ok(out)
}
