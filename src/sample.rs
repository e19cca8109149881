//! Raw sensor frames and single-point decoding.
//!
//! The sensor reports up to four IR blobs per transaction; only the first
//! one (bytes 1..=3) is consumed. Each axis is 10 bits wide: an 8-bit base
//! byte plus two high bits packed into the shared status byte.

use log::warn;

pub const RAW_SAMPLE_LEN: usize = 16;

/// Axis value the sensor reports when nothing is detected.
pub const ABSENT_AXIS: u16 = 1023;

const X_HIGH_MASK: u8 = 0x30;
const Y_HIGH_MASK: u8 = 0xC0;

/// One 16-byte sensor transaction, as fetched from the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample(pub [u8; RAW_SAMPLE_LEN]);

impl RawSample {
    /// A frame reporting no blob at all.
    #[cfg(test)]
    pub const fn absent() -> Self {
        let mut bytes = [0xFF; RAW_SAMPLE_LEN];
        bytes[0] = 0x00;
        Self(bytes)
    }

    /// Builds the frame a sensor would send for a single blob at `(x, y)`.
    /// Values above the 10-bit range are truncated to it.
    #[cfg(test)]
    pub fn from_axes(x: u16, y: u16) -> Self {
        let mut bytes = Self::absent().0;
        let x = x & ABSENT_AXIS;
        let y = y & ABSENT_AXIS;
        bytes[1] = (x & 0xFF) as u8;
        bytes[2] = (y & 0xFF) as u8;
        bytes[3] = (((x >> 8) as u8) << 4) | (((y >> 8) as u8) << 6);
        Self(bytes)
    }

    pub fn x_low(&self) -> u8 {
        self.0[1]
    }

    pub fn y_low(&self) -> u8 {
        self.0[2]
    }

    pub fn status(&self) -> u8 {
        self.0[3]
    }
}

/// A decoded blob position, or the absence of one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Point {
    #[default]
    Absent,
    Valid { x: i16, y: i16 },
}

impl Point {
    /// Folds two decoded axes into a point. A frame where only one axis
    /// carries the sentinel is a decode fault and is treated as absent.
    pub fn from_axes(x: u16, y: u16) -> Self {
        match (x >= ABSENT_AXIS, y >= ABSENT_AXIS) {
            (false, false) => Point::Valid {
                x: x as i16,
                y: y as i16,
            },
            (true, true) => Point::Absent,
            _ => {
                warn!("mixed sensor reading x={x} y={y}; treating as absent");
                Point::Absent
            }
        }
    }

    pub fn coords(&self) -> Option<(i16, i16)> {
        match *self {
            Point::Valid { x, y } => Some((x, y)),
            Point::Absent => None,
        }
    }
}

/// Raw 10-bit axes of the first blob, before sentinel interpretation.
pub fn decode_axes(raw: &RawSample) -> (u16, u16) {
    let s = raw.status();
    let x = raw.x_low() as u16 + (((s & X_HIGH_MASK) as u16) << 4);
    let y = raw.y_low() as u16 + (((s & Y_HIGH_MASK) as u16) << 2);
    (x, y)
}

pub fn decode(raw: &RawSample) -> Point {
    let (x, y) = decode_axes(raw);
    Point::from_axes(x, y)
}
