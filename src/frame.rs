//! Fixed 9-byte pointer command understood by the host receiver.
//!
//! ```text
//! 0xFD 0x00 0x03 <buttons> <x> <y> 0x00 0x00 0x00
//! ```
//! `x` and `y` are two's-complement signed bytes.

use serde::Serialize;

pub const FRAME_LEN: usize = 9;
const HEADER: [u8; 3] = [0xFD, 0x00, 0x03];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Buttons {
    #[default]
    None,
    Left,
    /// Reserved; nothing produces it yet.
    #[allow(dead_code)]
    Right,
}

impl Buttons {
    pub fn code(self) -> u8 {
        match self {
            Buttons::None => 0x00,
            Buttons::Left => 0x01,
            Buttons::Right => 0x02,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutputFrame {
    pub buttons: Buttons,
    pub x: i8,
    pub y: i8,
}

fn saturate(v: i16) -> i8 {
    v.clamp(i8::MIN as i16, i8::MAX as i16) as i8
}

impl OutputFrame {
    /// Builds a frame from mapped axes, saturating them to the byte range.
    pub fn encode(buttons: Buttons, x: i16, y: i16) -> Self {
        Self {
            buttons,
            x: saturate(x),
            y: saturate(y),
        }
    }

    pub fn is_heartbeat(&self) -> bool {
        *self == Self::default()
    }

    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        [
            HEADER[0],
            HEADER[1],
            HEADER[2],
            self.buttons.code(),
            self.x as u8,
            self.y as u8,
            0x00,
            0x00,
            0x00,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_layout() {
        let f = OutputFrame::default();
        assert!(f.is_heartbeat());
        assert_eq!(f.to_bytes(), [0xFD, 0x00, 0x03, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn click_and_motion_layout() {
        let f = OutputFrame::encode(Buttons::Left, 5, -3);
        assert_eq!(f.to_bytes(), [0xFD, 0x00, 0x03, 0x01, 0x05, 0xFD, 0, 0, 0]);
        assert_eq!(Buttons::Right.code(), 0x02);
    }

    #[test]
    fn saturates_instead_of_wrapping() {
        let f = OutputFrame::encode(Buttons::None, 255, -255);
        assert_eq!((f.x, f.y), (127, -128));
        let bytes = f.to_bytes();
        assert_eq!((bytes[4], bytes[5]), (0x7F, 0x80));
    }

    #[test]
    fn serializes_for_inspection() {
        let f = OutputFrame::encode(Buttons::Left, 1, -1);
        let v = serde_json::to_value(f).unwrap();
        assert_eq!(v, serde_json::json!({"buttons": "left", "x": 1, "y": -1}));
    }
}
