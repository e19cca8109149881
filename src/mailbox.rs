//! Single-slot mailboxes shared between the poll and output tasks.
//!
//! The poll task deposits at its own rate and the output task drains at a
//! slower one. Neither side ever blocks.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Pending relative motion, both axes packed into one atomic word so a
/// drain can never observe half of an update.
#[derive(Debug, Default)]
pub struct MotionMailbox {
    packed: AtomicU32,
}

fn pack(dx: i16, dy: i16) -> u32 {
    ((dx as u16 as u32) << 16) | (dy as u16 as u32)
}

fn unpack(word: u32) -> (i16, i16) {
    ((word >> 16) as u16 as i16, word as u16 as i16)
}

impl MotionMailbox {
    pub const fn new() -> Self {
        Self {
            packed: AtomicU32::new(0),
        }
    }

    /// Adds a shaped delta to whatever is still pending. Saturates per axis.
    pub fn deposit(&self, dx: i16, dy: i16) {
        if dx == 0 && dy == 0 {
            return;
        }
        // The closure always returns Some, so this cannot fail.
        let _ = self
            .packed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let (ax, ay) = unpack(word);
                Some(pack(ax.saturating_add(dx), ay.saturating_add(dy)))
            });
    }

    /// Takes all pending motion, leaving the mailbox at zero.
    pub fn drain(&self) -> (i16, i16) {
        unpack(self.packed.swap(0, Ordering::AcqRel))
    }

    /// Drops pending motion without reporting it.
    pub fn clear(&self) {
        self.packed.store(0, Ordering::Release);
    }

    #[cfg(test)]
    pub fn peek(&self) -> (i16, i16) {
        unpack(self.packed.load(Ordering::Acquire))
    }
}

/// One-shot click event: set by the classifier, consumed once by the encoder.
#[derive(Debug, Default)]
pub struct ClickMailbox {
    left: AtomicBool,
}

impl ClickMailbox {
    pub const fn new() -> Self {
        Self {
            left: AtomicBool::new(false),
        }
    }

    pub fn post_left(&self) {
        self.left.store(true, Ordering::Release);
    }

    /// Returns whether a click was pending and clears it in the same step.
    pub fn take_left(&self) -> bool {
        self.left.swap(false, Ordering::AcqRel)
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.left.load(Ordering::Acquire)
    }
}

/// Everything that crosses the poll/output boundary.
#[derive(Debug, Default)]
pub struct SharedState {
    pub motion: MotionMailbox,
    pub click: ClickMailbox,
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            motion: MotionMailbox::new(),
            click: ClickMailbox::new(),
        }
    }
}
