//! IMAP command tag generator.
//!
//! Tags are used to match commands with their responses.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::types::Tag;

/// Counter value at which the generator wraps back to zero.
pub const TAG_WRAP: u32 = 0x10000;

/// Tag generator for IMAP commands.
///
/// Generates four hex digit tags: "0001", "0002", ... "ffff", "0000", "0001".
/// Tags only correlate responses; they are not meant to be unpredictable.
#[derive(Debug, Default)]
pub struct TagGenerator {
    counter: AtomicU32,
}

impl TagGenerator {
    /// Creates a new tag generator starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: AtomicU32::new(0),
        }
    }

    /// Generates the next tag.
    pub fn next(&self) -> Tag {
        let previous = self
            .counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some((n + 1) % TAG_WRAP))
            .unwrap_or_default();
        Tag::new(format!("{:04x}", (previous + 1) % TAG_WRAP))
    }

    /// Returns the current counter value without incrementing.
    #[must_use]
    pub fn current(&self) -> u32 {
        self.counter.load(Ordering::Relaxed)
    }
}
