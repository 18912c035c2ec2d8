// SPDX-License-Identifier: MIT

//! Wraparound-correcting quadrature encoder position tracking.
//!
//! Hardware timers in encoder mode expose a bounded counter that wraps at
//! the auto-reload period. [`PositionTracker`] samples that counter through
//! [`RawCounter`](crate::hal::RawCounter) and accumulates an unbounded
//! signed position: each delta is folded into `(-modulus/2, modulus/2]`
//! before it is added, so a single overflow or underflow between samples is
//! corrected and no drift accumulates.

use crate::hal::{Encoder, RawCounter};

/// Cumulative position tracker over a bounded hardware counter.
///
/// Sampling must outrun the mechanism: if the counter moves half its wrap
/// period or more between two `read` calls, the correction picks the wrong
/// direction. The encoder tasks run at the highest priority for exactly this
/// reason.
pub struct PositionTracker<C: RawCounter> {
    counter: C,
    position: i32,
    last_count: u32,
}

impl<C: RawCounter> PositionTracker<C> {
    /// Start tracking from the counter's current value, at position zero.
    pub fn new(counter: C) -> Self {
        let last_count = counter.count();
        Self {
            counter,
            position: 0,
            last_count,
        }
    }

    /// Cumulative position from the most recent [`read`](Encoder::read),
    /// without sampling the hardware again.
    #[inline]
    pub fn position(&self) -> i32 {
        self.position
    }
}

impl<C: RawCounter> Encoder for PositionTracker<C> {
    fn read(&mut self) -> i32 {
        let period = self.counter.modulus() as i64;
        let current = self.counter.count();

        let mut delta = current as i64 - self.last_count as i64;
        if delta >= period / 2 {
            delta -= period;
        } else if delta <= -period / 2 {
            delta += period;
        }
        self.last_count = current;

        self.position = self.position.wrapping_add(delta as i32);
        self.position
    }

    fn set_position(&mut self, ticks: i32) {
        self.position = ticks;
    }
}
