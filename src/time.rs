// SPDX-License-Identifier: MIT

//! Monotonic millisecond time arithmetic.
//!
//! The clock source is a free-running 32-bit millisecond counter that wraps
//! roughly every 49.7 days. All elapsed-time math in the crate goes through
//! [`ticks_diff`], which is modulo-correct across the wrap, never a naive
//! subtraction.

/// Monotonic millisecond clock collaborator.
///
/// Implementations wrap a hardware tick source (SysTick, a free-running
/// timer). Wrapping of the 32-bit count is expected and handled by callers
/// via [`ticks_diff`].
pub trait Clock {
    /// Current monotonic time in milliseconds, wrapping at `u32::MAX`.
    fn ticks_ms(&self) -> u32;
}

/// Signed difference `now - then` in milliseconds, correct across counter
/// wraparound as long as the true interval is under half the counter period
/// (~24.8 days).
#[inline]
pub fn ticks_diff(now: u32, then: u32) -> i32 {
    now.wrapping_sub(then) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_elapsed() {
        assert_eq!(ticks_diff(1500, 1000), 500);
        assert_eq!(ticks_diff(1000, 1000), 0);
    }

    #[test]
    fn elapsed_across_wraparound() {
        // 10 ms before the wrap to 15 ms after it.
        assert_eq!(ticks_diff(15, u32::MAX - 9), 25);
    }

    #[test]
    fn negative_when_then_is_later() {
        assert_eq!(ticks_diff(1000, 1500), -500);
    }
}
