// SPDX-License-Identifier: MIT

//! Hardware collaborator traits.
//!
//! The control core never touches timer or GPIO registers directly; it talks
//! to the plotter hardware through these narrow traits. Board support code
//! implements them over the MCU's quadrature-counter timers and PWM channels,
//! and tests implement them over simulated hardware.

/// Raw bounded hardware counter behind a quadrature decoder.
///
/// The count wraps at the timer's auto-reload period;
/// [`PositionTracker`](crate::encoder::PositionTracker) turns it into an
/// unbounded signed position.
pub trait RawCounter {
    /// Current raw counter value, in `[0, modulus)`.
    fn count(&self) -> u32;

    /// Counter wrap period (auto-reload value + 1), e.g. `0x1_0000` for a
    /// 16-bit timer.
    fn modulus(&self) -> u32;
}

/// Cumulative, overflow-corrected encoder position source.
pub trait Encoder {
    /// Sample the hardware and return the cumulative signed position in
    /// ticks. Must be called often enough that the underlying counter moves
    /// less than half its wrap period between calls.
    fn read(&mut self) -> i32;

    /// Re-base the cumulative position, used once during homing to establish
    /// the known-geometry zero offset.
    fn set_position(&mut self, ticks: i32);
}

/// Signed-PWM motor driver.
pub trait MotorDriver {
    /// Set the motor duty cycle as a signed percentage in `[-100, 100]`.
    /// Positive values produce torque in one direction, negative in the
    /// other. Callers guarantee the range; the PID saturation step never
    /// emits an out-of-range value.
    fn set_duty_cycle(&mut self, percent: f32);
}

/// Pen-lift servo driver.
pub trait PenServo {
    /// Command the servo PWM duty cycle (percent). The two meaningful
    /// values are the configured pen-up and pen-down presets.
    fn set_angle(&mut self, percent: f32);
}

pub use crate::time::Clock;
