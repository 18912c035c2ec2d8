// SPDX-License-Identifier: MIT

//! Two-axis PID controller for the plotter belts.
//!
//! Both axes share one set of gains but keep independent transient state
//! (integral accumulator, last error, step timestamps). Every new setpoint
//! begins a fresh step response: all per-axis history is cleared so no stale
//! integral windup or derivative spike carries across disjoint targets.
//!
//! Works in `no_std` and does not allocate memory.

use micromath::F32Ext;

use crate::config::{Config, PidGains};
use crate::control::Axis;
use crate::time::ticks_diff;

/// Maximum allowable motor power (percent duty cycle). PID output is hard
/// saturated to `[-MAX_POWER, MAX_POWER]`.
pub const MAX_POWER: f32 = 100.0;

/// Per-axis transient state for one step response.
#[derive(Copy, Clone, Debug, Default)]
struct AxisState {
    /// Monotonic ms at which the current step began; `None` means no step is
    /// in progress and the next `run` establishes t=0.
    step_start: Option<u32>,
    /// Cumulative ms since step start at the previous sample.
    last_time: i32,
    /// Error at the most recent sample (ticks, measured minus target).
    error: f32,
    /// Error at the previous sample.
    last_error: f32,
    /// Integral term accumulator (duty %).
    i_duty: f32,
}

/// PID controller driving both motor axes toward the current setpoint.
pub struct PidController {
    gains: PidGains,
    set_point: [i32; 2],

    /// Per-axis output sign for mechanically mirrored motor mounting.
    axis_sign: [f32; 2],
    /// Step-finished tolerance (ticks).
    finish_tolerance: f32,

    axes: [AxisState; 2],
}

impl PidController {
    /// Create a controller with the configured gains, mirror signs,
    /// tolerance and initial setpoint.
    pub fn new(cfg: &Config) -> Self {
        Self {
            gains: cfg.gains,
            set_point: [cfg.initial_setpoint.0, cfg.initial_setpoint.1],
            axis_sign: cfg.axis_sign,
            finish_tolerance: cfg.finish_tolerance as f32,
            axes: [AxisState::default(); 2],
        }
    }

    /// Hot-swap the controller gains. Transient state is untouched.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    /// Set the target for the next step response.
    ///
    /// Clears all per-axis transient state so both axes start the step with
    /// zero accumulated history.
    pub fn set_setpoint(&mut self, theta1: i32, theta2: i32) {
        self.set_point = [theta1, theta2];
        self.axes = [AxisState::default(); 2];
    }

    /// Current target, (theta1, theta2) in ticks.
    #[inline]
    pub fn setpoint(&self) -> (i32, i32) {
        (self.set_point[0], self.set_point[1])
    }

    /// Run one control sample for `axis` and return the actuation value
    /// (signed duty %, saturated to `[-MAX_POWER, MAX_POWER]`).
    ///
    /// `measured` is the axis position in ticks, `now_ms` the monotonic
    /// clock. The derivative and integral increments both use the delta
    /// between this sample's cumulative step time and the previous one's,
    /// which keeps their scale consistent when the scheduler period jitters.
    pub fn run(&mut self, axis: Axis, measured: i32, now_ms: u32) -> f32 {
        let ax = &mut self.axes[axis.index()];

        // First sample of a step establishes t=0 for the time base.
        let step_start = match ax.step_start {
            Some(t) => t,
            None => {
                ax.step_start = Some(now_ms);
                ax.last_time = 0;
                now_ms
            }
        };

        ax.error = (measured - self.set_point[axis.index()]) as f32;
        let cum_time = ticks_diff(now_ms, step_start);
        let delta_t = (cum_time - ax.last_time) as f32;

        // Proportional: error is measured-minus-target, so the correction
        // carries a negative sign.
        let p_duty = -self.gains.kp * ax.error;

        // Integral with sign-flip reset: if the candidate increment opposes
        // the accumulated value, replace rather than accumulate.
        let i_new = self.gains.ki * ax.error * delta_t;
        if (ax.i_duty > 0.0 && i_new < 0.0) || (ax.i_duty < 0.0 && i_new > 0.0) {
            ax.i_duty = i_new;
        } else {
            ax.i_duty += i_new;
        }

        // Derivative, skipped for a zero-length sample interval.
        let d_duty = if delta_t > 0.0 {
            self.gains.kd * (ax.error - ax.last_error) / delta_t
        } else {
            0.0
        };

        let mut actuation = p_duty + ax.i_duty + d_duty;
        if actuation > MAX_POWER {
            actuation = MAX_POWER;
        } else if actuation < -MAX_POWER {
            actuation = -MAX_POWER;
        }

        ax.last_error = ax.error;
        ax.last_time = cum_time;

        actuation * self.axis_sign[axis.index()]
    }

    /// Check whether both axes are within tolerance of the current setpoint.
    ///
    /// On success this also resets the step timestamps and errors, so a
    /// second call before any new `run` is evaluated against the cleared
    /// (zero) errors and reports finished again. Not idempotent; callers act
    /// on the first answer.
    pub fn check_finish_step(&mut self) -> bool {
        let done = self.axes[0].error.abs() < self.finish_tolerance
            && self.axes[1].error.abs() < self.finish_tolerance;
        if done {
            for ax in &mut self.axes {
                ax.step_start = None;
                ax.error = 0.0;
            }
        }
        done
    }
}
