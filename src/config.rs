// SPDX-License-Identifier: MIT

//! Plotter configuration.
//!
//! Every tunable and geometry constant lives in one [`Config`] built at
//! startup and passed by reference into the components that need it. There
//! are no module-level mutable globals.

use crate::control::PenState;

/// Encoder pulses (ticks) per motor revolution: 256 CPR x 4 (quadrature)
/// x 16:1 gearbox.
pub const PPR: u32 = 256 * 4 * 16;

/// Encoder ticks per mm of belt length change.
///
/// 16 teeth on the drive pulleys at 2 mm pitch gives 32 mm of belt per
/// revolution; `PPR / 32 mm` = 512 ticks/mm.
pub const TICKS_PER_MM: f32 = 512.0;

/// Maximum length of either belt (mm), pen at the far corner.
pub const R_MAX_MM: f32 = 330.0;

/// Maximum position of either motor (ticks), the homed zero reference.
pub const TICKS_MAX: i32 = (TICKS_PER_MM * R_MAX_MM) as i32;

/// PID gains shared by both axes.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidGains {
    /// Proportional gain (duty% per tick).
    pub kp: f32,
    /// Integral gain (duty% per tick-ms).
    pub ki: f32,
    /// Derivative gain (duty% per tick/ms).
    pub kd: f32,
}

/// Physical layout of the board: two motors at the top corners, belts down
/// to the pen carriage.
#[derive(Copy, Clone, Debug)]
pub struct Geometry {
    /// Distance between the two motors (mm).
    pub motor_spacing_mm: f32,
    /// Home position of the pen relative to the drawing-area corner nearest
    /// motor 1 (mm).
    pub x_home_mm: f32,
    pub y_home_mm: f32,
    /// Belt ticks per mm.
    pub ticks_per_mm: f32,
}

/// Complete plotter configuration. [`Config::default`] carries the values
/// for the original 4 in x 6 in board.
#[derive(Copy, Clone, Debug)]
pub struct Config {
    pub gains: PidGains,

    /// Target loaded into the controller before the first queue entry.
    pub initial_setpoint: (i32, i32),
    /// Pen state the mechanism is left in by the homing routine.
    pub initial_pen: PenState,

    /// Per-axis actuation sign, compensating for mechanically mirrored motor
    /// mounting. A physical-layout constant, not a control-law term.
    pub axis_sign: [f32; 2],

    /// Servo duty preset for pen up (%).
    pub pen_up_duty: f32,
    /// Servo duty preset for pen down (%).
    pub pen_down_duty: f32,
    /// Time the servo needs to change position (ms).
    pub pen_settle_ms: u32,

    /// A step is finished when both axes are within this many ticks of
    /// target.
    pub finish_tolerance: i32,

    /// Scheduling period of each encoder task (ms).
    pub encoder_period_ms: u32,
    /// Scheduling period of the controller task (ms).
    pub controller_period_ms: u32,
    /// Encoder task priority (lower value = more urgent). Encoders run
    /// before the controller in every pass so it never acts on stale
    /// position data.
    pub encoder_priority: u8,
    /// Controller task priority.
    pub controller_priority: u8,

    pub geometry: Geometry,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Proportional-only by default, scaled from degrees per tick.
            gains: PidGains {
                kp: 4.0 * (360.0 / PPR as f32),
                ki: 0.0,
                kd: 0.0,
            },
            initial_setpoint: (TICKS_MAX, TICKS_MAX),
            initial_pen: PenState::Up,
            axis_sign: [-1.0, 1.0],
            pen_up_duty: 8.0,
            pen_down_duty: 7.0,
            pen_settle_ms: 500,
            finish_tolerance: 1000,
            encoder_period_ms: 10,
            controller_period_ms: 10,
            encoder_priority: 0,
            controller_priority: 1,
            geometry: Geometry {
                motor_spacing_mm: 263.0,
                x_home_mm: 80.7,
                y_home_mm: 122.676,
                ticks_per_mm: TICKS_PER_MM,
            },
        }
    }
}
