// SPDX-License-Identifier: MIT

//! HPGL parsing and the board kinematic transform.
//!
//! The parser runs once, before the scheduler starts: it walks the HPGL
//! text, keeps only the pen-move statements, converts each coordinate pair
//! through the two-cable kinematics, and fills the setpoint queues the
//! controller will drain. A full queue truncates the drawing gracefully and
//! is reported in the summary; malformed input is a fatal parse error, since
//! nothing is moving yet.

use micromath::F32Ext;

use crate::config::{Config, TICKS_MAX};
use crate::control::{PenState, Setpoint, SetpointQueues};

/// HPGL units per millimeter.
const HPGL_UNITS_PER_MM: f32 = 40.0;

/// Parse-time errors. All fatal: they occur entirely before the real-time
/// loop starts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// A statement that is neither a pen move nor one of the ignored
    /// preamble commands (`IN`, `SP<n>`, bare `PU`).
    UnknownCommand,
    /// A coordinate that does not parse as an integer.
    BadCoordinate,
    /// A pen-move statement with an odd number of coordinates.
    OddCoordinateCount,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParseError::UnknownCommand => write!(f, "unknown HPGL command"),
            ParseError::BadCoordinate => write!(f, "malformed coordinate"),
            ParseError::OddCoordinateCount => write!(f, "odd coordinate count"),
        }
    }
}

/// Result of a parse run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseSummary {
    /// Target tuples enqueued, including the final return-to-home.
    pub queued: usize,
    /// Points dropped because the queues filled up.
    pub dropped: usize,
}

/// Two-cable kinematics: drawing-area point (mm) to belt positions (ticks).
///
/// The point is measured from the drawing-area corner nearest motor 1. With
/// the motors `motor_spacing_mm` apart and both belts zeroed at their fully
/// extended length, the home offsets place the carriage at the configured
/// (x_home, y_home).
pub fn transform(cfg: &Config, x_mm: f32, y_mm: f32) -> (i32, i32) {
    let g = &cfg.geometry;
    let dy = g.y_home_mm + y_mm;
    let dx1 = g.x_home_mm + x_mm;
    let dx2 = g.motor_spacing_mm - g.x_home_mm - x_mm;

    let r1 = (dy * dy + dx1 * dx1).sqrt();
    let r2 = (dy * dy + dx2 * dx2).sqrt();

    (
        (g.ticks_per_mm * r1) as i32,
        (g.ticks_per_mm * r2) as i32,
    )
}

/// HPGL parser feeding the setpoint queues.
pub struct Parser<'a> {
    cfg: &'a Config,
}

impl<'a> Parser<'a> {
    pub fn new(cfg: &'a Config) -> Self {
        Self { cfg }
    }

    /// Parse `text` and enqueue every pen move, in visiting order, followed
    /// by a return-to-home tuple (pen up, both belts fully extended).
    ///
    /// Statements are separated by `;` or newlines. `IN`, `SP<n>` and bare
    /// `PU` (initialize, pen select, initial pen-up) are ignored. Everything
    /// else must be `PU`/`PD` followed by an even list of integer
    /// coordinates in HPGL units (1/40 mm).
    pub fn parse<const N: usize>(
        &self,
        text: &str,
        queues: &mut SetpointQueues<N>,
    ) -> Result<ParseSummary, ParseError> {
        let mut queued = 0;
        let mut dropped = 0;

        for raw in text.split(|c| c == ';' || c == '\n' || c == '\r') {
            let stmt = raw.trim();
            if stmt.is_empty() || stmt == "IN" || stmt.starts_with("SP") || stmt == "PU" {
                continue;
            }

            if stmt.len() < 2 || !stmt.is_char_boundary(2) {
                return Err(ParseError::UnknownCommand);
            }
            let (cmd, coords) = stmt.split_at(2);
            let pen = match cmd {
                "PU" => PenState::Up,
                "PD" => PenState::Down,
                _ => return Err(ParseError::UnknownCommand),
            };

            let mut values = coords.split(',');
            loop {
                let Some(first) = values.next() else { break };
                let x_units: i32 = first
                    .trim()
                    .parse()
                    .map_err(|_| ParseError::BadCoordinate)?;
                let second = values.next().ok_or(ParseError::OddCoordinateCount)?;
                let y_units: i32 = second
                    .trim()
                    .parse()
                    .map_err(|_| ParseError::BadCoordinate)?;

                let x_mm = x_units as f32 / HPGL_UNITS_PER_MM;
                let y_mm = y_units as f32 / HPGL_UNITS_PER_MM;
                let (theta1, theta2) = transform(self.cfg, x_mm, y_mm);

                let sp = Setpoint { theta1, theta2, pen };
                if queues.put(sp).is_ok() {
                    queued += 1;
                } else {
                    dropped += 1;
                }
            }
        }

        // Return-to-home after the last drawn point.
        let home = Setpoint {
            theta1: TICKS_MAX,
            theta2: TICKS_MAX,
            pen: PenState::Up,
        };
        if queues.put(home).is_ok() {
            queued += 1;
        } else {
            dropped += 1;
        }

        if dropped > 0 {
            warn!("setpoint queues full, dropped {} points", dropped);
        }
        info!("parsed drawing: {} points queued", queued);

        Ok(ParseSummary { queued, dropped })
    }
}
