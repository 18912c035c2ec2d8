// SPDX-License-Identifier: MIT

//! # Control Algorithms
//!
//! Closed-loop control building blocks for the two-motor plotter.
//!
//! ## Modules
//!
//! - [`pid`] - Two-axis PID controller with sign-flip integral reset.

pub mod pid;

pub use pid::PidController;

use crate::share::{Full, Queue};

/// Default capacity of each setpoint queue, in drawing points.
pub const SETPOINT_QUEUE_CAP: usize = 2000;

/// One of the two independently controlled motor/encoder channels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    Motor1 = 0,
    Motor2 = 1,
}

impl Axis {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Pen contact state: up (travel) or down (drawing).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PenState {
    Up,
    Down,
}

impl PenState {
    /// The opposite pen state.
    #[inline]
    pub fn toggled(self) -> PenState {
        match self {
            PenState::Up => PenState::Down,
            PenState::Down => PenState::Up,
        }
    }
}

/// One queued motion target: belt positions for both axes plus the pen state
/// to hold while moving there.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Setpoint {
    pub theta1: i32,
    pub theta2: i32,
    pub pen: PenState,
}

/// The three parallel setpoint queues the parser fills and the controller
/// drains. Entries appear in visiting order; the queues always hold the same
/// number of items.
pub struct SetpointQueues<const N: usize = SETPOINT_QUEUE_CAP> {
    theta1: Queue<i32, N>,
    theta2: Queue<i32, N>,
    pen: Queue<PenState, N>,
}

impl<const N: usize> SetpointQueues<N> {
    pub fn new() -> Self {
        Self {
            theta1: Queue::new(),
            theta2: Queue::new(),
            pen: Queue::new(),
        }
    }

    /// Enqueue one target tuple across all three queues, or report `Full`
    /// without storing any part of it.
    pub fn put(&mut self, sp: Setpoint) -> Result<(), Full> {
        if self.theta1.is_full() {
            return Err(Full);
        }
        self.theta1.put(sp.theta1)?;
        self.theta2.put(sp.theta2)?;
        self.pen.put(sp.pen)?;
        Ok(())
    }

    /// Dequeue the next target tuple. Callers gate on
    /// [`has_items`](Self::has_items).
    pub fn get(&mut self) -> Option<Setpoint> {
        let theta1 = self.theta1.get()?;
        let theta2 = self.theta2.get()?;
        let pen = self.pen.get()?;
        Some(Setpoint { theta1, theta2, pen })
    }

    #[inline]
    pub fn has_items(&self) -> bool {
        self.theta1.has_items()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.theta1.is_full()
    }

    /// Number of queued target tuples.
    #[inline]
    pub fn len(&self) -> usize {
        self.theta1.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.theta1.is_empty()
    }
}

impl<const N: usize> Default for SetpointQueues<N> {
    fn default() -> Self {
        Self::new()
    }
}
