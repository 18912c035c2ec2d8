// SPDX-License-Identifier: MIT

//! # Cableplot Control Core
//!
//! Control firmware core for a two-motor, cable-driven pen plotter: a
//! cooperative priority scheduler interleaves encoder sampling, closed-loop
//! PID motor control and pen-lift sequencing, fed by setpoint queues that an
//! HPGL parser fills before the real-time loop starts.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`hal`] | Narrow traits the core uses to reach the hardware |
//! | [`share`] | Inter-task cells and bounded FIFO queues |
//! | [`encoder`] | Wraparound-correcting encoder position tracking |
//! | [`control`] | Two-axis PID and the motion data types |
//! | [`tasks`] | Encoder sampling and the motion/pen controller task |
//! | [`sched`] | Fixed-priority cooperative scheduler |
//! | [`hpgl`] | HPGL parsing and the board kinematic transform |
//! | [`config`] | All tunables and geometry, one struct, built at startup |
//!
//! ## Bringing it up
//!
//! Board support code implements the [`hal`] traits over the MCU's timer,
//! PWM and quadrature peripherals, homes the mechanism, parses the drawing,
//! and hands everything to the scheduler:
//!
//! ```no_run
//! # use cableplot::{config::Config, control::SetpointQueues, hpgl::Parser,
//! #     sched::Scheduler, share::Share, tasks::{ControllerTask, EncoderTask}};
//! # use core::sync::atomic::AtomicBool;
//! # fn demo(clock: &dyn cableplot::hal::Clock,
//! #         enc1: impl cableplot::hal::Encoder,
//! #         enc2: impl cableplot::hal::Encoder,
//! #         motor1: impl cableplot::hal::MotorDriver,
//! #         motor2: impl cableplot::hal::MotorDriver,
//! #         servo: impl cableplot::hal::PenServo,
//! #         hpgl_text: &str) {
//! let cfg = Config::default();
//!
//! let mut queues: SetpointQueues = SetpointQueues::new();
//! Parser::new(&cfg).parse(hpgl_text, &mut queues).unwrap();
//!
//! let position1 = Share::new(0);
//! let position2 = Share::new(0);
//! let mut enc1_task = EncoderTask::new(enc1, &position1);
//! let mut enc2_task = EncoderTask::new(enc2, &position2);
//! let mut ctrl_task =
//!     ControllerTask::new(&cfg, motor1, motor2, servo, &position1, &position2, queues);
//!
//! let stop = AtomicBool::new(false);
//! let mut sched: Scheduler<3> = Scheduler::new();
//! sched
//!     .add_task("encoder1", cfg.encoder_priority, cfg.encoder_period_ms, &mut enc1_task)
//!     .unwrap();
//! sched
//!     .add_task("encoder2", cfg.encoder_priority, cfg.encoder_period_ms, &mut enc2_task)
//!     .unwrap();
//! sched
//!     .add_task("controller", cfg.controller_priority, cfg.controller_period_ms, &mut ctrl_task)
//!     .unwrap();
//! sched.run(clock, &stop);
//! # }
//! ```
//!
//! On any exit from [`Scheduler::run`](sched::Scheduler::run) every task gets
//! its `on_stop`, which drives both motors to zero duty.

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod control;
pub mod encoder;
pub mod hal;
pub mod hpgl;
pub mod sched;
pub mod share;
pub mod tasks;
pub mod time;

pub use config::Config;
pub use control::{Axis, PenState, Setpoint, SetpointQueues};
pub use sched::{Scheduler, Task};
pub use share::{Queue, Share};
