// SPDX-License-Identifier: MIT

//! # Periodic Tasks
//!
//! The units of work the cooperative scheduler dispatches.
//!
//! ## Modules
//!
//! - [`encoder`] - Samples one encoder and republishes its position.
//! - [`controller`] - Motion/pen state machine driving motors and servo.

pub mod controller;
pub mod encoder;

pub use controller::ControllerTask;
pub use encoder::EncoderTask;
