// SPDX-License-Identifier: MIT

//! Motion/pen controller task.
//!
//! A two-state machine sequencing the plotter through the queued targets:
//!
//! - **Motor**: the PID drives both axes toward the current setpoint. When
//!   the step finishes the next queue tuple is pulled; if its pen state
//!   matches the held one the new setpoint is applied immediately, otherwise
//!   the machine moves to **Servo**.
//! - **Servo**: on entry the pen servo is commanded to the opposite pen
//!   position; after the settle duration the pending setpoint is applied,
//!   the held pen state is updated and the machine returns to **Motor**.
//!
//! Actuation commands are issued unconditionally on every invocation, in
//! both states, before any state handling ("always update the controller
//! first"). Once the queue is exhausted the machine idles in Motor,
//! re-confirming the final setpoint forever.

use crate::config::Config;
use crate::control::{Axis, PenState, PidController, Setpoint, SetpointQueues, SETPOINT_QUEUE_CAP};
use crate::hal::{MotorDriver, PenServo};
use crate::sched::Task;
use crate::share::Share;
use crate::time::ticks_diff;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Motor,
    Servo,
}

/// The controller task: PID on both motor axes plus pen-lift sequencing.
pub struct ControllerTask<'a, M1, M2, S, const N: usize = SETPOINT_QUEUE_CAP>
where
    M1: MotorDriver,
    M2: MotorDriver,
    S: PenServo,
{
    pid: PidController,
    motor1: M1,
    motor2: M2,
    servo: S,

    position1: &'a Share<i32>,
    position2: &'a Share<i32>,
    queue: SetpointQueues<N>,

    state: State,
    /// Pen state the mechanism is physically in.
    held_pen: PenState,
    /// Most recently dequeued target; kept when the queue runs dry.
    pending: Setpoint,
    /// Entry time of the Servo state, `None` outside it.
    servo_start: Option<u32>,

    pen_up_duty: f32,
    pen_down_duty: f32,
    pen_settle_ms: u32,
}

impl<'a, M1, M2, S, const N: usize> ControllerTask<'a, M1, M2, S, N>
where
    M1: MotorDriver,
    M2: MotorDriver,
    S: PenServo,
{
    /// Build the controller and load the first queued setpoint.
    ///
    /// If the queue has entries, its first tuple becomes the initial target
    /// and its pen state seeds the held pen reference with no initial servo
    /// transition; the homing routine leaves the mechanism in a matching pen
    /// state. An empty queue falls back to the configured initial setpoint
    /// and pen state.
    pub fn new(
        cfg: &Config,
        motor1: M1,
        motor2: M2,
        servo: S,
        position1: &'a Share<i32>,
        position2: &'a Share<i32>,
        mut queue: SetpointQueues<N>,
    ) -> Self {
        let mut pid = PidController::new(cfg);

        let pending = match queue.get() {
            Some(first) => first,
            None => Setpoint {
                theta1: cfg.initial_setpoint.0,
                theta2: cfg.initial_setpoint.1,
                pen: cfg.initial_pen,
            },
        };
        pid.set_setpoint(pending.theta1, pending.theta2);
        debug!(
            "controller start: target ({}, {}), {} points queued",
            pending.theta1,
            pending.theta2,
            queue.len()
        );

        Self {
            pid,
            motor1,
            motor2,
            servo,
            position1,
            position2,
            queue,
            state: State::Motor,
            held_pen: pending.pen,
            pending,
            servo_start: None,
            pen_up_duty: cfg.pen_up_duty,
            pen_down_duty: cfg.pen_down_duty,
            pen_settle_ms: cfg.pen_settle_ms,
        }
    }

    /// Hot-swap the PID gains.
    pub fn set_gains(&mut self, gains: crate::config::PidGains) {
        self.pid.set_gains(gains);
    }

    /// Current PID target, (theta1, theta2) in ticks.
    #[inline]
    pub fn setpoint(&self) -> (i32, i32) {
        self.pid.setpoint()
    }

    /// Pen state the mechanism is currently held in.
    #[inline]
    pub fn held_pen(&self) -> PenState {
        self.held_pen
    }

    /// Number of targets still queued.
    #[inline]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn pen_duty(&self, pen: PenState) -> f32 {
        match pen {
            PenState::Up => self.pen_up_duty,
            PenState::Down => self.pen_down_duty,
        }
    }
}

impl<M1, M2, S, const N: usize> Task for ControllerTask<'_, M1, M2, S, N>
where
    M1: MotorDriver,
    M2: MotorDriver,
    S: PenServo,
{
    fn run(&mut self, now_ms: u32) {
        // Always update the controller first, in every state.
        let duty1 = self.pid.run(Axis::Motor1, self.position1.get(), now_ms);
        self.motor1.set_duty_cycle(duty1);
        let duty2 = self.pid.run(Axis::Motor2, self.position2.get(), now_ms);
        self.motor2.set_duty_cycle(duty2);

        match self.state {
            State::Motor => {
                if self.pid.check_finish_step() {
                    // Pull the next tuple, but don't retarget yet: the pen
                    // may need to move first. A dry queue keeps the last
                    // pending tuple, idling on the final setpoint.
                    if self.queue.has_items() {
                        if let Some(next) = self.queue.get() {
                            self.pending = next;
                        }
                    }
                    if self.pending.pen == self.held_pen {
                        self.pid
                            .set_setpoint(self.pending.theta1, self.pending.theta2);
                    } else {
                        trace!("pen change, entering servo state");
                        self.state = State::Servo;
                    }
                }
            }
            State::Servo => match self.servo_start {
                None => {
                    self.servo_start = Some(now_ms);
                    let duty = self.pen_duty(self.held_pen.toggled());
                    self.servo.set_angle(duty);
                }
                Some(start) if ticks_diff(now_ms, start) > self.pen_settle_ms as i32 => {
                    self.pid
                        .set_setpoint(self.pending.theta1, self.pending.theta2);
                    self.held_pen = self.pending.pen;
                    self.servo_start = None;
                    self.state = State::Motor;
                }
                Some(_) => {}
            },
        }
    }

    fn on_stop(&mut self) {
        self.motor1.set_duty_cycle(0.0);
        self.motor2.set_duty_cycle(0.0);
        info!("motors disabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PidGains;
    use core::cell::{Cell, RefCell};

    struct SimMotor<'a> {
        duty: &'a Cell<f32>,
    }

    impl MotorDriver for SimMotor<'_> {
        fn set_duty_cycle(&mut self, percent: f32) {
            self.duty.set(percent);
        }
    }

    struct SimServo<'a> {
        commands: &'a RefCell<std::vec::Vec<f32>>,
    }

    impl PenServo for SimServo<'_> {
        fn set_angle(&mut self, percent: f32) {
            self.commands.borrow_mut().push(percent);
        }
    }

    struct Rig {
        duty1: Cell<f32>,
        duty2: Cell<f32>,
        servo: RefCell<std::vec::Vec<f32>>,
        pos1: Share<i32>,
        pos2: Share<i32>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                duty1: Cell::new(f32::NAN),
                duty2: Cell::new(f32::NAN),
                servo: RefCell::new(std::vec::Vec::new()),
                pos1: Share::new(0),
                pos2: Share::new(0),
            }
        }

        fn controller<'a, const N: usize>(
            &'a self,
            cfg: &Config,
            queue: SetpointQueues<N>,
        ) -> ControllerTask<'a, SimMotor<'a>, SimMotor<'a>, SimServo<'a>, N> {
            ControllerTask::new(
                cfg,
                SimMotor { duty: &self.duty1 },
                SimMotor { duty: &self.duty2 },
                SimServo {
                    commands: &self.servo,
                },
                &self.pos1,
                &self.pos2,
                queue,
            )
        }
    }

    fn test_config() -> Config {
        Config {
            gains: PidGains {
                kp: 0.05,
                ki: 0.0,
                kd: 0.0,
            },
            initial_setpoint: (0, 0),
            initial_pen: PenState::Up,
            ..Config::default()
        }
    }

    #[test]
    fn first_queue_entry_seeds_target_and_pen() {
        let rig = Rig::new();
        let mut queue: SetpointQueues<4> = SetpointQueues::new();
        queue
            .put(Setpoint {
                theta1: 500,
                theta2: 600,
                pen: PenState::Down,
            })
            .unwrap();

        let ctrl = rig.controller(&test_config(), queue);
        assert_eq!(ctrl.setpoint(), (500, 600));
        assert_eq!(ctrl.held_pen(), PenState::Down);
        assert_eq!(ctrl.queued(), 0);
        // No initial servo transition.
        assert!(rig.servo.borrow().is_empty());
    }

    #[test]
    fn empty_queue_falls_back_to_configured_target() {
        let rig = Rig::new();
        let queue: SetpointQueues<4> = SetpointQueues::new();
        let ctrl = rig.controller(&test_config(), queue);
        assert_eq!(ctrl.setpoint(), (0, 0));
        assert_eq!(ctrl.held_pen(), PenState::Up);
    }

    #[test]
    fn matching_pen_retargets_without_servo_state() {
        let rig = Rig::new();
        let mut queue: SetpointQueues<4> = SetpointQueues::new();
        queue
            .put(Setpoint {
                theta1: 0,
                theta2: 0,
                pen: PenState::Up,
            })
            .unwrap();
        queue
            .put(Setpoint {
                theta1: 2_000,
                theta2: 2_000,
                pen: PenState::Up,
            })
            .unwrap();

        let mut ctrl = rig.controller(&test_config(), queue);
        // Already at (0, 0) within tolerance: finishes and retargets in one
        // tick, never touching the servo.
        ctrl.run(0);
        assert_eq!(ctrl.setpoint(), (2_000, 2_000));
        assert!(rig.servo.borrow().is_empty());
    }

    #[test]
    fn pen_change_sequences_servo_then_retarget() {
        let cfg = test_config();
        let rig = Rig::new();
        let mut queue: SetpointQueues<4> = SetpointQueues::new();
        // First entry matches the homed state: target (0, 0), pen up.
        queue
            .put(Setpoint {
                theta1: 0,
                theta2: 0,
                pen: PenState::Up,
            })
            .unwrap();
        queue
            .put(Setpoint {
                theta1: 1_000,
                theta2: 1_000,
                pen: PenState::Down,
            })
            .unwrap();

        let mut ctrl = rig.controller(&cfg, queue);

        // t=0: step (0,0) finishes immediately, pen differs -> Servo state.
        ctrl.run(0);
        assert!(rig.servo.borrow().is_empty());

        // t=10: servo commanded to the pen-down preset, exactly once.
        ctrl.run(10);
        assert_eq!(*rig.servo.borrow(), [cfg.pen_down_duty]);
        // Old target still active while the pen settles.
        assert_eq!(ctrl.setpoint(), (0, 0));

        // Settle window: strictly more than pen_settle_ms after entry.
        let mut now = 20;
        while now <= 10 + cfg.pen_settle_ms {
            ctrl.run(now);
            assert_eq!(ctrl.setpoint(), (0, 0));
            now += 10;
        }

        // First tick past the settle window applies the pending target.
        ctrl.run(now);
        assert_eq!(ctrl.setpoint(), (1_000, 1_000));
        assert_eq!(ctrl.held_pen(), PenState::Down);
        // Still only the one servo command.
        assert_eq!(rig.servo.borrow().len(), 1);

        // Axes converge; the step is confirmed finished and the machine
        // idles on the final setpoint.
        rig.pos1.put(1_000);
        rig.pos2.put(1_000);
        now += 10;
        ctrl.run(now);
        now += 10;
        ctrl.run(now);
        assert_eq!(ctrl.setpoint(), (1_000, 1_000));
        assert_eq!(rig.servo.borrow().len(), 1);
    }

    #[test]
    fn motors_always_commanded_each_tick() {
        let rig = Rig::new();
        let mut queue: SetpointQueues<4> = SetpointQueues::new();
        queue
            .put(Setpoint {
                theta1: 10_000,
                theta2: 10_000,
                pen: PenState::Up,
            })
            .unwrap();

        let mut ctrl = rig.controller(&test_config(), queue);
        ctrl.run(0);
        // kp = 0.05, error = -10_000: P = 500, saturated to 100, mirrored
        // on motor 1.
        assert_eq!(rig.duty1.get(), -100.0);
        assert_eq!(rig.duty2.get(), 100.0);
    }

    #[test]
    fn on_stop_zeroes_motor_duty() {
        let rig = Rig::new();
        let queue: SetpointQueues<4> = SetpointQueues::new();
        let mut ctrl = rig.controller(&test_config(), queue);
        ctrl.run(0);
        ctrl.on_stop();
        assert_eq!(rig.duty1.get(), 0.0);
        assert_eq!(rig.duty2.get(), 0.0);
    }
}
