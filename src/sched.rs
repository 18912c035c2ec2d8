// SPDX-License-Identifier: MIT

//! Fixed-priority cooperative scheduler.
//!
//! Tasks are registered once at startup and never created or destroyed at
//! runtime. Each scheduling pass resumes every task whose period has
//! elapsed, in ascending priority value (lower value = more urgent), so a
//! higher-priority task's writes earlier in a pass are visible to
//! lower-priority tasks later in the same pass. A task's `run` performs one
//! bounded unit of work and returns; nothing preempts it while it runs.
//!
//! The loop is abortable through a stop flag. On any exit the scheduler
//! invokes every task's `on_stop`, which is where actuators are driven to a
//! safe neutral state.

use core::sync::atomic::{AtomicBool, Ordering};

use heapless::Vec;

use crate::time::{ticks_diff, Clock};

/// A cooperative periodic task.
pub trait Task {
    /// Perform one unit of work. `now_ms` is the monotonic time at the
    /// start of the scheduling pass.
    fn run(&mut self, now_ms: u32);

    /// Invoked exactly once when the scheduler loop exits, on every exit
    /// path. Tasks that own actuators command them to a safe neutral state
    /// here.
    fn on_stop(&mut self) {}
}

/// Scheduler errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedError {
    /// The fixed task table is full.
    TaskTableFull,
}

impl core::fmt::Display for SchedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SchedError::TaskTableFull => write!(f, "task table full"),
        }
    }
}

struct Slot<'a> {
    task: &'a mut dyn Task,
    name: &'static str,
    priority: u8,
    period_ms: u32,
    /// Pass time of the most recent run; `None` runs on the first pass.
    last_start: Option<u32>,
}

/// Priority-ordered cooperative dispatcher over at most `N` tasks.
pub struct Scheduler<'a, const N: usize> {
    slots: Vec<Slot<'a>, N>,
}

impl<'a, const N: usize> Scheduler<'a, N> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Register a task. Lower `priority` values run earlier in each pass;
    /// tasks of equal priority keep registration order.
    pub fn add_task(
        &mut self,
        name: &'static str,
        priority: u8,
        period_ms: u32,
        task: &'a mut dyn Task,
    ) -> Result<(), SchedError> {
        let at = self
            .slots
            .iter()
            .position(|s| s.priority > priority)
            .unwrap_or(self.slots.len());
        let slot = Slot {
            task,
            name,
            priority,
            period_ms,
            last_start: None,
        };
        self.slots
            .insert(at, slot)
            .map_err(|_| SchedError::TaskTableFull)?;
        debug!("registered task {} (priority {})", name, priority);
        Ok(())
    }

    /// Run one scheduling pass: every due task, most urgent first.
    pub fn run_pass(&mut self, now_ms: u32) {
        for slot in self.slots.iter_mut() {
            let due = match slot.last_start {
                None => true,
                Some(t) => ticks_diff(now_ms, t) >= slot.period_ms as i32,
            };
            if due {
                slot.last_start = Some(now_ms);
                slot.task.run(now_ms);
            }
        }
    }

    /// Run passes until `stop` is observed set, then shut down.
    pub fn run(&mut self, clock: &dyn Clock, stop: &AtomicBool) {
        info!("scheduler running {} tasks", self.slots.len());
        while !stop.load(Ordering::Acquire) {
            self.run_pass(clock.ticks_ms());
        }
        self.shutdown();
    }

    /// Stop all tasks. The mandatory last action on every exit path: each
    /// task gets its `on_stop`, in priority order.
    pub fn shutdown(&mut self) {
        for slot in self.slots.iter_mut() {
            trace!("stopping task {}", slot.name);
            slot.task.on_stop();
        }
        info!("scheduler stopped");
    }
}

impl<'a, const N: usize> Default for Scheduler<'a, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;

    struct Recorder<'a> {
        name: &'static str,
        log: &'a RefCell<std::vec::Vec<&'static str>>,
        stopped: bool,
    }

    impl Task for Recorder<'_> {
        fn run(&mut self, _now_ms: u32) {
            self.log.borrow_mut().push(self.name);
        }

        fn on_stop(&mut self) {
            self.stopped = true;
            self.log.borrow_mut().push("stop");
        }
    }

    #[test]
    fn runs_due_tasks_in_priority_order() {
        let log = RefCell::new(std::vec::Vec::new());
        let mut low = Recorder {
            name: "low",
            log: &log,
            stopped: false,
        };
        let mut high = Recorder {
            name: "high",
            log: &log,
            stopped: false,
        };

        let mut sched: Scheduler<4> = Scheduler::new();
        // Registration order deliberately inverted relative to priority.
        sched.add_task("low", 5, 10, &mut low).unwrap();
        sched.add_task("high", 0, 10, &mut high).unwrap();

        sched.run_pass(0);
        assert_eq!(*log.borrow(), ["high", "low"]);
    }

    #[test]
    fn respects_task_periods() {
        let log = RefCell::new(std::vec::Vec::new());
        let mut fast = Recorder {
            name: "fast",
            log: &log,
            stopped: false,
        };
        let mut slow = Recorder {
            name: "slow",
            log: &log,
            stopped: false,
        };

        let mut sched: Scheduler<4> = Scheduler::new();
        sched.add_task("fast", 0, 10, &mut fast).unwrap();
        sched.add_task("slow", 1, 20, &mut slow).unwrap();

        for pass in 0..4 {
            sched.run_pass(pass * 10);
        }
        // Slow task skips every other 10 ms pass.
        assert_eq!(
            *log.borrow(),
            ["fast", "slow", "fast", "fast", "slow", "fast"]
        );
    }

    #[test]
    fn period_check_survives_clock_wraparound() {
        let log = RefCell::new(std::vec::Vec::new());
        let mut t = Recorder {
            name: "t",
            log: &log,
            stopped: false,
        };

        let mut sched: Scheduler<2> = Scheduler::new();
        sched.add_task("t", 0, 10, &mut t).unwrap();

        sched.run_pass(u32::MAX - 4);
        // 3 ms later (across the wrap): not yet due.
        sched.run_pass(u32::MAX.wrapping_add(4));
        // 12 ms after the first run: due.
        sched.run_pass(u32::MAX.wrapping_add(8));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn stop_flag_triggers_shutdown() {
        struct StopRequester<'a> {
            remaining: u32,
            stop: &'a AtomicBool,
        }

        impl Task for StopRequester<'_> {
            fn run(&mut self, _now_ms: u32) {
                if self.remaining == 0 {
                    self.stop.store(true, Ordering::Release);
                } else {
                    self.remaining -= 1;
                }
            }
        }

        struct CountingClock(core::cell::Cell<u32>);
        impl Clock for CountingClock {
            fn ticks_ms(&self) -> u32 {
                let t = self.0.get();
                self.0.set(t + 10);
                t
            }
        }

        let stop = AtomicBool::new(false);
        let log = RefCell::new(std::vec::Vec::new());
        let mut requester = StopRequester {
            remaining: 3,
            stop: &stop,
        };
        let mut recorder = Recorder {
            name: "motors",
            log: &log,
            stopped: false,
        };

        let mut sched: Scheduler<4> = Scheduler::new();
        sched.add_task("requester", 0, 10, &mut requester).unwrap();
        sched.add_task("motors", 1, 10, &mut recorder).unwrap();

        let clock = CountingClock(core::cell::Cell::new(0));
        sched.run(&clock, &stop);
        drop(sched);

        assert!(recorder.stopped);
        assert_eq!(*log.borrow().last().unwrap(), "stop");
    }

    #[test]
    fn task_table_capacity_is_reported() {
        let log = RefCell::new(std::vec::Vec::new());
        let mut a = Recorder {
            name: "a",
            log: &log,
            stopped: false,
        };
        let mut b = Recorder {
            name: "b",
            log: &log,
            stopped: false,
        };

        let mut sched: Scheduler<1> = Scheduler::new();
        sched.add_task("a", 0, 10, &mut a).unwrap();
        assert_eq!(
            sched.add_task("b", 0, 10, &mut b),
            Err(SchedError::TaskTableFull)
        );
    }
}
