// SPDX-License-Identifier: MIT

//! Encoder sampling task.
//!
//! One instance per axis. Each invocation samples the cumulative position
//! from its encoder and republishes it into the axis's share. Runs at the
//! highest scheduling priority: stale position data corrupts every
//! downstream PID computation.

use crate::hal::Encoder;
use crate::sched::Task;
use crate::share::Share;

/// Periodically reads an encoder and publishes its position.
pub struct EncoderTask<'a, E: Encoder> {
    encoder: E,
    position: &'a Share<i32>,
}

impl<'a, E: Encoder> EncoderTask<'a, E> {
    pub fn new(encoder: E, position: &'a Share<i32>) -> Self {
        Self { encoder, position }
    }

    /// Access the wrapped encoder, e.g. for homing re-base.
    pub fn encoder_mut(&mut self) -> &mut E {
        &mut self.encoder
    }
}

impl<E: Encoder> Task for EncoderTask<'_, E> {
    fn run(&mut self, _now_ms: u32) {
        let value = self.encoder.read();
        self.position.put(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeEncoder {
        value: i32,
    }

    impl Encoder for FakeEncoder {
        fn read(&mut self) -> i32 {
            self.value += 100;
            self.value
        }

        fn set_position(&mut self, ticks: i32) {
            self.value = ticks;
        }
    }

    #[test]
    fn publishes_each_sample() {
        let share = Share::new(0);
        let mut task = EncoderTask::new(FakeEncoder { value: 0 }, &share);

        task.run(0);
        assert_eq!(share.get(), 100);
        task.run(10);
        assert_eq!(share.get(), 200);

        task.encoder_mut().set_position(5_000);
        task.run(20);
        assert_eq!(share.get(), 5_100);
    }
}
