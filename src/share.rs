// SPDX-License-Identifier: MIT

//! Inter-task data exchange primitives.
//!
//! The scheduler is cooperative and single-threaded, so task-to-task sharing
//! needs no locking: a [`Share`] is a plain single-slot cell and a read
//! always returns the most recent write. Producers running in interrupt
//! context (limit-switch edge callbacks) are a separate execution context and
//! must go through [`AtomicShare`] instead, which keeps every access a single
//! atomic word operation.

use core::cell::Cell;
use core::sync::atomic::{AtomicI32, Ordering};

use heapless::Deque;

/// Single-slot mutable holder of one value, written by one task and read by
/// any number of others. The initial value is defined at construction
/// (typically zero).
#[derive(Debug)]
pub struct Share<T: Copy> {
    slot: Cell<T>,
}

impl<T: Copy> Share<T> {
    pub const fn new(initial: T) -> Self {
        Self {
            slot: Cell::new(initial),
        }
    }

    /// Store a value, visible to all subsequent [`get`](Self::get) calls.
    #[inline]
    pub fn put(&self, value: T) {
        self.slot.set(value);
    }

    /// Read the most recently written value.
    #[inline]
    pub fn get(&self) -> T {
        self.slot.get()
    }
}

/// Single-word cell safe against writers outside the cooperative scheduler.
///
/// Used for the limit-switch latches: an edge callback running in interrupt
/// context stores into the cell, and the homing routine polls it from task
/// context. Values transition from their initial state to the latched state
/// exactly once per homing run.
#[derive(Debug)]
pub struct AtomicShare {
    slot: AtomicI32,
}

impl AtomicShare {
    pub const fn new(initial: i32) -> Self {
        Self {
            slot: AtomicI32::new(initial),
        }
    }

    #[inline]
    pub fn put(&self, value: i32) {
        self.slot.store(value, Ordering::Release);
    }

    #[inline]
    pub fn get(&self) -> i32 {
        self.slot.load(Ordering::Acquire)
    }
}

/// Error reported when enqueueing onto a full [`Queue`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Full;

/// Fixed-capacity FIFO queue.
///
/// The setpoint queues are write-once-then-drain: fully populated by the
/// parser before the scheduler starts, then drained strictly in order by the
/// controller. [`put`](Self::put) on a full queue reports [`Full`] and drops
/// the value; [`get`](Self::get) on an empty queue is a caller error, so
/// callers gate on [`has_items`](Self::has_items) first.
#[derive(Debug)]
pub struct Queue<T, const N: usize> {
    fifo: Deque<T, N>,
}

impl<T, const N: usize> Queue<T, N> {
    pub fn new() -> Self {
        Self { fifo: Deque::new() }
    }

    /// Append a value, or report [`Full`] without storing it.
    pub fn put(&mut self, value: T) -> Result<(), Full> {
        self.fifo.push_back(value).map_err(|_| Full)
    }

    /// Remove and return the oldest value. `None` on an empty queue; the
    /// controller never calls this without checking
    /// [`has_items`](Self::has_items).
    pub fn get(&mut self) -> Option<T> {
        self.fifo.pop_front()
    }

    #[inline]
    pub fn has_items(&self) -> bool {
        !self.fifo.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.fifo.is_full()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fifo.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }
}

impl<T, const N: usize> Default for Queue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
