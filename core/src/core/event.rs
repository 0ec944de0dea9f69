//! Tick-ordered event scheduling.
//!
//! All timing in a machine is expressed in ticks of the master oscillator
//! (14.31818 MHz on the CoCo 3). The counter is 32 bits wide and wraps; every
//! comparison goes through [`Tick::delta`] so ordering stays correct across
//! the wrap as long as no two live ticks are more than half the range apart.

use std::collections::VecDeque;
use std::ops::Add;

/// Master-clock tick. Wraps at 32 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u32);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Signed distance from `self` to `later`.
    #[inline]
    pub const fn delta(self, later: Tick) -> i32 {
        later.0.wrapping_sub(self.0) as i32
    }

    /// True if `self` is at or before `now`.
    #[inline]
    pub const fn is_due(self, now: Tick) -> bool {
        self.delta(now) >= 0
    }

    /// `self` moved by a signed number of ticks.
    #[inline]
    pub const fn offset(self, delta: i32) -> Tick {
        Tick(self.0.wrapping_add(delta as u32))
    }
}

impl Add<u32> for Tick {
    type Output = Tick;

    #[inline]
    fn add(self, rhs: u32) -> Tick {
        Tick(self.0.wrapping_add(rhs))
    }
}

/// Receives events popped by [`Scheduler::advance`].
///
/// The event is already dequeued when `handle_event` runs, so the handler may
/// schedule the same key again.
pub trait EventHandler<E> {
    fn handle_event(&mut self, event: E, at: Tick, scheduler: &mut Scheduler<E>);
}

#[derive(Clone, Copy, Debug)]
struct Entry<E> {
    at: Tick,
    key: E,
}

/// Pending events ordered by tick, ties in insertion order.
///
/// Each key identifies one event owned by whichever component created it;
/// the queue holds at most one entry per key.
#[derive(Clone, Debug)]
pub struct Scheduler<E> {
    now: Tick,
    queue: VecDeque<Entry<E>>,
}

impl<E: Copy + PartialEq> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Copy + PartialEq> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: Tick::ZERO,
            queue: VecDeque::new(),
        }
    }

    /// Current time.
    #[inline]
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Queue `key` to fire at `at`, replacing any pending entry for it.
    /// A tick already in the past fires on the next `advance`.
    pub fn schedule(&mut self, key: E, at: Tick) {
        self.cancel(key);
        // Insert after every entry due at or before `at`, relative to now so
        // that the comparison survives wraparound.
        let rel = self.now.delta(at);
        let pos = self
            .queue
            .iter()
            .position(|e| self.now.delta(e.at) > rel)
            .unwrap_or(self.queue.len());
        self.queue.insert(pos, Entry { at, key });
    }

    /// Queue `key` to fire `delta` ticks from now.
    pub fn schedule_in(&mut self, key: E, delta: u32) {
        self.schedule(key, self.now + delta);
    }

    /// Remove `key` if queued.
    pub fn cancel(&mut self, key: E) {
        if let Some(pos) = self.queue.iter().position(|e| e.key == key) {
            self.queue.remove(pos);
        }
    }

    pub fn is_queued(&self, key: E) -> bool {
        self.queue.iter().any(|e| e.key == key)
    }

    pub fn scheduled_at(&self, key: E) -> Option<Tick> {
        self.queue.iter().find(|e| e.key == key).map(|e| e.at)
    }

    /// Tick of the earliest pending event.
    pub fn next_due(&self) -> Option<Tick> {
        self.queue.front().map(|e| e.at)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Dequeue the head if it is due at the current time.
    pub fn pop_due(&mut self) -> Option<(E, Tick)> {
        let head = self.queue.front()?;
        if !head.at.is_due(self.now) {
            return None;
        }
        self.queue.pop_front().map(|e| (e.key, e.at))
    }

    /// Move time to `now` and dispatch every event due by then, in order.
    pub fn advance<H: EventHandler<E> + ?Sized>(&mut self, now: Tick, handler: &mut H) {
        self.now = now;
        while let Some((key, at)) = self.pop_due() {
            handler.handle_event(key, at, self);
        }
    }

    /// Set the current time without dispatching anything.
    pub fn set_now(&mut self, now: Tick) {
        self.now = now;
    }

    /// Drop all pending events.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Pending events as offsets from the current time, in queue order.
    pub fn snapshot(&self) -> Vec<(E, i32)> {
        self.queue
            .iter()
            .map(|e| (e.key, self.now.delta(e.at)))
            .collect()
    }

    /// Replace the queue with `pending`, rebased onto `now`.
    pub fn restore(&mut self, now: Tick, pending: &[(E, i32)]) {
        self.now = now;
        self.queue.clear();
        for &(key, delta) in pending {
            self.schedule(key, now.offset(delta));
        }
    }
}
