//! Fixed-capacity priority queue for scheduled events.

use fw_core::ScheduledEvent;
use heapless::Vec;

/// Events sorted by target time, earliest first.
///
/// Storage is inline so pushing and draining never allocate, which lets the
/// audio callback own a queue. Events with equal target times keep their
/// insertion order.
#[derive(Debug)]
pub struct EventQueue<P, const N: usize> {
    events: Vec<ScheduledEvent<P>, N>,
}

impl<P, const N: usize> Default for EventQueue<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, const N: usize> EventQueue<P, N> {
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Insert an event. Hands it back if the queue is full.
    pub fn push(&mut self, event: ScheduledEvent<P>) -> Result<(), ScheduledEvent<P>> {
        if self.events.is_full() {
            return Err(event);
        }
        // Insert after any events with the same target time.
        let pos = self
            .events
            .iter()
            .rposition(|e| e.cmp_time(&event).is_le())
            .map_or(0, |i| i + 1);
        self.events.insert(pos, event)
    }

    /// Peek at the earliest event.
    pub fn peek(&self) -> Option<&ScheduledEvent<P>> {
        self.events.first()
    }

    /// Pop the earliest event.
    pub fn pop(&mut self) -> Option<ScheduledEvent<P>> {
        if self.events.is_empty() {
            None
        } else {
            Some(self.events.remove(0))
        }
    }

    /// Pop the earliest event if its target time is at or before `time`.
    pub fn pop_due(&mut self, time: f64) -> Option<ScheduledEvent<P>> {
        match self.events.first() {
            Some(e) if e.target_time <= time => Some(self.events.remove(0)),
            _ => None,
        }
    }

    /// Remove every event, passing each to `f` in time order.
    pub fn drain_with(&mut self, mut f: impl FnMut(ScheduledEvent<P>)) {
        while let Some(event) = self.pop() {
            f(event);
        }
    }

    /// Events in time order.
    pub fn iter(&self) -> core::slice::Iter<'_, ScheduledEvent<P>> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.events.is_full()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}
