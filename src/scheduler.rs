use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

/// Handle of a scheduled callback.
#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone, PartialOrd, Ord)]
pub struct EventId(u64);

impl EventId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Time service driving every callback of the MAC.
///
/// Callbacks are delivered in non-decreasing deadline order, callbacks for the same instant
/// in submission order. Cancelling a fired or cancelled handle does nothing.
pub trait Scheduler {
    fn now(&self) -> Duration;

    /// Requests a callback at `now + delay`. Returns the handle used to cancel it.
    fn schedule(&mut self, delay: Duration) -> EventId;

    fn cancel(&mut self, event_id: EventId);
}

/// Maps scheduled handles to the event they stand for.
///
/// The owner hands every fired handle to [Timer::triggered]. Events that were cancelled in
/// the meantime come back as `None`.
#[derive(Debug)]
pub struct Timer<E> {
    events: HashMap<EventId, E>,
}

impl<E> Default for Timer<E> {
    fn default() -> Self {
        Self {
            events: HashMap::default(),
        }
    }
}

impl<E> Timer<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triggered(&mut self, event_id: &EventId) -> Option<E> {
        self.events.remove(event_id)
    }

    pub fn schedule_event(
        &mut self,
        scheduler: &mut dyn Scheduler,
        delay: Duration,
        event: E,
    ) -> EventId {
        let event_id = scheduler.schedule(delay);
        self.events.insert(event_id, event);
        event_id
    }

    pub fn cancel_event(&mut self, scheduler: &mut dyn Scheduler, event_id: EventId) {
        if self.events.remove(&event_id).is_some() {
            scheduler.cancel(event_id);
        }
    }

    pub fn cancel_all(&mut self, scheduler: &mut dyn Scheduler) {
        for event_id in self.events.keys() {
            scheduler.cancel(*event_id);
        }
        self.events.clear();
    }

    pub fn is_pending(&self, event_id: &EventId) -> bool {
        self.events.contains_key(event_id)
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }
}

/// Deterministic scheduler, time only moves when the owner advances it.
///
/// Handles are handed out in increasing order, so ordering the queue by (deadline, handle)
/// yields submission order among callbacks due at the same instant.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Duration,
    next_id: u64,
    queue: BTreeSet<(Duration, EventId)>,
    deadlines: HashMap<EventId, Duration>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pops the earliest callback due at or before `until` and moves the clock to its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<EventId> {
        let (deadline, event_id) = *self.queue.iter().next()?;
        if deadline > until {
            return None;
        }
        self.queue.remove(&(deadline, event_id));
        self.deadlines.remove(&event_id);
        self.now = self.now.max(deadline);
        Some(event_id)
    }

    /// Moves the clock forward without firing anything. Never moves it backwards.
    pub fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(time);
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.iter().next().map(|(deadline, _)| *deadline)
    }

    pub fn deadline(&self, event_id: &EventId) -> Option<Duration> {
        self.deadlines.get(event_id).copied()
    }

    pub fn is_pending(&self, event_id: &EventId) -> bool {
        self.deadlines.contains_key(event_id)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Scheduler for VirtualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule(&mut self, delay: Duration) -> EventId {
        self.next_id += 1;
        let event_id = EventId(self.next_id);
        let deadline = self.now + delay;
        self.queue.insert((deadline, event_id));
        self.deadlines.insert(event_id, deadline);
        event_id
    }

    fn cancel(&mut self, event_id: EventId) {
        if let Some(deadline) = self.deadlines.remove(&event_id) {
            self.queue.remove(&(deadline, event_id));
        }
    }
}
