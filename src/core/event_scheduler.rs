use super::errors::SimError;
use super::event::Event;
use super::types::{ProcessId, SimTime};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
struct ScheduledEvent(Event);

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .0
            .due_time
            .total_cmp(&self.0.due_time)
            .then_with(|| other.0.sequence.cmp(&self.0.sequence))
    }
}

/// The simulation clock together with its pending event queue.
pub struct EventScheduler {
    event_queue: BinaryHeap<ScheduledEvent>,
    sequence_counter: u64,
    now: SimTime,
}

impl EventScheduler {
    /// Create a new EventScheduler with the clock at zero
    pub fn new() -> Self {
        Self {
            event_queue: BinaryHeap::new(),
            sequence_counter: 0,
            now: 0.0,
        }
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedule `process` to be resumed `delay` time units from now
    pub fn schedule(&mut self, delay: SimTime, process: ProcessId) -> Result<Event, SimError> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(SimError::InvalidDelay { delay });
        }

        let event = Event::new(self.now + delay, self.sequence_counter, process);
        self.event_queue.push(ScheduledEvent(event));
        self.sequence_counter += 1;

        Ok(event)
    }

    /// Remove the earliest pending event and move the clock to its due time
    pub fn pop(&mut self) -> Option<Event> {
        let ScheduledEvent(event) = self.event_queue.pop()?;
        // Due times are never in the past, so this cannot move the clock backwards
        self.now = self.now.max(event.due_time);
        Some(event)
    }

    /// Due time of the earliest pending event without removing it
    pub fn peek_next_time(&self) -> Option<SimTime> {
        self.event_queue.peek().map(|scheduled| scheduled.0.due_time)
    }

    /// Move the clock forward to `time` without firing anything.
    /// Times earlier than the current clock are ignored.
    pub fn advance_to(&mut self, time: SimTime) {
        if time > self.now {
            self.now = time;
        }
    }

    /// Check if there are any events remaining in the queue
    pub fn has_events(&self) -> bool {
        !self.event_queue.is_empty()
    }

    /// Number of pending events
    pub fn pending(&self) -> usize {
        self.event_queue.len()
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}
