use super::types::{ProcessId, SimTime};

/// A pending resumption of a process at a point in simulated time.
///
/// Events are ordered by `(due_time, sequence)`; `sequence` is assigned by the
/// scheduler at insertion so that events due at the same instant fire in the
/// order they were scheduled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub due_time: SimTime,
    pub sequence: u64,
    pub process: ProcessId,
}

impl Event {
    pub fn new(due_time: SimTime, sequence: u64, process: ProcessId) -> Self {
        Self {
            due_time,
            sequence,
            process,
        }
    }
}
