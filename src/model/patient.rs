use crate::core::types::{ResourceId, SimTime};
use serde::Serialize;

/// A patient moving through the department during one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub id: u64,
    /// Drawn once at creation; decides the final station of the pathway
    pub takes_branch: bool,
    pub arrival_time: SimTime,
    pub exit_time: Option<SimTime>,
    queue_times: Vec<Option<SimTime>>,
}

impl Patient {
    pub fn new(id: u64, takes_branch: bool, arrival_time: SimTime, stations: usize) -> Self {
        Self {
            id,
            takes_branch,
            arrival_time,
            exit_time: None,
            queue_times: vec![None; stations],
        }
    }

    pub fn record_wait(&mut self, station: ResourceId, waited: SimTime) {
        if let Some(slot) = self.queue_times.get_mut(station.index()) {
            *slot = Some(waited);
        }
    }

    pub fn queue_time(&self, station: ResourceId) -> Option<SimTime> {
        self.queue_times.get(station.index()).copied().flatten()
    }

    /// Freeze the patient into an observation once the journey is over
    pub fn into_record(self, run: usize) -> ObservationRecord {
        ObservationRecord {
            run,
            patient_id: self.id,
            arrival_time: self.arrival_time,
            exit_time: self.exit_time.unwrap_or(self.arrival_time),
            queue_times: self.queue_times,
        }
    }
}

/// Queueing delays of one patient whose journey completed after warm-up.
///
/// `queue_times` has one entry per configured station, in configuration
/// order; stations the patient never visited are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationRecord {
    pub run: usize,
    pub patient_id: u64,
    pub arrival_time: SimTime,
    pub exit_time: SimTime,
    pub queue_times: Vec<Option<SimTime>>,
}

impl ObservationRecord {
    pub fn queue_time(&self, station: usize) -> Option<SimTime> {
        self.queue_times.get(station).copied().flatten()
    }

    /// Time from arrival to leaving the last station
    pub fn time_in_system(&self) -> SimTime {
        self.exit_time - self.arrival_time
    }
}
