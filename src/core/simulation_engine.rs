use super::errors::SimError;
use super::event::Event;
use super::event_scheduler::EventScheduler;
use super::process::{Process, ProcessContext, ProcessState, ProcessTable, Suspend, WaitReason};
use super::resource::{ResourcePool, ResourceSet};
use super::types::{ProcessId, ResourceId, SimTime};
use log::{debug, trace};

/// Observer trait for simulation events
pub trait SimulationObserver {
    /// Called when the simulation clock moves forward
    fn on_time_advance(&mut self, old_time: SimTime, new_time: SimTime);

    /// Called just before the process targeted by `event` is resumed
    fn on_event_fired(&mut self, event: &Event, resources: &ResourceSet);
}

/// Discrete-event engine for one simulated run.
///
/// Owns the clock, the processes, the resource pools and a caller-defined
/// `world` value that every process can reach through its context. Runs are
/// strictly single-threaded: exactly one process executes at a time, and only
/// between its suspension points.
pub struct SimulationEngine<W> {
    scheduler: EventScheduler,
    processes: ProcessTable<W>,
    resources: ResourceSet,
    world: W,
    observers: Vec<Box<dyn SimulationObserver>>,
    events_fired: u64,
}

impl<W> SimulationEngine<W> {
    /// Create an engine with the clock at zero around `world`
    pub fn new(world: W) -> Self {
        Self {
            scheduler: EventScheduler::new(),
            processes: ProcessTable::new(),
            resources: ResourceSet::new(),
            world,
            observers: Vec::new(),
            events_fired: 0,
        }
    }

    /// Create an engine around `world` with pools that were set up beforehand
    pub fn with_resources(world: W, resources: ResourceSet) -> Self {
        Self {
            resources,
            ..Self::new(world)
        }
    }

    /// Register a resource pool
    pub fn add_resource(&mut self, name: &str, capacity: usize) -> Result<ResourceId, SimError> {
        self.resources.add(name, capacity)
    }

    /// Register a process; it first runs at the current instant
    pub fn spawn(&mut self, process: Box<dyn Process<W>>) -> Result<ProcessId, SimError> {
        self.processes.spawn(process, &mut self.scheduler)
    }

    /// Add an observer to the simulation
    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver>) {
        self.observers.push(observer);
    }

    fn notify_time_advance(&mut self, old_time: SimTime, new_time: SimTime) {
        for observer in &mut self.observers {
            observer.on_time_advance(old_time, new_time);
        }
    }

    fn notify_event_fired(&mut self, event: &Event) {
        for observer in &mut self.observers {
            observer.on_event_fired(event, &self.resources);
        }
    }

    /// Fire the earliest pending event. Returns false when nothing is left.
    pub fn advance(&mut self) -> Result<bool, SimError> {
        let old_time = self.scheduler.now();
        let Some(event) = self.scheduler.pop() else {
            return Ok(false);
        };

        if event.due_time > old_time {
            self.notify_time_advance(old_time, event.due_time);
        }
        trace!(
            "t={:.3} firing #{} for {}",
            event.due_time,
            event.sequence,
            event.process
        );
        self.notify_event_fired(&event);
        self.events_fired += 1;

        self.resume(event.process)?;
        Ok(true)
    }

    /// Fire every event due at or before `horizon`, then leave the clock at
    /// `horizon`. Later events stay unfired.
    pub fn run_until(&mut self, horizon: SimTime) -> Result<SimTime, SimError> {
        while let Some(next) = self.scheduler.peek_next_time() {
            if next > horizon {
                break;
            }
            self.advance()?;
        }

        let old_time = self.scheduler.now();
        self.scheduler.advance_to(horizon);
        if self.scheduler.now() > old_time {
            self.notify_time_advance(old_time, self.scheduler.now());
        }

        debug!(
            "stopped at {:.3} after {} events ({} still pending)",
            self.now(),
            self.events_fired,
            self.scheduler.pending()
        );
        Ok(self.now())
    }

    /// Fire events until the queue is empty
    pub fn run(&mut self) -> Result<SimTime, SimError> {
        while self.advance()? {}
        Ok(self.now())
    }

    /// Resume one process and drive it to its next suspension point
    pub(crate) fn resume(&mut self, pid: ProcessId) -> Result<(), SimError> {
        let mut process = self.processes.check_out(pid)?;

        let next_state = self.drive(pid, process.as_mut())?;
        if next_state == ProcessState::Completed {
            debug!("{} '{}' completed at {:.3}", pid, process.name(), self.now());
            drop(process);
            self.processes
                .complete(pid, &mut self.resources, &mut self.scheduler)
        } else {
            self.processes.check_in(pid, process, next_state)
        }
    }

    fn drive(
        &mut self,
        pid: ProcessId,
        process: &mut dyn Process<W>,
    ) -> Result<ProcessState, SimError> {
        loop {
            let step = {
                let mut ctx = ProcessContext {
                    pid,
                    world: &mut self.world,
                    scheduler: &mut self.scheduler,
                    table: &mut self.processes,
                    resources: &mut self.resources,
                };
                process.resume(&mut ctx)?
            };

            match step {
                Suspend::Hold(delay) => {
                    self.scheduler.schedule(delay, pid)?;
                    return Ok(ProcessState::Suspended(WaitReason::Timer));
                }
                Suspend::Acquire(resource) => {
                    let now = self.scheduler.now();
                    let pool = self
                        .resources
                        .get_mut(resource)
                        .ok_or_else(|| SimError::UnknownResource(resource.to_string()))?;
                    match pool.request(pid, now) {
                        // Free slot: keep running in the same instant
                        Some(grant) => self.processes.deliver(grant)?,
                        None => return Ok(ProcessState::Suspended(WaitReason::Resource(resource))),
                    }
                }
                Suspend::Complete => return Ok(ProcessState::Completed),
            }
        }
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resources.id_of(name)
    }

    pub fn resource(&self, id: ResourceId) -> Option<&ResourcePool> {
        self.resources.get(id)
    }

    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    pub fn process_state(&self, pid: ProcessId) -> Option<ProcessState> {
        self.processes.state(pid)
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn events_fired(&self) -> u64 {
        self.events_fired
    }

    /// Check if there are pending events in the scheduler
    pub fn has_pending_events(&self) -> bool {
        self.scheduler.has_events()
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Tear the engine down, keeping only the world
    pub fn into_world(self) -> W {
        self.world
    }
}
