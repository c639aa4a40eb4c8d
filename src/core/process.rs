use super::errors::SimError;
use super::event_scheduler::EventScheduler;
use super::resource::{Grant, ResourcePool, ResourceSet};
use super::types::{ProcessId, ResourceId, SimTime};
use log::{debug, warn};

/// What a process asks the engine to do when it gives up control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Suspend {
    /// Resume this process after `delay` time units
    Hold(SimTime),
    /// Resume this process once it holds a slot of the resource
    Acquire(ResourceId),
    /// The process is finished and must never be resumed again
    Complete,
}

/// Why a suspended process is not runnable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    Timer,
    Resource(ResourceId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Runnable,
    Running,
    Suspended(WaitReason),
    Completed,
}

/// A cooperatively scheduled activity.
///
/// Implementations are explicit state machines: `resume` picks up from
/// wherever the previous call left off, runs without interruption, and
/// returns the next suspension point. All state that must survive a
/// suspension lives in `self`.
pub trait Process<W> {
    fn resume(&mut self, ctx: &mut ProcessContext<'_, W>) -> Result<Suspend, SimError>;

    /// Label used in log output
    fn name(&self) -> &str {
        "process"
    }
}

pub(crate) struct ProcessSlot<W> {
    process: Option<Box<dyn Process<W>>>,
    state: ProcessState,
    delivered: Option<Grant>,
    held: Vec<(ResourceId, u64)>,
}

/// All processes of one engine, indexed by `ProcessId`
pub(crate) struct ProcessTable<W> {
    slots: Vec<ProcessSlot<W>>,
}

impl<W> ProcessTable<W> {
    pub(crate) fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Register a process and make it runnable at the current instant
    pub(crate) fn spawn(
        &mut self,
        process: Box<dyn Process<W>>,
        scheduler: &mut EventScheduler,
    ) -> Result<ProcessId, SimError> {
        let pid = ProcessId(self.slots.len());
        debug!("spawning {} '{}' at {:.3}", pid, process.name(), scheduler.now());
        self.slots.push(ProcessSlot {
            process: Some(process),
            state: ProcessState::Runnable,
            delivered: None,
            held: Vec::new(),
        });
        scheduler.schedule(0.0, pid)?;
        Ok(pid)
    }

    pub(crate) fn state(&self, pid: ProcessId) -> Option<ProcessState> {
        self.slots.get(pid.0).map(|slot| slot.state)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    fn slot_mut(&mut self, pid: ProcessId) -> Result<&mut ProcessSlot<W>, SimError> {
        self.slots.get_mut(pid.0).ok_or(SimError::UnknownProcess(pid))
    }

    /// Take the process out of its slot so it can run while the rest of the
    /// engine stays borrowable.
    pub(crate) fn check_out(&mut self, pid: ProcessId) -> Result<Box<dyn Process<W>>, SimError> {
        let slot = self.slot_mut(pid)?;
        if slot.state == ProcessState::Completed {
            return Err(SimError::ProcessCompleted(pid));
        }
        let process = slot.process.take().ok_or(SimError::ProcessCompleted(pid))?;
        slot.state = ProcessState::Running;
        Ok(process)
    }

    pub(crate) fn check_in(
        &mut self,
        pid: ProcessId,
        process: Box<dyn Process<W>>,
        state: ProcessState,
    ) -> Result<(), SimError> {
        let slot = self.slot_mut(pid)?;
        slot.process = Some(process);
        slot.state = state;
        Ok(())
    }

    /// Hand a grant to its holder without scheduling anything.
    pub(crate) fn deliver(&mut self, grant: Grant) -> Result<(), SimError> {
        let slot = self.slot_mut(grant.holder())?;
        slot.held.push((grant.resource(), grant.serial()));
        slot.delivered = Some(grant);
        Ok(())
    }

    /// Hand a grant to a process waiting on a resource and make it runnable
    /// at the current instant.
    pub(crate) fn wake_with(
        &mut self,
        grant: Grant,
        scheduler: &mut EventScheduler,
    ) -> Result<(), SimError> {
        let pid = grant.holder();
        self.deliver(grant)?;
        self.slot_mut(pid)?.state = ProcessState::Runnable;
        scheduler.schedule(0.0, pid)?;
        Ok(())
    }

    pub(crate) fn take_delivered(&mut self, pid: ProcessId) -> Option<Grant> {
        self.slots.get_mut(pid.0).and_then(|slot| slot.delivered.take())
    }

    /// Release one slot on behalf of `holder` and pass it on to the next
    /// waiter, if any.
    pub(crate) fn release(
        &mut self,
        resources: &mut ResourceSet,
        scheduler: &mut EventScheduler,
        holder: ProcessId,
        resource: ResourceId,
        serial: u64,
    ) -> Result<(), SimError> {
        let pool = resources
            .get_mut(resource)
            .ok_or_else(|| SimError::UnknownResource(resource.to_string()))?;
        let next = pool.release_serial(resource, serial, scheduler.now())?;

        if let Ok(slot) = self.slot_mut(holder) {
            slot.held.retain(|key| *key != (resource, serial));
        }
        if let Some(next) = next {
            self.wake_with(next, scheduler)?;
        }
        Ok(())
    }

    /// Mark a process completed, dropping its logic and releasing any slots
    /// it never handed back.
    pub(crate) fn complete(
        &mut self,
        pid: ProcessId,
        resources: &mut ResourceSet,
        scheduler: &mut EventScheduler,
    ) -> Result<(), SimError> {
        let slot = self.slot_mut(pid)?;
        slot.state = ProcessState::Completed;
        slot.process = None;
        slot.delivered = None;
        let leftover = std::mem::take(&mut slot.held);

        for (resource, serial) in leftover {
            warn!(
                "{} completed while holding grant {} on {}; releasing it",
                pid, serial, resource
            );
            self.release(resources, scheduler, pid, resource, serial)?;
        }
        Ok(())
    }
}

/// The view of the engine a process gets while it runs.
pub struct ProcessContext<'a, W> {
    pub(crate) pid: ProcessId,
    pub(crate) world: &'a mut W,
    pub(crate) scheduler: &'a mut EventScheduler,
    pub(crate) table: &'a mut ProcessTable<W>,
    pub(crate) resources: &'a mut ResourceSet,
}

impl<'a, W> ProcessContext<'a, W> {
    /// Id of the running process
    pub fn id(&self) -> ProcessId {
        self.pid
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    /// Shared state of the simulation
    pub fn world(&mut self) -> &mut W {
        self.world
    }

    /// Start another process. It first runs at the current instant, after
    /// everything already scheduled for this instant.
    pub fn spawn(&mut self, process: Box<dyn Process<W>>) -> Result<ProcessId, SimError> {
        self.table.spawn(process, self.scheduler)
    }

    /// The grant obtained by the last `Suspend::Acquire`, if not yet taken
    pub fn take_grant(&mut self) -> Option<Grant> {
        self.table.take_delivered(self.pid)
    }

    /// Like `take_grant`, but a missing grant is an error
    pub fn expect_grant(&mut self) -> Result<Grant, SimError> {
        self.take_grant().ok_or(SimError::NoGrantDelivered(self.pid))
    }

    /// Hand a slot back to its pool
    pub fn release(&mut self, grant: Grant) -> Result<(), SimError> {
        let holder = grant.holder();
        let (resource, serial) = (grant.resource(), grant.serial());
        if self.resources.get(resource).is_none() {
            return Err(SimError::GrantNotHeld { resource, serial });
        }
        self.table
            .release(self.resources, self.scheduler, holder, resource, serial)
    }

    pub fn resource_id(&self, name: &str) -> Result<ResourceId, SimError> {
        self.resources
            .id_of(name)
            .ok_or_else(|| SimError::UnknownResource(name.to_string()))
    }

    pub fn resource(&self, id: ResourceId) -> Option<&ResourcePool> {
        self.resources.get(id)
    }
}
