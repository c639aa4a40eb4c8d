use super::errors::SimError;
use super::types::{ProcessId, ResourceId, SimTime};
use log::debug;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Proof that a process holds one slot of a resource pool.
///
/// Grants cannot be cloned; handing one back through `release` consumes it.
#[derive(Debug, PartialEq)]
pub struct Grant {
    resource: ResourceId,
    holder: ProcessId,
    serial: u64,
    requested_at: SimTime,
    granted_at: SimTime,
}

impl Grant {
    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn holder(&self) -> ProcessId {
        self.holder
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn requested_at(&self) -> SimTime {
        self.requested_at
    }

    pub fn granted_at(&self) -> SimTime {
        self.granted_at
    }

    /// Time spent in the wait queue before the slot was granted
    pub fn waited(&self) -> SimTime {
        self.granted_at - self.requested_at
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    process: ProcessId,
    requested_at: SimTime,
}

/// A named group of identical servers with a strict FIFO wait queue.
#[derive(Debug)]
pub struct ResourcePool {
    id: ResourceId,
    name: String,
    capacity: usize,
    in_use: usize,
    wait_queue: VecDeque<PendingRequest>,
    held: BTreeSet<u64>,
    next_serial: u64,
    peak_in_use: usize,
    peak_queue_len: usize,
    grants_issued: u64,
}

impl ResourcePool {
    /// Create a pool. A zero capacity is a configuration error.
    pub fn new(id: ResourceId, name: impl Into<String>, capacity: usize) -> Result<Self, SimError> {
        let name = name.into();
        if capacity == 0 {
            return Err(SimError::InvalidCapacity { name });
        }

        Ok(Self {
            id,
            name,
            capacity,
            in_use: 0,
            wait_queue: VecDeque::new(),
            held: BTreeSet::new(),
            next_serial: 0,
            peak_in_use: 0,
            peak_queue_len: 0,
            grants_issued: 0,
        })
    }

    /// Ask for a slot on behalf of `process`.
    ///
    /// Returns the grant straight away when a slot is free; otherwise the
    /// request joins the back of the wait queue and `None` is returned.
    pub fn request(&mut self, process: ProcessId, now: SimTime) -> Option<Grant> {
        let request = PendingRequest {
            process,
            requested_at: now,
        };

        if self.in_use < self.capacity {
            return Some(self.grant(request, now));
        }

        self.wait_queue.push_back(request);
        self.peak_queue_len = self.peak_queue_len.max(self.wait_queue.len());
        debug!(
            "[{}] {} queued at {:.3} ({} waiting)",
            self.name,
            process,
            now,
            self.wait_queue.len()
        );
        None
    }

    /// Return a slot to the pool.
    ///
    /// If anyone is waiting, the freed slot goes to the earliest request and
    /// that request's grant is returned so the caller can wake its process.
    pub fn release(&mut self, grant: Grant, now: SimTime) -> Result<Option<Grant>, SimError> {
        self.release_serial(grant.resource, grant.serial, now)
    }

    pub(crate) fn release_serial(
        &mut self,
        resource: ResourceId,
        serial: u64,
        now: SimTime,
    ) -> Result<Option<Grant>, SimError> {
        if resource != self.id || !self.held.remove(&serial) {
            return Err(SimError::GrantNotHeld { resource, serial });
        }
        self.in_use -= 1;

        Ok(self
            .wait_queue
            .pop_front()
            .map(|request| self.grant(request, now)))
    }

    fn grant(&mut self, request: PendingRequest, now: SimTime) -> Grant {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.in_use += 1;
        self.held.insert(serial);
        self.grants_issued += 1;
        self.peak_in_use = self.peak_in_use.max(self.in_use);

        debug!(
            "[{}] {} granted slot at {:.3} after waiting {:.3}",
            self.name,
            request.process,
            now,
            now - request.requested_at
        );

        Grant {
            resource: self.id,
            holder: request.process,
            serial,
            requested_at: request.requested_at,
            granted_at: now,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn queue_len(&self) -> usize {
        self.wait_queue.len()
    }

    pub fn peak_in_use(&self) -> usize {
        self.peak_in_use
    }

    pub fn peak_queue_len(&self) -> usize {
        self.peak_queue_len
    }

    pub fn grants_issued(&self) -> u64 {
        self.grants_issued
    }
}

/// The resource pools of one engine, addressable by id or by name
#[derive(Debug, Default)]
pub struct ResourceSet {
    pools: Vec<ResourcePool>,
    by_name: HashMap<String, ResourceId>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pool; ids are handed out in insertion order
    pub fn add(&mut self, name: &str, capacity: usize) -> Result<ResourceId, SimError> {
        if self.by_name.contains_key(name) {
            return Err(SimError::DuplicateResource(name.to_string()));
        }
        let id = ResourceId(self.pools.len());
        self.pools.push(ResourcePool::new(id, name, capacity)?);
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn get(&self, id: ResourceId) -> Option<&ResourcePool> {
        self.pools.get(id.0)
    }

    pub fn get_mut(&mut self, id: ResourceId) -> Option<&mut ResourcePool> {
        self.pools.get_mut(id.0)
    }

    pub fn id_of(&self, name: &str) -> Option<ResourceId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourcePool> {
        self.pools.iter()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
