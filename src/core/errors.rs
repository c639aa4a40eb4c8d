use super::types::{ProcessId, ResourceId, SimTime};
use crate::model::config::ConfigError;
use thiserror::Error;

/// Errors raised by the simulation engine and the processes it drives.
///
/// Every variant is fatal to the run that produced it: the engine never
/// retries and never swallows an error coming out of a process.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("resource pool '{name}' must have a positive capacity")]
    InvalidCapacity { name: String },

    #[error("cannot schedule with delay {delay} (must be finite and non-negative)")]
    InvalidDelay { delay: SimTime },

    #[error("process {0} has already completed and cannot be resumed")]
    ProcessCompleted(ProcessId),

    #[error("process {0} is not registered with this engine")]
    UnknownProcess(ProcessId),

    #[error("resource '{0}' is not registered with this engine")]
    UnknownResource(String),

    #[error("resource '{0}' is registered twice")]
    DuplicateResource(String),

    #[error("grant {serial} is not currently held on resource {resource}")]
    GrantNotHeld { resource: ResourceId, serial: u64 },

    #[error("process {0} resumed after a resource wait without a grant")]
    NoGrantDelivered(ProcessId),

    #[error("variate sampling failed: {0}")]
    Sampling(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("could not build replicate thread pool: {0}")]
    ThreadPool(String),

    #[error("run {run} failed: {source}")]
    RunFailed {
        run: usize,
        #[source]
        source: Box<SimError>,
    },
}
