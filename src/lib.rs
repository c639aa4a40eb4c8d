pub mod core;
pub mod model;
pub mod stats;

// Re-export commonly used types
pub use crate::core::errors::SimError;
pub use crate::core::event::Event;
pub use crate::core::process::{Process, ProcessContext, ProcessState, Suspend, WaitReason};
pub use crate::core::random::{
    DeterministicVariates, ScriptedVariates, SeededVariates, VariateSource,
};
pub use crate::core::resource::{Grant, ResourcePool};
pub use crate::core::simulation_engine::{SimulationEngine, SimulationObserver};
pub use crate::core::types::{ProcessId, ResourceId, SimTime};
pub use crate::model::{Trial, TrialConfig};
pub use crate::stats::TrialResults;
