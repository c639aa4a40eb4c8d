//! Emergency-department queueing model built on the simulation core.

pub mod clinic;
pub mod config;
pub mod generator;
pub mod journey;
pub mod patient;
pub mod run;
pub mod trial;
pub mod unavailability;

pub use config::{ConfigError, PathwayConfig, StationConfig, TrialConfig, UnavailabilityConfig};
pub use patient::ObservationRecord;
pub use run::{RunController, RunOutput, RunSummary};
pub use trial::Trial;
