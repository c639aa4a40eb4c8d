use crate::core::execution::{ConcurrencyMode, ExecutionConfig};
use crate::core::types::SimTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("at least one station must be configured")]
    NoStations,
    #[error("station '{0}' is configured more than once")]
    DuplicateStation(String),
    #[error("station '{0}' must have a positive capacity")]
    NonPositiveCapacity(String),
    #[error("{what} must be finite and positive, got {value}")]
    NonPositiveMean { what: String, value: f64 },
    #[error("branch probability must lie in [0, 1], got {0}")]
    ProbabilityOutOfRange(f64),
    #[error("percentile must lie strictly between 0 and 100, got {0}")]
    PercentileOutOfRange(f64),
    #[error("{what} must be finite and non-negative, got {value}")]
    InvalidDuration { what: String, value: f64 },
    #[error("measurement duration must be positive")]
    EmptyMeasurement,
    #[error("{context} refers to unknown station '{station}'")]
    UnknownStation { context: String, station: String },
    #[error("station '{0}' appears more than once in a pathway")]
    RepeatedStation(String),
}

/// One staffed service point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    pub name: String,
    pub capacity: usize,
    pub mean_service: SimTime,
}

impl StationConfig {
    pub fn new(name: &str, capacity: usize, mean_service: SimTime) -> Self {
        Self {
            name: name.to_string(),
            capacity,
            mean_service,
        }
    }
}

/// Route a patient takes: every shared station in order, then one final
/// station picked by a coin drawn when the patient is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayConfig {
    pub shared: Vec<String>,
    pub default_final: String,
    pub branch_final: String,
    pub branch_probability: f64,
}

/// Periodic removal of one server from a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnavailabilityConfig {
    pub station: String,
    /// Time between the server returning and leaving again
    pub every: SimTime,
    /// How long the server is away once it has left
    pub duration: SimTime,
}

/// Everything a trial needs. Immutable once handed to a `Trial`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialConfig {
    pub stations: Vec<StationConfig>,
    pub pathway: PathwayConfig,
    pub mean_interarrival: SimTime,
    pub warm_up: SimTime,
    pub measurement: SimTime,
    pub number_of_runs: usize,
    pub percentile: f64,
    pub seed: u64,
    #[serde(default)]
    pub unavailability: Vec<UnavailabilityConfig>,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            stations: vec![
                StationConfig::new("Registration", 1, 2.0),
                StationConfig::new("Triage", 2, 5.0),
                StationConfig::new("ED_Assessment", 2, 30.0),
                StationConfig::new("ACU_Assessment", 1, 60.0),
            ],
            pathway: PathwayConfig {
                shared: vec!["Registration".to_string(), "Triage".to_string()],
                default_final: "ED_Assessment".to_string(),
                branch_final: "ACU_Assessment".to_string(),
                branch_probability: 0.2,
            },
            mean_interarrival: 8.0,
            warm_up: 1440.0,
            measurement: 2880.0,
            number_of_runs: 100,
            percentile: 90.0,
            seed: 42,
            unavailability: Vec::new(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl TrialConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the station table and pathway together
    pub fn with_topology(mut self, stations: Vec<StationConfig>, pathway: PathwayConfig) -> Self {
        self.stations = stations;
        self.pathway = pathway;
        self
    }

    /// Change the staffing of an existing station. An unknown name leaves
    /// the station table untouched.
    pub fn with_capacity(mut self, station: &str, capacity: usize) -> Self {
        if let Some(s) = self.stations.iter_mut().find(|s| s.name == station) {
            s.capacity = capacity;
        }
        self
    }

    pub fn with_mean_interarrival(mut self, mean: SimTime) -> Self {
        self.mean_interarrival = mean;
        self
    }

    pub fn with_branch_probability(mut self, probability: f64) -> Self {
        self.pathway.branch_probability = probability;
        self
    }

    pub fn with_durations(mut self, warm_up: SimTime, measurement: SimTime) -> Self {
        self.warm_up = warm_up;
        self.measurement = measurement;
        self
    }

    pub fn with_runs(mut self, number_of_runs: usize) -> Self {
        self.number_of_runs = number_of_runs;
        self
    }

    pub fn with_percentile(mut self, percentile: f64) -> Self {
        self.percentile = percentile;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_unavailability(mut self, schedule: UnavailabilityConfig) -> Self {
        self.unavailability.push(schedule);
        self
    }

    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.execution.concurrency_mode = mode;
        self
    }

    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.execution.thread_pool_size = Some(size);
        self
    }

    /// Simulated time at which each run stops
    pub fn horizon(&self) -> SimTime {
        self.warm_up + self.measurement
    }

    pub fn station_names(&self) -> Vec<String> {
        self.stations.iter().map(|s| s.name.clone()).collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stations.is_empty() {
            return Err(ConfigError::NoStations);
        }

        let mut seen = HashSet::new();
        for station in &self.stations {
            if !seen.insert(station.name.as_str()) {
                return Err(ConfigError::DuplicateStation(station.name.clone()));
            }
            if station.capacity == 0 {
                return Err(ConfigError::NonPositiveCapacity(station.name.clone()));
            }
            positive(&format!("mean service time of '{}'", station.name), station.mean_service)?;
        }

        positive("mean inter-arrival time", self.mean_interarrival)?;

        let p = self.pathway.branch_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::ProbabilityOutOfRange(p));
        }
        if !(self.percentile > 0.0 && self.percentile < 100.0) {
            return Err(ConfigError::PercentileOutOfRange(self.percentile));
        }

        non_negative("warm-up duration", self.warm_up)?;
        non_negative("measurement duration", self.measurement)?;
        if self.measurement == 0.0 {
            return Err(ConfigError::EmptyMeasurement);
        }

        let pathway_stations = self
            .pathway
            .shared
            .iter()
            .chain([&self.pathway.default_final, &self.pathway.branch_final]);
        for name in pathway_stations {
            if !seen.contains(name.as_str()) {
                return Err(ConfigError::UnknownStation {
                    context: "pathway".to_string(),
                    station: name.clone(),
                });
            }
        }

        // A patient records one wait per station, so no pathway may revisit one
        let mut visited = HashSet::new();
        for name in &self.pathway.shared {
            if !visited.insert(name.as_str()) {
                return Err(ConfigError::RepeatedStation(name.clone()));
            }
        }
        for last in [&self.pathway.default_final, &self.pathway.branch_final] {
            if visited.contains(last.as_str()) {
                return Err(ConfigError::RepeatedStation(last.clone()));
            }
        }

        for schedule in &self.unavailability {
            if !seen.contains(schedule.station.as_str()) {
                return Err(ConfigError::UnknownStation {
                    context: "unavailability schedule".to_string(),
                    station: schedule.station.clone(),
                });
            }
            positive("unavailability interval", schedule.every)?;
            positive("unavailability duration", schedule.duration)?;
        }

        Ok(())
    }
}

fn positive(what: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveMean {
            what: what.to_string(),
            value,
        })
    }
}

fn non_negative(what: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDuration {
            what: what.to_string(),
            value,
        })
    }
}
