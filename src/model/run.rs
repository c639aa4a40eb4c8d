use super::clinic::{Clinic, Topology};
use super::config::TrialConfig;
use super::generator::ArrivalGenerator;
use super::patient::ObservationRecord;
use super::unavailability::StaffBreak;
use crate::core::errors::SimError;
use crate::core::random::{SeededVariates, VariateSource};
use crate::core::resource::ResourceSet;
use crate::core::simulation_engine::{SimulationEngine, SimulationObserver};
use crate::core::types::SimTime;
use log::{debug, info};
use serde::Serialize;

/// Headline numbers of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run: usize,
    pub seed: u64,
    pub patients_generated: u64,
    pub patients_recorded: usize,
    /// Mean queueing time per station over recorded patients, in station order
    pub mean_queue_times: Vec<Option<SimTime>>,
    pub events_fired: u64,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub summary: RunSummary,
    pub records: Vec<ObservationRecord>,
}

/// Seed used by replicate `run` of a trial seeded with `base`
pub fn run_seed(base: u64, run: usize) -> u64 {
    base.wrapping_add(run as u64)
}

/// Builds and drives the engine for a single replicate.
pub struct RunController<'a> {
    config: &'a TrialConfig,
    run: usize,
    variates: Option<Box<dyn VariateSource>>,
    observers: Vec<Box<dyn SimulationObserver>>,
}

impl<'a> RunController<'a> {
    pub fn new(config: &'a TrialConfig, run: usize) -> Self {
        Self {
            config,
            run,
            variates: None,
            observers: Vec::new(),
        }
    }

    /// Replace the seeded random stream for this run
    pub fn with_variates(mut self, variates: Box<dyn VariateSource>) -> Self {
        self.variates = Some(variates);
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn SimulationObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn seed(&self) -> u64 {
        run_seed(self.config.seed, self.run)
    }

    pub fn execute(self) -> Result<RunOutput, SimError> {
        self.config.validate()?;
        let seed = self.seed();
        let horizon = self.config.horizon();
        info!("run {} starting (seed {}, horizon {:.1})", self.run, seed, horizon);

        let mut resources = ResourceSet::new();
        for station in &self.config.stations {
            resources.add(&station.name, station.capacity)?;
        }
        let topology = Topology::resolve(self.config, &resources)?;
        let variates: Box<dyn VariateSource> = match self.variates {
            Some(variates) => variates,
            None => Box::new(SeededVariates::new(seed)),
        };
        let clinic = Clinic::new(self.run, self.config.warm_up, topology, variates);

        let mut engine = SimulationEngine::with_resources(clinic, resources);
        for observer in self.observers {
            engine.add_observer(observer);
        }

        engine.spawn(Box::new(ArrivalGenerator::new()))?;
        for schedule in &self.config.unavailability {
            let station = engine
                .resource_id(&schedule.station)
                .ok_or_else(|| SimError::UnknownResource(schedule.station.clone()))?;
            engine.spawn(Box::new(StaffBreak::new(station, schedule.every, schedule.duration)))?;
        }

        engine.run_until(horizon)?;

        for pool in engine.resources().iter() {
            debug!(
                "run {} {}: {} grants, peak in use {}/{}, peak queue {}",
                self.run,
                pool.name(),
                pool.grants_issued(),
                pool.peak_in_use(),
                pool.capacity(),
                pool.peak_queue_len()
            );
        }

        let events_fired = engine.events_fired();
        let clinic = engine.into_world();
        let patients_generated = clinic.patients_generated();
        let records = clinic.into_records();
        let mean_queue_times = (0..self.config.stations.len())
            .map(|station| {
                crate::stats::mean(records.iter().filter_map(|r| r.queue_time(station)))
            })
            .collect();

        info!(
            "run {} finished: {} patients generated, {} recorded",
            self.run,
            patients_generated,
            records.len()
        );

        Ok(RunOutput {
            summary: RunSummary {
                run: self.run,
                seed,
                patients_generated,
                patients_recorded: records.len(),
                mean_queue_times,
                events_fired,
            },
            records,
        })
    }
}
