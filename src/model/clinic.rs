use super::config::TrialConfig;
use super::patient::ObservationRecord;
use crate::core::errors::SimError;
use crate::core::random::VariateSource;
use crate::core::resource::ResourceSet;
use crate::core::types::{ResourceId, SimTime};

/// Station table and pathway resolved against the pools of one engine
#[derive(Debug, Clone)]
pub struct Topology {
    mean_service: Vec<SimTime>,
    shared: Vec<ResourceId>,
    default_final: ResourceId,
    branch_final: ResourceId,
    branch_probability: f64,
    mean_interarrival: SimTime,
}

impl Topology {
    pub fn resolve(config: &TrialConfig, resources: &ResourceSet) -> Result<Self, SimError> {
        let lookup = |name: &str| {
            resources
                .id_of(name)
                .ok_or_else(|| SimError::UnknownResource(name.to_string()))
        };

        let mut mean_service = vec![0.0; resources.len()];
        for station in &config.stations {
            mean_service[lookup(station.name.as_str())?.index()] = station.mean_service;
        }

        Ok(Self {
            mean_service,
            shared: config
                .pathway
                .shared
                .iter()
                .map(|name| lookup(name.as_str()))
                .collect::<Result<_, _>>()?,
            default_final: lookup(config.pathway.default_final.as_str())?,
            branch_final: lookup(config.pathway.branch_final.as_str())?,
            branch_probability: config.pathway.branch_probability,
            mean_interarrival: config.mean_interarrival,
        })
    }

    /// Stations visited, in order, by a patient with the given branch flag
    pub fn pathway(&self, takes_branch: bool) -> Vec<ResourceId> {
        let last = if takes_branch {
            self.branch_final
        } else {
            self.default_final
        };
        self.shared.iter().copied().chain(std::iter::once(last)).collect()
    }

    pub fn mean_service(&self, station: ResourceId) -> Result<SimTime, SimError> {
        self.mean_service
            .get(station.index())
            .copied()
            .ok_or_else(|| SimError::UnknownResource(station.to_string()))
    }

    pub fn branch_probability(&self) -> f64 {
        self.branch_probability
    }

    pub fn mean_interarrival(&self) -> SimTime {
        self.mean_interarrival
    }

    pub fn station_count(&self) -> usize {
        self.mean_service.len()
    }
}

/// Shared state of one emergency-department run
pub struct Clinic {
    run: usize,
    warm_up: SimTime,
    topology: Topology,
    variates: Box<dyn VariateSource>,
    records: Vec<ObservationRecord>,
    patients_generated: u64,
}

impl Clinic {
    pub fn new(
        run: usize,
        warm_up: SimTime,
        topology: Topology,
        variates: Box<dyn VariateSource>,
    ) -> Self {
        Self {
            run,
            warm_up,
            topology,
            variates,
            records: Vec::new(),
            patients_generated: 0,
        }
    }

    pub fn run(&self) -> usize {
        self.run
    }

    pub fn warm_up(&self) -> SimTime {
        self.warm_up
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn variates(&mut self) -> &mut dyn VariateSource {
        self.variates.as_mut()
    }

    /// Hand out the next patient id, starting from 1
    pub fn next_patient_id(&mut self) -> u64 {
        self.patients_generated += 1;
        self.patients_generated
    }

    pub fn patients_generated(&self) -> u64 {
        self.patients_generated
    }

    /// Observation sink
    pub fn record(&mut self, record: ObservationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ObservationRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::DeterministicVariates;

    fn default_clinic() -> (Clinic, ResourceSet) {
        let config = TrialConfig::default();
        let mut resources = ResourceSet::new();
        for station in &config.stations {
            resources.add(&station.name, station.capacity).unwrap();
        }
        let topology = Topology::resolve(&config, &resources).unwrap();
        let clinic = Clinic::new(2, config.warm_up, topology, Box::new(DeterministicVariates));
        (clinic, resources)
    }

    #[test]
    fn test_pathways_end_at_the_drawn_final_station() {
        let (clinic, resources) = default_clinic();
        let id = |name: &str| resources.id_of(name).unwrap();
        let topology = clinic.topology();

        assert_eq!(
            topology.pathway(false),
            vec![id("Registration"), id("Triage"), id("ED_Assessment")]
        );
        assert_eq!(
            topology.pathway(true),
            vec![id("Registration"), id("Triage"), id("ACU_Assessment")]
        );
        assert_eq!(topology.mean_service(id("ACU_Assessment")).unwrap(), 60.0);
        assert_eq!(topology.station_count(), 4);
    }

    #[test]
    fn test_ids_and_records_accumulate() {
        let (mut clinic, _) = default_clinic();
        assert_eq!(clinic.run(), 2);
        assert_eq!(clinic.warm_up(), 1440.0);
        assert_eq!(clinic.next_patient_id(), 1);
        assert_eq!(clinic.next_patient_id(), 2);
        assert_eq!(clinic.patients_generated(), 2);
        assert!(clinic.records().is_empty());

        clinic.record(ObservationRecord {
            run: 2,
            patient_id: 1,
            arrival_time: 1500.0,
            exit_time: 1530.0,
            queue_times: vec![Some(0.5), Some(2.0), None, Some(7.0)],
        });

        assert_eq!(clinic.records().len(), 1);
        assert_eq!(clinic.records()[0].queue_time(3), Some(7.0));
        assert_eq!(clinic.into_records().len(), 1);
    }
}
