use edsim::core::execution::ConcurrencyMode;
use edsim::core::resource::ResourceSet;
use edsim::model::{ConfigError, PathwayConfig, RunController, StationConfig, UnavailabilityConfig};
use edsim::{
    DeterministicVariates, Event, Process, ProcessContext, ScriptedVariates, SimError, SimTime,
    SimulationEngine, SimulationObserver, Suspend, Trial, TrialConfig, VariateSource,
};
use std::cell::Cell;
use std::rc::Rc;

/// One station that every patient visits, whichever way the coin falls
fn single_desk(capacity: usize, mean_service: SimTime) -> TrialConfig {
    TrialConfig::new().with_topology(
        vec![StationConfig::new("Desk", capacity, mean_service)],
        PathwayConfig {
            shared: Vec::new(),
            default_final: "Desk".to_string(),
            branch_final: "Desk".to_string(),
            branch_probability: 0.2,
        },
    )
}

fn small_trial(runs: usize) -> TrialConfig {
    TrialConfig::new()
        .with_durations(120.0, 480.0)
        .with_runs(runs)
        .with_seed(2024)
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn exhausted(_seed: u64) -> Box<dyn VariateSource> {
    Box::new(ScriptedVariates::default())
}

#[test]
fn test_second_patient_waits_for_first() {
    init_logging();
    let config = single_desk(1, 5.0).with_durations(0.0, 20.0);
    // gap 1, service 5, gap 100, service 5
    let variates = ScriptedVariates::new([1.0, 5.0, 100.0, 5.0], [false, false]);

    let output = RunController::new(&config, 0)
        .with_variates(Box::new(variates))
        .execute()
        .unwrap();

    assert_eq!(output.summary.patients_generated, 2);
    assert_eq!(output.records.len(), 2);
    let first = &output.records[0];
    let second = &output.records[1];
    assert_eq!((first.patient_id, first.queue_time(0)), (1, Some(0.0)));
    assert_eq!((second.patient_id, second.queue_time(0)), (2, Some(4.0)));
    assert_eq!(second.arrival_time, 1.0);
    assert_eq!(second.exit_time, 10.0);
    assert_eq!(second.time_in_system(), 9.0);
    assert_eq!(output.summary.mean_queue_times, vec![Some(2.0)]);
}

#[test]
fn test_warm_up_cutoff_uses_exit_time() {
    let config = single_desk(100, 5.0)
        .with_mean_interarrival(1.0)
        .with_durations(6.0, 10.0);

    let output = RunController::new(&config, 0)
        .with_variates(Box::new(DeterministicVariates))
        .execute()
        .unwrap();

    // Arrivals at 0..=16; the patient arriving at 1 leaves exactly at the
    // cutoff and is dropped, the one arriving at 11 leaves at the horizon.
    assert_eq!(output.summary.patients_generated, 17);
    let ids: Vec<u64> = output.records.iter().map(|r| r.patient_id).collect();
    assert_eq!(ids, (3..=12).collect::<Vec<_>>());
    assert!(output.records.iter().all(|r| r.exit_time > 6.0));
    assert!(output.records.iter().all(|r| r.queue_time(0) == Some(0.0)));
}

#[test]
fn test_staff_break_blocks_a_server() {
    init_logging();
    let base = single_desk(1, 1.0)
        .with_mean_interarrival(10.0)
        .with_durations(0.0, 30.0);
    let with_break = base.clone().with_unavailability(UnavailabilityConfig {
        station: "Desk".to_string(),
        every: 8.0,
        duration: 5.0,
    });

    let waits = |config: &TrialConfig| -> Vec<Option<f64>> {
        RunController::new(config, 0)
            .with_variates(Box::new(DeterministicVariates))
            .execute()
            .unwrap()
            .records
            .iter()
            .map(|r| r.queue_time(0))
            .collect()
    };

    assert_eq!(waits(&base), vec![Some(0.0), Some(0.0), Some(0.0)]);
    // The break holds the desk from 8 to 13, so the patient arriving at 10 waits
    assert_eq!(waits(&with_break), vec![Some(0.0), Some(3.0), Some(0.0)]);
}

/// Counts fired events and the largest queue seen at the desk
struct DeskWatch {
    fired: Rc<Cell<u64>>,
    longest_queue: Rc<Cell<usize>>,
}

impl SimulationObserver for DeskWatch {
    fn on_time_advance(&mut self, _old_time: SimTime, _new_time: SimTime) {}

    fn on_event_fired(&mut self, _event: &Event, resources: &ResourceSet) {
        self.fired.set(self.fired.get() + 1);
        if let Some(desk) = resources.iter().find(|pool| pool.name() == "Desk") {
            self.longest_queue.set(self.longest_queue.get().max(desk.queue_len()));
        }
    }
}

#[test]
fn test_observer_sees_every_event_of_a_run() {
    let config = single_desk(1, 5.0).with_durations(0.0, 20.0);
    let fired = Rc::new(Cell::new(0));
    let longest_queue = Rc::new(Cell::new(0));

    let output = RunController::new(&config, 0)
        .with_variates(Box::new(ScriptedVariates::new([1.0, 5.0, 100.0, 5.0], [false, false])))
        .with_observer(Box::new(DeskWatch {
            fired: Rc::clone(&fired),
            longest_queue: Rc::clone(&longest_queue),
        }))
        .execute()
        .unwrap();

    assert!(fired.get() > 0);
    assert_eq!(fired.get(), output.summary.events_fired);
    assert_eq!(longest_queue.get(), 1);
}

#[test]
fn test_pathway_revisiting_a_station_is_rejected() {
    let config = TrialConfig::new()
        .with_topology(
            vec![StationConfig::new("Desk", 1, 4.0), StationConfig::new("Bay", 1, 1.0)],
            PathwayConfig {
                shared: vec!["Desk".to_string(), "Desk".to_string()],
                default_final: "Bay".to_string(),
                branch_final: "Bay".to_string(),
                branch_probability: 0.2,
            },
        )
        .with_mean_interarrival(3.0);

    assert!(matches!(
        Trial::new(config.clone()),
        Err(SimError::Config(ConfigError::RepeatedStation(ref name))) if name == "Desk"
    ));
    let run = RunController::new(&config, 0)
        .with_variates(Box::new(DeterministicVariates))
        .execute();
    assert!(matches!(
        run,
        Err(SimError::Config(ConfigError::RepeatedStation(_)))
    ));
}

#[test]
fn test_trial_is_reproducible() {
    let trial = Trial::new(small_trial(3)).unwrap();
    assert_eq!(trial.config(), &small_trial(3));
    let first = trial.run().unwrap();
    let second = Trial::new(small_trial(3)).unwrap().run().unwrap();

    assert_eq!(first.records, second.records);
    assert_eq!(first.stations, second.stations);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn test_parallel_runs_match_sequential() {
    let sequential = Trial::new(small_trial(4)).unwrap().run().unwrap();
    let parallel = Trial::new(
        small_trial(4)
            .with_concurrency(ConcurrencyMode::Rayon)
            .with_thread_pool_size(2),
    )
    .unwrap()
    .run()
    .unwrap();

    assert_eq!(sequential.runs, parallel.runs);
    assert_eq!(sequential.records, parallel.records);
    assert_eq!(sequential.stations, parallel.stations);
}

#[test]
fn test_runs_use_distinct_seeds() {
    let results = Trial::new(small_trial(2)).unwrap().run().unwrap();

    assert_eq!(results.runs.len(), 2);
    assert_eq!(results.runs[0].seed, 2024);
    assert_eq!(results.runs[1].seed, 2025);
    let per_run = |run: usize| -> Vec<_> {
        results.records.iter().filter(|r| r.run == run).cloned().collect()
    };
    assert_ne!(per_run(0).len(), 0);
    assert_ne!(
        per_run(0).iter().map(|r| r.arrival_time).collect::<Vec<_>>(),
        per_run(1).iter().map(|r| r.arrival_time).collect::<Vec<_>>()
    );
}

#[test]
fn test_default_model_reports_every_station() {
    let results = Trial::new(TrialConfig::new().with_runs(3)).unwrap().run().unwrap();

    let registration = results.station("Registration").unwrap();
    let ed = results.station("ED_Assessment").unwrap();
    let acu = results.station("ACU_Assessment").unwrap();
    assert_eq!(registration.observations, results.records.len());
    assert_eq!(ed.observations + acu.observations, results.records.len());
    assert!(acu.observations < ed.observations);
    assert!(results.stations.iter().all(|s| s.percentile.unwrap() >= 0.0));
    assert!(results.records.iter().all(|r| r.exit_time > 1440.0));

    let report = results.to_string();
    assert!(report.contains("90th percentile queue time for Triage over trial: "));
    assert!(report.contains(" minutes"));
}

#[test]
fn test_zero_runs_gives_empty_results() {
    let results = Trial::new(small_trial(0)).unwrap().run().unwrap();

    assert!(results.is_empty());
    assert!(results.runs.is_empty());
    assert!(results.stations.iter().all(|s| s.percentile.is_none()));
    assert_eq!(results.to_string().matches("no data").count(), 4);
}

#[test]
fn test_sampling_failure_aborts_trial() {
    init_logging();
    let trial = Trial::new(small_trial(2)).unwrap().with_variate_factory(exhausted);

    match trial.run() {
        Err(SimError::RunFailed { run, source }) => {
            assert_eq!(run, 0);
            assert!(matches!(*source, SimError::Sampling(_)));
        }
        other => panic!("expected a failed run, got {:?}", other.map(|r| r.records.len())),
    }
}

#[test]
fn test_invalid_configs_are_rejected() {
    let zero_capacity = Trial::new(TrialConfig::new().with_capacity("Triage", 0));
    assert!(matches!(
        zero_capacity,
        Err(SimError::Config(ConfigError::NonPositiveCapacity(ref name))) if name == "Triage"
    ));

    let bad_percentile = Trial::new(TrialConfig::new().with_percentile(100.0));
    assert!(matches!(
        bad_percentile,
        Err(SimError::Config(ConfigError::PercentileOutOfRange(_)))
    ));

    let bad_branch = Trial::new(TrialConfig::new().with_branch_probability(1.5));
    assert!(matches!(
        bad_branch,
        Err(SimError::Config(ConfigError::ProbabilityOutOfRange(_)))
    ));
}

/// A user-defined world and process, driven through the public engine API
struct Blinker {
    remaining: u32,
}

impl Process<Vec<SimTime>> for Blinker {
    fn resume(&mut self, ctx: &mut ProcessContext<'_, Vec<SimTime>>) -> Result<Suspend, SimError> {
        let now = ctx.now();
        ctx.world().push(now);
        if self.remaining == 0 {
            return Ok(Suspend::Complete);
        }
        self.remaining -= 1;
        Ok(Suspend::Hold(2.5))
    }
}

#[test]
fn test_custom_process_on_public_engine() {
    let mut engine = SimulationEngine::new(Vec::new());
    engine.spawn(Box::new(Blinker { remaining: 3 })).unwrap();

    let end = engine.run().unwrap();

    assert_eq!(end, 7.5);
    assert_eq!(engine.world(), &vec![0.0, 2.5, 5.0, 7.5]);
    assert!(!engine.has_pending_events());
}
