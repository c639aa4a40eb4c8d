use super::config::TrialConfig;
use super::run::{run_seed, RunController, RunOutput};
use crate::core::errors::SimError;
use crate::core::execution::ConcurrencyMode;
use crate::core::random::VariateSource;
use crate::stats::TrialResults;
use log::info;
use rayon::prelude::*;

/// Builds the random stream for a run from that run's seed
pub type VariateFactory = fn(u64) -> Box<dyn VariateSource>;

/// Runs independent replicates of the model and pools their observations.
///
/// Replicates share nothing but the immutable configuration, so the result
/// does not depend on the concurrency mode.
pub struct Trial {
    config: TrialConfig,
    variates: Option<VariateFactory>,
}

impl Trial {
    /// Validate `config` and prepare a trial. No run starts on a bad config.
    pub fn new(config: TrialConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            config,
            variates: None,
        })
    }

    /// Use a custom random stream per run instead of the seeded default
    pub fn with_variate_factory(mut self, factory: VariateFactory) -> Self {
        self.variates = Some(factory);
        self
    }

    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    fn execute_run(&self, run: usize) -> Result<RunOutput, SimError> {
        let mut controller = RunController::new(&self.config, run);
        if let Some(factory) = self.variates {
            controller = controller.with_variates(factory(run_seed(self.config.seed, run)));
        }
        controller.execute().map_err(|source| SimError::RunFailed {
            run,
            source: Box::new(source),
        })
    }

    /// Execute every run and compute the trial statistics
    pub fn run(&self) -> Result<TrialResults, SimError> {
        let runs = self.config.number_of_runs;
        let execution = &self.config.execution;
        info!(
            "trial starting: {} runs, {:?} execution",
            runs, execution.concurrency_mode
        );

        let outputs = match execution.concurrency_mode {
            ConcurrencyMode::Sequential => (0..runs)
                .map(|run| self.execute_run(run))
                .collect::<Result<Vec<_>, _>>()?,
            ConcurrencyMode::Rayon => {
                let mut builder = rayon::ThreadPoolBuilder::new();
                if let Some(threads) = execution.thread_pool_size {
                    builder = builder.num_threads(threads);
                }
                let pool = builder
                    .build()
                    .map_err(|e| SimError::ThreadPool(e.to_string()))?;
                // Indexed collect keeps run order regardless of completion order
                pool.install(|| {
                    (0..runs)
                        .into_par_iter()
                        .map(|run| self.execute_run(run))
                        .collect::<Result<Vec<_>, _>>()
                })?
            }
        };

        let results = TrialResults::from_runs(
            &self.config.station_names(),
            self.config.percentile,
            outputs,
        );
        info!(
            "trial finished: {} observations pooled from {} runs",
            results.records.len(),
            results.runs.len()
        );
        Ok(results)
    }
}
