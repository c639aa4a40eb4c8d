use super::percentile::{mean, percentile};
use crate::model::patient::ObservationRecord;
use crate::model::run::{RunOutput, RunSummary};
use serde::Serialize;
use std::fmt;

/// Queueing-time statistics of one station, pooled over every run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStatistics {
    pub station: String,
    pub observations: usize,
    pub percentile: Option<f64>,
    pub mean: Option<f64>,
}

/// Everything a finished trial produced
#[derive(Debug, Clone, Serialize)]
pub struct TrialResults {
    pub percentile: f64,
    pub stations: Vec<StationStatistics>,
    pub runs: Vec<RunSummary>,
    #[serde(skip)]
    pub records: Vec<ObservationRecord>,
}

impl TrialResults {
    /// Pool the output of every run and compute per-station statistics
    pub fn from_runs(station_names: &[String], p: f64, outputs: Vec<RunOutput>) -> Self {
        let mut runs = Vec::with_capacity(outputs.len());
        let mut records = Vec::new();
        for output in outputs {
            runs.push(output.summary);
            records.extend(output.records);
        }

        let stations = station_names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let waits: Vec<f64> = records.iter().filter_map(|r| r.queue_time(index)).collect();
                StationStatistics {
                    station: name.clone(),
                    observations: waits.len(),
                    percentile: percentile(&waits, p),
                    mean: mean(waits.iter().copied()),
                }
            })
            .collect();

        Self {
            percentile: p,
            stations,
            runs,
            records,
        }
    }

    pub fn station(&self, name: &str) -> Option<&StationStatistics> {
        self.stations.iter().find(|s| s.station == name)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl fmt::Display for TrialResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = "TRIAL RESULTS";
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "-".repeat(title.len()))?;
        writeln!(f, "runs: {}, observations: {}", self.runs.len(), self.records.len())?;

        for station in &self.stations {
            let text = format!(
                "{}th percentile queue time for {} over trial: ",
                self.percentile, station.station
            );
            match station.percentile {
                Some(value) => writeln!(f, "{:>58}{:5.1} minutes", text, value)?,
                None => writeln!(f, "{:>58}no data", text)?,
            }
        }
        Ok(())
    }
}
