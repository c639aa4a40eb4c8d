pub mod percentile;
pub mod report;

pub use percentile::{mean, percentile};
pub use report::{StationStatistics, TrialResults};
