use super::clinic::Clinic;
use super::journey::PatientJourney;
use super::patient::Patient;
use crate::core::errors::SimError;
use crate::core::process::{Process, ProcessContext, Suspend};
use log::trace;

/// Creates patients forever, with exponential gaps between arrivals.
///
/// Never completes; a run ends by no longer advancing the clock past its
/// horizon, which leaves the generator's next wake-up unfired.
#[derive(Debug, Default)]
pub struct ArrivalGenerator;

impl ArrivalGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Process<Clinic> for ArrivalGenerator {
    fn resume(&mut self, ctx: &mut ProcessContext<'_, Clinic>) -> Result<Suspend, SimError> {
        let now = ctx.now();
        let clinic = ctx.world();

        let id = clinic.next_patient_id();
        let branch_probability = clinic.topology().branch_probability();
        let takes_branch = clinic.variates().bernoulli(branch_probability)?;
        let pathway = clinic.topology().pathway(takes_branch);
        let patient = Patient::new(id, takes_branch, now, clinic.topology().station_count());
        trace!("patient {} arrives at {:.3} (branch: {})", id, now, takes_branch);

        let mean_gap = clinic.topology().mean_interarrival();
        let gap = clinic.variates().exponential(mean_gap)?;

        ctx.spawn(Box::new(PatientJourney::new(patient, pathway)))?;
        Ok(Suspend::Hold(gap))
    }

    fn name(&self) -> &str {
        "arrival generator"
    }
}
