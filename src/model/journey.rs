use super::clinic::Clinic;
use super::patient::Patient;
use crate::core::errors::SimError;
use crate::core::process::{Process, ProcessContext, Suspend};
use crate::core::resource::Grant;
use crate::core::types::ResourceId;
use log::debug;

enum Stage {
    Arriving,
    Queueing(usize),
    InService(usize, Grant),
    Left,
}

/// One patient's walk through the stations of its pathway.
///
/// At each station the patient queues for a slot, records how long that
/// took, holds the slot for a sampled service time and releases it. The
/// finished patient is kept as an observation only if it leaves after the
/// warm-up cutoff.
pub struct PatientJourney {
    patient: Patient,
    pathway: Vec<ResourceId>,
    stage: Stage,
}

impl PatientJourney {
    pub fn new(patient: Patient, pathway: Vec<ResourceId>) -> Self {
        Self {
            patient,
            pathway,
            stage: Stage::Arriving,
        }
    }

    fn queue_at(&mut self, step: usize) -> Suspend {
        match self.pathway.get(step) {
            Some(&station) => {
                self.stage = Stage::Queueing(step);
                Suspend::Acquire(station)
            }
            None => Suspend::Complete,
        }
    }

    fn leave(&mut self, ctx: &mut ProcessContext<'_, Clinic>) -> Suspend {
        let now = ctx.now();
        self.stage = Stage::Left;
        self.patient.exit_time = Some(now);

        let clinic = ctx.world();
        if now > clinic.warm_up() {
            let record = self.patient.clone().into_record(clinic.run());
            clinic.record(record);
        } else {
            debug!(
                "patient {} left at {:.3} during warm-up; not recorded",
                self.patient.id, now
            );
        }
        Suspend::Complete
    }
}

impl Process<Clinic> for PatientJourney {
    fn resume(&mut self, ctx: &mut ProcessContext<'_, Clinic>) -> Result<Suspend, SimError> {
        match std::mem::replace(&mut self.stage, Stage::Left) {
            Stage::Arriving => {
                if self.pathway.is_empty() {
                    return Ok(self.leave(ctx));
                }
                Ok(self.queue_at(0))
            }
            Stage::Queueing(step) => {
                let grant = ctx.expect_grant()?;
                let station = grant.resource();
                self.patient.record_wait(station, grant.waited());

                let clinic = ctx.world();
                let mean = clinic.topology().mean_service(station)?;
                let service = clinic.variates().exponential(mean)?;

                self.stage = Stage::InService(step, grant);
                Ok(Suspend::Hold(service))
            }
            Stage::InService(step, grant) => {
                ctx.release(grant)?;
                if step + 1 < self.pathway.len() {
                    Ok(self.queue_at(step + 1))
                } else {
                    Ok(self.leave(ctx))
                }
            }
            Stage::Left => Err(SimError::ProcessCompleted(ctx.id())),
        }
    }

    fn name(&self) -> &str {
        "patient journey"
    }
}
