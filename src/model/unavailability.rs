use super::clinic::Clinic;
use crate::core::errors::SimError;
use crate::core::process::{Process, ProcessContext, Suspend};
use crate::core::resource::Grant;
use crate::core::types::{ResourceId, SimTime};
use log::info;

enum Stage {
    Starting,
    Due,
    Leaving,
    Away(Grant),
}

/// Takes one server of a station out of service on a fixed cycle.
///
/// The absent server is modelled as an ordinary request for a slot, so the
/// break starts only once a server is free and queued patients ahead of it
/// are served first.
pub struct StaffBreak {
    station: ResourceId,
    every: SimTime,
    duration: SimTime,
    stage: Stage,
}

impl StaffBreak {
    pub fn new(station: ResourceId, every: SimTime, duration: SimTime) -> Self {
        Self {
            station,
            every,
            duration,
            stage: Stage::Starting,
        }
    }
}

impl Process<Clinic> for StaffBreak {
    fn resume(&mut self, ctx: &mut ProcessContext<'_, Clinic>) -> Result<Suspend, SimError> {
        match std::mem::replace(&mut self.stage, Stage::Due) {
            Stage::Starting => Ok(Suspend::Hold(self.every)),
            Stage::Due => {
                self.stage = Stage::Leaving;
                Ok(Suspend::Acquire(self.station))
            }
            Stage::Leaving => {
                let grant = ctx.expect_grant()?;
                let name = ctx
                    .resource(self.station)
                    .map(|pool| pool.name().to_string())
                    .unwrap_or_default();
                let run = ctx.world().run();
                let now = ctx.now();
                info!(
                    "[run {}] a {} server is unavailable at {:.1}; back at {:.1}",
                    run,
                    name,
                    now,
                    now + self.duration
                );
                self.stage = Stage::Away(grant);
                Ok(Suspend::Hold(self.duration))
            }
            Stage::Away(grant) => {
                ctx.release(grant)?;
                Ok(Suspend::Hold(self.every))
            }
        }
    }

    fn name(&self) -> &str {
        "staff break"
    }
}
