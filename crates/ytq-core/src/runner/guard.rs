//! RAII guard that reports an outcome even when the runner task dies early.

use super::{EventSender, ExitOutcome, WorkerEvent};

/// Sends `Finished` exactly once. If dropped without [`FinishGuard::finish`]
/// (panic or abort), reports a failure so the controller never waits forever.
pub(super) struct FinishGuard {
    job: u64,
    events: EventSender,
    sent: bool,
}

impl FinishGuard {
    pub(super) fn new(job: u64, events: EventSender) -> Self {
        Self {
            job,
            events,
            sent: false,
        }
    }

    pub(super) fn finish(mut self, outcome: ExitOutcome) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: ExitOutcome) {
        self.sent = true;
        let _ = self.events.send(WorkerEvent::Finished {
            job: self.job,
            outcome,
        });
    }
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        if !self.sent {
            tracing::error!(job = self.job, "runner task ended without an outcome");
            self.send(ExitOutcome::Failure { code: -1 });
        }
    }
}
