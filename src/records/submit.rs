//! Run Submission Client
//!
//! Bridges a finished run to the record service. Owns the explicit
//! submitted-this-run flag so duplicate game-over notifications from
//! the frame loop never double-submit.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::game::state::RunState;
use crate::records::profile::{PlayerId, RunOutcome, RunSummary};
use crate::records::service::{RecordError, RecordService};

impl RunSummary {
    /// Freeze the submittable counters of a run.
    pub fn of(state: &RunState) -> Self {
        Self {
            score: state.score,
            obstacles_avoided: state.obstacles_avoided,
            distance_traveled: state.distance.floor() as u32,
        }
    }
}

/// Submits finished runs to the record service, at most once per run.
///
/// The flag flips when a submission is dispatched, not when it
/// succeeds, so a failed submission is dropped rather than retried.
/// Completion only ever feeds the cached high score; it never touches
/// live gameplay state.
pub struct ScoreSubmitter {
    /// Destination service.
    service: Arc<RecordService>,
    /// Authenticated identity, if any.
    player: Option<PlayerId>,
    /// Whether the current run has already been submitted.
    submitted: bool,
}

impl ScoreSubmitter {
    /// Create a submitter for one player connection.
    pub fn new(service: Arc<RecordService>, player: Option<PlayerId>) -> Self {
        Self {
            service,
            player,
            submitted: false,
        }
    }

    /// Arm the submitter for a fresh run. Call on every run start.
    pub fn begin_run(&mut self) {
        self.submitted = false;
    }

    /// Has the current run already been dispatched?
    pub fn has_submitted(&self) -> bool {
        self.submitted
    }

    /// Dispatch a run summary to the service.
    ///
    /// Returns None if this run was already submitted. Otherwise marks
    /// the run submitted and spawns the service call, handing back the
    /// join handle so the driver can observe the outcome.
    pub fn submit(
        &mut self,
        summary: RunSummary,
    ) -> Option<JoinHandle<Result<RunOutcome, RecordError>>> {
        if self.submitted {
            debug!("Run already submitted, ignoring duplicate");
            return None;
        }
        self.submitted = true;

        let service = self.service.clone();
        let player = self.player;
        Some(tokio::spawn(async move {
            service.submit_run(player, summary).await
        }))
    }

    /// Read the caller's persisted best score, for syncing the local
    /// cache when returning to the menu.
    pub async fn fetch_high_score(&self) -> Option<u32> {
        let profile = self.service.current_profile(self.player).await?;
        Some(profile.highest_score)
    }
}
