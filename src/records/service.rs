//! Player Record Service
//!
//! Business rules over the record store: profile creation, run
//! submission with high-score comparison, leaderboard assembly, and
//! rank lookup. Callers are identified by the authenticated player
//! identity; every write requires one.

use chrono::Utc;
use tracing::{debug, info};

use crate::records::profile::{
    LeaderboardEntry, PlayerId, Profile, RankInfo, RunOutcome, RunRecord, RunSummary,
};
use crate::records::store::MemoryStore;

/// How many rows the leaderboard returns. Ranks inside this band are
/// reward-eligible.
pub const LEADERBOARD_SIZE: usize = 15;

/// Record service errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// Caller did not authenticate.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Caller has no profile yet.
    #[error("profile not found")]
    ProfileNotFound,

    /// A required text field was empty after trimming.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// The record service.
pub struct RecordService {
    /// Backing storage.
    store: MemoryStore,
}

impl RecordService {
    /// Create a service over an empty store.
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
        }
    }

    /// Fetch the caller's profile, creating it on first contact.
    ///
    /// Idempotent: if a profile already exists the stored one is
    /// returned unchanged and `display_name` is ignored.
    pub async fn get_or_create_profile(
        &self,
        caller: Option<PlayerId>,
        display_name: &str,
    ) -> Result<Profile, RecordError> {
        let id = caller.ok_or(RecordError::NotAuthenticated)?;

        let name = display_name.trim();
        if name.is_empty() {
            return Err(RecordError::EmptyField("display name"));
        }

        let profile = self
            .store
            .get_or_insert(Profile::new(id, name, Utc::now()))
            .await;

        debug!(
            "Profile ready for {}: {}",
            hex::encode(&id.as_bytes()[..4]),
            profile.display_name
        );

        Ok(profile)
    }

    /// Fetch the caller's profile without creating one.
    ///
    /// Unauthenticated callers and callers without a profile both get
    /// None; neither case is an error.
    pub async fn current_profile(&self, caller: Option<PlayerId>) -> Option<Profile> {
        let id = caller?;
        self.store.get(&id).await
    }

    /// Record a finished run and fold it into the caller's profile.
    ///
    /// Appends an immutable run record, increments the run counter,
    /// and raises the stored best score only on strict improvement.
    /// The outcome compares against the best score as it stood before
    /// this submission.
    pub async fn submit_run(
        &self,
        caller: Option<PlayerId>,
        run: RunSummary,
    ) -> Result<RunOutcome, RecordError> {
        let id = caller.ok_or(RecordError::NotAuthenticated)?;

        let profile = self
            .store
            .get(&id)
            .await
            .ok_or(RecordError::ProfileNotFound)?;

        let previous_high_score = profile.highest_score;
        let is_new_high_score = run.score > previous_high_score;
        let now = Utc::now();

        self.store
            .append_run(RunRecord {
                player: id,
                score: run.score,
                obstacles_avoided: run.obstacles_avoided,
                distance_traveled: run.distance_traveled,
                played_at: now,
            })
            .await;

        self.store
            .update(&id, |p| {
                p.total_runs += 1;
                if is_new_high_score {
                    p.highest_score = run.score;
                }
                p.updated_at = now;
            })
            .await;

        if is_new_high_score {
            info!(
                "New high score for {}: {} (was {})",
                hex::encode(&id.as_bytes()[..4]),
                run.score,
                previous_high_score
            );
        } else {
            debug!(
                "Run recorded for {}: score {}",
                hex::encode(&id.as_bytes()[..4]),
                run.score
            );
        }

        Ok(RunOutcome {
            is_new_high_score,
            previous_high_score,
        })
    }

    /// The top players, best score first, at most [`LEADERBOARD_SIZE`]
    /// rows, ranked from 1.
    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.store
            .top_by_score(LEADERBOARD_SIZE)
            .await
            .iter()
            .enumerate()
            .map(|(i, profile)| LeaderboardEntry::from_profile(i as u32 + 1, profile))
            .collect()
    }

    /// The caller's own standing.
    ///
    /// Rank is one plus the number of players with a strictly higher
    /// best score. None if unauthenticated or without a profile.
    pub async fn own_rank(&self, caller: Option<PlayerId>) -> Option<RankInfo> {
        let id = caller?;
        let profile = self.store.get(&id).await?;

        let higher = self.store.count_higher(profile.highest_score).await;

        Some(RankInfo {
            rank: higher as u32 + 1,
            highest_score: profile.highest_score,
            is_top_band: higher < LEADERBOARD_SIZE,
        })
    }

    /// Attach a payout address to the caller's profile.
    pub async fn set_wallet_address(
        &self,
        caller: Option<PlayerId>,
        address: &str,
    ) -> Result<(), RecordError> {
        let id = caller.ok_or(RecordError::NotAuthenticated)?;

        let address = address.trim();
        if address.is_empty() {
            return Err(RecordError::EmptyField("wallet address"));
        }

        let address = address.to_string();
        let updated = self
            .store
            .update(&id, |p| {
                p.wallet_address = Some(address);
                p.updated_at = Utc::now();
            })
            .await;

        if !updated {
            return Err(RecordError::ProfileNotFound);
        }

        Ok(())
    }

    /// Number of stored profiles.
    pub async fn player_count(&self) -> usize {
        self.store.player_count().await
    }

    /// Total run records across all players.
    pub async fn run_count(&self) -> usize {
        self.store.run_count().await
    }
}

impl Default for RecordService {
    fn default() -> Self {
        Self::new()
    }
}
