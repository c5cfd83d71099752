//! Player Records
//!
//! Persisted player profiles and per-run records, the leaderboard
//! reads built over them, and the submission client the game loop
//! hands finished runs to.

pub mod profile;
pub mod service;
pub mod store;
pub mod submit;

pub use profile::{
    LeaderboardEntry, PlayerId, Profile, RankInfo, RunOutcome, RunRecord, RunSummary,
};
pub use service::{RecordError, RecordService, LEADERBOARD_SIZE};
pub use store::MemoryStore;
pub use submit::ScoreSubmitter;
