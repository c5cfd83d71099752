//! Player Identity and Persisted Records
//!
//! The types the record service stores and serves: the player identity,
//! the profile it keys, the immutable per-run records, and the read
//! models the client renders (leaderboard rows, rank).

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Derived from the authenticated subject by the auth layer; all zeros
/// only ever appears for anonymous local play that never touches the
/// service. Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

// =============================================================================
// PROFILE
// =============================================================================

/// A persisted player record, keyed by authenticated identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Owning identity
    pub id: PlayerId,

    /// Name shown on the leaderboard
    pub display_name: String,

    /// Optional payout address for top-band rewards
    pub wallet_address: Option<String>,

    /// Best score across all runs
    pub highest_score: u32,

    /// Total completed runs submitted
    pub total_runs: u32,

    /// When the profile was created
    pub created_at: DateTime<Utc>,

    /// When the profile last changed
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create a fresh profile with zero stats.
    pub fn new(id: PlayerId, display_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            wallet_address: None,
            highest_score: 0,
            total_runs: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Does this profile have a payout address on file?
    pub fn has_wallet(&self) -> bool {
        self.wallet_address.is_some()
    }
}

// =============================================================================
// RUN RECORDS
// =============================================================================

/// What a finished run submits: the frozen final counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Final score
    pub score: u32,
    /// Obstacles avoided over the run
    pub obstacles_avoided: u32,
    /// Distance traveled, floored to whole units
    pub distance_traveled: u32,
}

/// The immutable session record the service appends per submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Who ran
    pub player: PlayerId,
    /// Final score
    pub score: u32,
    /// Obstacles avoided
    pub obstacles_avoided: u32,
    /// Distance traveled in whole units
    pub distance_traveled: u32,
    /// Submission time
    pub played_at: DateTime<Utc>,
}

/// The service's answer to a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Did this run beat the stored best?
    pub is_new_high_score: bool,
    /// The best on record before this submission
    pub previous_high_score: u32,
}

// =============================================================================
// READ MODELS
// =============================================================================

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: u32,
    /// Profile display name
    pub display_name: String,
    /// Best score
    pub highest_score: u32,
    /// Total submitted runs
    pub total_runs: u32,
    /// Whether a payout address is on file
    pub has_wallet: bool,
    /// The payout address, if any
    pub wallet_address: Option<String>,
}

impl LeaderboardEntry {
    /// Build a row from a profile at the given 1-based rank.
    pub fn from_profile(rank: u32, profile: &Profile) -> Self {
        Self {
            rank,
            display_name: profile.display_name.clone(),
            highest_score: profile.highest_score,
            total_runs: profile.total_runs,
            has_wallet: profile.has_wallet(),
            wallet_address: profile.wallet_address.clone(),
        }
    }
}

/// A player's own standing, shown on the game-over screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankInfo {
    /// 1-based rank: one plus the number of strictly better scores
    pub rank: u32,
    /// The player's best score
    pub highest_score: u32,
    /// Whether the rank falls inside the reward-eligible top band
    pub is_top_band: bool,
}

// =============================================================================
// TESTS
// =============================================================================
