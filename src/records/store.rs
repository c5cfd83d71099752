//! In-Memory Record Store
//!
//! Holds all profiles and run records behind async locks. The service
//! layer owns the business rules; this layer only stores, looks up,
//! and orders.

use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::records::profile::{PlayerId, Profile, RunRecord};

/// Async in-memory storage for profiles and run records.
///
/// Profiles are keyed by player identity in a BTreeMap so iteration
/// order is deterministic. Run records are append-only.
pub struct MemoryStore {
    /// Profiles keyed by player identity.
    players: RwLock<BTreeMap<PlayerId, Profile>>,
    /// Append-only run history.
    runs: RwLock<Vec<RunRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            players: RwLock::new(BTreeMap::new()),
            runs: RwLock::new(Vec::new()),
        }
    }

    /// Look up a profile by identity.
    pub async fn get(&self, id: &PlayerId) -> Option<Profile> {
        let players = self.players.read().await;
        players.get(id).cloned()
    }

    /// Insert a profile unless one already exists for the same identity.
    ///
    /// Returns the stored profile either way; an existing profile wins
    /// over the candidate.
    pub async fn get_or_insert(&self, profile: Profile) -> Profile {
        let mut players = self.players.write().await;
        players.entry(profile.id).or_insert(profile).clone()
    }

    /// Apply a mutation to a stored profile.
    ///
    /// Returns false if no profile exists for the identity.
    pub async fn update<F>(&self, id: &PlayerId, f: F) -> bool
    where
        F: FnOnce(&mut Profile),
    {
        let mut players = self.players.write().await;
        match players.get_mut(id) {
            Some(profile) => {
                f(profile);
                true
            }
            None => false,
        }
    }

    /// Append a run record to the history.
    pub async fn append_run(&self, record: RunRecord) {
        let mut runs = self.runs.write().await;
        runs.push(record);
    }

    /// All run records for one player, in submission order.
    pub async fn runs_for(&self, id: &PlayerId) -> Vec<RunRecord> {
        let runs = self.runs.read().await;
        runs.iter().filter(|r| r.player == *id).cloned().collect()
    }

    /// Total run records across all players.
    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Profiles ordered best-first, at most `limit` of them.
    ///
    /// Ordered by highest score descending; ties break toward the
    /// smaller player identity so the ordering is stable.
    pub async fn top_by_score(&self, limit: usize) -> Vec<Profile> {
        let players = self.players.read().await;
        let mut profiles: Vec<Profile> = players.values().cloned().collect();
        profiles.sort_by(|a, b| {
            b.highest_score
                .cmp(&a.highest_score)
                .then_with(|| a.id.cmp(&b.id))
        });
        profiles.truncate(limit);
        profiles
    }

    /// How many profiles hold a strictly higher best score.
    pub async fn count_higher(&self, score: u32) -> usize {
        let players = self.players.read().await;
        players.values().filter(|p| p.highest_score > score).count()
    }

    /// Number of stored profiles.
    pub async fn player_count(&self) -> usize {
        self.players.read().await.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
