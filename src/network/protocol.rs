//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! All messages are serialized as JSON for debugging ease,
//! with optional binary (bincode) for flat structs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::records::profile::{LeaderboardEntry, Profile, RankInfo, RunOutcome, RunSummary};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Authenticate with a provider token.
    Auth(AuthRequest),

    /// Fetch the caller's profile, creating it on first contact.
    CreateProfile {
        /// Name to register if no profile exists yet.
        display_name: String,
    },

    /// Fetch the caller's profile without creating one.
    Profile,

    /// Submit a finished run.
    SubmitRun(RunSubmission),

    /// Fetch the leaderboard.
    Leaderboard,

    /// Fetch the caller's own rank.
    Rank,

    /// Attach a payout address to the caller's profile.
    SetWallet {
        /// The address to store.
        address: String,
    },

    /// Ping for latency measurement.
    Ping {
        /// Client timestamp, echoed back.
        timestamp: u64,
    },
}

/// Authentication request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    /// Provider JWT; identity comes from its subject claim.
    pub token: String,
    /// Client version for compatibility check.
    pub client_version: String,
}

/// A finished run as submitted over the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunSubmission {
    /// Final score.
    pub score: u32,
    /// Obstacles avoided over the run.
    pub obstacles_avoided: u32,
    /// Distance traveled in whole units.
    pub distance_traveled: u32,
}

impl RunSubmission {
    /// Convert to the record-service summary type.
    pub fn to_summary(self) -> RunSummary {
        RunSummary {
            score: self.score,
            obstacles_avoided: self.obstacles_avoided,
            distance_traveled: self.distance_traveled,
        }
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Authentication result.
    AuthResult(AuthResult),

    /// The caller's profile, or None if none exists.
    Profile {
        /// Profile payload.
        profile: Option<ProfileInfo>,
    },

    /// Outcome of a run submission.
    SubmitResult(RunOutcome),

    /// Leaderboard rows, best first.
    Leaderboard {
        /// Ranked rows.
        entries: Vec<LeaderboardEntry>,
    },

    /// The caller's own standing, or None without a profile.
    Rank {
        /// Rank payload.
        rank: Option<RankInfo>,
    },

    /// Wallet address stored.
    WalletUpdated,

    /// Pong response.
    Pong {
        /// Client timestamp echoed back.
        timestamp: u64,
        /// Server wall clock in Unix milliseconds.
        server_time: u64,
    },

    /// Error message.
    Error(ErrorReply),

    /// Server is shutting down.
    Shutdown {
        /// Why the server is going away.
        reason: String,
    },
}

/// Authentication result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResult {
    /// Whether auth succeeded.
    pub success: bool,
    /// Derived player identity (UUID string) if successful.
    pub player_id: Option<String>,
    /// Error message if failed.
    pub error: Option<String>,
    /// Server version.
    pub server_version: String,
}

/// A profile as sent over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInfo {
    /// Player identity as a UUID string.
    pub player_id: String,
    /// Leaderboard display name.
    pub display_name: String,
    /// Payout address, if set.
    pub wallet_address: Option<String>,
    /// Best score across all runs.
    pub highest_score: u32,
    /// Total submitted runs.
    pub total_runs: u32,
    /// Profile creation time.
    pub created_at: DateTime<Utc>,
    /// Last profile change.
    pub updated_at: DateTime<Utc>,
}

impl ProfileInfo {
    /// Build the wire view of a stored profile.
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            player_id: profile.id.to_uuid_string(),
            display_name: profile.display_name.clone(),
            wallet_address: profile.wallet_address.clone(),
            highest_score: profile.highest_score,
            total_runs: profile.total_runs,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// An operation the server refused, with a machine-readable code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
    /// What went wrong, for client branching.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Authentication could not be performed.
    AuthFailed,
    /// The presented token has expired.
    TokenExpired,
    /// The presented token failed validation.
    InvalidToken,
    /// The operation needs a prior successful `auth`.
    NotAuthenticated,
    /// The caller has no profile yet.
    ProfileNotFound,
    /// A request field was rejected.
    InvalidInput,
    /// Something failed server-side.
    InternalError,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a JSON text frame.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Decode a binary frame.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

impl ServerMessage {
    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a JSON text frame.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::profile::PlayerId;

    #[test]
    fn test_auth_message_roundtrip() {
        let msg = ClientMessage::Auth(AuthRequest {
            token: "header.payload.sig".to_string(),
            client_version: "0.3.0".to_string(),
        });

        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"auth\""));

        let parsed = ClientMessage::from_json(&json).unwrap();
        if let ClientMessage::Auth(auth) = parsed {
            assert_eq!(auth.token, "header.payload.sig");
            assert_eq!(auth.client_version, "0.3.0");
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_unit_requests_serialize_with_tag_only() {
        for (msg, tag) in [
            (ClientMessage::Profile, "profile"),
            (ClientMessage::Leaderboard, "leaderboard"),
            (ClientMessage::Rank, "rank"),
        ] {
            let json = msg.to_json().unwrap();
            assert_eq!(json, format!("{{\"type\":\"{}\"}}", tag));
            ClientMessage::from_json(&json).unwrap();
        }
    }

    #[test]
    fn test_submit_run_roundtrip_and_conversion() {
        let msg = ClientMessage::SubmitRun(RunSubmission {
            score: 1200,
            obstacles_avoided: 12,
            distance_traveled: 480,
        });

        let json = msg.to_json().unwrap();
        let parsed = ClientMessage::from_json(&json).unwrap();

        if let ClientMessage::SubmitRun(submission) = parsed {
            let summary = submission.to_summary();
            assert_eq!(summary.score, 1200);
            assert_eq!(summary.obstacles_avoided, 12);
            assert_eq!(summary.distance_traveled, 480);
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_submit_result_flattens_outcome() {
        let msg = ServerMessage::SubmitResult(RunOutcome {
            is_new_high_score: true,
            previous_high_score: 800,
        });

        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"submit_result\""));
        assert!(json.contains("\"is_new_high_score\":true"));
        assert!(json.contains("\"previous_high_score\":800"));

        let parsed = ServerMessage::from_json(&json).unwrap();
        if let ServerMessage::SubmitResult(outcome) = parsed {
            assert!(outcome.is_new_high_score);
            assert_eq!(outcome.previous_high_score, 800);
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_leaderboard_roundtrip() {
        let msg = ServerMessage::Leaderboard {
            entries: vec![LeaderboardEntry {
                rank: 1,
                display_name: "noodle_master".to_string(),
                highest_score: 9000,
                total_runs: 40,
                has_wallet: true,
                wallet_address: Some("0xabc".to_string()),
            }],
        };

        let json = msg.to_json().unwrap();
        let parsed = ServerMessage::from_json(&json).unwrap();

        if let ServerMessage::Leaderboard { entries } = parsed {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].rank, 1);
            assert_eq!(entries[0].highest_score, 9000);
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_rank_none_roundtrip() {
        let msg = ServerMessage::Rank { rank: None };
        let json = msg.to_json().unwrap();
        let parsed = ServerMessage::from_json(&json).unwrap();
        assert!(matches!(parsed, ServerMessage::Rank { rank: None }));
    }

    #[test]
    fn test_error_codes_are_snake_case() {
        let msg = ServerMessage::Error(ErrorReply {
            code: ErrorCode::ProfileNotFound,
            message: "profile not found".to_string(),
        });

        let json = msg.to_json().unwrap();
        assert!(json.contains("profile_not_found"));
    }

    #[test]
    fn test_profile_info_maps_identity() {
        let id = PlayerId::new([0xAB; 16]);
        let mut profile = Profile::new(id, "runner", Utc::now());
        profile.highest_score = 777;

        let info = ProfileInfo::from_profile(&profile);
        assert_eq!(info.player_id, id.to_uuid_string());
        assert_eq!(info.highest_score, 777);
        assert_eq!(info.wallet_address, None);
    }

    #[test]
    fn test_binary_serialization_flat_struct() {
        // Tagged enums are JSON-only; bincode covers flat structs like
        // RunSubmission.
        let submission = RunSubmission {
            score: 1500,
            obstacles_avoided: 15,
            distance_traveled: 600,
        };

        let bytes = bincode::serialize(&submission).unwrap();
        let parsed: RunSubmission = bincode::deserialize(&bytes).unwrap();
        assert_eq!(parsed.score, 1500);
        assert_eq!(parsed.distance_traveled, 600);
    }

    #[test]
    fn test_unknown_message_type_rejected() {
        let result = ClientMessage::from_json("{\"type\":\"warp_drive\"}");
        assert!(result.is_err());
    }

    #[test]
    fn test_pong_roundtrip() {
        let msg = ServerMessage::Pong {
            timestamp: 42,
            server_time: 1_700_000_000_000,
        };

        let json = msg.to_json().unwrap();
        let parsed = ServerMessage::from_json(&json).unwrap();
        if let ServerMessage::Pong { timestamp, server_time } = parsed {
            assert_eq!(timestamp, 42);
            assert_eq!(server_time, 1_700_000_000_000);
        } else {
            panic!("Wrong message type");
        }
    }
}
