//! Network Layer
//!
//! WebSocket server for profile and leaderboard traffic. This layer is
//! **non-deterministic** - all gameplay runs through `game/`.

pub mod auth;
pub mod protocol;
pub mod server;

pub use auth::{validate_token, AuthConfig, AuthError, TokenClaims};
pub use protocol::{
    AuthRequest, AuthResult, ClientMessage, ErrorCode, ErrorReply, ProfileInfo, RunSubmission,
    ServerMessage,
};
pub use server::{RecordServer, ServerConfig, ServerError};
