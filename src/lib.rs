//! # Ramen Rush Server
//!
//! Runtime core and record service for Ramen Rush, a three-lane
//! endless runner. The simulation is headless and seed-replayable;
//! rendering and input capture live in the client.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    RAMEN RUSH SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  └── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │                                                              │
//! │  game/           - Run simulation (deterministic per seed)   │
//! │  ├── state.rs    - Run state, lanes, phases                  │
//! │  ├── frame.rs    - Per-frame update pipeline                 │
//! │  ├── jump.rs     - Jump arc math                             │
//! │  ├── input.rs    - Action mapping                            │
//! │  └── events.rs   - Frame event reporting                     │
//! │                                                              │
//! │  records/        - Profiles, runs, leaderboard               │
//! │  ├── profile.rs  - Identity and persisted types              │
//! │  ├── store.rs    - In-memory storage                         │
//! │  ├── service.rs  - Business rules                            │
//! │  └── submit.rs   - At-most-once submission client            │
//! │                                                              │
//! │  network/        - Networking (non-deterministic)            │
//! │  ├── server.rs   - WebSocket record server                   │
//! │  ├── protocol.rs - Message types                             │
//! │  └── auth.rs     - JWT validation                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Replay Guarantee
//!
//! The `core/` and `game/` modules take no input besides the seed, the
//! per-frame delta, and the player's actions:
//! - No system time dependencies
//! - No global state; one owned [`game::RunState`] per run
//! - All randomness from the seeded PRNG carried inside the state
//!
//! Feeding the same seed, deltas, and actions through [`game::step`]
//! reproduces the same run, which is what the tests lean on.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod records;

// Re-export commonly used types
pub use core::rng::{derive_run_seed, GameRng};
pub use game::{step, GameAction, Obstacle, RunPhase, RunState, TrackConfig};
pub use records::{PlayerId, Profile, RecordService, RunSummary, ScoreSubmitter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nominal client frame rate (Hz); the simulation itself is
/// delta-driven and accepts any cadence
pub const FRAME_RATE: u32 = 60;
