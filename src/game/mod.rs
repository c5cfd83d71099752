//! Game Logic Module
//!
//! The runner simulation. Deterministic per seed: the only randomness is
//! the obstacle draw from the state's own RNG.
//!
//! ## Module Structure
//!
//! - `state`: run state machine, obstacle model, lane constants
//! - `frame`: per-frame step pipeline and track tuning
//! - `jump`: jump arc profile
//! - `input`: keyboard/touch action mapping
//! - `events`: per-frame events for UI layers and tests

pub mod state;
pub mod frame;
pub mod jump;
pub mod input;
pub mod events;

// Re-export key types
pub use state::{RunState, RunPhase, Obstacle, Rival};
pub use frame::{step, FrameResult, TrackConfig};
pub use input::GameAction;
pub use events::RunEvent;
