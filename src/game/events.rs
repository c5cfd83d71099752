//! Run Events
//!
//! Events generated by the frame pipeline, one batch per step. UI and
//! audio layers consume them (score popups, collision stingers); tests
//! assert on them. A run is single-player, so within a frame the batch
//! is simply in pipeline order and needs no priorities.

use serde::{Serialize, Deserialize};
use crate::game::state::Rival;

/// Something that happened during one frame of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RunEvent {
    /// A new obstacle entered the track at the far spawn position.
    ObstacleSpawned {
        /// Obstacle id
        id: u32,
        /// Character variant
        rival: Rival,
        /// Lane it occupies
        lane: u8,
    },

    /// An obstacle passed behind the player and was removed.
    ObstacleAvoided {
        /// Obstacle id
        id: u32,
        /// Score after the avoidance reward
        new_score: u32,
        /// Total obstacles avoided this run
        total_avoided: u32,
    },

    /// A score milestone raised the forward speed.
    SpeedRaised {
        /// New speed in units per second
        speed: f32,
        /// The milestone score that triggered it
        score: u32,
    },

    /// The player ran into an obstacle; the run is over.
    Collision {
        /// Obstacle id
        id: u32,
        /// Lane the collision happened in
        lane: u8,
        /// Final score of the run
        final_score: u32,
    },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_roundtrip() {
        let event = RunEvent::ObstacleSpawned {
            id: 7,
            rival: Rival::Sensei,
            lane: 2,
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: RunEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
