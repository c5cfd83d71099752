//! Input Mapping
//!
//! Normalizes keyboard and touch input into the three game actions. The
//! state machine only ever sees [`GameAction`]; which key or on-screen
//! button produced it is a device detail that stops here.

use serde::{Serialize, Deserialize};

use crate::game::state::RunState;

/// One discrete player action.
///
/// Touch controls dispatch these directly from their three on-screen
/// buttons; keyboards go through [`action_for_key`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameAction {
    /// Shift one lane left
    MoveLeft,
    /// Shift one lane right
    MoveRight,
    /// Start a jump
    Jump,
}

impl GameAction {
    /// Apply this action to a run. The state machine's own guards decide
    /// whether anything happens (phase, lane bounds, airborne).
    pub fn apply(self, state: &mut RunState) {
        match self {
            GameAction::MoveLeft => state.move_left(),
            GameAction::MoveRight => state.move_right(),
            GameAction::Jump => state.jump(),
        }
    }
}

/// Map a DOM-style key value to an action.
///
/// Arrows and WASD move, up/W/space jump. Unknown keys map to nothing.
pub fn action_for_key(key: &str) -> Option<GameAction> {
    match key {
        "ArrowLeft" | "a" | "A" => Some(GameAction::MoveLeft),
        "ArrowRight" | "d" | "D" => Some(GameAction::MoveRight),
        "ArrowUp" | "w" | "W" | " " => Some(GameAction::Jump),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::CENTER_LANE;

    #[test]
    fn test_key_bindings() {
        assert_eq!(action_for_key("ArrowLeft"), Some(GameAction::MoveLeft));
        assert_eq!(action_for_key("a"), Some(GameAction::MoveLeft));
        assert_eq!(action_for_key("A"), Some(GameAction::MoveLeft));
        assert_eq!(action_for_key("ArrowRight"), Some(GameAction::MoveRight));
        assert_eq!(action_for_key("d"), Some(GameAction::MoveRight));
        assert_eq!(action_for_key("ArrowUp"), Some(GameAction::Jump));
        assert_eq!(action_for_key("w"), Some(GameAction::Jump));
        assert_eq!(action_for_key(" "), Some(GameAction::Jump));

        assert_eq!(action_for_key("Escape"), None);
        assert_eq!(action_for_key("q"), None);
    }

    #[test]
    fn test_apply_respects_state_guards() {
        let mut state = RunState::new(1);

        // Menu: nothing reacts
        GameAction::MoveLeft.apply(&mut state);
        GameAction::Jump.apply(&mut state);
        assert_eq!(state.player_lane, CENTER_LANE);
        assert!(!state.is_jumping);

        state.start_game();
        GameAction::MoveLeft.apply(&mut state);
        assert_eq!(state.player_lane, 0);
        GameAction::MoveRight.apply(&mut state);
        assert_eq!(state.player_lane, 1);
        GameAction::Jump.apply(&mut state);
        assert!(state.is_jumping);
    }
}
