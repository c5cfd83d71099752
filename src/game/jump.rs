//! Jump Arc
//!
//! The jump is a fixed-duration half-sine vertical displacement,
//! parameterized purely by time. The frame pipeline advances the clock
//! and lands the player; renderers sample [`height`] for the visual.
//! Airborne status is what matters to collisions, not the height itself.

use std::f32::consts::PI;

/// Total arc duration in seconds.
pub const JUMP_DURATION: f32 = 0.6;

/// Peak vertical displacement in world units, reached at the midpoint.
pub const JUMP_HEIGHT: f32 = 3.0;

/// Vertical displacement `elapsed` seconds into a jump.
///
/// Zero at takeoff and landing, `JUMP_HEIGHT` at the midpoint; zero for
/// any time outside the arc.
#[inline]
pub fn height(elapsed: f32) -> f32 {
    if elapsed < 0.0 || elapsed >= JUMP_DURATION {
        return 0.0;
    }
    JUMP_HEIGHT * (PI * elapsed / JUMP_DURATION).sin()
}

/// Has an arc that started `elapsed` seconds ago finished?
#[inline]
pub fn is_complete(elapsed: f32) -> bool {
    elapsed >= JUMP_DURATION
}

// =============================================================================
// TESTS
// =============================================================================
