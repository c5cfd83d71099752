//! Game State Definitions
//!
//! The single owned state record for one player's run, plus the obstacle
//! model. All transitions are explicit methods; the frame pipeline in
//! [`crate::game::frame`] is the only other mutator.

use serde::{Serialize, Deserialize};

use crate::core::rng::GameRng;
use crate::game::jump;

// =============================================================================
// TRACK CONSTANTS
// =============================================================================

/// Number of lanes on the track.
pub const LANE_COUNT: u8 = 3;

/// The center lane, where every run starts.
pub const CENTER_LANE: u8 = 1;

/// Forward speed at the start of a run, in units per second.
pub const INITIAL_SPEED: f32 = 15.0;

// =============================================================================
// RIVAL (Obstacle Variant)
// =============================================================================

/// Obstacle character variant.
///
/// Purely cosmetic as far as the simulation is concerned; every rival
/// blocks its lane the same way. The renderer picks the model by variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rival {
    /// Dark cloak, fast idle animation
    Shadow = 0,
    /// Pink-haired, mid height
    Blossom = 1,
    /// Pale eyes, narrow silhouette
    Mystic = 2,
    /// Masked, silver hair
    Sensei = 3,
    /// Black turtleneck, arms crossed
    Maverick = 4,
}

impl Rival {
    /// Number of rival variants.
    pub const COUNT: u8 = 5;

    /// Get variant from index (0-4).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Rival::Shadow),
            1 => Some(Rival::Blossom),
            2 => Some(Rival::Mystic),
            3 => Some(Rival::Sensei),
            4 => Some(Rival::Maverick),
            _ => None,
        }
    }
}

// =============================================================================
// OBSTACLE
// =============================================================================

/// One obstacle on the track.
///
/// Created by the spawner, advanced by the frame pipeline, removed when it
/// passes the despawn threshold behind the player.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Unique id within the run (monotonic counter)
    pub id: u32,

    /// Character variant
    pub rival: Rival,

    /// Lane index (0..LANE_COUNT)
    pub lane: u8,

    /// Forward position: spawned far negative, increases toward the player
    /// at 0 and past them to the despawn threshold
    pub position: f32,
}

impl Obstacle {
    /// Create a new obstacle.
    pub fn new(id: u32, rival: Rival, lane: u8, position: f32) -> Self {
        Self { id, rival, lane, position }
    }
}

// =============================================================================
// RUN PHASE
// =============================================================================

/// Current phase of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum RunPhase {
    /// Title screen, nothing simulated
    #[default]
    Menu,
    /// Active gameplay
    Playing,
    /// Frozen mid-run, resumable
    Paused,
    /// Run over, final score frozen for display and submission
    GameOver,
}

// =============================================================================
// RUN STATE
// =============================================================================

/// Complete state of one player's run.
///
/// Owned by whoever drives the game (render loop, headless simulation,
/// tests); there is no global. The public fields are what UI layers
/// observe; frame bookkeeping stays private to the game module.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunState {
    /// Current phase
    pub phase: RunPhase,

    /// Score this run; only avoided obstacles add to it (100 each)
    pub score: u32,

    /// Cached personal best, reconciled from the record service.
    /// Survives run resets.
    pub high_score: u32,

    /// Distance traveled this run, speed integrated over playing time
    pub distance: f32,

    /// Obstacles that passed without a collision
    pub obstacles_avoided: u32,

    /// Player lane index (0..LANE_COUNT), starts center
    pub player_lane: u8,

    /// True while the jump arc is in progress
    pub is_jumping: bool,

    /// Live obstacles in spawn order, ids unique within the run
    pub obstacles: Vec<Obstacle>,

    /// Forward speed in units per second, raised at score milestones
    pub speed: f32,

    /// Seed this state's RNG was created from (for replays)
    pub seed: u64,

    /// Obstacle randomness; injectable via the seed
    #[serde(skip)]
    pub(crate) rng: GameRng,

    /// Seconds spent in Playing this run
    pub(crate) clock: f32,

    /// Run-clock time of the last spawn; None until the first, so the
    /// first spawn check always fires
    pub(crate) last_spawn: Option<f32>,

    /// Seconds into the current jump arc
    pub(crate) jump_elapsed: f32,

    /// Next obstacle id (monotonic within the run)
    pub(crate) next_obstacle_id: u32,
}

impl RunState {
    /// Create a fresh state at the menu.
    ///
    /// The seed fixes the obstacle sequence; drivers derive one per
    /// session via [`crate::core::rng::derive_run_seed`], tests pass
    /// constants.
    pub fn new(seed: u64) -> Self {
        Self {
            phase: RunPhase::Menu,
            score: 0,
            high_score: 0,
            distance: 0.0,
            obstacles_avoided: 0,
            player_lane: CENTER_LANE,
            is_jumping: false,
            obstacles: Vec::new(),
            speed: INITIAL_SPEED,
            seed,
            rng: GameRng::new(seed),
            clock: 0.0,
            last_spawn: None,
            jump_elapsed: 0.0,
            next_obstacle_id: 0,
        }
    }

    /// Reset everything a run touches. `high_score`, the RNG stream and
    /// the seed survive.
    fn clear_run(&mut self) {
        self.score = 0;
        self.distance = 0.0;
        self.obstacles_avoided = 0;
        self.player_lane = CENTER_LANE;
        self.is_jumping = false;
        self.obstacles.clear();
        self.speed = INITIAL_SPEED;
        self.clock = 0.0;
        self.last_spawn = None;
        self.jump_elapsed = 0.0;
        self.next_obstacle_id = 0;
    }

    /// Start (or restart) a run: full reset, then Playing.
    ///
    /// Valid from any phase; restarting mid-run simply abandons the run.
    pub fn start_game(&mut self) {
        self.clear_run();
        self.phase = RunPhase::Playing;
    }

    /// End the run. Score and distance freeze at their final values.
    pub fn end_game(&mut self) {
        self.phase = RunPhase::GameOver;
    }

    /// Freeze the run. Only valid while Playing, so a stray pause cannot
    /// drag a finished run out of GameOver.
    pub fn pause(&mut self) {
        if self.phase == RunPhase::Playing {
            self.phase = RunPhase::Paused;
        }
    }

    /// Unfreeze a paused run. Only valid while Paused.
    pub fn resume(&mut self) {
        if self.phase == RunPhase::Paused {
            self.phase = RunPhase::Playing;
        }
    }

    /// Shift one lane left. No-op outside Playing or at the left edge.
    pub fn move_left(&mut self) {
        if self.phase == RunPhase::Playing && self.player_lane > 0 {
            self.player_lane -= 1;
        }
    }

    /// Shift one lane right. No-op outside Playing or at the right edge.
    pub fn move_right(&mut self) {
        if self.phase == RunPhase::Playing && self.player_lane + 1 < LANE_COUNT {
            self.player_lane += 1;
        }
    }

    /// Begin a jump. No-op outside Playing or while already airborne,
    /// so there is no mid-air double jump.
    pub fn jump(&mut self) {
        if self.phase == RunPhase::Playing && !self.is_jumping {
            self.is_jumping = true;
            self.jump_elapsed = 0.0;
        }
    }

    /// Touch down. Invoked exactly once per completed arc by the frame
    /// pipeline; a new jump is enterable afterwards.
    pub fn land(&mut self) {
        self.is_jumping = false;
        self.jump_elapsed = 0.0;
    }

    /// Back to the menu with all run counters cleared. Same reset payload
    /// as [`start_game`](Self::start_game), different destination phase.
    pub fn reset_game(&mut self) {
        self.clear_run();
        self.phase = RunPhase::Menu;
    }

    /// Update the cached personal best. Only the records layer calls
    /// this, from a submission response or a profile fetch.
    pub fn set_high_score(&mut self, score: u32) {
        self.high_score = score;
    }

    /// Is the simulation live?
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.phase == RunPhase::Playing
    }

    /// Current vertical displacement of the player, for presentation.
    /// Zero whenever grounded.
    pub fn jump_height(&self) -> f32 {
        if self.is_jumping {
            jump::height(self.jump_elapsed)
        } else {
            0.0
        }
    }

    /// Add an obstacle to the track, assigning it the next id.
    pub fn spawn_obstacle(&mut self, rival: Rival, lane: u8, position: f32) -> u32 {
        let id = self.next_obstacle_id;
        self.next_obstacle_id += 1;
        self.obstacles.push(Obstacle::new(id, rival, lane, position));
        id
    }
}

// =============================================================================
// TESTS
// =============================================================================
