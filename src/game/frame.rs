//! Frame Update Pipeline
//!
//! The per-frame step function that drives a run. Any driver works,
//! whether a render loop feeding real frame deltas, a headless
//! simulation feeding fixed ones, or a test feeding hand-picked values;
//! the pipeline only ever sees elapsed seconds. Given the same seed and
//! the same delta sequence, a run plays out identically.

use serde::{Serialize, Deserialize};

use crate::core::rng::GameRng;
use crate::game::events::RunEvent;
use crate::game::jump;
use crate::game::state::{Obstacle, Rival, RunPhase, RunState, INITIAL_SPEED, LANE_COUNT};

/// Result of one frame step.
#[derive(Debug)]
#[derive(Default)]
pub struct FrameResult {
    /// Events generated this frame, in pipeline order
    pub events: Vec<RunEvent>,
    /// Whether a collision ended the run on this frame
    pub run_ended: bool,
}

/// Track tuning.
///
/// Every numeric policy of the pipeline lives here; the defaults are the
/// shipped game. Serializable so deployments can override individual
/// values from a config file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Forward position obstacles spawn at, far ahead of the player
    pub spawn_position: f32,
    /// Forward position past which an obstacle counts as avoided
    pub despawn_position: f32,
    /// Near edge of the collision band (exclusive)
    pub collision_near: f32,
    /// Far edge of the collision band (exclusive)
    pub collision_far: f32,
    /// Seconds between spawns at score zero
    pub base_spawn_interval: f32,
    /// The interval never shrinks below this fraction of the base
    pub min_interval_factor: f32,
    /// Score at which the raw interval factor would reach zero
    pub interval_score_scale: f32,
    /// Score awarded per avoided obstacle
    pub avoid_reward: u32,
    /// Speed floor; also the start-of-run speed
    pub base_speed: f32,
    /// Speed ceiling
    pub max_speed: f32,
    /// Score milestone granularity for speed raises
    pub speed_milestone: u32,
    /// Divisor converting score into bonus speed
    pub speed_divisor: f32,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            spawn_position: -80.0,
            despawn_position: 10.0,
            collision_near: 0.0,
            collision_far: 4.0,
            base_spawn_interval: 1.5,
            min_interval_factor: 0.3,
            interval_score_scale: 10_000.0,
            avoid_reward: 100,
            base_speed: INITIAL_SPEED,
            max_speed: 35.0,
            speed_milestone: 500,
            speed_divisor: 200.0,
        }
    }
}

impl TrackConfig {
    /// Seconds between spawns at the given score. Shrinks linearly as the
    /// score grows, floored at `min_interval_factor` of the base.
    pub fn spawn_interval(&self, score: u32) -> f32 {
        let factor =
            (1.0 - score as f32 / self.interval_score_scale).max(self.min_interval_factor);
        self.base_spawn_interval * factor
    }

    /// Target speed once the given milestone score is reached, capped at
    /// `max_speed`.
    pub fn milestone_speed(&self, score: u32) -> f32 {
        (self.base_speed + score as f32 / self.speed_divisor).min(self.max_speed)
    }
}

/// Advance one frame.
///
/// No-op unless the run is Playing. Order within the frame:
///
/// 1. Jump arc clock (landing happens here)
/// 2. Advance obstacles by `speed * delta`
/// 3. Despawn passed obstacles, paying the avoidance reward
/// 4. Spawn one obstacle when the interval has elapsed
/// 5. Raise speed at score milestones
/// 6. Collision check; a hit ends the run and the frame immediately
/// 7. Distance accrual
///
/// # Determinism
///
/// The only randomness is the obstacle draw from `state`'s own RNG, so
/// identical seeds and delta sequences replay identically.
pub fn step(state: &mut RunState, delta: f32, config: &TrackConfig) -> FrameResult {
    let mut result = FrameResult::default();

    if state.phase != RunPhase::Playing {
        return result;
    }

    state.clock += delta;

    // 1. Jump arc
    advance_jump(state, delta);

    // 2. Advance obstacles toward (and past) the player
    let travel = state.speed * delta;
    for obstacle in &mut state.obstacles {
        obstacle.position += travel;
    }

    // 3. Despawn and score
    despawn_passed(state, config, &mut result.events);

    // 4. Spawn
    maybe_spawn(state, config, &mut result.events);

    // 5. Difficulty
    apply_difficulty(state, config, &mut result.events);

    // 6. Collision: first hit ends the run, skipping distance accrual
    if let Some(hit) = detect_collision(state, config) {
        state.end_game();
        result.events.push(RunEvent::Collision {
            id: hit.id,
            lane: hit.lane,
            final_score: state.score,
        });
        result.run_ended = true;
        return result;
    }

    // 7. Distance accrual
    state.distance += state.speed * delta;

    result
}

/// Advance the jump clock and land when the arc completes. Landing here,
/// before the collision check, means the airborne flag the check sees
/// reflects time through this frame.
fn advance_jump(state: &mut RunState, delta: f32) {
    if !state.is_jumping {
        return;
    }
    state.jump_elapsed += delta;
    if jump::is_complete(state.jump_elapsed) {
        state.land();
    }
}

/// Remove every obstacle past the despawn threshold; each one pays the
/// avoidance reward exactly once.
fn despawn_passed(state: &mut RunState, config: &TrackConfig, events: &mut Vec<RunEvent>) {
    // Collect first: the reward mutates counters the retain closure
    // cannot touch while the obstacle list is borrowed
    let mut passed: Vec<Obstacle> = Vec::new();
    let threshold = config.despawn_position;
    state.obstacles.retain(|obstacle| {
        if obstacle.position > threshold {
            passed.push(*obstacle);
            false
        } else {
            true
        }
    });

    for obstacle in passed {
        state.obstacles_avoided += 1;
        state.score = state.score.saturating_add(config.avoid_reward);
        events.push(RunEvent::ObstacleAvoided {
            id: obstacle.id,
            new_score: state.score,
            total_avoided: state.obstacles_avoided,
        });
    }
}

/// Spawn at most one obstacle per frame, whenever the score-scaled
/// interval has elapsed. The first check of a run always fires.
fn maybe_spawn(state: &mut RunState, config: &TrackConfig, events: &mut Vec<RunEvent>) {
    let due = match state.last_spawn {
        None => true,
        Some(at) => state.clock - at > config.spawn_interval(state.score),
    };
    if !due {
        return;
    }

    let rival = random_rival(&mut state.rng);
    let lane = state.rng.next_int(LANE_COUNT as u32) as u8;
    let id = state.spawn_obstacle(rival, lane, config.spawn_position);
    state.last_spawn = Some(state.clock);

    events.push(RunEvent::ObstacleSpawned { id, rival, lane });
}

/// Pick a rival variant uniformly.
fn random_rival(rng: &mut GameRng) -> Rival {
    match rng.next_int(Rival::COUNT as u32) {
        0 => Rival::Shadow,
        1 => Rival::Blossom,
        2 => Rival::Mystic,
        3 => Rival::Sensei,
        _ => Rival::Maverick,
    }
}

/// Raise speed when the score sits on a positive milestone. The score
/// rests there for many frames; only the first check actually raises.
fn apply_difficulty(state: &mut RunState, config: &TrackConfig, events: &mut Vec<RunEvent>) {
    if config.speed_milestone == 0 {
        return;
    }
    if state.score == 0 || state.score % config.speed_milestone != 0 {
        return;
    }

    let target = config.milestone_speed(state.score);
    if target > state.speed {
        state.speed = target;
        events.push(RunEvent::SpeedRaised {
            speed: target,
            score: state.score,
        });
    }
}

/// First obstacle (spawn order) occupying the player's lane inside the
/// collision band while the player is grounded. Any single hit is enough
/// to end the run, so order among simultaneous hits does not matter.
fn detect_collision(state: &RunState, config: &TrackConfig) -> Option<Obstacle> {
    if state.is_jumping {
        return None;
    }
    let lane = state.player_lane;
    state
        .obstacles
        .iter()
        .find(|o| {
            o.lane == lane
                && o.position > config.collision_near
                && o.position < config.collision_far
        })
        .copied()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::CENTER_LANE;

    const DT: f32 = 1.0 / 60.0;

    fn playing_state(seed: u64) -> RunState {
        let mut state = RunState::new(seed);
        state.start_game();
        state
    }

    #[test]
    fn test_step_noop_outside_playing() {
        let config = TrackConfig::default();

        let mut state = RunState::new(1);
        let result = step(&mut state, DT, &config);
        assert!(result.events.is_empty());
        assert!(state.obstacles.is_empty());
        assert_eq!(state.distance, 0.0);

        state.start_game();
        state.pause();
        let result = step(&mut state, DT, &config);
        assert!(result.events.is_empty());
        assert_eq!(state.distance, 0.0);
    }

    #[test]
    fn test_obstacles_advance_by_speed_delta() {
        let config = TrackConfig::default();
        let mut state = playing_state(1);
        state.spawn_obstacle(Rival::Shadow, 0, -80.0);

        step(&mut state, 1.0, &config);

        // -80 + 15 * 1.0, plus whatever the first frame spawned at -80
        let moved = state.obstacles.iter().find(|o| o.id == 0).unwrap();
        assert!((moved.position - (-65.0)).abs() < 1e-4);
    }

    #[test]
    fn test_first_frame_spawns_immediately() {
        let config = TrackConfig::default();
        let mut state = playing_state(7);

        let result = step(&mut state, DT, &config);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e, RunEvent::ObstacleSpawned { .. })));
        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.obstacles[0].position, config.spawn_position);
        assert!(state.obstacles[0].lane < LANE_COUNT);
    }

    #[test]
    fn test_spawn_waits_for_interval() {
        let config = TrackConfig::default();
        let mut state = playing_state(7);

        step(&mut state, 1.0, &config); // first spawn, clock 1.0
        assert_eq!(state.obstacles.len(), 1);

        // 1.0s since last spawn: not yet past the 1.5s interval
        step(&mut state, 1.0, &config);
        assert_eq!(state.obstacles.len(), 1);

        // 2.0s since last spawn: due
        step(&mut state, 1.0, &config);
        assert_eq!(state.obstacles.len(), 2);
    }

    #[test]
    fn test_spawn_interval_shrinks_with_score() {
        let config = TrackConfig::default();
        assert!((config.spawn_interval(0) - 1.5).abs() < 1e-6);
        assert!((config.spawn_interval(5_000) - 0.75).abs() < 1e-6);
        // Floored at 30% of base from score 7000 up
        assert!((config.spawn_interval(10_000) - 0.45).abs() < 1e-6);
        assert!((config.spawn_interval(50_000) - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_despawn_rewards_exactly_once() {
        let config = TrackConfig::default();
        let mut state = playing_state(1);
        // Past the despawn threshold after one frame advance; lane 1 is
        // the player's but 10+ is far outside the collision band
        state.spawn_obstacle(Rival::Blossom, CENTER_LANE, 9.9);

        let result = step(&mut state, 1.0, &config);
        assert_eq!(state.score, 100);
        assert_eq!(state.obstacles_avoided, 1);
        assert!(result.events.iter().any(|e| matches!(
            e,
            RunEvent::ObstacleAvoided { id: 0, new_score: 100, total_avoided: 1 }
        )));
        assert!(state.obstacles.iter().all(|o| o.id != 0));

        // Nothing left to reward
        step(&mut state, 1.0, &config);
        assert_eq!(state.score, 100);
        assert_eq!(state.obstacles_avoided, 1);
    }

    #[test]
    fn test_despawn_threshold_is_exclusive() {
        let config = TrackConfig::default();
        let mut state = playing_state(1);
        state.spawn_obstacle(Rival::Mystic, 0, 10.0);
        state.spawn_obstacle(Rival::Mystic, 0, 10.1);

        // Zero delta: no advance, pure threshold check
        step(&mut state, 0.0, &config);
        assert_eq!(state.obstacles_avoided, 1);
        assert!(state.obstacles.iter().any(|o| o.position == 10.0));
    }

    #[test]
    fn test_milestone_speed_values() {
        let config = TrackConfig::default();
        assert!((config.milestone_speed(500) - 17.5).abs() < 1e-6);
        assert!((config.milestone_speed(1_000) - 20.0).abs() < 1e-6);
        // 15 + 4000/200 = 35: exactly at the cap
        assert!((config.milestone_speed(4_000) - 35.0).abs() < 1e-6);
        assert!((config.milestone_speed(20_000) - 35.0).abs() < 1e-6);
    }

    #[test]
    fn test_difficulty_raises_only_on_milestones() {
        let config = TrackConfig::default();
        let mut state = playing_state(1);

        state.score = 400;
        step(&mut state, DT, &config);
        assert_eq!(state.speed, INITIAL_SPEED);

        state.score = 500;
        let result = step(&mut state, DT, &config);
        assert_eq!(state.speed, 17.5);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e, RunEvent::SpeedRaised { speed, score: 500 } if *speed == 17.5)));

        // Resting on the milestone: no second raise, no event spam
        let result = step(&mut state, DT, &config);
        assert_eq!(state.speed, 17.5);
        assert!(!result
            .events
            .iter()
            .any(|e| matches!(e, RunEvent::SpeedRaised { .. })));
    }

    #[test]
    fn test_five_avoidances_reach_first_milestone() {
        let config = TrackConfig::default();
        let mut state = playing_state(1);
        for lane in [0, 1, 2, 0, 1] {
            state.spawn_obstacle(Rival::Sensei, lane, 9.9);
        }

        let result = step(&mut state, DT, &config);

        assert_eq!(state.obstacles_avoided, 5);
        assert_eq!(state.score, 500);
        // The milestone applies on the same frame the score reaches it
        assert_eq!(state.speed, 17.5);
        assert_eq!(
            result
                .events
                .iter()
                .filter(|e| matches!(e, RunEvent::ObstacleAvoided { .. }))
                .count(),
            5
        );
    }

    #[test]
    fn test_collision_ends_run_and_frame() {
        let config = TrackConfig::default();
        let mut state = playing_state(1);
        state.spawn_obstacle(Rival::Shadow, CENTER_LANE, 2.0);

        let result = step(&mut state, DT, &config);

        assert_eq!(state.phase, RunPhase::GameOver);
        assert!(result.run_ended);
        assert!(result.events.iter().any(|e| matches!(
            e,
            RunEvent::Collision { id: 0, lane: 1, .. }
        )));
        // The frame aborted before distance accrual
        assert_eq!(state.distance, 0.0);
        // Score and the obstacle list freeze for the game-over screen
        assert!(!state.obstacles.is_empty());
    }

    #[test]
    fn test_collision_requires_same_lane() {
        let config = TrackConfig::default();
        let mut state = playing_state(1);
        state.spawn_obstacle(Rival::Shadow, 0, 2.0);
        state.player_lane = 2;

        step(&mut state, DT, &config);
        assert_eq!(state.phase, RunPhase::Playing);
    }

    #[test]
    fn test_collision_band_is_exclusive() {
        let config = TrackConfig::default();

        // Exactly on the near edge: no hit
        let mut state = playing_state(1);
        state.spawn_obstacle(Rival::Maverick, CENTER_LANE, 0.0);
        step(&mut state, 0.0, &config);
        assert_eq!(state.phase, RunPhase::Playing);

        // Exactly on the far edge: no hit
        let mut state = playing_state(1);
        state.spawn_obstacle(Rival::Maverick, CENTER_LANE, 4.0);
        step(&mut state, 0.0, &config);
        assert_eq!(state.phase, RunPhase::Playing);

        // Just inside: hit
        let mut state = playing_state(1);
        state.spawn_obstacle(Rival::Maverick, CENTER_LANE, 3.9);
        step(&mut state, 0.0, &config);
        assert_eq!(state.phase, RunPhase::GameOver);
    }

    #[test]
    fn test_jump_clears_collision() {
        let config = TrackConfig::default();
        let mut state = playing_state(1);
        state.spawn_obstacle(Rival::Shadow, CENTER_LANE, 2.0);
        state.jump();

        let result = step(&mut state, DT, &config);

        assert_eq!(state.phase, RunPhase::Playing);
        assert!(!result.run_ended);
        assert!(state.distance > 0.0);
    }

    #[test]
    fn test_jump_lands_after_duration() {
        let config = TrackConfig::default();
        let mut state = playing_state(1);
        state.jump();

        step(&mut state, 0.3, &config);
        assert!(state.is_jumping);
        assert!(state.jump_height() > 0.0);

        step(&mut state, 0.4, &config);
        assert!(!state.is_jumping);
        assert_eq!(state.jump_height(), 0.0);
    }

    #[test]
    fn test_landing_frame_can_collide() {
        let config = TrackConfig::default();
        let mut state = playing_state(1);
        state.jump();
        // Obstacle parked in the band; speed 0 keeps it there
        state.speed = 0.0;
        state.spawn_obstacle(Rival::Blossom, CENTER_LANE, 2.0);

        // Arc still in progress: safe
        step(&mut state, 0.5, &config);
        assert_eq!(state.phase, RunPhase::Playing);

        // This frame completes the arc before the collision check runs
        step(&mut state, 0.2, &config);
        assert_eq!(state.phase, RunPhase::GameOver);
    }

    #[test]
    fn test_distance_accrues_by_speed() {
        let config = TrackConfig::default();
        let mut state = playing_state(1);

        step(&mut state, 1.0, &config);
        assert!((state.distance - 15.0).abs() < 1e-4);

        step(&mut state, 0.5, &config);
        assert!((state.distance - 22.5).abs() < 1e-4);
    }

    #[test]
    fn test_speed_stays_within_bounds_over_long_run() {
        let config = TrackConfig::default();
        let mut state = playing_state(3);

        for i in 0..200 {
            // Feed scores around milestones, including far past the cap
            state.score = i * 250;
            state.phase = RunPhase::Playing;
            step(&mut state, DT, &config);
            assert!(state.speed >= config.base_speed);
            assert!(state.speed <= config.max_speed);
        }
    }

    #[test]
    fn test_identical_seeds_replay_identically() {
        let config = TrackConfig::default();
        let mut a = playing_state(99);
        let mut b = playing_state(99);

        let mut events_a = Vec::new();
        let mut events_b = Vec::new();
        for _ in 0..500 {
            events_a.extend(step(&mut a, DT, &config).events);
            events_b.extend(step(&mut b, DT, &config).events);
        }

        assert_eq!(a.phase, b.phase);
        assert_eq!(a.score, b.score);
        assert_eq!(a.distance, b.distance);
        assert_eq!(a.obstacles, b.obstacles);
        assert_eq!(events_a, events_b);
    }
}
