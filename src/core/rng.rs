//! Deterministic Random Number Generator
//!
//! Uses the Xorshift128+ algorithm for fast, high-quality, deterministic
//! randomness. Given the same seed, a run spawns the identical obstacle
//! sequence, which is what makes headless replays and tests reproducible.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Deterministic PRNG using the Xorshift128+ algorithm.
///
/// # Determinism
///
/// Given the same seed, this RNG produces the exact same sequence of
/// values on any platform. Tests inject fixed seeds; live runs derive
/// one via [`derive_run_seed`].
///
/// # Example
///
/// ```
/// use ramen_rush::core::rng::GameRng;
///
/// let mut rng = GameRng::new(12345);
/// let value = rng.next_u64();
/// assert_eq!(value, 6233086606872742541); // Always the same!
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameRng {
    state: [u64; 2],
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl GameRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// The seed is expanded through SplitMix64 so even small or
    /// sequential seeds land on well-distributed state.
    pub fn new(seed: u64) -> Self {
        let mut x = seed;
        let a = splitmix64(&mut x);
        let b = splitmix64(&mut x);

        // All-zero state would lock the generator at zero
        let state = if a == 0 && b == 0 { [1, 1] } else { [a, b] };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let a = self.state[0];
        let mut b = self.state[1];
        let out = a.wrapping_add(b);

        b ^= a;
        self.state[0] = a.rotate_left(24) ^ b ^ (b << 16);
        self.state[1] = b.rotate_left(37);

        out
    }

    /// Generate a random u32.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but the spawner
        // only ever draws from tiny ranges (5 rivals, 3 lanes)
        (self.next_u64() % max as u64) as u32
    }
}

/// SplitMix64, used only to expand seeds into generator state.
#[inline]
fn splitmix64(x: &mut u64) -> u64 {
    *x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a run seed from the player identity and the run start time.
///
/// Runs are single-player, so the seed only has to be fresh per run and
/// reproducible for a replay of that run, not unpredictable. Hashing the
/// inputs under a domain separator keeps run seeds disjoint from every
/// other hash in the system.
///
/// # Parameters
///
/// - `player_id`: the 16-byte player identity (all zeros for anonymous play)
/// - `started_at_millis`: wall-clock run start, Unix milliseconds
pub fn derive_run_seed(player_id: &[u8; 16], started_at_millis: u64) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"RAMEN_RUSH_SEED_V1");

    hasher.update(player_id);
    hasher.update(started_at_millis.to_le_bytes());

    let digest = hasher.finalize();
    u64::from_le_bytes(digest[0..8].try_into().unwrap_or([0u8; 8]))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(seed: u64, count: usize) -> Vec<u64> {
        let mut rng = GameRng::new(seed);
        (0..count).map(|_| rng.next_u64()).collect()
    }

    #[test]
    fn test_rng_determinism() {
        assert_eq!(draw(12345, 1000), draw(12345, 1000));
    }

    #[test]
    fn test_rng_different_seeds() {
        assert_ne!(draw(12345, 4), draw(54321, 4));
    }

    #[test]
    fn test_rng_known_values() {
        // These values must never change!
        // If they do, recorded run seeds will replay differently.
        assert_eq!(
            draw(42, 3),
            vec![
                16629283624882167704,
                1420492921613871959,
                9768315062676884790,
            ]
        );
    }

    #[test]
    fn test_next_int() {
        let mut rng = GameRng::new(1234);

        assert!((0..1000).all(|_| rng.next_int(100) < 100));

        // Degenerate ranges
        assert_eq!(rng.next_int(0), 0);
        assert_eq!(rng.next_int(1), 0);
    }

    #[test]
    fn test_next_int_covers_small_ranges() {
        // Lane and rival draws come from ranges of 3 and 5; every value
        // must actually occur.
        let mut rng = GameRng::new(777);
        let mut seen = [false; 5];
        for _ in 0..200 {
            seen[rng.next_int(5) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_derive_run_seed() {
        let player = [7u8; 16];
        let base = derive_run_seed(&player, 1_700_000_000_000);

        // Reproducible for identical inputs
        assert_eq!(base, derive_run_seed(&player, 1_700_000_000_000));

        // Any input change moves the seed
        assert_ne!(base, derive_run_seed(&player, 1_700_000_000_001));
        assert_ne!(base, derive_run_seed(&[8u8; 16], 1_700_000_000_000));
    }
}
