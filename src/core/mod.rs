//! Core deterministic primitives.
//!
//! The runner's only source of nondeterminism is obstacle selection, so the
//! whole module is one injectable PRNG plus its seed derivation.

pub mod rng;

// Re-export core types
pub use rng::{GameRng, derive_run_seed};
