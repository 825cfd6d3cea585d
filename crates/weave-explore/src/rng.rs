//! Per-stage RNG seeding with ChaCha8.
//!
//! Every random consumer of a search (the random fallback, the mutators,
//! each portfolio member) gets its own ChaCha8Rng seeded from
//! `(global_seed + stage_id)`. Same seed -> same search, always.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Stage id of the random fallback inside a fuzzing controller.
pub const FALLBACK_STAGE: u64 = 0;
/// Stage id of the mutation source inside a fuzzing controller.
pub const MUTATION_STAGE: u64 = 1;
/// First stage id handed to plain random portfolio members.
pub const PORTFOLIO_STAGE_BASE: u64 = 16;

/// Create a deterministic RNG for a given global seed and stage ID.
pub fn stage_rng(global_seed: u64, stage_id: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(global_seed.wrapping_add(stage_id))
}

/// Stage id of the `member`-th random strategy rotating alongside the lead
/// strategy.
pub fn portfolio_stage(member: usize) -> u64 {
    PORTFOLIO_STAGE_BASE.wrapping_add(member as u64)
}
