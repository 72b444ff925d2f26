//! Tier classification and admissibility (spec §4.3).

use crate::config::TierGates;
use crate::types::{CandidateScore, Tier};

/// Classifies a reference into a size tier from its pixel dimensions.
pub fn classify(width: u32, height: u32) -> Tier {
    let min_dim = width.min(height);
    let area = width as u64 * height as u64;

    if area >= 250_000 || min_dim >= 600 {
        Tier::Board
    } else if min_dim < 140 || area < 25_000 {
        Tier::Icon
    } else {
        Tier::Mid
    }
}

/// A pair is admissible iff at least one of the four signals clears its
/// gate for the given tier.
pub fn is_admissible(
    gates: TierGates,
    phash_dist: u32,
    dhash_dist: u32,
    feature_sim: f64,
    fallback_sim: f64,
) -> bool {
    phash_dist <= gates.phash_cap
        || dhash_dist <= gates.dhash_cap
        || feature_sim >= gates.feature_floor
        || fallback_sim >= gates.fallback_floor
}

/// True if `score` is admissible under the reference's own tier.
pub fn admissible_for_own_tier(score: &CandidateScore, tier: Tier) -> bool {
    score.admissible_under(tier)
}
