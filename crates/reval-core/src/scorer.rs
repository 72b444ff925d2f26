//! Candidate scorer (spec §4.4).

use crate::config::TierThresholds;
use crate::processing::{dhash, features, fallback, phash};
use crate::tier;
use crate::types::{CandidateScore, MatchMethod, Signatures, Tier};

const FEATURE_FLOOR_FOR_EFFECTIVE: f64 = 0.05;

/// Scores one (reference, candidate) pair against every tier's gates.
/// `admissible` is indexed by `types::tier_index`.
pub fn score(reference: &Signatures, candidate: &Signatures, thresholds: &TierThresholds) -> CandidateScore {
    let phash_dist = phash::distance(reference.phash, candidate.phash);
    let dhash_dist = dhash::distance(reference.dhash, candidate.dhash);
    let feature_sim = features::similarity(&reference.features, &candidate.features);
    let fallback_sim = fallback::similarity(&reference.fallback, &candidate.fallback);

    let effective_feature_sim = if feature_sim >= FEATURE_FLOOR_FOR_EFFECTIVE {
        feature_sim
    } else {
        fallback_sim
    };
    let combined = 0.55 * phash_dist.min(dhash_dist) as f64
        + 0.45 * (1.0 - effective_feature_sim) * 20.0;

    let admissible = Tier::ALL.map(|t| {
        tier::is_admissible(
            thresholds.gates_for(t),
            phash_dist,
            dhash_dist,
            feature_sim,
            fallback_sim,
        )
    });

    CandidateScore {
        phash_dist,
        dhash_dist,
        feature_sim,
        fallback_sim,
        combined,
        admissible,
    }
}

/// Which single signal made a matched pair admissible under `tier`,
/// checked in a fixed priority order (spec §4.3: "any single signal can
/// carry admissibility").
pub fn decide_method(score: &CandidateScore, tier: Tier, thresholds: &TierThresholds) -> MatchMethod {
    let gates = thresholds.gates_for(tier);
    if score.phash_dist <= gates.phash_cap {
        MatchMethod::Phash
    } else if score.dhash_dist <= gates.dhash_cap {
        MatchMethod::Dhash
    } else if score.feature_sim >= gates.feature_floor {
        MatchMethod::Features
    } else {
        MatchMethod::Fallback
    }
}
