//! Miss packet construction and tier audit classification (spec §4.5).

use crate::types::{tier_index, AuditClass, CandidateScore, MissCandidate, MissRecord, Tier};
use std::collections::HashMap;

/// Builds the miss record for one unmatched reference: its top-k candidates
/// by ascending combined score (ties broken by candidate id), each
/// annotated with admissibility under all three tiers and who currently
/// holds it, plus the tier audit classification.
pub fn build_miss_record(
    ref_id: &str,
    tier: Tier,
    candidate_ids: &[String],
    scores: &[CandidateScore],
    held_by: &HashMap<String, String>,
    top_k: usize,
) -> MissRecord {
    let mut order: Vec<usize> = (0..candidate_ids.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .combined
            .partial_cmp(&scores[b].combined)
            .unwrap()
            .then_with(|| candidate_ids[a].cmp(&candidate_ids[b]))
    });

    let top_candidates: Vec<MissCandidate> = order
        .iter()
        .take(top_k)
        .map(|&idx| MissCandidate {
            candidate_id: candidate_ids[idx].clone(),
            combined_score: scores[idx].combined,
            phash_dist: scores[idx].phash_dist,
            dhash_dist: scores[idx].dhash_dist,
            feature_sim: scores[idx].feature_sim,
            fallback_sim: scores[idx].fallback_sim,
            admissible: scores[idx].admissible,
            held_by: held_by.get(&candidate_ids[idx]).cloned(),
        })
        .collect();

    let audit = classify(tier, &top_candidates);

    MissRecord {
        ref_id: ref_id.to_string(),
        tier,
        top_candidates,
        audit,
    }
}

fn classify(tier: Tier, top_candidates: &[MissCandidate]) -> AuditClass {
    let Some(top) = top_candidates.first() else {
        return AuditClass::NoTierMatches;
    };

    let admissible_current = top.admissible[tier_index(tier)];
    let admissible_any_other = Tier::ALL
        .iter()
        .any(|&t| t != tier && top.admissible[tier_index(t)]);

    if admissible_current {
        if top.held_by.is_none() {
            AuditClass::UnexpectedCurrentTierShouldMatch
        } else {
            AuditClass::AssignmentCompetition
        }
    } else if admissible_any_other {
        AuditClass::WrongTier
    } else {
        AuditClass::NoTierMatches
    }
}
