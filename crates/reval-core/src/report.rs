//! Report writers (spec §4.6): the primary JSON report, and the optional
//! miss-packet directory tree for human visual review.

use crate::config::EvalConfig;
use crate::error::Result;
use crate::types::{AuditClass, CandidateImage, Match, MissRecord, ReferenceImage, Tier};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct CeilingNotice {
    pub extracted_count: usize,
    pub reference_count: usize,
    pub max_possible_recall: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierBreakdown {
    pub references: usize,
    pub matches: usize,
    pub recall: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub recall: f64,
    pub recall_numerator: usize,
    pub recall_denominator: usize,
    pub false_positive_count: usize,
    pub verdict: String,
    pub ceiling_notice: Option<CeilingNotice>,
    pub per_tier: BTreeMap<String, TierBreakdown>,
    pub matches: Vec<Match>,
    pub false_positives: Vec<String>,
    pub misses: Vec<MissRecord>,
}

/// Assembles the report from the outputs of assignment and diagnostics.
/// `references` and `misses` must already be in sorted `ref_id` order;
/// `matches` and `false_positives` likewise sorted, per spec §4.6.
pub fn build(
    references: &[ReferenceImage],
    candidates_decoded_count: usize,
    matches: Vec<Match>,
    false_positives: Vec<String>,
    misses: Vec<MissRecord>,
    config: &EvalConfig,
) -> EvaluationReport {
    let recall_denominator = references.len();
    let recall_numerator = matches.len();
    let recall = if recall_denominator == 0 {
        1.0
    } else {
        recall_numerator as f64 / recall_denominator as f64
    };

    let ceiling_notice = if candidates_decoded_count < recall_denominator {
        Some(CeilingNotice {
            extracted_count: candidates_decoded_count,
            reference_count: recall_denominator,
            max_possible_recall: if recall_denominator == 0 {
                1.0
            } else {
                candidates_decoded_count as f64 / recall_denominator as f64
            },
        })
    } else {
        None
    };

    let mut per_tier: BTreeMap<String, TierBreakdown> = BTreeMap::new();
    for tier in Tier::ALL {
        let tier_refs: usize = references.iter().filter(|r| r.tier == tier).count();
        let tier_matched: usize = matches
            .iter()
            .filter(|m| {
                references
                    .iter()
                    .find(|r| r.ref_id == m.ref_id)
                    .map(|r| r.tier == tier)
                    .unwrap_or(false)
            })
            .count();
        per_tier.insert(
            tier.as_str().to_string(),
            TierBreakdown {
                references: tier_refs,
                matches: tier_matched,
                recall: if tier_refs == 0 {
                    1.0
                } else {
                    tier_matched as f64 / tier_refs as f64
                },
            },
        );
    }

    let invariant_violation = misses
        .iter()
        .any(|m| m.audit == AuditClass::UnexpectedCurrentTierShouldMatch);
    let numeric_pass = recall >= config.pass_recall_threshold
        && false_positives.len() <= config.pass_max_false_positives;
    let verdict = if numeric_pass && !invariant_violation {
        "PASS"
    } else {
        "FAIL"
    };

    EvaluationReport {
        recall,
        recall_numerator,
        recall_denominator,
        false_positive_count: false_positives.len(),
        verdict: verdict.to_string(),
        ceiling_notice,
        per_tier,
        matches,
        false_positives,
        misses,
    }
}

pub fn write_json(report: &EvaluationReport, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

/// Materializes one subdirectory per unmatched reference, containing the
/// reference image, its top-k candidate images, and a metrics record.
/// References are iterated in the order `misses` was built (sorted by
/// `ref_id`), satisfying the ordering guarantee of spec §4.6.
pub fn write_miss_packets(
    dir: &Path,
    references: &[ReferenceImage],
    candidates: &[CandidateImage],
    misses: &[MissRecord],
) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    for miss in misses {
        let miss_dir = dir.join(&miss.ref_id);
        std::fs::create_dir_all(&miss_dir)?;

        if let Some(reference) = references.iter().find(|r| r.ref_id == miss.ref_id) {
            copy_into(&reference.path, &miss_dir, "reference")?;
        }

        for candidate in &miss.top_candidates {
            if let Some(c) = candidates.iter().find(|c| c.candidate_id == candidate.candidate_id) {
                copy_into(&c.path, &miss_dir, &format!("candidate_{}", candidate.candidate_id))?;
            }
        }

        let metrics_path = miss_dir.join("metrics.json");
        let file = std::fs::File::create(metrics_path)?;
        serde_json::to_writer_pretty(file, miss)?;
    }

    Ok(())
}

fn copy_into(src: &Path, dest_dir: &Path, stem: &str) -> Result<()> {
    let ext = src
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let dest = dest_dir.join(format!("{stem}.{ext}"));
    std::fs::copy(src, dest)?;
    Ok(())
}
