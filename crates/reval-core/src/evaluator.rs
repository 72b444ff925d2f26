//! Top-level orchestration tying every stage together (spec §2).

use crate::config::EvalConfig;
use crate::discovery;
use crate::error::Result;
use crate::manifest;
use crate::processing;
use crate::report::{self, EvaluationReport};
use crate::scorer;
use crate::tier;
use crate::types::{CandidateImage, Match, ReferenceImage};
use crate::{assignment, diagnostics};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;

pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        reference_dir: &Path,
        extracted_dir: &Path,
        manifest_path: &Path,
    ) -> Result<EvaluationReport> {
        self.config.validate()?;

        log::info!("loading manifest from {}", manifest_path.display());
        let manifest_entries = manifest::load(manifest_path)?;

        log::info!("discovering references in {}", reference_dir.display());
        let ref_files = discovery::discover(reference_dir)?;
        log::info!("discovering candidates in {}", extracted_dir.display());
        let candidate_files = discovery::discover(extracted_dir)?;

        let references = self.load_references(&ref_files)?;
        let candidates = self.load_candidates(&candidate_files, &manifest_entries)?;

        log::info!(
            "scoring {} references against {} candidates",
            references.len(),
            candidates.len()
        );
        let scores = self.score_all(&references, &candidates);

        let assignment = assignment::solve_from_scores(
            references.len(),
            candidates.len(),
            &scores,
            &|i, j| scores[i][j].admissible_under(references[i].tier),
        );

        let mut matches: Vec<Match> = Vec::new();
        let mut held_by: HashMap<String, String> = HashMap::new();
        let mut matched_candidate_idx: std::collections::HashSet<usize> =
            std::collections::HashSet::new();

        for (i, reference) in references.iter().enumerate() {
            if let Some(j) = assignment[i] {
                let score = &scores[i][j];
                let candidate = &candidates[j];
                let method = scorer::decide_method(score, reference.tier, &self.config.tier_thresholds);
                matches.push(Match {
                    ref_id: reference.ref_id.clone(),
                    candidate_id: candidate.candidate_id.clone(),
                    combined_score: score.combined,
                    method,
                    phash_dist: score.phash_dist,
                    dhash_dist: score.dhash_dist,
                    feature_sim: score.feature_sim,
                    fallback_sim: score.fallback_sim,
                });
                held_by.insert(candidate.candidate_id.clone(), reference.ref_id.clone());
                matched_candidate_idx.insert(j);
            }
        }

        let false_positives: Vec<String> = candidates
            .iter()
            .enumerate()
            .filter(|(j, _)| !matched_candidate_idx.contains(j))
            .map(|(_, c)| c.candidate_id.clone())
            .collect();

        let candidate_ids: Vec<String> = candidates.iter().map(|c| c.candidate_id.clone()).collect();
        let misses: Vec<_> = references
            .iter()
            .enumerate()
            .filter(|(i, _)| assignment[*i].is_none())
            .map(|(i, reference)| {
                diagnostics::build_miss_record(
                    &reference.ref_id,
                    reference.tier,
                    &candidate_ids,
                    &scores[i],
                    &held_by,
                    self.config.top_k_misses,
                )
            })
            .collect();

        for miss in &misses {
            if miss.audit == crate::types::AuditClass::UnexpectedCurrentTierShouldMatch {
                log::error!(
                    "invariant violation: reference {} has an admissible, unassigned top candidate",
                    miss.ref_id
                );
            }
        }

        let evaluation = report::build(
            &references,
            candidates.len(),
            matches,
            false_positives,
            misses,
            &self.config,
        );

        if let Some(dir) = &self.config.miss_packet_dir {
            report::write_miss_packets(dir, &references, &candidates, &evaluation.misses)?;
        }

        Ok(evaluation)
    }

    fn load_references(&self, files: &[discovery::DiscoveredImage]) -> Result<Vec<ReferenceImage>> {
        let load_one = |file: &discovery::DiscoveredImage| -> Result<ReferenceImage> {
            let img = crate::io::load(&file.path)?;
            let tier = tier::classify(img.width(), img.height());
            let signatures = processing::compute_signatures(&img);
            Ok(ReferenceImage {
                ref_id: file.id.clone(),
                path: file.path.clone(),
                tier,
                signatures,
            })
        };

        if self.config.parallel {
            files.par_iter().map(load_one).collect()
        } else {
            files.iter().map(load_one).collect()
        }
    }

    fn load_candidates(
        &self,
        files: &[discovery::DiscoveredImage],
        manifest_entries: &HashMap<String, crate::types::ManifestRecord>,
    ) -> Result<Vec<CandidateImage>> {
        let mut kept = Vec::with_capacity(files.len());
        for file in files {
            let file_name = match file.path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            match manifest_entries.get(&file_name) {
                Some(record) => kept.push((file.clone(), record.clone())),
                None => {
                    log::warn!(
                        "candidate {} present on disk but absent from manifest; dropped before scoring",
                        file_name
                    );
                }
            }
        }

        let load_one = |(file, record): &(discovery::DiscoveredImage, crate::types::ManifestRecord)| -> Result<CandidateImage> {
            let img = crate::io::load(&file.path)?;
            let signatures = processing::compute_signatures(&img);
            Ok(CandidateImage {
                candidate_id: file.id.clone(),
                path: file.path.clone(),
                signatures,
                manifest: record.clone(),
            })
        };

        if self.config.parallel {
            kept.par_iter().map(load_one).collect()
        } else {
            kept.iter().map(load_one).collect()
        }
    }

    fn score_all(
        &self,
        references: &[ReferenceImage],
        candidates: &[CandidateImage],
    ) -> Vec<Vec<crate::types::CandidateScore>> {
        let thresholds = self.config.tier_thresholds;
        let pairs: Vec<(usize, usize)> = (0..references.len())
            .flat_map(|i| (0..candidates.len()).map(move |j| (i, j)))
            .collect();

        let score_one = |&(i, j): &(usize, usize)| {
            scorer::score(
                &references[i].signatures,
                &candidates[j].signatures,
                &thresholds,
            )
        };

        let flat: Vec<crate::types::CandidateScore> = if self.config.parallel {
            pairs.par_iter().map(score_one).collect()
        } else {
            pairs.iter().map(score_one).collect()
        };

        let num_candidates = candidates.len();
        let mut rows: Vec<Vec<crate::types::CandidateScore>> = Vec::with_capacity(references.len());
        for chunk in flat.chunks(num_candidates.max(1)) {
            rows.push(chunk.to_vec());
        }
        if candidates.is_empty() {
            rows = references.iter().map(|_| Vec::new()).collect();
        }
        rows
    }
}
