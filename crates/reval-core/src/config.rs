use std::path::PathBuf;

/// The four acceptance gates for one tier (spec §4.3). Lower distance is
/// better for the hash caps; higher similarity is better for the floors.
#[derive(Debug, Clone, Copy)]
pub struct TierGates {
    pub phash_cap: u32,
    pub dhash_cap: u32,
    pub feature_floor: f64,
    pub fallback_floor: f64,
}

/// Gates for all three tiers. Data, not constants, so property 4
/// (monotonicity under loosened thresholds) is testable by constructing a
/// looser table and re-running.
#[derive(Debug, Clone, Copy)]
pub struct TierThresholds {
    pub icon: TierGates,
    pub mid: TierGates,
    pub board: TierGates,
}

impl TierThresholds {
    pub fn gates_for(&self, tier: crate::types::Tier) -> TierGates {
        match tier {
            crate::types::Tier::Icon => self.icon,
            crate::types::Tier::Mid => self.mid,
            crate::types::Tier::Board => self.board,
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            icon: TierGates {
                phash_cap: 16,
                dhash_cap: 16,
                feature_floor: 0.08,
                fallback_floor: 0.82,
            },
            mid: TierGates {
                phash_cap: 12,
                dhash_cap: 12,
                feature_floor: 0.12,
                fallback_floor: 0.85,
            },
            board: TierGates {
                phash_cap: 10,
                dhash_cap: 10,
                feature_floor: 0.15,
                fallback_floor: 0.88,
            },
        }
    }
}

/// Run-wide tunables, following the teacher's flat-struct-with-`Default`
/// config pattern.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// How many top candidates to record per miss (spec §4.5). Default 5.
    pub top_k_misses: usize,
    /// Enables rayon-parallel per-pair scoring (spec §5).
    pub parallel: bool,
    /// When set, the miss-packet directory tree is materialized here.
    pub miss_packet_dir: Option<PathBuf>,
    /// Minimum recall for a PASS verdict.
    pub pass_recall_threshold: f64,
    /// Maximum false positives for a PASS verdict.
    pub pass_max_false_positives: usize,
    pub tier_thresholds: TierThresholds,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            top_k_misses: 5,
            parallel: true,
            miss_packet_dir: None,
            pass_recall_threshold: 0.90,
            pass_max_false_positives: 2,
            tier_thresholds: TierThresholds::default(),
        }
    }
}

impl EvalConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(0.0..=1.0).contains(&self.pass_recall_threshold) {
            return Err(crate::error::Error::ManifestMalformed(format!(
                "pass_recall_threshold must be in [0,1], got {}",
                self.pass_recall_threshold
            )));
        }
        if self.top_k_misses == 0 {
            return Err(crate::error::Error::ManifestMalformed(
                "top_k_misses must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
