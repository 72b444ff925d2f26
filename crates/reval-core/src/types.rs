//! Core data model shared across every evaluator stage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Size-based acceptance class. Determines which thresholds apply to a
/// reference's candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Icon,
    Mid,
    Board,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Icon, Tier::Mid, Tier::Board];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Icon => "ICON",
            Tier::Mid => "MID",
            Tier::Board => "BOARD",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single rotation-invariant keypoint descriptor: position plus a binary
/// intensity-comparison fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub x: u32,
    pub y: u32,
    pub bits: [u8; 32],
}

/// Local-feature descriptor set for one image.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub descriptors: Vec<Descriptor>,
}

/// 64x64 normalized grayscale fingerprint, row-major, values in [0, 1].
#[derive(Debug, Clone)]
pub struct FallbackSignature {
    pub pixels: Vec<f32>,
}

impl FallbackSignature {
    pub const SIDE: usize = 64;
}

/// The four signatures computed for every reference and candidate image.
#[derive(Debug, Clone)]
pub struct Signatures {
    pub phash: u64,
    pub dhash: u64,
    pub features: FeatureSet,
    pub fallback: FallbackSignature,
}

#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pub ref_id: String,
    pub path: PathBuf,
    pub tier: Tier,
    pub signatures: Signatures,
}

/// Required manifest fields plus pass-through metadata (spec §3/§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct CandidateImage {
    pub candidate_id: String,
    pub path: PathBuf,
    pub signatures: Signatures,
    pub manifest: ManifestRecord,
}

/// Per-pair score for one (reference, candidate). `admissible` is indexed by
/// `Tier::Icon/Mid/Board` so the audit stage can reuse it without
/// recomputation.
#[derive(Debug, Clone, Copy)]
pub struct CandidateScore {
    pub phash_dist: u32,
    pub dhash_dist: u32,
    pub feature_sim: f64,
    pub fallback_sim: f64,
    pub combined: f64,
    pub admissible: [bool; 3],
}

impl CandidateScore {
    pub fn admissible_under(&self, tier: Tier) -> bool {
        self.admissible[tier_index(tier)]
    }
}

pub fn tier_index(tier: Tier) -> usize {
    match tier {
        Tier::Icon => 0,
        Tier::Mid => 1,
        Tier::Board => 2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Phash,
    Dhash,
    Features,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub ref_id: String,
    pub candidate_id: String,
    pub combined_score: f64,
    pub method: MatchMethod,
    pub phash_dist: u32,
    pub dhash_dist: u32,
    pub feature_sim: f64,
    pub fallback_sim: f64,
}

/// One candidate entry inside a miss record, per spec §4.5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissCandidate {
    pub candidate_id: String,
    pub combined_score: f64,
    pub phash_dist: u32,
    pub dhash_dist: u32,
    pub feature_sim: f64,
    pub fallback_sim: f64,
    /// Admissibility under {ICON, MID, BOARD}, in that order.
    pub admissible: [bool; 3],
    /// `ref_id` of the reference currently holding this candidate, if any.
    pub held_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditClass {
    WrongTier,
    NoTierMatches,
    ThresholdMismatch,
    UnexpectedCurrentTierShouldMatch,
    AssignmentCompetition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissRecord {
    pub ref_id: String,
    pub tier: Tier,
    pub top_candidates: Vec<MissCandidate>,
    pub audit: AuditClass,
}
