//! End-to-end evaluator scenarios and the testable properties they exercise.

use image::{ImageBuffer, Rgb};
use reval_core::config::EvalConfig;
use reval_core::evaluator::Evaluator;
use std::path::{Path, PathBuf};

fn write_png(path: &Path, w: u32, h: u32, pattern: &dyn Fn(u32, u32) -> [u8; 3]) {
    let buf: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(w, h, |x, y| Rgb(pattern(x, y)));
    buf.save(path).unwrap();
}

fn checkerboard(cell: u32) -> impl Fn(u32, u32) -> [u8; 3] {
    move |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            [230, 230, 230]
        } else {
            [20, 20, 20]
        }
    }
}

fn solid(rgb: [u8; 3]) -> impl Fn(u32, u32) -> [u8; 3] {
    move |_, _| rgb
}

fn write_manifest(path: &Path, entries: &[(&str, u32, u32)]) {
    let arr: Vec<serde_json::Value> = entries
        .iter()
        .map(|(name, w, h)| {
            serde_json::json!({ "file_name": name, "width": w, "height": h })
        })
        .collect();
    std::fs::write(path, serde_json::to_string(&serde_json::Value::Array(arr)).unwrap()).unwrap();
}

struct Scenario {
    dir: tempfile::TempDir,
}

impl Scenario {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("refs")).unwrap();
        std::fs::create_dir_all(dir.path().join("candidates")).unwrap();
        Self { dir }
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        self.dir.path().join("refs").join(name)
    }

    fn candidate_path(&self, name: &str) -> PathBuf {
        self.dir.path().join("candidates").join(name)
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.path().join("manifest.json")
    }

    fn refs_dir(&self) -> PathBuf {
        self.dir.path().join("refs")
    }

    fn candidates_dir(&self) -> PathBuf {
        self.dir.path().join("candidates")
    }
}

// S2: trivial identity. References and candidates hold byte-identical
// files; every reference must match its copy with a zero combined score.
#[test]
fn s2_trivial_identity_yields_perfect_recall() {
    let s = Scenario::new();
    let names = ["r1.png", "r2.png", "r3.png"];
    for (i, name) in names.iter().enumerate() {
        let pattern = checkerboard(4 + i as u32);
        write_png(&s.ref_path(name), 96, 96, &pattern);
        std::fs::copy(s.ref_path(name), s.candidate_path(name)).unwrap();
    }
    write_manifest(
        &s.manifest_path(),
        &names.iter().map(|n| (*n, 96, 96)).collect::<Vec<_>>(),
    );

    let evaluator = Evaluator::new(EvalConfig::default());
    let report = evaluator
        .run(&s.refs_dir(), &s.candidates_dir(), &s.manifest_path())
        .unwrap();

    assert_eq!(report.matches.len(), 3);
    assert_eq!(report.false_positives.len(), 0);
    assert_eq!(report.misses.len(), 0);
    assert_eq!(report.recall, 1.0);
    assert_eq!(report.verdict, "PASS");
    assert!(report.ceiling_notice.is_none());

    for m in &report.matches {
        assert_eq!(m.phash_dist, 0);
        assert_eq!(m.dhash_dist, 0);
        assert_eq!(m.combined_score, 0.0);
    }
}

// S3: empty extracted directory and empty manifest. Every reference misses
// with NO_TIER_MATCHES, and the ceiling notice caps recall at zero.
#[test]
fn s3_empty_extracted_yields_all_misses() {
    let s = Scenario::new();
    for i in 0..5 {
        let name = format!("r{i}.png");
        write_png(&s.ref_path(&name), 64, 64, &solid([i as u8 * 10, 0, 0]));
    }
    write_manifest(&s.manifest_path(), &[]);

    let evaluator = Evaluator::new(EvalConfig::default());
    let report = evaluator
        .run(&s.refs_dir(), &s.candidates_dir(), &s.manifest_path())
        .unwrap();

    assert_eq!(report.matches.len(), 0);
    assert_eq!(report.false_positives.len(), 0);
    assert_eq!(report.misses.len(), 5);
    assert_eq!(report.recall, 0.0);
    assert_eq!(report.verdict, "FAIL");
    let notice = report.ceiling_notice.expect("ceiling notice must be present");
    assert_eq!(notice.max_possible_recall, 0.0);
    for miss in &report.misses {
        assert_eq!(miss.audit, reval_core::types::AuditClass::NoTierMatches);
    }
}

// S4: excess, unrelated candidates. The true duplicates match; the
// unrelated candidates become false positives and push the verdict to FAIL.
#[test]
fn s4_excess_unrelated_candidates_become_false_positives() {
    let s = Scenario::new();
    let ref_names = ["r1.png", "r2.png", "r3.png"];
    for (i, name) in ref_names.iter().enumerate() {
        write_png(&s.ref_path(name), 200, 200, &checkerboard(8 + i as u32 * 2));
        std::fs::copy(s.ref_path(name), s.candidate_path(name)).unwrap();
    }

    let mut manifest_entries: Vec<(&str, u32, u32)> =
        ref_names.iter().map(|n| (*n, 200, 200)).collect();

    let unrelated_names = [
        "u0.png", "u1.png", "u2.png", "u3.png", "u4.png", "u5.png", "u6.png",
    ];
    let shades: [u8; 7] = [0, 30, 60, 90, 150, 180, 255];
    for (name, shade) in unrelated_names.iter().zip(shades.iter()) {
        write_png(&s.candidate_path(name), 200, 200, &solid([*shade, *shade, *shade]));
    }
    for name in unrelated_names {
        manifest_entries.push((name, 200, 200));
    }

    write_manifest(&s.manifest_path(), &manifest_entries);

    let evaluator = Evaluator::new(EvalConfig::default());
    let report = evaluator
        .run(&s.refs_dir(), &s.candidates_dir(), &s.manifest_path())
        .unwrap();

    assert_eq!(report.matches.len(), 3);
    assert_eq!(report.misses.len(), 0);
    assert_eq!(report.false_positives.len(), 7);
    assert_eq!(report.recall, 1.0);
    assert_eq!(report.verdict, "FAIL"); // false_positive_count(7) > 2
    assert!(report.ceiling_notice.is_none());
}

// Property: one-to-one matching. No ref_id or candidate_id repeats across matches.
#[test]
fn property_one_to_one_matching() {
    let s = Scenario::new();
    let names = ["r1.png", "r2.png"];
    for name in names {
        write_png(&s.ref_path(name), 80, 80, &checkerboard(5));
        std::fs::copy(s.ref_path(name), s.candidate_path(name)).unwrap();
    }
    write_manifest(&s.manifest_path(), &names.iter().map(|n| (*n, 80, 80)).collect::<Vec<_>>());

    let evaluator = Evaluator::new(EvalConfig::default());
    let report = evaluator
        .run(&s.refs_dir(), &s.candidates_dir(), &s.manifest_path())
        .unwrap();

    let mut ref_ids: Vec<&str> = report.matches.iter().map(|m| m.ref_id.as_str()).collect();
    let mut cand_ids: Vec<&str> = report.matches.iter().map(|m| m.candidate_id.as_str()).collect();
    let ref_len = ref_ids.len();
    let cand_len = cand_ids.len();
    ref_ids.sort();
    ref_ids.dedup();
    cand_ids.sort();
    cand_ids.dedup();
    assert_eq!(ref_ids.len(), ref_len);
    assert_eq!(cand_ids.len(), cand_len);
}

// Property: conservation. matches+false_positives == candidates scored;
// matches+misses == references.
#[test]
fn property_conservation() {
    let s = Scenario::new();
    write_png(&s.ref_path("r1.png"), 80, 80, &checkerboard(5));
    write_png(&s.ref_path("r2.png"), 80, 80, &checkerboard(7));
    std::fs::copy(s.ref_path("r1.png"), s.candidate_path("r1.png")).unwrap();
    write_png(&s.candidate_path("unrelated.png"), 80, 80, &solid([0, 0, 0]));
    write_manifest(
        &s.manifest_path(),
        &[("r1.png", 80, 80), ("unrelated.png", 80, 80)],
    );

    let evaluator = Evaluator::new(EvalConfig::default());
    let report = evaluator
        .run(&s.refs_dir(), &s.candidates_dir(), &s.manifest_path())
        .unwrap();

    let candidates_decoded = 2; // r1.png + unrelated.png, both in manifest
    assert_eq!(report.matches.len() + report.false_positives.len(), candidates_decoded);
    assert_eq!(report.matches.len() + report.misses.len(), 2);
}

// Property: determinism. Running twice over the same inputs yields byte-identical reports.
#[test]
fn property_determinism_across_runs() {
    let s = Scenario::new();
    let names = ["r1.png", "r2.png", "r3.png"];
    for (i, name) in names.iter().enumerate() {
        write_png(&s.ref_path(name), 90, 90, &checkerboard(3 + i as u32));
    }
    write_png(&s.candidate_path("r1.png"), 90, 90, &checkerboard(3));
    write_png(&s.candidate_path("other.png"), 90, 90, &solid([77, 77, 77]));
    write_manifest(
        &s.manifest_path(),
        &[("r1.png", 90, 90), ("other.png", 90, 90)],
    );

    let evaluator = Evaluator::new(EvalConfig::default());
    let first = evaluator
        .run(&s.refs_dir(), &s.candidates_dir(), &s.manifest_path())
        .unwrap();
    let second = evaluator
        .run(&s.refs_dir(), &s.candidates_dir(), &s.manifest_path())
        .unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

// Property: monotonicity. Loosening every tier's thresholds cannot decrease the match count.
#[test]
fn property_monotonicity_under_looser_thresholds() {
    let s = Scenario::new();
    write_png(&s.ref_path("r1.png"), 80, 80, &checkerboard(5));
    write_png(&s.candidate_path("r1.png"), 80, 80, &checkerboard(6));
    write_manifest(&s.manifest_path(), &[("r1.png", 80, 80)]);

    let strict_config = EvalConfig {
        tier_thresholds: {
            let mut t = reval_core::config::TierThresholds::default();
            t.icon.phash_cap = 0;
            t.icon.dhash_cap = 0;
            t.icon.feature_floor = 1.0;
            t.icon.fallback_floor = 1.0;
            t
        },
        ..EvalConfig::default()
    };
    let loose_config = EvalConfig {
        tier_thresholds: {
            let mut t = reval_core::config::TierThresholds::default();
            t.icon.phash_cap = 64;
            t.icon.dhash_cap = 64;
            t.icon.feature_floor = 0.0;
            t.icon.fallback_floor = 0.0;
            t
        },
        ..EvalConfig::default()
    };

    let strict_report = Evaluator::new(strict_config)
        .run(&s.refs_dir(), &s.candidates_dir(), &s.manifest_path())
        .unwrap();
    let loose_report = Evaluator::new(loose_config)
        .run(&s.refs_dir(), &s.candidates_dir(), &s.manifest_path())
        .unwrap();

    assert!(loose_report.matches.len() >= strict_report.matches.len());
}

// Property: admissibility. Every recorded match is admissible under the
// reference's own tier when recomputed directly from the scorer.
#[test]
fn property_every_match_is_admissible_under_its_own_tier() {
    let s = Scenario::new();
    let names = ["r1.png", "r2.png"];
    for name in names {
        write_png(&s.ref_path(name), 80, 80, &checkerboard(4));
        std::fs::copy(s.ref_path(name), s.candidate_path(name)).unwrap();
    }
    write_manifest(&s.manifest_path(), &names.iter().map(|n| (*n, 80, 80)).collect::<Vec<_>>());

    let config = EvalConfig::default();
    let report = Evaluator::new(config.clone())
        .run(&s.refs_dir(), &s.candidates_dir(), &s.manifest_path())
        .unwrap();

    for m in &report.matches {
        let ref_img = reval_core::io::load(&s.ref_path(&format!("{}.png", m.ref_id))).unwrap();
        let cand_img =
            reval_core::io::load(&s.candidate_path(&format!("{}.png", m.candidate_id))).unwrap();
        let ref_sigs = reval_core::processing::compute_signatures(&ref_img);
        let cand_sigs = reval_core::processing::compute_signatures(&cand_img);
        let tier = reval_core::tier::classify(ref_img.width(), ref_img.height());
        let score = reval_core::scorer::score(&ref_sigs, &cand_sigs, &config.tier_thresholds);
        assert!(score.admissible_under(tier));
    }
}

// Property: unicode path safety. Non-ASCII file names must decode and
// score exactly like their byte-identical ASCII-renamed counterparts.
#[test]
fn property_unicode_paths_do_not_error_or_change_bytes_read() {
    let s = Scenario::new();
    let unicode_name = "参考画像_a.png";
    write_png(&s.ref_path(unicode_name), 64, 64, &checkerboard(4));
    std::fs::copy(s.ref_path(unicode_name), s.candidate_path(unicode_name)).unwrap();
    write_manifest(&s.manifest_path(), &[(unicode_name, 64, 64)]);

    let evaluator = Evaluator::new(EvalConfig::default());
    let report = evaluator
        .run(&s.refs_dir(), &s.candidates_dir(), &s.manifest_path())
        .unwrap();

    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].combined_score, 0.0);
}
