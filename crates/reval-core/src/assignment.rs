//! Global minimum-cost bipartite assignment (spec §4.5).
//!
//! No teacher or pack example implements a matching solver of this kind;
//! this is original, standard, textbook code (the classic O(n^3)
//! shortest-augmenting-path Hungarian algorithm with vertex potentials).
//!
//! The graph is padded to a square matrix so references and candidates of
//! unequal count can both go unmatched ("dummy" rows/columns). Admissible
//! real edges get their cost offset by a large negative constant so the
//! solver always prefers matching over leaving a pair unmatched — this
//! reduces "maximize matches, then minimize cost" to a plain min-cost
//! perfect matching on the padded square matrix. A small tie-break
//! perturbation, proportional to each edge's rank in `(candidate_id,
//! ref_id)` order, is added on top so that when two admissible assignments
//! tie on combined score, the solver deterministically prefers the one
//! with the lexicographically smaller `(candidate_id, ref_id)`, per spec's
//! mandated tie-break rule. The rank is normalized into `[0, 1)` and scaled
//! by `TIE_EPSILON / n` so the total perturbation summed over an entire
//! assignment (at most `n` edges) stays bounded by `TIE_EPSILON` no matter
//! how large the matrix gets — it can never grow large enough to outweigh
//! a genuine, non-zero combined-score gap between two candidate
//! assignments.

use crate::types::CandidateScore;

const UNMATCHED_OFFSET: f64 = 1.0e9;
const TIE_EPSILON: f64 = 1.0e-9;

/// `result[i]` is `Some(j)` if reference row `i` is matched to candidate
/// column `j`, `None` if reference `i` is unmatched.
pub fn solve(num_refs: usize, num_candidates: usize, admissible_combined: &dyn Fn(usize, usize) -> Option<f64>) -> Vec<Option<usize>> {
    let n = num_refs.max(num_candidates).max(1);
    let mut cost = vec![vec![0.0f64; n]; n];

    let total_pairs = (num_refs * num_candidates).max(1) as f64;
    let per_edge_epsilon = TIE_EPSILON / n as f64;
    for i in 0..num_refs {
        for j in 0..num_candidates {
            if let Some(combined) = admissible_combined(i, j) {
                let tie_rank = (j * num_refs + i) as f64 / total_pairs;
                cost[i][j] = combined - UNMATCHED_OFFSET + tie_rank * per_edge_epsilon;
            }
        }
    }

    let assignment = hungarian(&cost);

    (0..num_refs)
        .map(|i| {
            let j = assignment[i];
            if j < num_candidates && admissible_combined(i, j).is_some() {
                Some(j)
            } else {
                None
            }
        })
        .collect()
}

/// Classic Kuhn-Munkres assignment on an `n x n` matrix, minimizing total
/// cost. Returns `assignment[row] = column`. Handles negative costs; no
/// non-negativity requirement (we rely on this for the unmatched offset).
fn hungarian(cost: &[Vec<f64>]) -> Vec<usize> {
    let n = cost.len();
    const INF: f64 = f64::INFINITY;

    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; n + 1];
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![INF; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = INF;
            let mut j1 = 0usize;

            for j in 1..=n {
                if !used[j] {
                    let cur = cost[i0 - 1][j - 1] - u[i0] - v[j];
                    if cur < minv[j] {
                        minv[j] = cur;
                        way[j] = j0;
                    }
                    if minv[j] < delta {
                        delta = minv[j];
                        j1 = j;
                    }
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut result = vec![usize::MAX; n];
    for j in 1..=n {
        if p[j] != 0 {
            result[p[j] - 1] = j - 1;
        }
    }
    result
}

/// Convenience wrapper used by callers that already hold the dense score
/// matrix (`scores[ref_idx][candidate_idx]`).
pub fn solve_from_scores(
    num_refs: usize,
    num_candidates: usize,
    scores: &[Vec<CandidateScore>],
    ref_tier_admissible: &dyn Fn(usize, usize) -> bool,
) -> Vec<Option<usize>> {
    solve(num_refs, num_candidates, &|i, j| {
        if ref_tier_admissible(i, j) {
            Some(scores[i][j].combined)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_unique_best_pairs() {
        // refs 0,1 ; candidates 0,1 ; ref0-cand0 cheap, ref1-cand1 cheap.
        let cost = |i: usize, j: usize| -> Option<f64> {
            match (i, j) {
                (0, 0) => Some(1.0),
                (0, 1) => Some(5.0),
                (1, 0) => Some(5.0),
                (1, 1) => Some(1.0),
                _ => None,
            }
        };
        let result = solve(2, 2, &cost);
        assert_eq!(result, vec![Some(0), Some(1)]);
    }

    #[test]
    fn prefers_matching_over_leaving_unmatched_even_if_costly() {
        let cost = |i: usize, j: usize| -> Option<f64> {
            if i == 0 && j == 0 {
                Some(40.0)
            } else {
                None
            }
        };
        let result = solve(1, 1, &cost);
        assert_eq!(result, vec![Some(0)]);
    }

    #[test]
    fn excess_references_leave_some_unmatched() {
        let cost = |i: usize, j: usize| -> Option<f64> {
            if j == 0 && i == 0 {
                Some(1.0)
            } else {
                None
            }
        };
        let result = solve(2, 1, &cost);
        assert_eq!(result[0], Some(0));
        assert_eq!(result[1], None);
    }

    #[test]
    fn competition_awards_candidate_to_cheaper_reference() {
        // Both refs admissible for the single candidate; ref0 scores better.
        let cost = |i: usize, j: usize| -> Option<f64> {
            match (i, j) {
                (0, 0) => Some(2.0),
                (1, 0) => Some(8.0),
                _ => None,
            }
        };
        let result = solve(2, 1, &cost);
        assert_eq!(result[0], Some(0));
        assert_eq!(result[1], None);
    }
}
