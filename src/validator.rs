//! Level-by-level PLI validation of the FD tree's current conjectures,
//! yielding both specializations for invalid FDs and comparison
//! suggestions the sampler can turn directly into non-FD masks.

use crate::fd_tree::FdTree;
use crate::pli::{ClusterMatrix, Pli};
use std::collections::HashMap;

/// Checks which of `rhss` are actually determined by `lhs` against the
/// PLIs, by walking the clusters of `lhs`'s first (smallest-index)
/// attribute and comparing row signatures. Any pair of rows that agree on
/// `lhs` but disagree on some candidate RHS is reported as a comparison
/// suggestion for the sampler, and that RHS is dropped from the result.
fn refines(
    plis: &[Pli],
    matrix: &ClusterMatrix,
    n_rows: usize,
    lhs: &[usize],
    rhss: &[usize],
    comparison_suggestions: &mut Vec<(usize, usize)>,
) -> Vec<usize> {
    if rhss.is_empty() {
        return Vec::new();
    }
    if lhs.is_empty() {
        return rhss
            .iter()
            .copied()
            .filter(|&i| plis[i].is_constant(n_rows))
            .collect();
    }

    let mut mask: Vec<usize> = (0..rhss.len()).collect();
    let mut s_lhs = lhs.to_vec();
    s_lhs.sort_unstable();
    let lhs_len = s_lhs.len();
    let probing_att = s_lhs[0];
    let signature_atts: Vec<usize> = s_lhs.iter().chain(rhss.iter()).copied().collect();

    struct MappingEntry {
        rows: Vec<usize>,
        s2: Vec<i32>,
    }
    let mut mapping: HashMap<Vec<i32>, MappingEntry> = HashMap::new();

    'clusters: for cluster in plis[probing_att].iter() {
        for &row in cluster {
            let sig: Vec<i32> = signature_atts.iter().map(|&a| matrix.get(row, a)).collect();
            let s1 = &sig[..lhs_len];
            let s2 = &sig[lhs_len..];
            if s1.iter().any(|&v| v < 0) {
                continue;
            }
            match mapping.get_mut(s1) {
                None => {
                    mapping.insert(s1.to_vec(), MappingEntry { rows: vec![row], s2: s2.to_vec() });
                }
                Some(entry) => {
                    let diff: Vec<usize> = mask
                        .iter()
                        .copied()
                        .filter(|&i| s2[i] < 0 || s2[i] != entry.s2[i])
                        .collect();
                    if diff.is_empty() {
                        entry.rows.push(row);
                    } else {
                        for &tj in &entry.rows {
                            comparison_suggestions.push((tj, row));
                        }
                        mask.retain(|i| !diff.contains(i));
                    }
                }
            }
            if mask.is_empty() {
                break 'clusters;
            }
        }
    }

    mask.into_iter().map(|i| rhss[i]).collect()
}

/// Drives the level-order validation walk across possibly many engine
/// iterations: each call to [`Validator::run`] processes tree levels until
/// either the tree is fully validated (no invalid FDs remain anywhere) or
/// the invalid/valid ratio at some level exceeds `invalid_fds_threshold`,
/// at which point it yields control back to the sampler/inductor for
/// another round.
pub struct Validator {
    current_level_number: usize,
    invalid_fds_threshold: f64,
}

impl Validator {
    pub fn new(invalid_fds_threshold: f64) -> Self {
        Validator {
            current_level_number: 0,
            invalid_fds_threshold,
        }
    }

    /// Returns `true` if discovery should keep going (there may still be
    /// invalid FDs to chase), `false` once the whole tree validates clean.
    pub fn run(
        &mut self,
        fds: &mut FdTree,
        plis: &[Pli],
        matrix: &ClusterMatrix,
        comparison_suggestions: &mut Vec<(usize, usize)>,
    ) -> bool {
        // Re-fetched every call (not just the first) so that nodes the
        // inductor added since the previous call — at exactly the depth
        // this call is about to process — are picked up rather than
        // silently skipped in favor of a stale, locally-built level.
        let mut current_level = fds.get_level(self.current_level_number);

        let n_rows = matrix.n_rows();
        loop {
            if current_level.is_empty() {
                return false;
            }

            let mut invalid_fds: Vec<(Vec<usize>, Vec<usize>)> = Vec::new();
            let mut num_valid_fds = 0usize;
            for &node in &current_level {
                let lhs = fds.get_lhs(node);
                let rhss = fds.get_rhss(node);
                if rhss.is_empty() {
                    continue;
                }
                let valid = refines(plis, matrix, n_rows, &lhs, &rhss, comparison_suggestions);
                num_valid_fds += valid.len();
                let invalid: Vec<usize> = rhss.into_iter().filter(|r| !valid.contains(r)).collect();
                invalid_fds.push((lhs, invalid));
            }

            let mut next_level = Vec::new();
            for &node in &current_level {
                next_level.extend(fds.get_children(node));
            }
            for (lhs, rhss) in &invalid_fds {
                next_level.extend(fds.specialize(lhs, rhss));
            }

            current_level = next_level;
            self.current_level_number += 1;

            if (invalid_fds.len() as f64) > self.invalid_fds_threshold * num_valid_fds as f64 {
                return true;
            }
        }
    }
}
