//! Windowed pairwise-comparison sampler: the source of every observed
//! non-FD agreement mask fed to the inductor.

use crate::efficiency::Efficiency;
use crate::non_fd_set::NonFdSet;
use crate::pli::{ClusterMatrix, Pli};

/// Agreement mask between two rows: bit `a` is set iff both rows share the
/// same (non-singleton) cluster in attribute `a`.
fn match_rows(matrix: &ClusterMatrix, r1: usize, r2: usize) -> Vec<bool> {
    (0..matrix.n_attrs())
        .map(|a| {
            let v1 = matrix.get(r1, a);
            let v2 = matrix.get(r2, a);
            v1 == v2 && v1 >= 0
        })
        .collect()
}

/// Slides `efficiency.window` across every cluster of `pli`, comparing the
/// two rows at each end of the window, recording any non-trivial mask in
/// `non_fds`, and crediting the attribute's efficiency with however many of
/// those comparisons turned out to be new.
fn run_window(efficiency: &mut Efficiency, pli: &Pli, matrix: &ClusterMatrix, non_fds: &mut NonFdSet) {
    let prev = non_fds.len();
    for cluster in pli.iter() {
        if cluster.len() < efficiency.window {
            continue;
        }
        for i in 0..=(cluster.len() - efficiency.window) {
            let pivot = cluster[i];
            let partner = cluster[i + efficiency.window - 1];
            let compare = match_rows(matrix, pivot, partner);
            if compare.iter().any(|&b| !b) {
                non_fds.append(compare);
            }
            efficiency.increase_comps();
        }
    }
    efficiency.results += (non_fds.len() - prev) as f64;
}

/// Drives the sampling phase: on the very first call it reorders every
/// PLI's clusters by neighbor-attribute cluster key and seeds one
/// [`Efficiency`] per attribute; on later calls it folds in the validator's
/// comparison suggestions before resuming the efficiency-queue-driven
/// window walk. Returns `false` once discovery should stop.
pub struct Sampler {
    efficiency_queue: Vec<Efficiency>,
    efficiency_threshold: f64,
    learning_factor: f64,
    efficiency_limit: f64,
    initialized: bool,
}

impl Sampler {
    pub fn new(efficiency_threshold: f64, learning_factor: f64, efficiency_limit: f64) -> Self {
        Sampler {
            efficiency_queue: Vec::new(),
            efficiency_threshold,
            learning_factor,
            efficiency_limit,
            initialized: false,
        }
    }

    fn reorder_clusters(plis: &mut [Pli], matrix: &ClusterMatrix) {
        let n_attrs = plis.len();
        for x in 0..n_attrs {
            let ileft = (x + n_attrs - 1) % n_attrs;
            let iright = (x + 1) % n_attrs;
            for idx in 0..plis[x].len() {
                plis[x].cluster_mut(idx).sort_by_key(|&row| {
                    let left = matrix.get(row, ileft);
                    if left >= 0 {
                        left
                    } else {
                        matrix.get(row, iright)
                    }
                });
            }
        }
    }

    /// Runs one sampling phase. `comparison_suggestions` are the
    /// validator's `(row_a, row_b)` pairs from the previous iteration,
    /// empty on the very first call.
    pub fn run(
        &mut self,
        plis: &mut [Pli],
        matrix: &ClusterMatrix,
        non_fds: &mut NonFdSet,
        comparison_suggestions: &[(usize, usize)],
    ) -> bool {
        if !self.initialized {
            Self::reorder_clusters(plis, matrix);
            for (x, pli) in plis.iter().enumerate() {
                let mut eff = Efficiency::new(x, pli);
                run_window(&mut eff, pli, matrix, non_fds);
                self.efficiency_queue.push(eff);
            }
            self.initialized = true;
        } else {
            self.efficiency_threshold *= self.learning_factor;
            for &(a, b) in comparison_suggestions {
                non_fds.append(match_rows(matrix, a, b));
            }
        }

        let mut go_on = true;
        loop {
            // Drop entries that are done (including all-unique columns whose
            // `total` was 0 from the start) before ranking, so the queue
            // never has to compare a NaN `eval()` against anything.
            self.efficiency_queue.retain(|e| !e.done);
            if self.efficiency_queue.is_empty() {
                go_on = false;
                break;
            }
            self.efficiency_queue
                .sort_by(|a, b| b.eval().partial_cmp(&a.eval()).unwrap_or(std::cmp::Ordering::Equal));

            let best = &mut self.efficiency_queue[0];
            best.window += 1;
            run_window(best, &plis[best.att], matrix, non_fds);
            let best_done = best.done;
            let best_eval = best.eval();

            if best_done {
                self.efficiency_queue.remove(0);
            }
            if self.efficiency_queue.is_empty() {
                go_on = false;
                break;
            }
            if best_eval < self.efficiency_threshold {
                break;
            }
        }

        if self.efficiency_threshold <= self.efficiency_limit {
            go_on = false;
        }
        go_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pli::preprocess;
    use crate::table::Table;

    fn table(rows: &[&[&str]]) -> Table {
        Table::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn first_run_seeds_one_efficiency_per_attribute() {
        let t = table(&[
            &["a", "1"],
            &["a", "1"],
            &["b", "2"],
            &["b", "2"],
        ]);
        let mut pp = preprocess(&t);
        let mut non_fds = NonFdSet::new();
        let mut sampler = Sampler::new(0.01, 0.5, 1e-14);
        sampler.run(&mut pp.plis, &pp.matrix, &mut non_fds, &[]);
        assert_eq!(sampler.efficiency_queue.len(), pp.plis.len());
    }

    #[test]
    fn perfectly_correlated_columns_yield_no_non_fds() {
        // attribute 1 is fully determined by attribute 0: every comparison
        // within a cluster of attribute 0 should agree on attribute 1 too.
        let t = table(&[
            &["a", "1"],
            &["a", "1"],
            &["a", "1"],
            &["b", "2"],
            &["b", "2"],
        ]);
        let mut pp = preprocess(&t);
        let mut non_fds = NonFdSet::new();
        let mut sampler = Sampler::new(0.01, 0.5, 1e-14);
        sampler.run(&mut pp.plis, &pp.matrix, &mut non_fds, &[]);
        assert_eq!(non_fds.len(), 0);
    }

    #[test]
    fn key_column_does_not_panic_the_efficiency_queue() {
        // attribute 0 is an all-unique key column (every PLI cluster is a
        // discarded singleton, so its Efficiency starts `done` with
        // `total == 0`); attribute 1 repeats. Sorting the queue used to
        // panic comparing that entry's NaN `eval()` against attribute 1's.
        let t = table(&[&["1", "a"], &["2", "a"], &["3", "b"]]);
        let mut pp = preprocess(&t);
        let mut non_fds = NonFdSet::new();
        let mut sampler = Sampler::new(0.01, 0.5, 1e-14);
        sampler.run(&mut pp.plis, &pp.matrix, &mut non_fds, &[]);
    }

    #[test]
    fn conflicting_columns_produce_a_non_fd_mask() {
        let t = table(&[
            &["a", "1"],
            &["a", "2"],
        ]);
        let mut pp = preprocess(&t);
        let mut non_fds = NonFdSet::new();
        let mut sampler = Sampler::new(0.01, 0.5, 1e-14);
        sampler.run(&mut pp.plis, &pp.matrix, &mut non_fds, &[]);
        // attribute 0 agrees, attribute 1 disagrees -> mask (true, false)
        let masks = non_fds.read_all();
        assert!(masks.contains(&vec![true, false]));
    }
}
