//! Position-list indexes (PLIs) and the derived row/attribute cluster-id
//! matrix, built once in preprocessing and never re-partitioned afterwards.

use crate::table::Table;
use std::collections::HashMap;

/// `-1` sentinel: row is a singleton (unique value) in some attribute.
pub const SINGLETON: i32 = -1;

/// A position-list index for one attribute: the value-equality partition of
/// row-ids, with singleton buckets discarded and the rest ordered by size
/// descending. Remembers which original (pre-sort) attribute it came from.
#[derive(Debug, Clone)]
pub struct Pli {
    pub original_att: usize,
    clusters: Vec<Vec<usize>>,
}

impl Pli {
    /// Buckets row-ids of `table` by the value of attribute `att`, discards
    /// singletons, and orders the remaining clusters by size descending.
    fn build(table: &Table, att: usize) -> Self {
        let mut buckets: HashMap<&str, Vec<usize>> = HashMap::new();
        for r in 0..table.n_rows() {
            buckets.entry(table.cell(r, att)).or_default().push(r);
        }
        let mut clusters: Vec<Vec<usize>> = buckets
            .into_values()
            .filter(|c| c.len() > 1)
            .collect();
        for c in &mut clusters {
            c.sort_unstable();
        }
        clusters.sort_unstable_by(|a, b| b.len().cmp(&a.len()));
        Pli {
            original_att: att,
            clusters,
        }
    }

    /// `number_of_parts = bucket_count + (R - sum(|bucket|))`: non-singleton
    /// clusters count once each, every discarded singleton counts as its own
    /// part. Used to rank attributes from finest to coarsest partition.
    pub fn number_of_parts(&self, n_rows: usize) -> usize {
        let covered: usize = self.clusters.iter().map(Vec::len).sum();
        self.clusters.len() + (n_rows - covered)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn cluster(&self, idx: usize) -> &[usize] {
        &self.clusters[idx]
    }

    pub fn cluster_mut(&mut self, idx: usize) -> &mut Vec<usize> {
        &mut self.clusters[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<usize>> {
        self.clusters.iter()
    }

    /// The column is constant iff there is exactly one cluster, covering
    /// every row.
    pub fn is_constant(&self, n_rows: usize) -> bool {
        self.clusters.len() == 1 && self.clusters[0].len() == n_rows
    }
}

/// `M[r][a]`: the cluster index of row `r` in `PLI[a]` (reindexed attribute
/// space), or `SINGLETON` if row `r` is a singleton in attribute `a`.
#[derive(Debug, Clone)]
pub struct ClusterMatrix {
    cells: Vec<i32>,
    n_rows: usize,
    n_attrs: usize,
}

impl ClusterMatrix {
    fn build(plis: &[Pli], n_rows: usize) -> Self {
        let n_attrs = plis.len();
        let mut cells = vec![SINGLETON; n_rows * n_attrs];
        for (a, pli) in plis.iter().enumerate() {
            for (cluster_id, cluster) in pli.iter().enumerate() {
                for &r in cluster {
                    cells[r * n_attrs + a] = cluster_id as i32;
                }
            }
        }
        ClusterMatrix {
            cells,
            n_rows,
            n_attrs,
        }
    }

    #[inline]
    pub fn get(&self, r: usize, a: usize) -> i32 {
        self.cells[r * self.n_attrs + a]
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_attrs(&self) -> usize {
        self.n_attrs
    }
}

/// The result of preprocessing: attribute-reindexed PLIs (attribute 0 has
/// the finest partition) and the derived cluster-id matrix.
pub struct Preprocessed {
    pub plis: Vec<Pli>,
    pub matrix: ClusterMatrix,
}

/// Builds one PLI per attribute, sorts attributes by `number_of_parts`
/// descending (fixing the reindexed attribute space used throughout the
/// engine), then builds the cluster-id matrix in that new order.
pub fn preprocess(table: &Table) -> Preprocessed {
    let n_rows = table.n_rows();
    let mut plis: Vec<Pli> = (0..table.n_attrs())
        .map(|att| Pli::build(table, att))
        .collect();
    plis.sort_by_key(|p| std::cmp::Reverse(p.number_of_parts(n_rows)));
    let matrix = ClusterMatrix::build(&plis, n_rows);
    Preprocessed { plis, matrix }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> Table {
        Table::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn singleton_buckets_are_discarded() {
        let t = table(&[&["x"], &["y"], &["x"]]);
        let pli = Pli::build(&t, 0);
        assert_eq!(pli.len(), 1);
        assert_eq!(pli.cluster(0), &[0, 2]);
    }

    #[test]
    fn number_of_parts_counts_singletons_individually() {
        // rows: x, y, x, z -> cluster {0,2} (size 2), singles y, z
        let t = table(&[&["x"], &["y"], &["x"], &["z"]]);
        let pli = Pli::build(&t, 0);
        assert_eq!(pli.number_of_parts(4), 1 + (4 - 2));
    }

    #[test]
    fn constant_column_is_one_cluster_covering_all_rows() {
        let t = table(&[&["1"], &["1"], &["1"]]);
        let pli = Pli::build(&t, 0);
        assert!(pli.is_constant(3));
    }

    #[test]
    fn preprocessing_reindexes_by_finest_partition_first() {
        // att0 is constant (coarsest), att1 is all-unique (finest, but
        // all-unique means every row is a singleton -> no clusters at all,
        // so number_of_parts == n_rows, which is the max possible).
        let t = table(&[&["1", "a"], &["1", "b"], &["1", "c"]]);
        let pp = preprocess(&t);
        assert_eq!(pp.plis[0].original_att, 1);
        assert_eq!(pp.plis[1].original_att, 0);
    }

    #[test]
    fn cluster_matrix_agrees_with_plis() {
        let t = table(&[&["a", "1"], &["a", "2"], &["b", "1"]]);
        let pp = preprocess(&t);
        for a in 0..pp.plis.len() {
            for (cluster_id, cluster) in pp.plis[a].iter().enumerate() {
                for &r in cluster {
                    assert_eq!(pp.matrix.get(r, a), cluster_id as i32);
                }
            }
        }
    }
}
