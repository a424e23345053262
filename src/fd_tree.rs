//! The FD prefix tree: an arena of nodes (no owned parent/child cycles, per
//! the design note on cyclic back-references) holding the currently
//! conjectured valid minimal functional dependencies.
//!
//! A root-to-node path (excluding the root's own sentinel) is an LHS
//! attribute set; a node's RHS bit-set says which attributes are currently
//! believed functionally determined by that LHS.

use std::collections::BTreeMap;

const ROOT: usize = 0;
const NO_ATT: i64 = -1;

#[derive(Debug)]
struct FdNode {
    att: i64,
    parent: Option<usize>,
    children: BTreeMap<usize, usize>,
    rhs: Vec<bool>,
}

impl FdNode {
    fn new(att: i64, parent: Option<usize>, n_attrs: usize) -> Self {
        FdNode {
            att,
            parent,
            children: BTreeMap::new(),
            rhs: vec![false; n_attrs],
        }
    }
}

/// Arena-backed prefix tree of conjectured FDs. `n_attrs` bounds the width
/// of every node's RHS bit-set.
#[derive(Debug)]
pub struct FdTree {
    n_attrs: usize,
    nodes: Vec<FdNode>,
}

impl FdTree {
    pub fn new(n_attrs: usize) -> Self {
        FdTree {
            n_attrs,
            nodes: vec![FdNode::new(NO_ATT, None, n_attrs)],
        }
    }

    fn lhs_sorted(lhs: &[usize]) -> Vec<usize> {
        let mut v = lhs.to_vec();
        v.sort_unstable();
        v.dedup();
        v
    }

    /// Traverses/creates the path for `lhs`, sets every bit in `rhss`, and
    /// returns the index of the (now-existing) terminal node.
    pub fn add(&mut self, lhs: &[usize], rhss: &[usize]) -> usize {
        let s_lhs = Self::lhs_sorted(lhs);
        let mut current = ROOT;
        for att in s_lhs {
            current = match self.nodes[current].children.get(&att) {
                Some(&child) => child,
                None => {
                    let new_idx = self.nodes.len();
                    self.nodes.push(FdNode::new(att as i64, Some(current), self.n_attrs));
                    self.nodes[current].children.insert(att, new_idx);
                    new_idx
                }
            };
        }
        for &r in rhss {
            self.nodes[current].rhs[r] = true;
        }
        current
    }

    /// Clears the RHS bit for `rhs` at the node addressed by `lhs`. The path
    /// is not pruned: the subtree may still hold more specific FDs.
    ///
    /// Panics if no node exists for `lhs` — the caller is expected to have
    /// obtained `lhs` from this same tree (an internal invariant violation
    /// otherwise).
    pub fn remove(&mut self, lhs: &[usize], rhs: usize) {
        let idx = self.find(lhs).unwrap_or_else(|| {
            panic!("FdTree::remove: no node for lhs {lhs:?} (internal invariant violation)")
        });
        self.nodes[idx].rhs[rhs] = false;
    }

    fn find(&self, lhs: &[usize]) -> Option<usize> {
        let s_lhs = Self::lhs_sorted(lhs);
        let mut current = ROOT;
        for att in s_lhs {
            current = *self.nodes[current].children.get(&att)?;
        }
        Some(current)
    }

    pub fn get_lhs(&self, node: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut cur = Some(node);
        while let Some(idx) = cur {
            let n = &self.nodes[idx];
            if n.att >= 0 {
                out.push(n.att as usize);
            }
            cur = n.parent;
        }
        out.sort_unstable();
        out
    }

    pub fn get_rhss(&self, node: usize) -> Vec<usize> {
        self.nodes[node]
            .rhs
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
            .collect()
    }

    /// Children indices in ascending attribute-key order (matches the
    /// `BTreeMap`'s natural iteration order).
    pub fn get_children(&self, node: usize) -> Vec<usize> {
        self.nodes[node].children.values().copied().collect()
    }

    fn level_and_recurse(&self, current: usize, sought_depth: usize, depth: usize, out: &mut Vec<usize>) {
        if sought_depth == depth {
            out.push(current);
        } else {
            for &child in self.nodes[current].children.values() {
                self.level_and_recurse(child, sought_depth, depth + 1, out);
            }
        }
    }

    /// All nodes whose LHS has size `k`.
    pub fn get_level(&self, k: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.level_and_recurse(ROOT, k, 0, &mut out);
        out
    }

    fn read_and_recurse(&self, current: usize, base: &[usize], out: &mut Vec<(Vec<usize>, usize)>) {
        for (i, &set) in self.nodes[current].rhs.iter().enumerate() {
            if set {
                out.push((base.to_vec(), i));
            }
        }
        for (&att, &child) in &self.nodes[current].children {
            let mut next_base = base.to_vec();
            next_base.push(att);
            self.read_and_recurse(child, &next_base, out);
        }
    }

    /// Enumerates every `(LHS, RHS)` pair currently believed valid.
    pub fn read_fds(&self) -> Vec<(Vec<usize>, usize)> {
        let mut out = Vec::new();
        self.read_and_recurse(ROOT, &[], &mut out);
        out
    }

    pub fn n_fds(&self) -> usize {
        self.read_fds().len()
    }

    /// Recurses along child keys that are members of `lhs`, stopping a
    /// branch once a child's key exceeds every remaining candidate (keys are
    /// visited in ascending order, so nothing past that point can be a
    /// subset of `lhs` either).
    fn check_and_recurse(
        &self,
        current: usize,
        base: &[usize],
        lhs: &[usize],
        rhs: usize,
        out: &mut Vec<usize>,
    ) {
        if self.nodes[current].rhs[rhs] && base.iter().all(|a| lhs.contains(a)) {
            out.push(current);
        }
        let max_lhs = lhs.iter().copied().max();
        for (&att, &child) in &self.nodes[current].children {
            if lhs.contains(&att) {
                let mut next_base = base.to_vec();
                next_base.push(att);
                self.check_and_recurse(child, &next_base, lhs, rhs, out);
            } else if Some(att) > max_lhs {
                break;
            }
        }
    }

    /// True iff some `LHS' -> rhs` with `LHS' ⊆ lhs` is already present.
    pub fn fd_has_generals(&self, lhs: &[usize], rhs: usize) -> bool {
        let mut out = Vec::new();
        self.check_and_recurse(ROOT, &[], lhs, rhs, &mut out);
        !out.is_empty()
    }

    /// Node indices of every `LHS' -> rhs` with `LHS' ⊆ lhs` currently set.
    pub fn get_fd_and_generals(&self, lhs: &[usize], rhs: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.check_and_recurse(ROOT, &[], lhs, rhs, &mut out);
        out
    }

    /// Specializes the tree against the observation that `lhs -> a` is
    /// invalid for every `a` in `rhss`: every node whose LHS is a subset of
    /// `lhs` and whose RHS bit `a` is set has that bit cleared, and is
    /// replaced by `LHS' ∪ {c} -> a` for every attribute `c` not already in
    /// `lhs ∪ {a}`, unless a more general FD already covers it. Returns the
    /// (possibly already-existing) nodes touched by the new additions.
    pub fn specialize(&mut self, lhs: &[usize], rhss: &[usize]) -> Vec<usize> {
        let mut touched = Vec::new();
        for &rhs in rhss {
            let invalid_nodes = self.get_fd_and_generals(lhs, rhs);
            for node in invalid_nodes {
                let general_lhs = self.get_lhs(node);
                self.remove(&general_lhs, rhs);
                for c in 0..self.n_attrs {
                    if lhs.contains(&c) || c == rhs {
                        continue;
                    }
                    let mut new_lhs = general_lhs.clone();
                    new_lhs.push(c);
                    if self.fd_has_generals(&new_lhs, rhs) {
                        continue;
                    }
                    touched.push(self.add(&new_lhs, &[rhs]));
                }
            }
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_empty_lhs_to_everything() {
        let mut t = FdTree::new(4);
        t.add(&[], &[0, 1, 2, 3]);
        let fds: Vec<_> = t.read_fds().into_iter().collect();
        assert_eq!(fds.len(), 4);
        assert!(fds.iter().all(|(lhs, _)| lhs.is_empty()));
    }

    #[test]
    fn fd_has_generals_finds_subset_lhs() {
        let mut t = FdTree::new(4);
        t.add(&[1], &[3]);
        assert!(t.fd_has_generals(&[1, 2], 3));
        assert!(!t.fd_has_generals(&[1, 2], 2));
        assert!(!t.fd_has_generals(&[0], 3));
    }

    #[test]
    fn remove_clears_bit_but_keeps_path() {
        let mut t = FdTree::new(3);
        let node = t.add(&[0], &[1]);
        t.remove(&[0], 1);
        assert!(t.get_rhss(node).is_empty());
        // path still reachable
        assert_eq!(t.find(&[0]), Some(node));
    }

    #[test]
    #[should_panic]
    fn remove_missing_path_panics() {
        let mut t = FdTree::new(3);
        t.remove(&[0], 1);
    }

    #[test]
    fn specialize_scenario_from_spec() {
        // Observing agreement mask (T,T,F,F) from two rows must remove
        // empty-LHS FDs on 0 and 1, and add {2}->0, {2}->1, {3}->0, {3}->1
        // (or generalizations thereof).
        let mut t = FdTree::new(4);
        t.add(&[], &[0, 1, 2, 3]);
        t.specialize(&[0, 1], &[2, 3]);

        let fds: std::collections::HashSet<_> = t.read_fds().into_iter().collect();
        assert!(!fds.contains(&(vec![], 0)));
        assert!(!fds.contains(&(vec![], 1)));
        assert!(fds.contains(&(vec![2], 0)));
        assert!(fds.contains(&(vec![2], 1)));
        assert!(fds.contains(&(vec![3], 0)));
        assert!(fds.contains(&(vec![3], 1)));
        // empty LHS for 2 and 3 survives untouched
        assert!(fds.contains(&(vec![], 2)));
        assert!(fds.contains(&(vec![], 3)));
    }

    #[test]
    fn get_level_buckets_by_lhs_size() {
        let mut t = FdTree::new(3);
        t.add(&[], &[2]);
        t.add(&[0], &[1]);
        t.add(&[0, 1], &[2]);
        assert_eq!(t.get_level(0), vec![ROOT]);
        assert_eq!(t.get_level(1).len(), 1);
        assert_eq!(t.get_level(2).len(), 1);
    }
}
