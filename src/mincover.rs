//! Canonical-cover to minimal-cover reduction: LinClosure plus the
//! augment-then-reduce pass that drops redundant attributes (and whole
//! rules) from the FD tree's raw output.

use indexmap::IndexMap;
use std::collections::BTreeSet;

type Rule = (BTreeSet<usize>, BTreeSet<usize>);

/// Groups the FD tree's `(lhs, single-rhs)` pairs by LHS into the
/// canonical-cover shape the reducer expects: one rule per distinct LHS,
/// RHS as the full set of attributes that LHS determines.
pub fn canonical_cover(fds: &[(Vec<usize>, usize)]) -> Vec<Rule> {
    let mut grouped: IndexMap<Vec<usize>, BTreeSet<usize>> = IndexMap::new();
    for (lhs, rhs) in fds {
        let mut key = lhs.clone();
        key.sort_unstable();
        grouped.entry(key).or_default().insert(*rhs);
    }
    grouped
        .into_iter()
        .map(|(lhs, rhs)| (lhs.into_iter().collect(), rhs))
        .collect()
}

/// LinClosure: extends `new_closure` in place to its full closure under
/// `rules`, using the inverted-index/decrementing-counter technique (each
/// rule fires exactly once, as soon as every one of its LHS attributes has
/// entered the closure).
fn l_close(rules: &[Rule], new_closure: &mut BTreeSet<usize>) {
    let mut fd_index: IndexMap<usize, Vec<usize>> = IndexMap::new();
    let mut counts: Vec<usize> = Vec::with_capacity(rules.len());
    for (ri, (a, _b)) in rules.iter().enumerate() {
        counts.push(a.len());
        for &m in a {
            fd_index.entry(m).or_default().push(ri);
        }
    }

    let mut update: Vec<usize> = new_closure.iter().copied().collect();
    while let Some(m) = update.pop() {
        let Some(indices) = fd_index.get(&m) else {
            continue;
        };
        for &i in indices {
            counts[i] -= 1;
            if counts[i] == 0 {
                let (_, b) = &rules[i];
                let add: Vec<usize> = b.difference(new_closure).copied().collect();
                new_closure.extend(add.iter().copied());
                update.extend(add);
            }
        }
    }
}

/// Augments every rule's RHS with its own LHS, then for each rule in turn:
/// zeroes it out, computes its LHS's closure under the (now rule-free)
/// remaining set, and either keeps it with the RHS trimmed down to the
/// attributes the closure doesn't already explain, or drops it entirely if
/// the closure already explains everything. Mutations are visible to later
/// rules in the same pass, exactly as the FD set is meant to converge.
pub fn minimal_cover(mut rules: Vec<Rule>) -> Vec<Rule> {
    for (a, b) in rules.iter_mut() {
        let a = a.clone();
        b.extend(a);
    }

    let mut remove = Vec::new();
    let n = rules.len();
    for ri in 0..n {
        let (mut a, b) = rules[ri].clone();
        rules[ri] = (BTreeSet::new(), BTreeSet::new());
        l_close(&rules, &mut a);
        if b.is_subset(&a) {
            remove.push(ri);
        } else {
            let reduced_b: BTreeSet<usize> = b.difference(&a).copied().collect();
            rules[ri] = (a, reduced_b);
        }
    }

    for &ri in remove.iter().rev() {
        rules.remove(ri);
    }
    rules
}

/// Full pipeline: group the tree's FDs into a canonical cover, reduce it,
/// and hand back sorted `(lhs, rhs)` vectors in whatever attribute space
/// the caller fed in.
pub fn reduce(fds: &[(Vec<usize>, usize)]) -> Vec<(Vec<usize>, Vec<usize>)> {
    let cover = canonical_cover(fds);
    minimal_cover(cover)
        .into_iter()
        .map(|(a, b)| (a.into_iter().collect(), b.into_iter().collect()))
        .collect()
}
