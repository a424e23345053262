//! End-to-end exercise of the discovery engine and the minimal-cover
//! reducer over small, hand-written tables.

use std::io::Write;
use tabfd::config::DiscoveryConfig;
use tabfd::{mincover, Engine, Table};
use tempfile::NamedTempFile;

fn write_csv(rows: &[&str]) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(f, "{row}").unwrap();
    }
    f.flush().unwrap();
    f
}

#[test]
fn single_column_table_has_no_non_trivial_fds() {
    let f = write_csv(&["a", "b", "a", "c"]);
    let table = Table::from_path(f.path(), b',').unwrap();
    let mut engine = Engine::new(table, DiscoveryConfig::default());
    let out = NamedTempFile::new().unwrap();
    let results = NamedTempFile::new().unwrap();
    engine.run("single", out.path(), results.path(), 0.0).unwrap();

    // only attribute 0 exists, so the only possible FD is [] -> 0,
    // which only holds if the column happens to be constant (it isn't).
    assert!(engine.fds().iter().all(|(lhs, rhs)| !(lhs.is_empty() && rhs == &[0])));
}

#[test]
fn all_identical_rows_yield_every_fd() {
    let f = write_csv(&["x,1,p", "x,1,p", "x,1,p"]);
    let table = Table::from_path(f.path(), b',').unwrap();
    let mut engine = Engine::new(table, DiscoveryConfig::default());
    let out = NamedTempFile::new().unwrap();
    let results = NamedTempFile::new().unwrap();
    engine.run("constant", out.path(), results.path(), 0.0).unwrap();

    // every column is constant, so [] -> a holds for every attribute a.
    let fds = engine.fds();
    for a in 0..3 {
        assert!(fds.iter().any(|(lhs, rhs)| lhs.is_empty() && rhs.contains(&a)));
    }
}

#[test]
fn all_unique_rows_yield_no_non_trivial_fds() {
    let f = write_csv(&["a,1", "b,2", "c,3", "d,4"]);
    let table = Table::from_path(f.path(), b',').unwrap();
    let mut engine = Engine::new(table, DiscoveryConfig::default());
    let out = NamedTempFile::new().unwrap();
    let results = NamedTempFile::new().unwrap();
    engine.run("unique", out.path(), results.path(), 0.0).unwrap();

    // every attribute is all-unique: no constant column, and neither
    // attribute determines the other in a way that survives minimality.
    let fds = engine.fds();
    assert!(fds.iter().all(|(lhs, _)| !lhs.is_empty()));
}

#[test]
fn duplicate_rows_preserve_a_genuine_dependency() {
    // column 0 -> column 1, with the first two rows being exact duplicates.
    let f = write_csv(&["x,1", "x,1", "y,2", "y,2", "z,3"]);
    let table = Table::from_path(f.path(), b',').unwrap();
    let mut engine = Engine::new(table, DiscoveryConfig::default());
    let out = NamedTempFile::new().unwrap();
    let results = NamedTempFile::new().unwrap();
    engine.run("dup", out.path(), results.path(), 0.0).unwrap();

    let fds = engine.fds();
    assert!(fds.iter().any(|(lhs, rhs)| lhs == &vec![0] && rhs.contains(&1)));
}

#[test]
fn discovered_canonical_cover_reduces_to_a_minimal_cover() {
    let f = write_csv(&["x,1,p", "x,1,p", "y,2,q", "y,2,q"]);
    let table = Table::from_path(f.path(), b',').unwrap();
    let mut engine = Engine::new(table, DiscoveryConfig::default());
    let out = NamedTempFile::new().unwrap();
    let results = NamedTempFile::new().unwrap();
    engine.run("reduce", out.path(), results.path(), 0.0).unwrap();

    let flat: Vec<(Vec<usize>, usize)> = engine
        .fds()
        .into_iter()
        .flat_map(|(lhs, rhss)| rhss.into_iter().map(move |r| (lhs.clone(), r)))
        .collect();
    let cover = mincover::canonical_cover(&flat);
    let reduced = mincover::minimal_cover(cover);

    // the reduced cover must not itself contain a rule whose LHS is a
    // strict superset of another rule's LHS with an overlapping RHS
    // (that would mean minimality failed).
    for (a_lhs, a_rhs) in &reduced {
        for (b_lhs, b_rhs) in &reduced {
            if a_lhs == b_lhs {
                continue;
            }
            if b_lhs.is_subset(a_lhs) {
                assert!(
                    a_rhs.is_disjoint(b_rhs),
                    "rule {a_lhs:?} -> {a_rhs:?} is not minimal against {b_lhs:?} -> {b_rhs:?}"
                );
            }
        }
    }
}
