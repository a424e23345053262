//! Orchestrates preprocessing and the sample/induct/validate loop: the
//! direct analog of the original's `HyFd` class.

use crate::config::DiscoveryConfig;
use crate::fd_tree::FdTree;
use crate::inductor::induce;
use crate::non_fd_set::NonFdSet;
use crate::output::{self, Stats};
use crate::pli::{preprocess, ClusterMatrix, Pli};
use crate::sampler::Sampler;
use crate::table::Table;
use crate::utils::format_timestamp;
use crate::validator::Validator;
use color_eyre::eyre::{Context, Result};
use indexmap::IndexMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::info;

pub struct Engine {
    table: Table,
    plis: Vec<Pli>,
    matrix: ClusterMatrix,
    original_index: Vec<usize>,
    non_fds: NonFdSet,
    fds: FdTree,
    sampler: Sampler,
    validator: Validator,
    comparison_suggestions: Vec<(usize, usize)>,
    go_on: bool,
    iteration: usize,
    config: DiscoveryConfig,
    interrupted: Arc<AtomicBool>,
}

impl Engine {
    /// Preprocesses `table` (builds PLIs and the cluster-id matrix) and
    /// seeds the FD tree with the maximal conjecture `[] -> every
    /// attribute`, ready for the first sampling pass.
    pub fn new(table: Table, config: DiscoveryConfig) -> Self {
        let pp = preprocess(&table);
        let original_index: Vec<usize> = pp.plis.iter().map(|p| p.original_att).collect();
        let n_attrs = pp.plis.len();

        let mut fds = FdTree::new(n_attrs);
        fds.add(&[], &(0..n_attrs).collect::<Vec<_>>());

        Engine {
            sampler: Sampler::new(
                config.efficiency_threshold,
                config.learning_factor,
                config.efficiency_limit,
            ),
            validator: Validator::new(config.invalid_fds_threshold),
            plis: pp.plis,
            matrix: pp.matrix,
            original_index,
            non_fds: NonFdSet::new(),
            fds,
            comparison_suggestions: Vec::new(),
            go_on: true,
            iteration: 0,
            table,
            config,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Installs a SIGINT handler that trips the engine's cooperative
    /// interrupt flag instead of terminating the process outright. The
    /// engine checks this flag once per outer-loop iteration and, on
    /// trip, flushes its current FD set before returning.
    pub fn install_ctrlc_handler(&mut self) -> Result<()> {
        let flag = Arc::clone(&self.interrupted);
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .context("could not install SIGINT handler")?;
        Ok(())
    }

    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    /// Current FD set re-expanded to original attribute indices, grouped
    /// by LHS with both sides sorted.
    pub fn fds(&self) -> Vec<(Vec<usize>, Vec<usize>)> {
        let mut grouped: IndexMap<Vec<usize>, Vec<usize>> = IndexMap::new();
        for (lhs, rhs) in self.fds.read_fds() {
            if lhs.is_empty() && !self.config.report_constant_empty_lhs {
                continue;
            }
            let mut orig_lhs: Vec<usize> = lhs.iter().map(|&a| self.original_index[a]).collect();
            orig_lhs.sort_unstable();
            let orig_rhs = self.original_index[rhs];
            grouped.entry(orig_lhs).or_default().push(orig_rhs);
        }
        grouped
            .into_iter()
            .map(|(lhs, mut rhs)| {
                rhs.sort_unstable();
                (lhs, rhs)
            })
            .collect()
    }

    pub fn n_fds(&self) -> usize {
        self.fds.n_fds()
    }

    /// Runs preprocess's successor phases — sample, induct, validate — to
    /// completion or until cooperatively interrupted, writing the current
    /// FD set to `output_path` after every iteration and one stats line
    /// to `results_path` at the end, regardless of how the run stopped.
    pub fn run(
        &mut self,
        dbname: &str,
        output_path: &Path,
        results_path: &Path,
        reading_time_secs: f64,
    ) -> Result<()> {
        let start = Instant::now();
        let started_at = format_timestamp(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        );

        while self.go_on {
            if self.interrupted.load(Ordering::Relaxed) {
                info!("interrupted, flushing current FD set");
                break;
            }

            let sampler_go_on = self.sampler.run(
                &mut self.plis,
                &self.matrix,
                &mut self.non_fds,
                &self.comparison_suggestions,
            );
            induce(&mut self.fds, &mut self.non_fds);

            let mut new_suggestions = Vec::new();
            let validator_go_on =
                self.validator
                    .run(&mut self.fds, &self.plis, &self.matrix, &mut new_suggestions);
            self.comparison_suggestions.extend(new_suggestions);

            self.go_on = sampler_go_on && validator_go_on;
            self.iteration += 1;

            output::write_fds(output_path, &self.fds())?;
            info!(iteration = self.iteration, n_fds = self.n_fds(), "iteration complete");
        }

        let stats = Stats {
            dbname: dbname.to_string(),
            output_path: output_path.display().to_string(),
            timestamp: started_at,
            n_rows: self.table.n_rows(),
            n_attrs: self.table.n_attrs(),
            n_fds: self.n_fds(),
            reading_time_secs,
            execution_time_secs: start.elapsed().as_secs_f64(),
            peak_rss_kb: output::peak_rss_kb(),
        };
        output::append_stats_line(results_path, &stats)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn table(rows: &[&[&str]]) -> Table {
        Table::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn discovers_a_genuine_fd_end_to_end() {
        // column 0 -> column 1
        let t = table(&[
            &["x", "1"],
            &["x", "1"],
            &["y", "2"],
            &["y", "2"],
            &["z", "3"],
        ]);
        let mut engine = Engine::new(t, DiscoveryConfig::default());
        let out = NamedTempFile::new().unwrap();
        let results = NamedTempFile::new().unwrap();
        engine.run("test", out.path(), results.path(), 0.0).unwrap();

        let fds = engine.fds();
        assert!(fds.iter().any(|(lhs, rhs)| lhs == &vec![0] && rhs.contains(&1)));
    }

    #[test]
    fn interrupt_flag_stops_the_loop_before_next_iteration() {
        let t = table(&[&["x", "1"], &["y", "2"], &["z", "3"], &["w", "4"]]);
        let mut engine = Engine::new(t, DiscoveryConfig::default());
        engine.interrupted.store(true, Ordering::Relaxed);
        let out = NamedTempFile::new().unwrap();
        let results = NamedTempFile::new().unwrap();
        engine.run("test", out.path(), results.path(), 0.0).unwrap();
        // no sampling/induction/validation iteration happened
        assert_eq!(engine.iteration, 0);
    }
}
