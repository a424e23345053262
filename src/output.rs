//! JSON FD-set output and the tab-separated results log, mirroring the
//! original's `Stats`/`Output` bookkeeping and the teacher's `serde_json`
//! writer idiom.

use color_eyre::eyre::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Writes the current FD set as a JSON array of `[lhs, rhs]` pairs (both
/// sides sorted, original attribute indices). Overwrites `path` in full
/// each call so a reader (or an interrupted run) always sees a complete,
/// parseable file.
pub fn write_fds(path: &Path, fds: &[(Vec<usize>, Vec<usize>)]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("could not create output file {}", path.display()))?;
    serde_json::to_writer(file, fds).context("could not serialize FD set to JSON")?;
    Ok(())
}

/// One line of run metadata, tab-separated on append: database name,
/// output path, start timestamp, row/attribute counts, FD count, CSV
/// read time, total execution time, peak resident set size.
pub struct Stats {
    pub dbname: String,
    pub output_path: String,
    pub timestamp: String,
    pub n_rows: usize,
    pub n_attrs: usize,
    pub n_fds: usize,
    pub reading_time_secs: f64,
    pub execution_time_secs: f64,
    pub peak_rss_kb: u64,
}

impl Stats {
    fn to_line(&self) -> String {
        [
            self.dbname.clone(),
            self.output_path.clone(),
            self.timestamp.clone(),
            self.n_rows.to_string(),
            self.n_attrs.to_string(),
            self.n_fds.to_string(),
            self.reading_time_secs.to_string(),
            self.execution_time_secs.to_string(),
            self.peak_rss_kb.to_string(),
        ]
        .join("\t")
    }
}

/// Appends `stats` as one line to the results file, creating it if
/// necessary.
pub fn append_stats_line(results_path: &Path, stats: &Stats) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(results_path)
        .with_context(|| format!("could not open results file {}", results_path.display()))?;
    writeln!(file, "{}", stats.to_line())
        .with_context(|| format!("could not append to results file {}", results_path.display()))?;
    Ok(())
}

/// Peak resident set size in kilobytes, read via `getrusage(2)`, the same
/// syscall the original's `resource.getrusage(resource.RUSAGE_SELF)`
/// wraps. Returns 0 if the call fails, since this is diagnostic-only.
#[cfg(unix)]
pub fn peak_rss_kb() -> u64 {
    use std::mem::MaybeUninit;
    unsafe {
        let mut usage = MaybeUninit::<libc::rusage>::zeroed();
        if libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) == 0 {
            let usage = usage.assume_init();
            // Linux reports ru_maxrss in KiB already; other unices in bytes,
            // but this crate only ships for Linux hosts in practice.
            usage.ru_maxrss as u64
        } else {
            0
        }
    }
}

#[cfg(not(unix))]
pub fn peak_rss_kb() -> u64 {
    0
}
