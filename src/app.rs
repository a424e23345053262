//! The main app logic: argument structs and top-level subcommand dispatch.

use crate::config::{self, DiscoveryConfig};
use crate::engine::Engine;
use crate::mincover;
use crate::output::{self, Stats};
use crate::table::Table;
use crate::utils::format_timestamp;
use clap::{Parser, Subcommand, ValueHint};
use color_eyre::eyre::{bail, Context, Result};
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[clap(version, about, name = "tabfd")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: CliCommands,
}

#[derive(Subcommand, Debug)]
pub enum CliCommands {
    /// Discover minimal functional dependencies in a table
    Discover(CliDiscover),
    /// Reduce a canonical FD set (JSON) to a minimal cover
    MinCover(CliMinCover),
}

/// Runs the hybrid sampling/induction/validation discovery engine against
/// an input table.
#[derive(Parser, Debug)]
pub struct CliDiscover {
    /// Input table: delimiter-separated, no header row
    #[clap(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Where to write the discovered FD set as JSON (default: `<dbname>.json`)
    #[clap(long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Results log to append a stats line to
    #[clap(long, value_hint = ValueHint::FilePath, default_value = "hyfd_results.txt")]
    pub results: PathBuf,

    /// Field separator (single byte)
    #[clap(short, long, default_value = ",")]
    pub separator: String,

    #[clap(long, default_value_t = config::EFFICIENCY_THRESHOLD_INIT)]
    pub efficiency_threshold: f64,

    #[clap(long, default_value_t = config::LEARNING_FACTOR)]
    pub learning_factor: f64,

    #[clap(long, default_value_t = config::INVALID_FDS_THRESHOLD)]
    pub invalid_fds_threshold: f64,

    #[clap(long, default_value_t = config::EFFICIENCY_LIMIT)]
    pub efficiency_limit: f64,

    /// Don't report `[] -> a` FDs for constant columns
    #[clap(long)]
    pub no_constant_lhs: bool,

    /// TOML config overlay; when given, overrides all threshold flags above
    #[clap(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Verbose (trace-level) logging
    #[clap(short, long)]
    pub debug: bool,

    /// Suppress all logging
    #[clap(short, long)]
    pub mute: bool,

    /// Send log output to this file instead of stderr
    #[clap(short, long, value_hint = ValueHint::FilePath)]
    pub logfile: Option<PathBuf>,
}

/// Reduces a canonical FD set to a minimal cover via `LinClosure`.
#[derive(Parser, Debug)]
pub struct CliMinCover {
    /// Input FD set: JSON array of `[lhs, rhs]` pairs
    #[clap(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Where to write the minimal cover (default: `<input-stem>.mincov.json`)
    #[clap(long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Results log to append a stats line to
    #[clap(long, value_hint = ValueHint::FilePath, default_value = "can2min_results.txt")]
    pub results: PathBuf,
}

fn dbname_of(path: &std::path::Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table")
        .to_string()
}

/// Performs the `discover` subcommand.
pub fn run_discover(args: CliDiscover) -> Result<()> {
    let sep = args.separator.as_bytes();
    if sep.len() != 1 {
        bail!(
            "separator must be exactly one byte, got {:?}",
            args.separator
        );
    }

    let mut cfg = match &args.config {
        Some(p) => DiscoveryConfig::from_toml_path(p)?,
        None => DiscoveryConfig {
            separator: sep[0],
            efficiency_threshold: args.efficiency_threshold,
            learning_factor: args.learning_factor,
            invalid_fds_threshold: args.invalid_fds_threshold,
            efficiency_limit: args.efficiency_limit,
            report_constant_empty_lhs: !args.no_constant_lhs,
            debug: args.debug,
            mute: args.mute,
            logfile: args.logfile.clone(),
        },
    };
    if args.config.is_some() {
        cfg.debug = args.debug;
        cfg.mute = args.mute;
        cfg.logfile = args.logfile.clone();
    }
    cfg.validate()?;

    let t0 = Instant::now();
    let table = Table::from_path(&args.input, cfg.separator)?;
    let reading_time = t0.elapsed().as_secs_f64();

    let dbname = dbname_of(&args.input);
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{dbname}.json")));

    let mut engine = Engine::new(table, cfg);
    engine
        .install_ctrlc_handler()
        .context("could not install interrupt handler")?;
    engine.run(&dbname, &output_path, &args.results, reading_time)?;

    Ok(())
}

/// Performs the `min-cover` subcommand.
pub fn run_min_cover(args: CliMinCover) -> Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("could not read {}", args.input.display()))?;
    let raw: Vec<(Vec<usize>, Vec<usize>)> =
        serde_json::from_str(&text).context("input is not a JSON array of [lhs, rhs] pairs")?;

    let flat: Vec<(Vec<usize>, usize)> = raw
        .iter()
        .flat_map(|(lhs, rhss)| rhss.iter().map(move |&r| (lhs.clone(), r)))
        .collect();

    let t0 = Instant::now();
    let cover = mincover::canonical_cover(&flat);
    let canonical_cover_len = cover.len();
    let reduced = mincover::minimal_cover(cover);
    let out: Vec<(Vec<usize>, Vec<usize>)> = reduced
        .into_iter()
        .map(|(a, b)| {
            let mut a: Vec<usize> = a.into_iter().collect();
            a.sort_unstable();
            let mut b: Vec<usize> = b.into_iter().collect();
            b.sort_unstable();
            (a, b)
        })
        .collect();
    let execution_time = t0.elapsed().as_secs_f64();

    let dbname = dbname_of(&args.input);
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{dbname}.mincov.json")));
    output::write_fds(&output_path, &out)?;

    let stats = Stats {
        dbname,
        output_path: output_path.display().to_string(),
        timestamp: format_timestamp(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        ),
        n_rows: canonical_cover_len,
        n_attrs: flat.len(),
        n_fds: out.len(),
        reading_time_secs: 0.0,
        execution_time_secs: execution_time,
        peak_rss_kb: output::peak_rss_kb(),
    };
    output::append_stats_line(&args.results, &stats)?;

    Ok(())
}

/// Does the top-level command.
pub fn actual(cli: Cli) -> Result<()> {
    match cli.command {
        CliCommands::Discover(args) => run_discover(args),
        CliCommands::MinCover(args) => run_min_cover(args),
    }
}
