use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser};
use lazy_static::lazy_static;

use crate::dispatch::FailurePolicy;
use crate::families;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn get_default_queue_size() -> usize {
    num_cpus::get() * 4
}

lazy_static! {
    pub static ref BUILD_INFO: String = format!("  ver: {}  rev: {}",
        env!("CARGO_PKG_VERSION"), env!("BUILD_GIT_HASH"));
}

#[derive(Parser, Debug)]
#[command(version = BUILD_INFO.as_str(), rename_all = "kebab-case")]
/// Run combinatorial star-schema benchmark queries against a bitmap-index
/// engine.
///
/// A query family (1.1 .. 4.3) expands into its full parameter cross
/// product and is dispatched by a pool of workers in payloads of
/// --batch-size queries. With --concurrency 0 the run sweeps a grid of
/// worker/batch combinations. --grouped switches families 2.x/3.x/4.x to
/// GROUP BY mode: one query per business-key tuple, output sorted per the
/// family's ORDER BY.
pub struct CliCfg {
    #[arg(short = 'e', long = "engine", default_value = "localhost:10101")]
    pub engine: String,
    #[arg(long = "index", default_value = "ssb1")]
    pub index: String,
    #[arg(short = 'n', long = "name", default_value = "test")]
    pub name: String,
    /// worker thread count; 0 sweeps the full concurrency x batch grid
    #[arg(short = 'w', long = "concurrency", default_value_t = 0)]
    pub concurrency: usize,
    #[arg(short = 'b', long = "batch_size", default_value_t = 1)]
    pub batch_size: usize,
    #[arg(short = 'g', long = "grouped")]
    pub grouped: bool,
    #[arg(long = "on_error", value_enum, default_value = "drop-payload")]
    pub on_error: FailurePolicy,
    #[arg(long = "queue_size", default_value_t = get_default_queue_size())]
    pub queue_size: usize,
    #[arg(short = 'r', long = "results_dir", default_value = "results")]
    pub results_dir: PathBuf,
    #[arg(long = "no_results_file")]
    pub no_results_file: bool,
    #[arg(short = 'j', long = "json")]
    pub json: bool,
    /// print the family's queries instead of running them
    #[arg(short = 'p', long = "print_queries")]
    pub print_queries: bool,
    /// cap on queries printed by --print-queries; 0 means all
    #[arg(long = "limit", default_value_t = 10)]
    pub limit: usize,
    #[arg(long = "stats")]
    pub stats: bool,
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

pub fn get_cli() -> Result<Arc<CliCfg>> {
    // Immutable after this point; Arc so the run loop can hand it around
    // without copies.
    let cfg = Arc::new({
        let cfg: CliCfg = CliCfg::parse();
        if cfg.batch_size == 0 {
            Err("batch size must be 1 or greater".to_string())?;
        }
        if cfg.grouped && !families::GROUPED_FAMILIES.contains(&cfg.name.as_str()) {
            Err(format!(
                "family \"{}\" has no grouped form; grouped families are: {}",
                cfg.name,
                families::GROUPED_FAMILIES.join(" ")
            ))?;
        }
        if !cfg.grouped && !families::FLAT_FAMILIES.contains(&cfg.name.as_str()) {
            Err(format!(
                "unknown family \"{}\"; families are: {}",
                cfg.name,
                families::FLAT_FAMILIES.join(" ")
            ))?;
        }
        if cfg.verbose >= 1 {
            eprintln!("CLI: {:?}", cfg);
        }
        cfg
    });
    Ok(cfg)
}
