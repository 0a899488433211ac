use std::time::Instant;

use atty::Stream;
use cpu_time::ProcessTime;
use crossterm::style::{Color, ResetColor, SetForegroundColor};

use ssbench::cli::{get_cli, CliCfg};
use ssbench::dims::Dimensions;
use ssbench::dispatch::{run_multi_batch, DispatchOpts};
use ssbench::engine::EngineClient;
use ssbench::grouped::run_grouped;
use ssbench::{families, report};

// worker/batch grid used when no explicit concurrency is given
const SWEEP_CONCURRENCY: [usize; 6] = [1, 2, 4, 8, 16, 32];
const SWEEP_BATCH: [usize; 5] = [1, 2, 4, 8, 16];

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", &err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let start_f = Instant::now();
    let startcpu = ProcessTime::now();

    let cfg = get_cli()?;
    let dims = Dimensions::new();

    if cfg.print_queries {
        print_queries(&cfg, &dims)?;
        return Ok(());
    }

    let client = EngineClient::new(&cfg.engine, &cfg.index)?;
    if cfg.verbose >= 1 {
        match client.server_version() {
            Ok(v) => eprintln!("engine version: {}", v),
            Err(e) => eprintln!("engine version not available: {}", e),
        }
    }

    if atty::is(Stream::Stderr) {
        eprintln!(
            "{}<<< running {}{} against {}/{}{}",
            SetForegroundColor(Color::Blue),
            &cfg.name,
            if cfg.grouped { " (grouped)" } else { "" },
            &cfg.engine,
            &cfg.index,
            ResetColor
        );
    }

    if cfg.grouped {
        let (rows, order) = families::grouped(&cfg.name, &dims)?;
        let concurrency = if cfg.concurrency == 0 { 32 } else { cfg.concurrency };
        let rep = run_grouped(
            &client,
            &cfg.name,
            rows,
            order,
            concurrency,
            cfg.queue_size,
            cfg.verbose,
        )?;
        report::print_grouped(&rep, cfg.json)?;
    } else {
        let qs = families::flat(&cfg.name, &dims)?;
        let record_count = match client.record_count() {
            Ok(n) => n,
            Err(e) => {
                eprintln!("record count not available: {}", e);
                0
            }
        };
        let mut opts = DispatchOpts {
            concurrency: cfg.concurrency,
            batch_size: cfg.batch_size,
            queue_size: cfg.queue_size,
            on_error: cfg.on_error,
            results_dir: (!cfg.no_results_file).then(|| cfg.results_dir.clone()),
            verbose: cfg.verbose,
        };
        let mut results = Vec::new();
        if cfg.concurrency > 0 {
            results.push(run_multi_batch(&client, &qs, record_count, &opts)?);
        } else {
            for w in SWEEP_CONCURRENCY {
                for b in SWEEP_BATCH {
                    opts.concurrency = w;
                    opts.batch_size = b;
                    if cfg.verbose >= 1 {
                        eprintln!("sweep: workers {} batch {}", w, b);
                    }
                    results.push(run_multi_batch(&client, &qs, record_count, &opts)?);
                }
            }
        }
        report::print_results(&results, cfg.json)?;
    }

    if cfg.verbose >= 1 || cfg.stats {
        let elapsed = start_f.elapsed();
        let sec = (elapsed.as_secs() as f64) + (elapsed.subsec_nanos() as f64 / 1_000_000_000.0);
        let elapsedcpu = startcpu.elapsed();
        let seccpu =
            (elapsedcpu.as_secs() as f64) + (elapsedcpu.subsec_nanos() as f64 / 1_000_000_000.0);
        eprintln!("time: {:.3}  cpu: {:.3}", sec, seccpu);
    }
    Ok(())
}

fn print_queries(cfg: &CliCfg, dims: &Dimensions) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.grouped {
        let (rows, _) = families::grouped(&cfg.name, dims)?;
        let total = rows.len();
        for row in rows.iter().take(limit_or_all(cfg.limit, total)) {
            println!("{}", row.query);
        }
        eprintln!("{}: {} cells", &cfg.name, total);
    } else {
        let qs = families::flat(&cfg.name, dims)?;
        for n in 0..limit_or_all(cfg.limit, qs.size()) {
            println!("{}", qs.query_at(n));
        }
        eprintln!("{}: {} queries", &cfg.name, qs.size());
    }
    Ok(())
}

fn limit_or_all(limit: usize, total: usize) -> usize {
    if limit == 0 {
        total
    } else {
        limit.min(total)
    }
}
