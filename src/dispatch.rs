//! Concurrent dispatch of a query set.
//!
//! One producer walks the set in index order and chunks it into payloads of
//! `batch_size` queries; a pool of worker threads pulls payloads from a
//! bounded queue, issues each as a single engine call, and pushes one
//! outcome per query into a results channel the caller drains. Completion
//! is signalled by dropping senders, never by sentinel values: the producer
//! hangs up the payload queue when the set is exhausted, workers hang up the
//! results queue when they exit, and the drain loop ends when the last
//! sender is gone.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::engine::Engine;
use crate::queryset::QuerySet;
use crate::BenchError;

/// What to do with a payload whose engine call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Report the whole payload failed and move on.
    DropPayload,
    /// Reissue the payload's queries one at a time so only the genuinely
    /// bad ones are lost.
    RetrySingle,
}

/// Knobs for one dispatch run.
#[derive(Debug, Clone)]
pub struct DispatchOpts {
    pub concurrency: usize,
    pub batch_size: usize,
    pub queue_size: usize,
    pub on_error: FailurePolicy,
    /// Directory for the per-run flat result log; None disables the log.
    pub results_dir: Option<PathBuf>,
    pub verbose: u8,
}

impl Default for DispatchOpts {
    fn default() -> Self {
        DispatchOpts {
            concurrency: 1,
            batch_size: 1,
            queue_size: 100,
            on_error: FailurePolicy::DropPayload,
            results_dir: None,
            verbose: 0,
        }
    }
}

/// One chunk of consecutive queries issued as a single engine call.
struct Payload {
    queries: Vec<String>,
}

/// Per-query result flowing out of the worker pool. A failed payload under
/// [`FailurePolicy::DropPayload`] surfaces as a single `Failed` carrying the
/// number of queries it covered, so the drain can still account for every
/// query in the set.
#[derive(Debug, Clone)]
pub enum CellOutcome {
    Value(i64),
    Failed { queries: usize, reason: String },
}

/// Timing and accounting for one completed dispatch run. Field names on the
/// wire match the historical flat-log format consumed by downstream
/// plotting scripts.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
    pub name: String,
    pub iterations: usize,
    pub concurrency: usize,
    #[serde(rename = "batchsize")]
    pub batch_size: usize,
    pub seconds: f64,
    #[serde(rename = "columncount")]
    pub record_count: u64,
    pub failed: usize,
    pub timestamp: i64,
    #[serde(skip)]
    pub values: Vec<i64>,
}

impl BenchmarkResult {
    /// Queries completed per second.
    pub fn rate(&self) -> f64 {
        if self.seconds > 0.0 {
            (self.iterations - self.failed) as f64 / self.seconds
        } else {
            0.0
        }
    }
}

/// Run the whole query set through the worker pool and collect every
/// outcome. `record_count` is carried through into the result untouched;
/// it sizes the data set the run was measured against.
pub fn run_multi_batch<E: Engine + ?Sized>(
    engine: &E,
    qs: &QuerySet,
    record_count: u64,
    opts: &DispatchOpts,
) -> Result<BenchmarkResult, BenchError> {
    let concurrency = opts.concurrency.max(1);
    let batch_size = opts.batch_size.max(1);

    let (send_payload, recv_payload) = crossbeam_channel::bounded::<Payload>(opts.queue_size);
    let (send_outcome, recv_outcome) = crossbeam_channel::unbounded::<CellOutcome>();

    let mut values = Vec::with_capacity(qs.size());
    let mut failed = 0usize;

    let start = Instant::now();
    thread::scope(|s| -> Result<(), BenchError> {
        thread::Builder::new()
            .name("producer".to_string())
            .spawn_scoped(s, move || {
                let mut batch: Vec<String> = Vec::with_capacity(batch_size);
                for n in 0..qs.size() {
                    batch.push(qs.query_at(n));
                    if batch.len() == batch_size {
                        let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                        if send_payload.send(Payload { queries: full }).is_err() {
                            return; // workers are gone, nothing to produce for
                        }
                    }
                }
                if !batch.is_empty() {
                    let _ = send_payload.send(Payload { queries: batch });
                }
                // send_payload drops here and closes the payload queue
            })
            .map_err(BenchError::Io)?;

        for no_threads in 0..concurrency {
            let clone_recv_payload = recv_payload.clone();
            let clone_send_outcome = send_outcome.clone();
            let on_error = opts.on_error;
            let verbose = opts.verbose;
            thread::Builder::new()
                .name(format!("worker_q{}", no_threads))
                .spawn_scoped(s, move || {
                    worker_query(engine, &clone_recv_payload, &clone_send_outcome, on_error, verbose)
                })
                .map_err(BenchError::Io)?;
        }
        drop(recv_payload);
        drop(send_outcome);

        for outcome in recv_outcome.iter() {
            match outcome {
                CellOutcome::Value(v) => values.push(v),
                CellOutcome::Failed { queries, reason } => {
                    failed += queries;
                    if opts.verbose > 0 {
                        eprintln!("dropped {} queries: {}", queries, reason);
                    }
                }
            }
        }
        Ok(())
    })?;
    let seconds = start.elapsed().as_secs_f64();

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let result = BenchmarkResult {
        name: qs.name().to_string(),
        iterations: qs.size(),
        concurrency,
        batch_size,
        seconds,
        record_count,
        failed,
        timestamp,
        values,
    };

    if let Some(dir) = &opts.results_dir {
        // result-log trouble is reported, never fatal to the run
        if let Err(e) = write_result_log(dir, &result) {
            eprintln!("could not write result log: {}", e);
        }
    }

    Ok(result)
}

fn worker_query<E: Engine + ?Sized>(
    engine: &E,
    recv_payload: &crossbeam_channel::Receiver<Payload>,
    send_outcome: &crossbeam_channel::Sender<CellOutcome>,
    on_error: FailurePolicy,
    verbose: u8,
) {
    for payload in recv_payload.iter() {
        let pql = payload.queries.join("\n");
        match engine.query(&pql) {
            Ok(results) => {
                for r in results {
                    let _ = send_outcome.send(CellOutcome::Value(r.sum));
                }
            }
            Err(err) => {
                if matches!(err, BenchError::EngineUnsupported(_)) {
                    eprintln!("hint: engine may not support range (><) queries");
                }
                if verbose > 1 {
                    eprintln!("payload of {} queries failed: {}", payload.queries.len(), &err);
                }
                match on_error {
                    FailurePolicy::RetrySingle if payload.queries.len() > 1 => {
                        for q in &payload.queries {
                            match engine.query(q) {
                                Ok(results) => {
                                    for r in results {
                                        let _ = send_outcome.send(CellOutcome::Value(r.sum));
                                    }
                                }
                                Err(e) => {
                                    let _ = send_outcome.send(CellOutcome::Failed {
                                        queries: 1,
                                        reason: e.to_string(),
                                    });
                                }
                            }
                        }
                    }
                    _ => {
                        let _ = send_outcome.send(CellOutcome::Failed {
                            queries: payload.queries.len(),
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }
    }
}

/// Append-style flat log of one run: one aggregate value per line, written
/// to `<dir>/<name>-<timestamp>.txt`.
fn write_result_log(dir: &Path, result: &BenchmarkResult) -> Result<PathBuf, BenchError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}-{}.txt", result.name, result.timestamp));
    let mut f = std::io::BufWriter::new(fs::File::create(&path)?);
    for v in &result.values {
        writeln!(f, "{}", v)?;
    }
    f.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineValue;
    use crate::queryset::QuerySet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers V(a,b) statements with sum = a * b; statements containing
    /// `fail_on` poison the whole payload.
    struct MockEngine {
        fail_on: Option<String>,
        calls: AtomicUsize,
    }

    impl MockEngine {
        fn new() -> MockEngine {
            MockEngine { fail_on: None, calls: AtomicUsize::new(0) }
        }

        fn failing_on(s: &str) -> MockEngine {
            MockEngine { fail_on: Some(s.to_string()), calls: AtomicUsize::new(0) }
        }
    }

    impl Engine for MockEngine {
        fn query(&self, pql: &str) -> Result<Vec<EngineValue>, BenchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(bad) = &self.fail_on {
                if pql.contains(bad.as_str()) {
                    return Err(BenchError::EngineCall("injected failure".to_string()));
                }
            }
            let mut out = Vec::new();
            for line in pql.lines() {
                let inner = line
                    .trim_start_matches("V(")
                    .trim_end_matches(')');
                let mut parts = inner.split(',');
                let a: i64 = parts.next().unwrap().parse().unwrap();
                let b: i64 = parts.next().unwrap().parse().unwrap();
                out.push(EngineValue { sum: a * b, count: 1 });
            }
            Ok(out)
        }
    }

    fn test_set() -> QuerySet {
        QuerySet::ints(
            "q",
            "V(%d,%d)",
            vec![vec![1, 2, 3, 4], vec![10, 20, 30, 40, 50]],
        )
        .unwrap()
    }

    fn sorted_values(r: &BenchmarkResult) -> Vec<i64> {
        let mut v = r.values.clone();
        v.sort_unstable();
        v
    }

    #[test]
    fn monolithic_equals_fan_out() {
        let qs = test_set();
        assert_eq!(qs.size(), 20);
        let engine = MockEngine::new();

        let mono = run_multi_batch(
            &engine,
            &qs,
            0,
            &DispatchOpts { concurrency: 1, batch_size: 20, ..Default::default() },
        )
        .unwrap();
        let fan = run_multi_batch(
            &engine,
            &qs,
            0,
            &DispatchOpts { concurrency: 20, batch_size: 1, ..Default::default() },
        )
        .unwrap();
        let mixed = run_multi_batch(
            &engine,
            &qs,
            0,
            &DispatchOpts { concurrency: 3, batch_size: 7, ..Default::default() },
        )
        .unwrap();

        assert_eq!(mono.iterations, 20);
        assert_eq!(mono.failed, 0);
        assert_eq!(sorted_values(&mono), sorted_values(&fan));
        assert_eq!(sorted_values(&mono), sorted_values(&mixed));
    }

    #[test]
    fn final_partial_payload_is_issued() {
        let qs = QuerySet::ints("q", "V(%d,%d)", vec![vec![1], vec![10; 17]]).unwrap();
        assert_eq!(qs.size(), 17);
        let engine = MockEngine::new();
        let r = run_multi_batch(
            &engine,
            &qs,
            0,
            &DispatchOpts { concurrency: 2, batch_size: 5, ..Default::default() },
        )
        .unwrap();
        // 17 queries in payloads of 5 means calls of 5, 5, 5 and 2
        assert_eq!(engine.calls.load(Ordering::SeqCst), 4);
        assert_eq!(r.values.len(), 17);
    }

    #[test]
    fn dropped_payload_is_accounted_and_run_completes() {
        let qs = test_set();
        let engine = MockEngine::failing_on("V(3,");
        let r = run_multi_batch(
            &engine,
            &qs,
            0,
            &DispatchOpts { concurrency: 4, batch_size: 1, ..Default::default() },
        )
        .unwrap();
        // five queries use a=3, each alone in its payload
        assert_eq!(r.failed, 5);
        assert_eq!(r.values.len(), 15);
    }

    #[test]
    fn retry_single_salvages_good_queries() {
        let qs = test_set();
        let engine = MockEngine::failing_on("V(3,");
        let r = run_multi_batch(
            &engine,
            &qs,
            0,
            &DispatchOpts {
                concurrency: 2,
                batch_size: 20,
                on_error: FailurePolicy::RetrySingle,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(r.failed, 5);
        assert_eq!(r.values.len(), 15);
    }

    #[test]
    fn result_log_written_when_dir_set() {
        let dir = tempfile::tempdir().unwrap();
        let qs = QuerySet::ints("logme", "V(%d,%d)", vec![vec![2], vec![5, 7]]).unwrap();
        let engine = MockEngine::new();
        let r = run_multi_batch(
            &engine,
            &qs,
            0,
            &DispatchOpts {
                results_dir: Some(dir.path().to_path_buf()),
                ..Default::default()
            },
        )
        .unwrap();
        let path = dir.path().join(format!("logme-{}.txt", r.timestamp));
        let body = std::fs::read_to_string(path).unwrap();
        let mut lines: Vec<i64> = body.lines().map(|l| l.parse().unwrap()).collect();
        lines.sort_unstable();
        assert_eq!(lines, vec![10, 14]);
    }
}
