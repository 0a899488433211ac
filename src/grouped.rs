//! Grouped benchmark runs.
//!
//! A grouped run enumerates one point query per business-key tuple (the
//! GROUP BY cells of the corresponding warehouse query), dispatches them
//! through the same producer / worker-pool / fan-in shape as the flat
//! runner with an effective batch size of 1, and sorts the finished rows
//! per the family's ORDER BY. Each cell's aggregate is computed wholly by
//! the engine; there is no partial-aggregate merging on this side.

use std::cmp::Ordering;
use std::thread;
use std::time::Instant;

use serde::Serialize;

use crate::engine::Engine;
use crate::BenchError;

/// One GROUP BY cell: the business keys that identify it, the query that
/// computes it, and the engine's answer. Only the keys a family uses are
/// populated; the rest stay `None` and are skipped on output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupRow {
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brandnum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s_nation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<i64>,
    /// Customer-side dimension id used in the query (nation or city).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_id: Option<u64>,
    /// Supplier-side dimension id used in the query (nation or city).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s_id: Option<u64>,
    /// None until the engine answers, and stays None if the call failed.
    pub value: Option<i64>,
    #[serde(skip)]
    pub query: String,
}

/// ORDER BY shape of each grouped family. Sorting is a stable post-hoc pass
/// over the finished rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    /// year ascending, brand number ascending (2.x)
    YearBrandnum,
    /// year ascending, value descending (3.x)
    YearValueDesc,
    /// year then customer nation, ascending (4.1)
    YearCNation,
    /// year, supplier nation, category, ascending (4.2)
    YearSNationCategory,
    /// year, supplier city, brand, ascending (4.3)
    YearSCityBrand,
}

pub fn sort_rows(order: OrderBy, rows: &mut [GroupRow]) {
    rows.sort_by(|a, b| compare(order, a, b));
}

fn compare(order: OrderBy, a: &GroupRow, b: &GroupRow) -> Ordering {
    let year = a.year.cmp(&b.year);
    match order {
        OrderBy::YearBrandnum => year.then(a.brandnum.cmp(&b.brandnum)),
        // None values (failed cells) order last within a year
        OrderBy::YearValueDesc => year.then(b.value.cmp(&a.value)),
        OrderBy::YearCNation => year.then(a.c_id.cmp(&b.c_id)),
        OrderBy::YearSNationCategory => {
            year.then(a.s_id.cmp(&b.s_id)).then(a.category.cmp(&b.category))
        }
        OrderBy::YearSCityBrand => year.then(a.s_id.cmp(&b.s_id)).then(a.brandnum.cmp(&b.brandnum)),
    }
}

/// A finished grouped run: ordered rows plus timing.
#[derive(Debug, Clone, Serialize)]
pub struct GroupedReport {
    pub name: String,
    pub iterations: usize,
    pub concurrency: usize,
    pub seconds: f64,
    pub failed: usize,
    pub rows: Vec<GroupRow>,
}

/// Fill every row's value by querying the engine, one call per row, then
/// sort per the family ordering. A row whose call fails keeps `value: None`
/// and the run continues.
pub fn run_grouped<E: Engine + ?Sized>(
    engine: &E,
    name: &str,
    rows: Vec<GroupRow>,
    order: OrderBy,
    concurrency: usize,
    queue_size: usize,
    verbose: u8,
) -> Result<GroupedReport, BenchError> {
    let concurrency = concurrency.max(1);
    let iterations = rows.len();

    let (send_row, recv_row) = crossbeam_channel::bounded::<GroupRow>(queue_size);
    let (send_done, recv_done) = crossbeam_channel::unbounded::<GroupRow>();

    let mut done: Vec<GroupRow> = Vec::with_capacity(iterations);
    let start = Instant::now();
    thread::scope(|s| -> Result<(), BenchError> {
        thread::Builder::new()
            .name("producer".to_string())
            .spawn_scoped(s, move || {
                for row in rows {
                    if send_row.send(row).is_err() {
                        return;
                    }
                }
            })
            .map_err(BenchError::Io)?;

        for no_threads in 0..concurrency {
            let clone_recv_row = recv_row.clone();
            let clone_send_done = send_done.clone();
            thread::Builder::new()
                .name(format!("worker_g{}", no_threads))
                .spawn_scoped(s, move || {
                    for mut row in clone_recv_row.iter() {
                        match engine.query(&row.query) {
                            Ok(results) => {
                                row.value = results.first().map(|r| r.sum);
                            }
                            Err(err) => {
                                if verbose > 0 {
                                    eprintln!("cell for year {} failed: {}", row.year, &err);
                                }
                            }
                        }
                        if clone_send_done.send(row).is_err() {
                            return;
                        }
                    }
                })
                .map_err(BenchError::Io)?;
        }
        drop(recv_row);
        drop(send_done);

        for row in recv_done.iter() {
            done.push(row);
        }
        Ok(())
    })?;
    let seconds = start.elapsed().as_secs_f64();

    sort_rows(order, &mut done);
    let failed = done.iter().filter(|r| r.value.is_none()).count();
    Ok(GroupedReport {
        name: name.to_string(),
        iterations,
        concurrency,
        seconds,
        failed,
        rows: done,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineValue;

    fn row(year: i32, brandnum: i64, value: i64) -> GroupRow {
        GroupRow {
            year,
            brandnum: Some(brandnum),
            value: Some(value),
            ..Default::default()
        }
    }

    #[test]
    fn year_brandnum_ordering() {
        let mut rows = vec![row(1993, 5, 10), row(1992, 5, 20), row(1992, 3, 30)];
        sort_rows(OrderBy::YearBrandnum, &mut rows);
        let keys: Vec<(i32, i64, i64)> = rows
            .iter()
            .map(|r| (r.year, r.brandnum.unwrap(), r.value.unwrap()))
            .collect();
        assert_eq!(keys, vec![(1992, 3, 30), (1992, 5, 20), (1993, 5, 10)]);
    }

    #[test]
    fn year_value_desc_puts_failed_cells_last() {
        let mut rows = vec![row(1992, 0, 5), row(1992, 1, 50)];
        rows.push(GroupRow { year: 1992, ..Default::default() }); // failed, value None
        rows.push(row(1993, 0, 1));
        sort_rows(OrderBy::YearValueDesc, &mut rows);
        assert_eq!(rows[0].value, Some(50));
        assert_eq!(rows[1].value, Some(5));
        assert_eq!(rows[2].value, None);
        assert_eq!(rows[3].year, 1993);
    }

    /// Sums the digits of the query text, failing on request.
    struct GroupMock;

    impl Engine for GroupMock {
        fn query(&self, pql: &str) -> Result<Vec<EngineValue>, BenchError> {
            if pql.contains("boom") {
                return Err(BenchError::EngineCall("injected".to_string()));
            }
            let sum: i64 = pql
                .bytes()
                .filter(u8::is_ascii_digit)
                .map(|b| (b - b'0') as i64)
                .sum();
            Ok(vec![EngineValue { sum, count: 1 }])
        }
    }

    #[test]
    fn grouped_run_fills_sorts_and_isolates_failures() {
        let mut rows = Vec::new();
        for year in [1993, 1992] {
            for brandnum in [2i64, 1, 0] {
                rows.push(GroupRow {
                    year,
                    brandnum: Some(brandnum),
                    query: if year == 1992 && brandnum == 1 {
                        "boom".to_string()
                    } else {
                        format!("cell({},{})", year, brandnum)
                    },
                    ..Default::default()
                });
            }
        }
        let report =
            run_grouped(&GroupMock, "g", rows, OrderBy::YearBrandnum, 3, 10, 0).unwrap();
        assert_eq!(report.iterations, 6);
        assert_eq!(report.failed, 1);
        assert_eq!(report.rows.len(), 6);
        let keys: Vec<(i32, i64)> =
            report.rows.iter().map(|r| (r.year, r.brandnum.unwrap())).collect();
        assert_eq!(
            keys,
            vec![(1992, 0), (1992, 1), (1992, 2), (1993, 0), (1993, 1), (1993, 2)]
        );
        // the failed cell kept its slot with no value
        assert_eq!(report.rows[1].value, None);
        assert!(report.rows[0].value.is_some());
    }
}
