//! Result rendering: plain tables on a terminal, JSON for pipelines.

use std::io::Write;

use prettytable::{format, Cell, Row, Table};

use crate::dispatch::BenchmarkResult;
use crate::grouped::GroupedReport;
use crate::BenchError;

/// Print a batch of flat-run results, one line per (concurrency, batch)
/// combination.
pub fn print_results(results: &[BenchmarkResult], json: bool) -> Result<(), BenchError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, results)
            .map_err(|e| BenchError::Io(std::io::Error::other(e)))?;
        writeln!(out)?;
        return Ok(());
    }

    let mut celltable = Table::new();
    celltable.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    celltable.set_titles(Row::new(vec![
        Cell::new("name"),
        Cell::new("queries"),
        Cell::new("workers"),
        Cell::new("batch"),
        Cell::new("seconds"),
        Cell::new("q/s"),
        Cell::new("records"),
        Cell::new("failed"),
    ]));
    for r in results {
        celltable.add_row(Row::new(vec![
            Cell::new(&r.name),
            Cell::new(&r.iterations.to_string()),
            Cell::new(&r.concurrency.to_string()),
            Cell::new(&r.batch_size.to_string()),
            Cell::new(&format!("{:.3}", r.seconds)),
            Cell::new(&format!("{:.1}", r.rate())),
            Cell::new(&r.record_count.to_string()),
            Cell::new(&r.failed.to_string()),
        ]));
    }
    celltable.print(&mut out)?;
    Ok(())
}

/// Print a grouped report: summary line plus one row per GROUP BY cell.
pub fn print_grouped(report: &GroupedReport, json: bool) -> Result<(), BenchError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, report)
            .map_err(|e| BenchError::Io(std::io::Error::other(e)))?;
        writeln!(out)?;
        return Ok(());
    }

    let first = match report.rows.first() {
        Some(f) => f,
        None => {
            writeln!(out, "{}: no rows", report.name)?;
            return Ok(());
        }
    };

    // column set depends on which keys the family populates
    let mut titles = vec![Cell::new("year")];
    if first.brand.is_some() {
        titles.push(Cell::new("brand"));
    }
    if first.c_nation.is_some() {
        titles.push(Cell::new("c_nation"));
    }
    if first.s_nation.is_some() {
        titles.push(Cell::new("s_nation"));
    }
    if first.c_city.is_some() {
        titles.push(Cell::new("c_city"));
    }
    if first.s_city.is_some() {
        titles.push(Cell::new("s_city"));
    }
    if first.category.is_some() {
        titles.push(Cell::new("category"));
    }
    titles.push(Cell::new("value"));

    let mut celltable = Table::new();
    celltable.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    celltable.set_titles(Row::new(titles));
    for row in &report.rows {
        let mut vcell = vec![Cell::new(&row.year.to_string())];
        if let Some(b) = &row.brand {
            vcell.push(Cell::new(b));
        }
        if let Some(n) = &row.c_nation {
            vcell.push(Cell::new(n));
        }
        if let Some(n) = &row.s_nation {
            vcell.push(Cell::new(n));
        }
        if let Some(c) = &row.c_city {
            vcell.push(Cell::new(c));
        }
        if let Some(c) = &row.s_city {
            vcell.push(Cell::new(c));
        }
        if let Some(c) = row.category {
            vcell.push(Cell::new(&c.to_string()));
        }
        match row.value {
            Some(v) => vcell.push(Cell::new(&v.to_string())),
            None => vcell.push(Cell::new("failed")),
        }
        celltable.add_row(Row::new(vcell));
    }
    celltable.print(&mut out)?;
    writeln!(
        out,
        "{}: {} cells  workers: {}  time: {:.3}s  failed: {}",
        report.name, report.iterations, report.concurrency, report.seconds, report.failed
    )?;
    Ok(())
}
