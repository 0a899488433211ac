//! # ssbench
//!
//! `ssbench` drives combinatorial aggregate-query benchmarks against an
//! external bitmap-index engine. A query family (e.g. "revenue by year and
//! brand where region = AMERICA") is expanded from a template plus
//! per-dimension argument lists into a linear sequence of concrete queries,
//! dispatched concurrently in configurable batches, and summarized as
//! throughput plus aggregate results.
//!
//! Pieces:
//!
//! - [`dims`]: static lookup tables mapping years/regions/nations/cities/brands
//!   to the dense row ids the engine indexes on
//! - [`queryset`]: mixed-radix unranking and on-demand query materialization
//! - [`dispatch`]: producer / worker-pool / fan-in pipeline with batching
//! - [`grouped`]: GROUP BY / ORDER BY style benchmark runs over point queries
//! - [`families`]: the catalog of star-schema benchmark query families
//! - [`engine`]: the HTTP boundary to the query engine

pub mod cli;
pub mod dims;
pub mod dispatch;
pub mod engine;
pub mod families;
pub mod grouped;
pub mod queryset;
pub mod report;

use thiserror::Error;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("unknown query family: {0}")]
    UnknownFamily(String),

    #[error("engine call failed: {0}")]
    EngineCall(String),

    #[error("engine capability: {0}")]
    EngineUnsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
