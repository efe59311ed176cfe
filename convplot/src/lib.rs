//! Convergence diagnostics for Monte Carlo and Newton-Raphson result files.
//!
//! The crate covers the data half of the pipeline: column schemas, the
//! delimited-file loader, derived error series and a backend-independent
//! figure description. Drawing lives in the `convplot` binary.

use std::path::PathBuf;

use thiserror::Error;

pub mod derive;
pub mod figure;
pub mod loader;
pub mod schema;

pub use derive::{
    absolute_error, convergence_order, decay_reference, quadratic_model, relative_error, Derived,
    MonteCarloSeries, NewtonSeries, Summary, DEFAULT_DECAY_CONSTANT, PI_REFERENCE,
};
pub use figure::{
    monte_carlo_figure, newton_figure, Bounds, ErrorBars, Figure, LineStyle, Panel, Rgb, Scale,
    Series,
};
pub use loader::{load_table, parse_table, Table};
pub use schema::{ColumnRole, Schema, Variant};

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed input: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("line {line}, column {column}: '{value}' is not a number")]
    InvalidNumber {
        line: u64,
        column: usize,
        value: String,
    },
    #[error("no data rows in input")]
    Empty,
    #[error("schema has no {0:?} column")]
    MissingColumn(ColumnRole),
}
