//! Delimited result-file loader.
//!
//! Files have no header row. `#` starts a comment line, blank lines are
//! skipped and fields are whitespace-trimmed. Every data row must have exactly
//! as many fields as the schema declares.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use tracing::debug;

use crate::schema::{ColumnRole, Schema};
use crate::PlotError;

/// Loaded result file: axis 0 is the column, axis 1 the trial.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    schema: Schema,
    data: Array2<f64>,
}

impl Table {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn trials(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn columns(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn column(&self, role: ColumnRole) -> Result<ArrayView1<'_, f64>, PlotError> {
        let idx = self
            .schema
            .index_of(role)
            .ok_or(PlotError::MissingColumn(role))?;
        Ok(self.data.index_axis(Axis(0), idx))
    }
}

pub fn load_table(path: &Path, delimiter: u8, schema: &Schema) -> Result<Table, PlotError> {
    let file = File::open(path).map_err(|source| PlotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_table(file, delimiter, schema)?;
    debug!(
        "Loaded {} trials from {} ({})",
        table.trials(),
        path.display(),
        schema.describe()
    );
    Ok(table)
}

pub fn parse_table<R: Read>(input: R, delimiter: u8, schema: &Schema) -> Result<Table, PlotError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);

    let width = schema.width();
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let line = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(idx as u64 + 1);
        if record.len() != width {
            return Err(PlotError::ColumnCount {
                line,
                expected: width,
                found: record.len(),
            });
        }
        let mut row = Vec::with_capacity(width);
        for (column, field) in record.iter().enumerate() {
            let value: f64 = field.parse().map_err(|_| PlotError::InvalidNumber {
                line,
                column,
                value: field.to_string(),
            })?;
            row.push(value);
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(PlotError::Empty);
    }

    let data = Array2::from_shape_fn((width, rows.len()), |(column, trial)| rows[trial][column]);
    Ok(Table {
        schema: schema.clone(),
        data,
    })
}
