use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use convplot::{Derived, Summary};

/// Writes every derived column, one row per trial. `-` writes to stdout.
pub fn write_derived(derived: &Derived, path: &Path) -> Result<()> {
    if path.as_os_str() == "-" {
        let stdout = io::stdout();
        let mut writer = csv::Writer::from_writer(stdout.lock());
        return write_derived_rows(derived, &mut writer);
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    write_derived_rows(derived, &mut writer)
}

fn write_derived_rows<W: Write>(derived: &Derived, writer: &mut csv::Writer<W>) -> Result<()> {
    let columns = derived.columns();
    writer.write_record(columns.iter().map(|(name, _)| *name))?;

    let rows = columns.first().map(|(_, col)| col.len()).unwrap_or(0);
    for row in 0..rows {
        writer.write_record(columns.iter().map(|(_, col)| format_value(col[row])))?;
    }
    writer.flush()?;
    Ok(())
}

/// Non-finite values are left empty.
fn format_value(v: f64) -> String {
    if v.is_finite() {
        v.to_string()
    } else {
        String::new()
    }
}

pub fn write_summary(summary: &Summary, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(summary)?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
