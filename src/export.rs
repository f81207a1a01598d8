use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;

use crate::plot::Figure;

pub const HEADER: [&str; 6] = ["institution", "model", "run", "time", "decimal_year", "sle_mm"];

/// Writes every plotted sample as one row; NaN values become empty cells.
pub fn write_csv(fig: &Figure, path: &Path) -> Result<usize> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(HEADER)?;

    let mut rows = 0;
    for line in fig.lines() {
        let s = &line.series;
        for ((t, y), v) in s.times().iter().zip(s.decimal_years()).zip(s.values()) {
            let time  = t.format("%Y-%m-%dT%H:%M:%S").to_string();
            let year  = format!("{y:.6}");
            let value = if v.is_finite() { format!("{v}") } else { String::new() };
            wtr.write_record([
                line.id.institution.as_str(),
                line.id.model.as_str(),
                line.id.run.as_str(),
                time.as_str(),
                year.as_str(),
                value.as_str(),
            ])?;
            rows += 1;
        }
    }
    wtr.flush()?;
    Ok(rows)
}
