use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::table::ElevationTable;

/// Writes result tables as `lon,lat,<column>` CSV.
#[derive(Default)]
pub struct TableWriter {}

impl TableWriter {
    pub fn new() -> Self {
        Self {}
    }

    pub fn write(&self, table: &ElevationTable, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory {parent:?}"))?;
        }

        let file = File::create(output_path)
            .with_context(|| format!("Failed to create {output_path:?}"))?;
        let mut out = BufWriter::new(file);

        self.write_to(table, &mut out)
            .with_context(|| format!("Failed to write table to {output_path:?}"))?;
        out.flush().context("Failed to flush CSV output")?;

        tracing::info!("Written {} rows: {:?}", table.len(), output_path);
        Ok(())
    }

    pub fn write_to<W: Write>(&self, table: &ElevationTable, out: &mut W) -> Result<()> {
        writeln!(out, "lon,lat,{}", table.column_name())?;
        for (lon, lat, z) in table.rows() {
            // f64 Display already renders NaN as "NaN"
            writeln!(out, "{lon},{lat},{z}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QueryPoint;

    fn sample_table() -> ElevationTable {
        ElevationTable::new(
            vec![QueryPoint::new(-10.0, 5.5), QueryPoint::new(200.0, 0.0)],
            vec![1.25, f64::NAN],
            "elev_km",
        )
    }

    #[test]
    fn test_write_to_buffer() {
        let mut buf = Vec::new();
        TableWriter::new().write_to(&sample_table(), &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "lon,lat,elev_km\n-10,5.5,1.25\n200,0,NaN\n");
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        TableWriter::new().write(&sample_table(), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
