use super::{Dimension, GridPoint, Sweep, Unit};
use anyhow::Result;
use csv::Writer;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes sweep grid points as CSV, one row per point.
pub struct GridLogger<W: Write> {
    writer: Writer<W>,
}

impl GridLogger<File> {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }
}

impl<W: Write> GridLogger<W> {
    pub fn from_writer(inner: W) -> Self {
        Self {
            writer: Writer::from_writer(inner),
        }
    }

    pub fn log_header(&mut self, dimensions: &[Dimension]) -> Result<()> {
        let mut header = vec!["index".to_string()];
        header.extend(dimensions.iter().map(column_name));
        self.writer.write_record(&header)?;
        Ok(())
    }

    pub fn log(&mut self, point: &GridPoint) -> Result<()> {
        let mut record = vec![point.index.to_string()];
        record.extend(point.values.iter().map(|v| v.to_string()));
        self.writer.write_record(&record)?;
        Ok(())
    }

    /// Header plus every grid point of `sweep`, returns the number of rows written.
    pub fn log_sweep(&mut self, sweep: Sweep) -> Result<usize> {
        self.log_header(sweep.dimensions())?;
        let mut rows = 0;
        for point in sweep.iter() {
            self.log(&point)?;
            rows += 1;
        }
        self.writer.flush()?;
        Ok(rows)
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flushing grid export failed: {}", e.error()))
    }
}

fn column_name(dimension: &Dimension) -> String {
    match dimension.unit {
        Unit::Linear => dimension.path.clone(),
        Unit::Decibel => format!("{} [dB]", dimension.path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::DimensionTarget;

    #[test]
    fn exports_header_and_rows() {
        let dims = vec![
            Dimension {
                path: "snr".to_string(),
                target: DimensionTarget::Engine {
                    parameter: "snr".to_string(),
                },
                values: vec![0.0, 5.5],
                unit: Unit::Decibel,
            },
            Dimension {
                path: "tx.max_range".to_string(),
                target: DimensionTarget::Engine {
                    parameter: "max_range".to_string(),
                },
                values: vec![10.0],
                unit: Unit::Linear,
            },
        ];

        let mut logger = GridLogger::from_writer(Vec::new());
        let rows = logger.log_sweep(Sweep::new(&dims)).unwrap();
        assert_eq!(rows, 2);

        let csv = String::from_utf8(logger.into_inner().unwrap()).unwrap();
        assert_eq!(csv, "index,snr [dB],tx.max_range\n0,0,10\n1,5.5,10\n");
    }
}
