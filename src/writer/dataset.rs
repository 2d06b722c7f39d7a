//! Streaming writer for dataset ("space") files.
//!
//! Rows are appended and flushed one at a time so everything written
//! before a failure stays on disk.

use std::io::Write;

use crate::error::{MapSpaceError, Result};
use crate::model::DimensionRange;

pub struct DatasetWriter<W: Write> {
    out: W,
    dimensions: usize,
    rows: usize,
}

impl<W: Write> DatasetWriter<W> {
    /// Write the `meta` header and open the `data` array.
    pub fn new(mut out: W, ranges: &[DimensionRange]) -> Result<Self> {
        let dimensions = ranges.iter().map(|r| r.1).sum();
        writeln!(
            out,
            "{{\"meta\":{{\"dimensionRanges\":{}}},\"data\":[",
            serde_json::to_string(ranges)?
        )?;
        Ok(Self {
            out,
            dimensions,
            rows: 0,
        })
    }

    pub fn push(&mut self, row: &[f64]) -> Result<()> {
        if row.len() != self.dimensions {
            return Err(MapSpaceError::SchemaViolation(format!(
                "row has {} values, dataset declares {}",
                row.len(),
                self.dimensions
            )));
        }
        if self.rows > 0 {
            writeln!(self.out, ",")?;
        }
        serde_json::to_writer(&mut self.out, row)?;
        self.out.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Close the document and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        writeln!(self.out, "\n]}}")?;
        self.out.flush()?;
        Ok(self.out)
    }
}
