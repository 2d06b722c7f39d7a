//! The functional core: map selection, packing and vector assembly.
pub mod assembler;
pub mod resample;
pub mod selection;
pub mod slots;

use std::io::Write;

use tracing::{debug, error, info, warn};

use crate::error::{MapSpaceError, Result};
use crate::model::{Curation, GameMode, MIN_EXTENT, ROUND_DIGITS, VectorMap};
use crate::writer::DatasetWriter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorizeOptions {
    pub mode: GameMode,
    pub curation: Curation,
    pub min_extent: f64,
}

impl VectorizeOptions {
    pub fn new(mode: GameMode, curation: Curation) -> Self {
        Self {
            mode,
            curation,
            min_extent: MIN_EXTENT,
        }
    }
}

/// Outcome counters of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub attempted: usize,
    pub processed: usize,
    pub filtered: usize,
    pub failed: usize,
}

/// Select, assemble and round a single map.
pub fn encode_map(map: &VectorMap, options: &VectorizeOptions) -> Result<Vec<f64>> {
    selection::check(map, options.mode, options.min_extent)?;
    let mut vector = assembler::assemble(map, options.curation)?;
    assembler::round_vector(&mut vector, ROUND_DIGITS);
    Ok(vector)
}

/// Encode every map in source order and append the rows to `sink`.
///
/// A map that fails to load or encode is logged and skipped; only sink
/// I/O errors abort the batch.
pub fn run<I, W>(maps: I, options: &VectorizeOptions, sink: &mut DatasetWriter<W>) -> Result<BatchReport>
where
    I: IntoIterator<Item = (String, anyhow::Result<VectorMap>)>,
    W: Write,
{
    let mut report = BatchReport::default();

    for (id, source) in maps {
        report.attempted += 1;

        let map = match source {
            Ok(map) => map,
            Err(e) => {
                warn!(map = %id, "skipping unreadable map: {e:#}");
                report.failed += 1;
                continue;
            }
        };

        match encode_map(&map, options) {
            Ok(row) => {
                sink.push(&row)?;
                report.processed += 1;
            }
            Err(MapSpaceError::SelectionMismatch(reason)) => {
                debug!(map = %id, "filtered: {reason}");
                report.filtered += 1;
            }
            Err(e @ MapSpaceError::SchemaViolation(_)) => {
                error!(map = %id, "{e}");
                report.failed += 1;
            }
            Err(e) => {
                warn!(map = %id, "skipping map: {e}");
                report.failed += 1;
            }
        }
    }

    info!(
        processed = report.processed,
        attempted = report.attempted,
        filtered = report.filtered,
        failed = report.failed,
        "processed {} of {} maps",
        report.processed,
        report.attempted
    );
    Ok(report)
}
