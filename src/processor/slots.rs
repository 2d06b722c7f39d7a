//! Fixed-slot packing of unordered element collections.
//!
//! Each slot is `[exists, fields...]`. Elements are ordered by distance to
//! a reference point (the map center), so slot `i` always means "the i-th
//! closest element" regardless of how the source listed them.

use crate::error::{MapSpaceError, Result};
use crate::model::Point;

#[derive(Debug, Clone, PartialEq)]
pub struct SlotPacker {
    pub slot_count: usize,
    /// Fields written into every slot when the collection is empty.
    pub default_fields: Vec<f64>,
}

impl SlotPacker {
    pub fn new(slot_count: usize, default_fields: Vec<f64>) -> Self {
        Self {
            slot_count,
            default_fields,
        }
    }

    /// Width of one slot including the existence flag.
    pub fn slot_width(&self) -> usize {
        1 + self.default_fields.len()
    }

    pub fn dimensions(&self) -> usize {
        self.slot_count * self.slot_width()
    }

    /// Pack `elements` into exactly `slot_count` slots.
    ///
    /// * sorted ascending by distance of `position(e)` to `reference`
    /// * more elements than slots: the farthest are dropped
    /// * fewer: cyclic duplicates fill the rest with their flag forced to 0
    /// * none: every slot is `[0, default_fields...]`
    pub fn pack<T, P, F>(
        &self,
        elements: &[T],
        reference: Point,
        position: P,
        fields: F,
    ) -> Result<Vec<f64>>
    where
        P: Fn(&T) -> Point,
        F: Fn(&T) -> Vec<f64>,
    {
        let width = self.default_fields.len();

        let mut ordered = Vec::<(f64, Vec<f64>)>::with_capacity(elements.len());
        for element in elements {
            let values = fields(element);
            if values.len() != width {
                return Err(MapSpaceError::SchemaViolation(format!(
                    "field extractor produced {} values, slot expects {}",
                    values.len(),
                    width
                )));
            }
            ordered.push((position(element).distance(&reference), values));
        }
        ordered.sort_by(|a, b| a.0.total_cmp(&b.0));
        ordered.truncate(self.slot_count);

        let mut out = Vec::<f64>::with_capacity(self.dimensions());
        if ordered.is_empty() {
            for _ in 0..self.slot_count {
                out.push(0.0);
                out.extend_from_slice(&self.default_fields);
            }
            return Ok(out);
        }

        for slot in 0..self.slot_count {
            let (_, values) = &ordered[slot % ordered.len()];
            out.push(if slot < ordered.len() { 1.0 } else { 0.0 });
            out.extend_from_slice(values);
        }

        Ok(out)
    }
}
