//! Compact description of which flattened indices hold fluid.

use crate::mesh::types::{IndexSlice, Line, RunKind};

/// Sorted, disjoint, non-adjacent slices covering every fluid point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FluidIndex {
    slices: Vec<IndexSlice>,
}

impl FluidIndex {
    /// Builds the index from the lines of an axis whose stride is 1.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a Line>) -> Self {
        let mut slices: Vec<IndexSlice> = Vec::new();
        for line in lines {
            if line.kind != RunKind::Fluid || line.is_empty() {
                continue;
            }
            debug_assert_eq!(line.stride, 1, "fluid slices need a unit-stride axis");
            let points = line.points();
            let first = line.flat_index(points.start);
            let last = line.flat_index(points.end - 1) + 1;
            match slices.last_mut() {
                Some(prev) if prev.last == first => prev.last = last,
                _ => slices.push(IndexSlice { first, last }),
            }
        }
        Self { slices }
    }

    pub fn slices(&self) -> &[IndexSlice] {
        &self.slices
    }

    /// Number of fluid points.
    pub fn len(&self) -> usize {
        self.slices.iter().map(IndexSlice::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        let pos = self.slices.partition_point(|s| s.last <= index);
        self.slices.get(pos).is_some_and(|s| s.contains(index))
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.slices.iter().flat_map(IndexSlice::range)
    }

    /// Values of `field` at the fluid points, in index order.
    pub fn gather(&self, field: &[f64]) -> Vec<f64> {
        self.indices().map(|i| field[i]).collect()
    }

    /// Boolean mask of length `n` marking fluid points.
    pub fn mask(&self, n: usize) -> Vec<bool> {
        let mut mask = vec![false; n];
        for slice in &self.slices {
            mask[slice.range()].iter_mut().for_each(|m| *m = true);
        }
        mask
    }
}
