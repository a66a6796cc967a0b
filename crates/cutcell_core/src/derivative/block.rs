use nalgebra::DMatrix;

/// One banded row of a line block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandRow {
    /// Axis coordinate of the output point.
    pub point: usize,
    /// Axis coordinate of the first column.
    pub start: usize,
    pub width: usize,
}

/// Mesh-to-mesh coefficients of a single fluid line.
///
/// Row `i` of `weights` holds the `rows[i].width` coefficients applied to
/// the consecutive points starting at `rows[i].start`; the rest is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBlock {
    offset: usize,
    stride: usize,
    rows: Vec<BandRow>,
    weights: DMatrix<f64>,
}

impl LineBlock {
    pub fn rows(&self) -> &[BandRow] {
        &self.rows
    }

    pub fn weights(&self) -> &DMatrix<f64> {
        &self.weights
    }

    pub fn flat_index(&self, along: usize) -> usize {
        self.offset + along * self.stride
    }

    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|row| row.width).sum()
    }

    /// Adds the block's contribution to `out`.
    pub fn apply_into(&self, field: &[f64], out: &mut [f64]) {
        for (i, row) in self.rows.iter().enumerate() {
            let mut acc = 0.0;
            for j in 0..row.width {
                acc += self.weights[(i, j)] * field[self.flat_index(row.start + j)];
            }
            out[self.flat_index(row.point)] += acc;
        }
    }
}

/// Collects rows of a line block in deposit order.
#[derive(Debug)]
pub(crate) struct LineBlockBuilder {
    offset: usize,
    stride: usize,
    rows: Vec<BandRow>,
    values: Vec<f64>,
}

impl LineBlockBuilder {
    pub fn new(offset: usize, stride: usize) -> Self {
        Self {
            offset,
            stride,
            rows: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn push_row(&mut self, point: usize, start: usize, weights: &[f64]) {
        self.rows.push(BandRow {
            point,
            start,
            width: weights.len(),
        });
        self.values.extend_from_slice(weights);
    }

    pub fn finish(self) -> LineBlock {
        let max_width = self.rows.iter().map(|row| row.width).max().unwrap_or(0);
        let mut weights = DMatrix::zeros(self.rows.len(), max_width);
        let mut cursor = 0;
        for (i, row) in self.rows.iter().enumerate() {
            for j in 0..row.width {
                weights[(i, j)] = self.values[cursor + j];
            }
            cursor += row.width;
        }
        LineBlock {
            offset: self.offset,
            stride: self.stride,
            rows: self.rows,
            weights,
        }
    }
}
