//! First-derivative stencil with tunable boundary closures.
//!
//! Each closure row is the Lagrange row on the first `2p + 1` nodes plus a
//! multiple of the divided-difference null vector on all `2p + 2` nodes.
//! The null vector annihilates polynomials of degree `2p`, so tuning trades
//! boundary accuracy at degree `2p + 1` for other properties (e.g.
//! stability) without losing the base order.

use crate::error::StencilError;
use crate::stencil::weights;
use crate::stencil::{BoundaryKind, DerivativeOrder, Stencil};

pub const MAX_RADIUS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct FreeCoefficient {
    radius: usize,
    tuning: Vec<f64>,
}

impl FreeCoefficient {
    /// `tuning` holds one coefficient per tunable row (`radius` of them);
    /// an empty vector means no tuning.
    pub fn new(radius: usize, tuning: Vec<f64>) -> Result<Self, StencilError> {
        if radius == 0 || radius > MAX_RADIUS {
            return Err(StencilError::InvalidRadius {
                radius,
                max: MAX_RADIUS,
            });
        }
        let tuning = if tuning.is_empty() {
            vec![0.0; radius]
        } else {
            tuning
        };
        if tuning.len() != radius {
            return Err(StencilError::InvalidTuning {
                expected: radius,
                got: tuning.len(),
            });
        }
        Ok(Self { radius, tuning })
    }
}

impl Stencil for FreeCoefficient {
    fn name(&self) -> &'static str {
        "free"
    }

    fn order(&self) -> DerivativeOrder {
        DerivativeOrder::First
    }

    fn radius(&self) -> usize {
        self.radius
    }

    fn width(&self) -> usize {
        2 * self.radius + 2
    }

    fn supports(&self, kind: BoundaryKind) -> bool {
        kind != BoundaryKind::Neumann
    }

    fn interior_row(&self, out: &mut [f64]) {
        let n = 2 * self.radius + 1;
        weights::central(self.radius, 1, &mut out[..n]);
    }

    fn lagrange_row(&self, psi: f64, index: usize, row: &mut [f64]) -> Result<(), StencilError> {
        let t = self.width();
        let nodes: Vec<f64> = std::iter::once(0.0)
            .chain((0..t - 2).map(|k| psi + k as f64))
            .collect();

        weights::fornberg(nodes[index], &nodes, 1, &mut row[..t - 1]);
        row[t - 1] = 0.0;

        // The row that becomes the interior stencil at psi = 1 stays untuned.
        if index < self.radius {
            weights::tune_row(psi, self.tuning[index], &mut row[..t]);
        }
        Ok(())
    }

    fn neumann_row(
        &self,
        _psi: f64,
        _index: usize,
        _row: &mut [f64],
        _extra: &mut f64,
    ) -> Result<(), StencilError> {
        Err(StencilError::UnsupportedKind {
            family: "free",
            kind: BoundaryKind::Neumann,
        })
    }
}
