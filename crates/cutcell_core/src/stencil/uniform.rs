//! Higher-order stencils whose closures are evaluated numerically.
//!
//! Lagrange rows use Fornberg weights on `{0, psi, ..., psi + 2p - 1}` and
//! Neumann rows solve the Hermite moment system, so every closure row keeps
//! the degree `2p` of the interior stencil.

use crate::error::StencilError;
use crate::stencil::weights;
use crate::stencil::{DerivativeOrder, Stencil};

pub const MAX_RADIUS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uniform {
    order: DerivativeOrder,
    radius: usize,
}

impl Uniform {
    pub fn new(order: DerivativeOrder, radius: usize) -> Result<Self, StencilError> {
        if radius == 0 || radius > MAX_RADIUS {
            return Err(StencilError::InvalidRadius {
                radius,
                max: MAX_RADIUS,
            });
        }
        Ok(Self { order, radius })
    }

    fn nodes(&self, psi: f64) -> Vec<f64> {
        std::iter::once(0.0)
            .chain((0..2 * self.radius).map(|k| psi + k as f64))
            .collect()
    }
}

impl Stencil for Uniform {
    fn name(&self) -> &'static str {
        match self.radius {
            3 => "E6-uniform",
            4 => "E8-uniform",
            _ => "uniform",
        }
    }

    fn order(&self) -> DerivativeOrder {
        self.order
    }

    fn radius(&self) -> usize {
        self.radius
    }

    fn interior_row(&self, out: &mut [f64]) {
        let n = 2 * self.radius + 1;
        weights::central(self.radius, self.order.degree() as usize, &mut out[..n]);
    }

    fn lagrange_row(&self, psi: f64, index: usize, row: &mut [f64]) -> Result<(), StencilError> {
        let nodes = self.nodes(psi);
        let t = nodes.len();
        weights::fornberg(nodes[index], &nodes, self.order.degree() as usize, &mut row[..t]);
        Ok(())
    }

    fn neumann_row(
        &self,
        psi: f64,
        index: usize,
        row: &mut [f64],
        extra: &mut f64,
    ) -> Result<(), StencilError> {
        let nodes = self.nodes(psi);
        let t = nodes.len();
        row[0] = 0.0;
        weights::hermite_closure(
            nodes[index + 1],
            &nodes[1..],
            self.order.degree() as usize,
            (t - 1) as f64,
            &mut row[1..t],
            extra,
        )
        .map_err(|_| StencilError::SingularClosure { psi })
    }
}
