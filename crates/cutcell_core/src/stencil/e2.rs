//! Second-order stencil (`p = 1`) with closed-form closures.

use crate::error::StencilError;
use crate::stencil::{DerivativeOrder, Stencil};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct E2 {
    order: DerivativeOrder,
}

impl E2 {
    pub fn new(order: DerivativeOrder) -> Self {
        Self { order }
    }
}

impl Stencil for E2 {
    fn name(&self) -> &'static str {
        "E2"
    }

    fn order(&self) -> DerivativeOrder {
        self.order
    }

    fn radius(&self) -> usize {
        1
    }

    fn interior_row(&self, out: &mut [f64]) {
        let row = match self.order {
            DerivativeOrder::First => [-0.5, 0.0, 0.5],
            DerivativeOrder::Second => [1.0, -2.0, 1.0],
        };
        out[..3].copy_from_slice(&row);
    }

    fn lagrange_row(&self, psi: f64, index: usize, row: &mut [f64]) -> Result<(), StencilError> {
        match self.order {
            DerivativeOrder::First => first_lagrange_row(psi, index, row),
            DerivativeOrder::Second => second_lagrange_row(psi, index, row),
        }
        Ok(())
    }

    fn neumann_row(
        &self,
        psi: f64,
        index: usize,
        row: &mut [f64],
        extra: &mut f64,
    ) -> Result<(), StencilError> {
        match self.order {
            DerivativeOrder::First => first_neumann_row(psi, index, row, extra),
            DerivativeOrder::Second => second_neumann_row(psi, index, row, extra),
        }
        Ok(())
    }
}

// Closures on the nodes {0, psi, psi + 1}: row `index` evaluates at node
// `index`. Neumann rows evaluate at fluid point `index` and weight the
// outward face slope through `extra`.

fn first_lagrange_row(psi: f64, index: usize, row: &mut [f64]) {
    let psi2 = psi * psi;
    let q1 = psi + 1.0;
    match index {
        0 => {
            let inv = 1.0 / (psi * q1);
            row[0] = (-2.0 * psi - 1.0) * inv;
            row[1] = (psi2 + 2.0 * psi + 1.0) * inv;
            row[2] = -psi2 * inv;
        }
        1 => {
            let inv = 1.0 / (psi * q1);
            row[0] = -inv;
            row[1] = (-psi2 + 1.0) * inv;
            row[2] = psi2 * inv;
        }
        _ => unreachable!("closure row {index} out of range"),
    }
}

fn first_neumann_row(psi: f64, index: usize, row: &mut [f64], extra: &mut f64) {
    let r2_1 = 2.0 * psi + 1.0;
    match index {
        0 => {
            let inv = 1.0 / r2_1;
            row[0] = 0.0;
            row[1] = -2.0 * psi * inv;
            row[2] = 2.0 * psi * inv;
            *extra = -inv;
        }
        _ => unreachable!("closure row {index} out of range"),
    }
}

fn second_lagrange_row(psi: f64, index: usize, row: &mut [f64]) {
    let q1 = psi + 1.0;
    match index {
        0 => {
            let inv = 1.0 / (psi * q1);
            row[0] = 2.0 * inv;
            row[1] = (-2.0 * psi - 2.0) * inv;
            row[2] = 2.0 * psi * inv;
        }
        1 => {
            let inv = 1.0 / (psi * q1);
            row[0] = 2.0 * inv;
            row[1] = (-2.0 * psi - 2.0) * inv;
            row[2] = 2.0 * psi * inv;
        }
        _ => unreachable!("closure row {index} out of range"),
    }
}

fn second_neumann_row(psi: f64, index: usize, row: &mut [f64], extra: &mut f64) {
    let r2_1 = 2.0 * psi + 1.0;
    match index {
        0 => {
            let inv = 1.0 / r2_1;
            row[0] = 0.0;
            row[1] = -2.0 * inv;
            row[2] = 2.0 * inv;
            *extra = 2.0 * inv;
        }
        _ => unreachable!("closure row {index} out of range"),
    }
}
