//! Fourth-order stencil (`p = 2`) with closed-form closures.

use crate::error::StencilError;
use crate::stencil::{DerivativeOrder, Stencil};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct E4 {
    order: DerivativeOrder,
}

impl E4 {
    pub fn new(order: DerivativeOrder) -> Self {
        Self { order }
    }
}

impl Stencil for E4 {
    fn name(&self) -> &'static str {
        "E4"
    }

    fn order(&self) -> DerivativeOrder {
        self.order
    }

    fn radius(&self) -> usize {
        2
    }

    fn interior_row(&self, out: &mut [f64]) {
        let row = match self.order {
            DerivativeOrder::First => [1.0 / 12.0, -2.0 / 3.0, 0.0, 2.0 / 3.0, -1.0 / 12.0],
            DerivativeOrder::Second => [-1.0 / 12.0, 4.0 / 3.0, -2.5, 4.0 / 3.0, -1.0 / 12.0],
        };
        out[..5].copy_from_slice(&row);
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

// Closures on the nodes {0, psi, psi + 1, psi + 2, psi + 3}, same row
// convention as the E2 closures.

fn first_lagrange_row(psi: f64, index: usize, row: &mut [f64]) {
    let psi2 = psi * psi;
    let psi3 = psi2 * psi;
    let psi4 = psi3 * psi;
    let psi5 = psi4 * psi;
    let psi6 = psi5 * psi;
    let q1 = psi + 1.0;
    let q2 = psi + 2.0;
    let q3 = psi + 3.0;
    match index {
        0 => {
            let inv = 1.0 / (6.0 * psi * q1 * q2 * q3);
            row[0] = (-24.0 * psi3 - 108.0 * psi2 - 132.0 * psi - 36.0) * inv;
            row[1] = (psi6 + 12.0 * psi5 + 58.0 * psi4 + 144.0 * psi3 + 193.0 * psi2 + 132.0 * psi + 36.0) * inv;
            row[2] = (-3.0 * psi6 - 30.0 * psi5 - 111.0 * psi4 - 180.0 * psi3 - 108.0 * psi2) * inv;
            row[3] = (3.0 * psi6 + 24.0 * psi5 + 66.0 * psi4 + 72.0 * psi3 + 27.0 * psi2) * inv;
            row[4] = (-psi6 - 6.0 * psi5 - 13.0 * psi4 - 12.0 * psi3 - 4.0 * psi2) * inv;
        }
        1 => {
            let inv = 1.0 / (6.0 * psi * q1 * q2 * q3);
            row[0] = -36.0 * inv;
            row[1] = (-11.0 * psi4 - 60.0 * psi3 - 85.0 * psi2 + 36.0) * inv;
            row[2] = (18.0 * psi4 + 90.0 * psi3 + 108.0 * psi2) * inv;
            row[3] = (-9.0 * psi4 - 36.0 * psi3 - 27.0 * psi2) * inv;
            row[4] = (2.0 * psi4 + 6.0 * psi3 + 4.0 * psi2) * inv;
        }
        2 => {
            let inv = 1.0 / (6.0 * psi * q1 * q2 * q3);
            row[0] = 12.0 * inv;
            row[1] = (-2.0 * psi4 - 14.0 * psi3 - 34.0 * psi2 - 34.0 * psi - 12.0) * inv;
            row[2] = (-3.0 * psi4 - 12.0 * psi3 - 3.0 * psi2 + 18.0 * psi) * inv;
            row[3] = (6.0 * psi4 + 30.0 * psi3 + 42.0 * psi2 + 18.0 * psi) * inv;
            row[4] = (-psi4 - 4.0 * psi3 - 5.0 * psi2 - 2.0 * psi) * inv;
        }
        _ => unreachable!("closure row {index} out of range"),
    }
}

fn first_neumann_row(psi: f64, index: usize, row: &mut [f64], extra: &mut f64) {
    let psi2 = psi * psi;
    let psi3 = psi2 * psi;
    let r2_3 = 2.0 * psi + 3.0;
    match index {
        0 => {
            let inv = 1.0 / (6.0 * r2_3 * (psi2 + 3.0 * psi + 1.0));
            row[0] = 0.0;
            row[1] = (-22.0 * psi3 - 90.0 * psi2 - 85.0 * psi) * inv;
            row[2] = (36.0 * psi3 + 135.0 * psi2 + 108.0 * psi) * inv;
            row[3] = (-18.0 * psi3 - 54.0 * psi2 - 27.0 * psi) * inv;
            row[4] = (4.0 * psi3 + 9.0 * psi2 + 4.0 * psi) * inv;
            *extra = -18.0 * inv;
        }
        1 => {
            let inv = 1.0 / (6.0 * r2_3 * (psi2 + 3.0 * psi + 1.0));
            row[0] = 0.0;
            row[1] = (-4.0 * psi3 - 21.0 * psi2 - 34.0 * psi - 17.0) * inv;
            row[2] = (-6.0 * psi3 - 18.0 * psi2 - 3.0 * psi + 9.0) * inv;
            row[3] = (12.0 * psi3 + 45.0 * psi2 + 42.0 * psi + 9.0) * inv;
            row[4] = (-2.0 * psi3 - 6.0 * psi2 - 5.0 * psi - 1.0) * inv;
            *extra = 6.0 * inv;
        }
        _ => unreachable!("closure row {index} out of range"),
    }
}

fn second_lagrange_row(psi: f64, index: usize, row: &mut [f64]) {
    let psi2 = psi * psi;
    let psi3 = psi2 * psi;
    let psi4 = psi3 * psi;
    let psi5 = psi4 * psi;
    let q1 = psi + 1.0;
    let q2 = psi + 2.0;
    let q3 = psi + 3.0;
    match index {
        0 => {
            let inv = 1.0 / (3.0 * psi * q1 * q2 * q3);
            row[0] = (36.0 * psi2 + 108.0 * psi + 66.0) * inv;
            row[1] = (-3.0 * psi5 - 30.0 * psi4 - 116.0 * psi3 - 216.0 * psi2 - 193.0 * psi - 66.0) * inv;
            row[2] = (9.0 * psi5 + 75.0 * psi4 + 222.0 * psi3 + 270.0 * psi2 + 108.0 * psi) * inv;
            row[3] = (-9.0 * psi5 - 60.0 * psi4 - 132.0 * psi3 - 108.0 * psi2 - 27.0 * psi) * inv;
            row[4] = (3.0 * psi5 + 15.0 * psi4 + 26.0 * psi3 + 18.0 * psi2 + 4.0 * psi) * inv;
        }
        1 => {
            let inv = 1.0 / (3.0 * psi * q1 * q2 * q3);
            row[0] = 66.0 * inv;
            row[1] = (6.0 * psi4 + 25.0 * psi3 - 85.0 * psi - 66.0) * inv;
            row[2] = (-15.0 * psi4 - 57.0 * psi3 + 108.0 * psi) * inv;
            row[3] = (12.0 * psi4 + 39.0 * psi3 - 27.0 * psi) * inv;
            row[4] = (-3.0 * psi4 - 7.0 * psi3 + 4.0 * psi) * inv;
        }
        2 => {
            let inv = 1.0 / (3.0 * psi * q1 * q2 * q3);
            row[0] = -6.0 * inv;
            row[1] = (3.0 * psi4 + 19.0 * psi3 + 39.0 * psi2 + 29.0 * psi + 6.0) * inv;
            row[2] = (-6.0 * psi4 - 39.0 * psi3 - 81.0 * psi2 - 54.0 * psi) * inv;
            row[3] = (3.0 * psi4 + 21.0 * psi3 + 45.0 * psi2 + 27.0 * psi) * inv;
            row[4] = (-psi3 - 3.0 * psi2 - 2.0 * psi) * inv;
        }
        _ => unreachable!("closure row {index} out of range"),
    }
}

fn second_neumann_row(psi: f64, index: usize, row: &mut [f64], extra: &mut f64) {
    let psi2 = psi * psi;
    let psi3 = psi2 * psi;
    let r2_3 = 2.0 * psi + 3.0;
    match index {
        0 => {
            let inv = 1.0 / (6.0 * r2_3 * (psi2 + 3.0 * psi + 1.0));
            row[0] = 0.0;
            row[1] = (24.0 * psi3 + 75.0 * psi2 - 85.0) * inv;
            row[2] = (-60.0 * psi3 - 171.0 * psi2 + 108.0) * inv;
            row[3] = (48.0 * psi3 + 117.0 * psi2 - 27.0) * inv;
            row[4] = (-12.0 * psi3 - 21.0 * psi2 + 4.0) * inv;
            *extra = 66.0 * inv;
        }
        1 => {
            let inv = 1.0 / (6.0 * r2_3 * (psi2 + 3.0 * psi + 1.0));
            row[0] = 0.0;
            row[1] = (12.0 * psi3 + 57.0 * psi2 + 78.0 * psi + 29.0) * inv;
            row[2] = (-24.0 * psi3 - 117.0 * psi2 - 162.0 * psi - 54.0) * inv;
            row[3] = (12.0 * psi3 + 63.0 * psi2 + 90.0 * psi + 27.0) * inv;
            row[4] = (-3.0 * psi2 - 6.0 * psi - 2.0) * inv;
            *extra = -6.0 * inv;
        }
        _ => unreachable!("closure row {index} out of range"),
    }
}
